use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;
use crate::models::MemberDetails;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Unpaid,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Enrollment {
    pub id: String,
    pub member_id: String,
    pub program_id: String,
    pub duration_months: Option<i64>,
    pub total_classes: Option<i64>,
    /// Credits bought over the life of the enrollment, extensions included.
    pub purchased_classes: i64,
    pub remaining_classes: i64,
    pub total_amount: i64,
    pub original_amount: i64,
    pub payment_status: PaymentStatus,
    pub start_date: NaiveDate,
    pub created_at: String,
    pub updated_at: String,
}

impl Enrollment {
    /// Classes attended so far under this enrollment.
    pub fn consumed_classes(&self) -> i64 {
        self.purchased_classes - self.remaining_classes
    }

    pub fn plan(&self) -> Option<PlanInput> {
        PlanFields {
            duration_months: self.duration_months,
            total_classes: self.total_classes,
        }
        .into_plan()
        .ok()
    }
}

/// Subscription shape chosen by a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanInput {
    Months(u32),
    Classes(u32),
}

impl PlanInput {
    /// `(duration_months, total_classes)` column values for this plan.
    pub fn columns(&self) -> (Option<i64>, Option<i64>) {
        match *self {
            PlanInput::Months(m) => (Some(i64::from(m)), None),
            PlanInput::Classes(c) => (None, Some(i64::from(c))),
        }
    }
}

/// Plan fields as they arrive in request bodies.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PlanFields {
    pub duration_months: Option<i64>,
    pub total_classes: Option<i64>,
}

impl PlanFields {
    pub fn into_plan(self) -> Result<PlanInput, AppError> {
        match (self.duration_months, self.total_classes) {
            (Some(months), None) => positive(months, "duration_months").map(PlanInput::Months),
            (None, Some(classes)) => positive(classes, "total_classes").map(PlanInput::Classes),
            (Some(_), Some(_)) => Err(AppError::InvalidPlanInput(
                "duration_months and total_classes are mutually exclusive".to_string(),
            )),
            (None, None) => Err(AppError::InvalidPlanInput(
                "one of duration_months or total_classes is required".to_string(),
            )),
        }
    }
}

fn positive(value: i64, field: &str) -> Result<u32, AppError> {
    u32::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| AppError::InvalidPlanInput(format!("{} must be a positive integer, got {}", field, value)))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEnrollmentRequest {
    pub program_id: String,
    pub start_date: NaiveDate,
    pub payment_status: PaymentStatus,
    #[serde(flatten)]
    pub plan: PlanFields,
    #[serde(default)]
    pub is_extension: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateEnrollmentRequest {
    pub program_id: String,
    pub start_date: NaiveDate,
    pub payment_status: PaymentStatus,
    #[serde(flatten)]
    pub plan: PlanFields,
    #[serde(default)]
    pub is_extension: bool,
}

/// Member registration together with the first enrollment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationRequest {
    #[serde(flatten)]
    pub member: MemberDetails,
    pub program_id: String,
    pub start_date: NaiveDate,
    pub payment_status: PaymentStatus,
    #[serde(flatten)]
    pub plan: PlanFields,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentReceipt {
    pub member_id: String,
    pub enrollment_id: String,
    pub total_price: i64,
    pub remaining_classes: i64,
}

/// Per-program revenue line.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SalesSummary {
    pub program_id: String,
    pub program_name: String,
    pub enrollment_count: i64,
    pub gross_amount: i64,
    pub paid_amount: i64,
    pub unpaid_amount: i64,
}
