use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::repository;
use crate::error::AppError;
use crate::models::{Enrollment, PaymentStatus, PlanInput, Program};
use crate::services::plan::compute_plan;

/// Creation, extension and editing of enrollments.
///
/// Every public operation runs in its own transaction. The `*_in` functions
/// take an open connection so callers can compose them into a larger
/// transaction (member registration, for instance).
pub struct EnrollmentLedger {
    db: SqlitePool,
}

impl EnrollmentLedger {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn create_enrollment(
        &self,
        member_id: &str,
        program_id: &str,
        plan: PlanInput,
        payment_status: PaymentStatus,
        start_date: NaiveDate,
    ) -> Result<Enrollment, AppError> {
        let mut tx = self.db.begin().await?;
        let enrollment =
            create_in(&mut tx, member_id, program_id, plan, payment_status, start_date).await?;
        tx.commit().await?;
        Ok(enrollment)
    }

    /// Adds a plan on top of an existing enrollment. `payment_status` of
    /// `None` keeps the current status.
    pub async fn extend_enrollment(
        &self,
        enrollment_id: &str,
        plan: PlanInput,
        payment_status: Option<PaymentStatus>,
    ) -> Result<Enrollment, AppError> {
        let mut tx = self.db.begin().await?;
        let enrollment = extend_in(&mut tx, enrollment_id, plan, payment_status).await?;
        tx.commit().await?;
        Ok(enrollment)
    }

    pub async fn update_enrollment(
        &self,
        enrollment_id: &str,
        program_id: &str,
        plan: PlanInput,
        payment_status: PaymentStatus,
        start_date: NaiveDate,
    ) -> Result<Enrollment, AppError> {
        let mut tx = self.db.begin().await?;
        let enrollment =
            update_in(&mut tx, enrollment_id, program_id, plan, payment_status, start_date).await?;
        tx.commit().await?;
        Ok(enrollment)
    }

    pub async fn delete_enrollment(&self, enrollment_id: &str) -> Result<(), AppError> {
        let mut tx = self.db.begin().await?;
        delete_in(&mut tx, enrollment_id).await?;
        tx.commit().await?;
        Ok(())
    }
}

async fn load_program(conn: &mut SqliteConnection, program_id: &str) -> Result<Program, AppError> {
    repository::find_program_by_id(conn, program_id)
        .await?
        .ok_or_else(|| AppError::ProgramNotFound(program_id.to_string()))
}

async fn load_enrollment(
    conn: &mut SqliteConnection,
    enrollment_id: &str,
) -> Result<Enrollment, AppError> {
    repository::find_enrollment_by_id(conn, enrollment_id)
        .await?
        .ok_or_else(|| AppError::EnrollmentNotFound(enrollment_id.to_string()))
}

pub async fn create_in(
    conn: &mut SqliteConnection,
    member_id: &str,
    program_id: &str,
    plan: PlanInput,
    payment_status: PaymentStatus,
    start_date: NaiveDate,
) -> Result<Enrollment, AppError> {
    if repository::find_member_by_id(conn, member_id).await?.is_none() {
        return Err(AppError::MemberNotFound(member_id.to_string()));
    }
    let program = load_program(conn, program_id).await?;

    if repository::find_enrollment_for_program(conn, member_id, program_id)
        .await?
        .is_some()
    {
        return Err(AppError::DuplicateEnrollment {
            member_id: member_id.to_string(),
            program_id: program_id.to_string(),
        });
    }

    let quote = compute_plan(&program, plan)?;
    let (duration_months, total_classes) = plan.columns();
    let now = Utc::now().to_rfc3339();
    let enrollment = Enrollment {
        id: Uuid::new_v4().to_string(),
        member_id: member_id.to_string(),
        program_id: program_id.to_string(),
        duration_months,
        total_classes,
        purchased_classes: quote.class_credits,
        remaining_classes: quote.class_credits,
        total_amount: quote.total_price,
        original_amount: quote.total_price,
        payment_status,
        start_date,
        created_at: now.clone(),
        updated_at: now,
    };
    repository::insert_enrollment(conn, &enrollment).await?;

    info!(
        enrollment_id = %enrollment.id,
        member_id,
        program = %program.name,
        credits = quote.class_credits,
        price = quote.total_price,
        "enrollment created"
    );
    Ok(enrollment)
}

pub async fn extend_in(
    conn: &mut SqliteConnection,
    enrollment_id: &str,
    plan: PlanInput,
    payment_status: Option<PaymentStatus>,
) -> Result<Enrollment, AppError> {
    let current = load_enrollment(conn, enrollment_id).await?;
    let program = load_program(conn, &current.program_id).await?;
    let quote = compute_plan(&program, plan)?;

    let overflow = || {
        AppError::InvalidPlanInput("extension exceeds the enrollment's limits".to_string())
    };
    let purchased = current
        .purchased_classes
        .checked_add(quote.class_credits)
        .ok_or_else(overflow)?;
    current
        .remaining_classes
        .checked_add(quote.class_credits)
        .ok_or_else(overflow)?;
    current
        .total_amount
        .checked_add(quote.total_price)
        .ok_or_else(overflow)?;
    let consumed = current.consumed_classes();
    if purchased < consumed {
        return Err(AppError::ExtensionBelowConsumed { purchased, consumed });
    }

    let (duration_months, total_classes) = merged_plan_columns(&current, plan, purchased);
    repository::add_to_enrollment(
        conn,
        enrollment_id,
        quote.class_credits,
        quote.total_price,
        duration_months,
        total_classes,
        payment_status.unwrap_or(current.payment_status),
    )
    .await?;

    info!(
        enrollment_id,
        added_credits = quote.class_credits,
        added_price = quote.total_price,
        "enrollment extended"
    );
    load_enrollment(conn, enrollment_id).await
}

/// Plan columns after an extension. Matching plan kinds accumulate; mixing
/// kinds turns the enrollment into a class-count plan over all purchased
/// credits.
fn merged_plan_columns(
    current: &Enrollment,
    plan: PlanInput,
    purchased: i64,
) -> (Option<i64>, Option<i64>) {
    match (current.plan(), plan) {
        (Some(PlanInput::Months(months)), PlanInput::Months(more)) => {
            (Some(i64::from(months) + i64::from(more)), None)
        }
        (Some(PlanInput::Classes(classes)), PlanInput::Classes(more)) => {
            (None, Some(i64::from(classes) + i64::from(more)))
        }
        _ => {
            debug!(enrollment_id = %current.id, "plan kind changed on extension");
            (None, Some(purchased))
        }
    }
}

pub async fn update_in(
    conn: &mut SqliteConnection,
    enrollment_id: &str,
    program_id: &str,
    plan: PlanInput,
    payment_status: PaymentStatus,
    start_date: NaiveDate,
) -> Result<Enrollment, AppError> {
    let mut enrollment = load_enrollment(conn, enrollment_id).await?;
    let program = load_program(conn, program_id).await?;

    if enrollment.program_id != program_id
        && repository::find_enrollment_for_program(conn, &enrollment.member_id, program_id)
            .await?
            .is_some()
    {
        return Err(AppError::DuplicateEnrollment {
            member_id: enrollment.member_id.clone(),
            program_id: program_id.to_string(),
        });
    }

    let quote = compute_plan(&program, plan)?;
    let consumed = enrollment.consumed_classes();
    if quote.class_credits < consumed {
        return Err(AppError::PlanDowngradeRejected {
            requested: quote.class_credits,
            consumed,
        });
    }

    let (duration_months, total_classes) = plan.columns();
    enrollment.program_id = program_id.to_string();
    enrollment.duration_months = duration_months;
    enrollment.total_classes = total_classes;
    enrollment.purchased_classes = quote.class_credits;
    enrollment.remaining_classes = quote.class_credits - consumed;
    enrollment.total_amount = quote.total_price;
    enrollment.payment_status = payment_status;
    enrollment.start_date = start_date;
    enrollment.updated_at = Utc::now().to_rfc3339();
    repository::replace_enrollment(conn, &enrollment).await?;

    info!(
        enrollment_id,
        program = %program.name,
        credits = quote.class_credits,
        consumed,
        price = quote.total_price,
        "enrollment updated"
    );
    Ok(enrollment)
}

pub async fn delete_in(conn: &mut SqliteConnection, enrollment_id: &str) -> Result<(), AppError> {
    let enrollment = load_enrollment(conn, enrollment_id).await?;

    if repository::count_enrollments_for_member(conn, &enrollment.member_id).await? <= 1 {
        return Err(AppError::LastEnrollmentUndeletable(enrollment_id.to_string()));
    }

    let removed = repository::delete_attendance_for_enrollment(conn, enrollment_id).await?;
    repository::delete_enrollment(conn, enrollment_id).await?;

    info!(enrollment_id, attendance_removed = removed, "enrollment deleted");
    Ok(())
}
