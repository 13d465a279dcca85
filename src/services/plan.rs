use serde::Serialize;

use crate::error::AppError;
use crate::models::{PlanInput, Program};

/// A month is billed as exactly four weeks of classes.
pub const WEEKS_PER_MONTH: i64 = 4;

/// Credits and price produced by a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanQuote {
    pub class_credits: i64,
    pub total_price: i64,
}

/// Prices a plan against a program's schedule.
///
/// Months-based plans grant `months * classes_per_week * 4` credits for
/// `months * monthly_price`; class-based plans grant one credit per class at
/// `per_class_price` each.
pub fn compute_plan(program: &Program, plan: PlanInput) -> Result<PlanQuote, AppError> {
    match plan {
        PlanInput::Months(0) | PlanInput::Classes(0) => Err(AppError::InvalidPlanInput(
            "plan quantity must be a positive integer".to_string(),
        )),
        PlanInput::Months(months) => {
            let months = i64::from(months);
            let class_credits = months
                .checked_mul(program.classes_per_week)
                .and_then(|c| c.checked_mul(WEEKS_PER_MONTH))
                .ok_or_else(overflow)?;
            let total_price = months
                .checked_mul(program.monthly_price)
                .ok_or_else(overflow)?;
            Ok(PlanQuote { class_credits, total_price })
        }
        PlanInput::Classes(classes) => {
            let classes = i64::from(classes);
            let total_price = classes
                .checked_mul(program.per_class_price)
                .ok_or_else(overflow)?;
            Ok(PlanQuote { class_credits: classes, total_price })
        }
    }
}

fn overflow() -> AppError {
    AppError::InvalidPlanInput("plan quantity is too large".to_string())
}
