use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid plan input: {0}")]
    InvalidPlanInput(String),

    #[error("Member {member_id} is already enrolled in program {program_id}")]
    DuplicateEnrollment { member_id: String, program_id: String },

    #[error("Extension would leave {purchased} purchased classes, below {consumed} already attended")]
    ExtensionBelowConsumed { purchased: i64, consumed: i64 },

    #[error("New plan grants {requested} classes, below {consumed} already attended")]
    PlanDowngradeRejected { requested: i64, consumed: i64 },

    #[error("Enrollment {0} is the member's only enrollment; delete the member instead")]
    LastEnrollmentUndeletable(String),

    #[error("Attendance already recorded for enrollment {enrollment_id} on {date}")]
    AlreadyAttended { enrollment_id: String, date: chrono::NaiveDate },

    #[error("Enrollment not found: {0}")]
    EnrollmentNotFound(String),

    #[error("Program not found: {0}")]
    ProgramNotFound(String),

    #[error("Member not found: {0}")]
    MemberNotFound(String),

    #[error("Program {0} still has enrollments")]
    ProgramInUse(String),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Stable machine-readable name for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DatabaseFailure",
            AppError::InvalidPlanInput(_) => "InvalidPlanInput",
            AppError::DuplicateEnrollment { .. } => "DuplicateEnrollment",
            AppError::ExtensionBelowConsumed { .. } => "ExtensionBelowConsumed",
            AppError::PlanDowngradeRejected { .. } => "PlanDowngradeRejected",
            AppError::LastEnrollmentUndeletable(_) => "LastEnrollmentUndeletable",
            AppError::AlreadyAttended { .. } => "AlreadyAttended",
            AppError::EnrollmentNotFound(_) => "EnrollmentNotFound",
            AppError::ProgramNotFound(_) => "ProgramNotFound",
            AppError::MemberNotFound(_) => "MemberNotFound",
            AppError::ProgramInUse(_) => "ProgramInUse",
            AppError::InvalidSchedule(_) => "InvalidSchedule",
            AppError::BadRequest(_) => "BadRequest",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidPlanInput(_)
            | AppError::InvalidSchedule(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::EnrollmentNotFound(_)
            | AppError::ProgramNotFound(_)
            | AppError::MemberNotFound(_) => StatusCode::NOT_FOUND,
            AppError::DuplicateEnrollment { .. }
            | AppError::AlreadyAttended { .. }
            | AppError::ProgramInUse(_)
            | AppError::LastEnrollmentUndeletable(_) => StatusCode::CONFLICT,
            AppError::ExtensionBelowConsumed { .. } | AppError::PlanDowngradeRejected { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Database(e) => {
                error!("database error: {}", e);
                "Database error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(ErrorResponse {
            error: status.to_string(),
            code: self.code().to_string(),
            message,
        });

        (status, body).into_response()
    }
}
