use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::repository;
use crate::error::AppError;
use crate::models::AttendanceOutcome;

/// Toggles check-ins and keeps the enrollment balance in step.
pub struct AttendanceRecorder {
    db: SqlitePool,
}

impl AttendanceRecorder {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Marks `enrollment_id` present or absent on `date`.
    ///
    /// Checking in decrements the balance unless it is already zero, in which
    /// case the record is still written. Un-marking a day that has no record
    /// is a no-op.
    pub async fn set_attendance(
        &self,
        enrollment_id: &str,
        date: NaiveDate,
        present: bool,
    ) -> Result<AttendanceOutcome, AppError> {
        let mut tx = self.db.begin().await?;

        if repository::find_enrollment_by_id(&mut tx, enrollment_id)
            .await?
            .is_none()
        {
            return Err(AppError::EnrollmentNotFound(enrollment_id.to_string()));
        }

        if present {
            if repository::find_attendance(&mut tx, enrollment_id, date)
                .await?
                .is_some()
            {
                return Err(already_attended(enrollment_id, date));
            }

            match repository::insert_attendance(&mut tx, enrollment_id, date).await {
                Ok(_) => {}
                Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                    return Err(already_attended(enrollment_id, date));
                }
                Err(e) => return Err(e.into()),
            }

            if !repository::decrement_remaining(&mut tx, enrollment_id).await? {
                warn!(enrollment_id, %date, "check-in recorded with no remaining classes");
            }
        } else if repository::delete_attendance(&mut tx, enrollment_id, date).await? {
            repository::increment_remaining(&mut tx, enrollment_id).await?;
        }

        let remaining_classes = repository::remaining_classes(&mut tx, enrollment_id).await?;
        tx.commit().await?;

        info!(enrollment_id, %date, present, remaining_classes, "attendance set");
        Ok(AttendanceOutcome {
            enrollment_id: enrollment_id.to_string(),
            attendance_date: date,
            is_present: present,
            remaining_classes,
        })
    }
}

fn already_attended(enrollment_id: &str, date: NaiveDate) -> AppError {
    AppError::AlreadyAttended {
        enrollment_id: enrollment_id.to_string(),
        date,
    }
}
