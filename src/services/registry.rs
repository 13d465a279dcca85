use sqlx::SqlitePool;
use tracing::info;

use crate::db::repository;
use crate::error::AppError;
use crate::models::{
    Enrollment, EnrollmentReceipt, Member, NewEnrollmentRequest, RegistrationRequest,
    UpdateMemberRequest,
};
use crate::services::ledger;

/// Member registration and removal.
pub struct MemberRegistry {
    db: SqlitePool,
}

impl MemberRegistry {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Registers a member and their first enrollment in one transaction.
    pub async fn register(&self, req: RegistrationRequest) -> Result<EnrollmentReceipt, AppError> {
        validate_name(&req.member.name)?;
        let plan = req.plan.into_plan()?;

        let mut tx = self.db.begin().await?;
        let member = repository::insert_member(&mut tx, req.member).await?;
        let enrollment = ledger::create_in(
            &mut tx,
            &member.id,
            &req.program_id,
            plan,
            req.payment_status,
            req.start_date,
        )
        .await?;
        tx.commit().await?;

        info!(member_id = %member.id, name = %member.name, "member registered");
        Ok(EnrollmentReceipt {
            member_id: member.id,
            enrollment_id: enrollment.id,
            total_price: enrollment.total_amount,
            remaining_classes: enrollment.remaining_classes,
        })
    }

    /// Adds an enrollment to an existing member, or extends the one they
    /// already hold for the program when `is_extension` is set.
    pub async fn enroll(
        &self,
        member_id: &str,
        req: NewEnrollmentRequest,
    ) -> Result<Enrollment, AppError> {
        let plan = req.plan.into_plan()?;

        let mut tx = self.db.begin().await?;
        let enrollment = if req.is_extension {
            let existing =
                repository::find_enrollment_for_program(&mut tx, member_id, &req.program_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::EnrollmentNotFound(format!(
                            "member {} has no enrollment in program {}",
                            member_id, req.program_id
                        ))
                    })?;
            ledger::extend_in(&mut tx, &existing.id, plan, Some(req.payment_status)).await?
        } else {
            ledger::create_in(
                &mut tx,
                member_id,
                &req.program_id,
                plan,
                req.payment_status,
                req.start_date,
            )
            .await?
        };
        tx.commit().await?;
        Ok(enrollment)
    }

    pub async fn update_member(
        &self,
        member_id: &str,
        req: UpdateMemberRequest,
    ) -> Result<Member, AppError> {
        if let Some(name) = &req.name {
            validate_name(name)?;
        }
        let mut conn = self.db.acquire().await?;
        repository::update_member(&mut conn, member_id, req)
            .await?
            .ok_or_else(|| AppError::MemberNotFound(member_id.to_string()))
    }

    /// Deletes the member together with its enrollments and attendance.
    pub async fn delete_member(&self, member_id: &str) -> Result<(), AppError> {
        let mut tx = self.db.begin().await?;
        if !repository::delete_member(&mut tx, member_id).await? {
            return Err(AppError::MemberNotFound(member_id.to_string()));
        }
        tx.commit().await?;

        info!(member_id, "member deleted");
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::BadRequest("member name is required".to_string()));
    }
    Ok(())
}
