use chrono::Weekday;
use sqlx::SqlitePool;
use tracing::info;

use crate::db::repository;
use crate::error::AppError;
use crate::models::{NewProgramRequest, Program};

/// Program catalog maintenance.
pub struct ProgramCatalog {
    db: SqlitePool,
}

impl ProgramCatalog {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn create_program(&self, req: NewProgramRequest) -> Result<Program, AppError> {
        validate_program(&req)?;
        let mut tx = self.db.begin().await?;
        let program = repository::insert_program(&mut tx, req).await?;
        tx.commit().await?;

        info!(program_id = %program.id, name = %program.name, "program created");
        Ok(program)
    }

    pub async fn update_program(&self, id: &str, req: NewProgramRequest) -> Result<Program, AppError> {
        validate_program(&req)?;
        let mut tx = self.db.begin().await?;
        let program = repository::update_program(&mut tx, id, req)
            .await?
            .ok_or_else(|| AppError::ProgramNotFound(id.to_string()))?;
        tx.commit().await?;

        info!(program_id = %program.id, "program updated");
        Ok(program)
    }

    /// Refuses to delete a program that any enrollment still references.
    pub async fn delete_program(&self, id: &str) -> Result<(), AppError> {
        let mut tx = self.db.begin().await?;
        if repository::count_enrollments_for_program(&mut tx, id).await? > 0 {
            return Err(AppError::ProgramInUse(id.to_string()));
        }
        if !repository::delete_program(&mut tx, id).await? {
            return Err(AppError::ProgramNotFound(id.to_string()));
        }
        tx.commit().await?;

        info!(program_id = id, "program deleted");
        Ok(())
    }
}

pub fn validate_program(req: &NewProgramRequest) -> Result<(), AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("program name is required".to_string()));
    }
    if req.monthly_price < 0 || req.per_class_price < 0 {
        return Err(AppError::BadRequest("prices must not be negative".to_string()));
    }
    if req.classes_per_week <= 0 {
        return Err(AppError::InvalidSchedule(
            "classes_per_week must be positive".to_string(),
        ));
    }
    if req.schedule.len() as i64 != req.classes_per_week {
        return Err(AppError::InvalidSchedule(format!(
            "classes_per_week is {} but {} weekly slots were given",
            req.classes_per_week,
            req.schedule.len()
        )));
    }
    for slot in &req.schedule {
        if slot.day_of_week.parse::<Weekday>().is_err() {
            return Err(AppError::InvalidSchedule(format!(
                "unknown day of week: {}",
                slot.day_of_week
            )));
        }
        if slot.end_time <= slot.start_time {
            return Err(AppError::InvalidSchedule(format!(
                "slot on {} ends before it starts",
                slot.day_of_week
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScheduleSlot;
    use chrono::NaiveTime;

    fn slot(day: &str, start: u32, end: u32) -> ScheduleSlot {
        ScheduleSlot {
            day_of_week: day.to_string(),
            start_time: NaiveTime::from_hms_opt(start, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(end, 0, 0).unwrap(),
        }
    }

    fn request(classes_per_week: i64, schedule: Vec<ScheduleSlot>) -> NewProgramRequest {
        NewProgramRequest {
            name: "Ballet".to_string(),
            monthly_price: 120_000,
            per_class_price: 40_000,
            classes_per_week,
            instructor: None,
            schedule,
        }
    }

    #[test]
    fn test_slots_must_match_classes_per_week() {
        let req = request(2, vec![slot("Mon", 18, 19)]);
        assert!(matches!(validate_program(&req), Err(AppError::InvalidSchedule(_))));

        let req = request(2, vec![slot("Mon", 18, 19), slot("Wednesday", 18, 19)]);
        assert!(validate_program(&req).is_ok());
    }

    #[test]
    fn test_rejects_bad_slots() {
        let req = request(1, vec![slot("Someday", 18, 19)]);
        assert!(matches!(validate_program(&req), Err(AppError::InvalidSchedule(_))));

        let req = request(1, vec![slot("Fri", 19, 18)]);
        assert!(matches!(validate_program(&req), Err(AppError::InvalidSchedule(_))));
    }

    #[test]
    fn test_rejects_negative_price() {
        let mut req = request(1, vec![slot("Sat", 10, 11)]);
        req.per_class_price = -1;
        assert!(matches!(validate_program(&req), Err(AppError::BadRequest(_))));
    }
}
