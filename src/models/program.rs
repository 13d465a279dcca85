use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Program {
    pub id: String,
    pub name: String,
    pub monthly_price: i64,
    pub per_class_price: i64,
    pub classes_per_week: i64,
    pub instructor: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[sqlx(skip)]
    #[serde(default)]
    pub schedule: Vec<ScheduleSlot>,
}

/// One weekly time slot of a program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ScheduleSlot {
    /// English weekday name or abbreviation, e.g. "Mon" or "Monday".
    pub day_of_week: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProgramRequest {
    pub name: String,
    pub monthly_price: i64,
    pub per_class_price: i64,
    pub classes_per_week: i64,
    pub instructor: Option<String>,
    #[serde(default)]
    pub schedule: Vec<ScheduleSlot>,
}
