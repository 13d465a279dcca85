use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AttendanceRecord {
    pub id: String,
    pub enrollment_id: String,
    pub attendance_date: NaiveDate,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRequest {
    pub enrollment_id: String,
    pub attendance_date: NaiveDate,
    pub is_present: bool,
}

/// Result of an attendance toggle, including the balance after the change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceOutcome {
    pub enrollment_id: String,
    pub attendance_date: NaiveDate,
    pub is_present: bool,
    pub remaining_classes: i64,
}

/// One line of a program's roster for a given day.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RosterEntry {
    pub enrollment_id: String,
    pub member_id: String,
    pub member_name: String,
    pub remaining_classes: i64,
    pub is_present: bool,
}
