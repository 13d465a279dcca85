#![allow(dead_code)]

use academy::db::repository;
use academy::models::{
    Enrollment, Member, MemberDetails, NewProgramRequest, PaymentStatus, PlanInput, Program,
    ScheduleSlot,
};
use academy::services::{EnrollmentLedger, ProgramCatalog};
use chrono::{NaiveDate, NaiveTime};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

/// In-memory database on a single long-lived connection.
pub async fn setup_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn slot(day: &str) -> ScheduleSlot {
    ScheduleSlot {
        day_of_week: day.to_string(),
        start_time: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(20, 30, 0).unwrap(),
    }
}

pub fn kpop_request() -> NewProgramRequest {
    NewProgramRequest {
        name: "Kpop".to_string(),
        monthly_price: 150_000,
        per_class_price: 50_000,
        classes_per_week: 2,
        instructor: Some("Jisoo".to_string()),
        schedule: vec![slot("Tue"), slot("Thu")],
    }
}

pub fn ballet_request() -> NewProgramRequest {
    NewProgramRequest {
        name: "Ballet".to_string(),
        monthly_price: 120_000,
        per_class_price: 40_000,
        classes_per_week: 1,
        instructor: None,
        schedule: vec![slot("Sat")],
    }
}

pub async fn create_program(pool: &SqlitePool, req: NewProgramRequest) -> Program {
    ProgramCatalog::new(pool.clone())
        .create_program(req)
        .await
        .expect("Failed to create program")
}

pub async fn create_member(pool: &SqlitePool, name: &str) -> Member {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    repository::insert_member(
        &mut conn,
        MemberDetails {
            name: name.to_string(),
            ..Default::default()
        },
    )
    .await
    .expect("Failed to insert member")
}

/// Member "Mina" with one month of Kpop (8 credits, 150000).
pub async fn kpop_enrollment(pool: &SqlitePool) -> (Program, Member, Enrollment) {
    let program = create_program(pool, kpop_request()).await;
    let member = create_member(pool, "Mina").await;
    let enrollment = EnrollmentLedger::new(pool.clone())
        .create_enrollment(
            &member.id,
            &program.id,
            PlanInput::Months(1),
            PaymentStatus::Paid,
            date(2026, 3, 2),
        )
        .await
        .expect("Failed to create enrollment");
    (program, member, enrollment)
}

pub async fn fetch_enrollment(pool: &SqlitePool, id: &str) -> Enrollment {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    repository::find_enrollment_by_id(&mut conn, id)
        .await
        .expect("Failed to fetch enrollment")
        .expect("Enrollment not found")
}
