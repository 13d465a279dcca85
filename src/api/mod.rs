use axum::Json;
use axum::extract::{Path, Query};
use axum::routing::post;
use axum::{Router, extract::State, http::StatusCode, routing::get};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::db::repository;
use crate::error::AppError;
use crate::models::*;
use crate::services::{
    AttendanceRecorder, EnrollmentLedger, MemberRegistry, PlanQuote, ProgramCatalog, compute_plan,
};
use crate::state::AppState;

#[derive(Deserialize)]
struct RosterQueryParams {
    date: NaiveDate,
}

#[derive(Deserialize)]
struct SalesQueryParams {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/programs", get(list_programs).post(create_program))
        .route(
            "/programs/{id}",
            get(get_program).put(update_program).delete(delete_program),
        )
        .route("/programs/{id}/quote", post(quote_plan))
        .route("/programs/{id}/roster", get(program_roster))
        .route("/members", get(list_members).post(register_member))
        .route(
            "/members/{id}",
            get(get_member).patch(update_member).delete(delete_member),
        )
        .route(
            "/members/{id}/enrollments",
            get(list_member_enrollments).post(enroll_member),
        )
        .route("/enrollments", get(list_enrollments))
        .route(
            "/enrollments/{id}",
            get(get_enrollment).put(update_enrollment).delete(delete_enrollment),
        )
        .route("/enrollments/{id}/attendance", get(list_attendance))
        .route("/attendance", post(set_attendance))
        .route("/sales", get(sales_summary))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

// Programs

async fn list_programs(State(state): State<AppState>) -> Result<Json<Vec<Program>>, AppError> {
    let mut conn = state.db.acquire().await?;
    let programs = repository::fetch_programs(&mut conn).await?;
    Ok(Json(programs))
}

async fn get_program(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Program>, AppError> {
    let mut conn = state.db.acquire().await?;
    let program = repository::find_program_by_id(&mut conn, &id)
        .await?
        .ok_or_else(|| AppError::ProgramNotFound(id.clone()))?;
    Ok(Json(program))
}

async fn create_program(
    State(state): State<AppState>,
    Json(req): Json<NewProgramRequest>,
) -> Result<(StatusCode, Json<Program>), AppError> {
    let program = ProgramCatalog::new(state.db.clone()).create_program(req).await?;
    Ok((StatusCode::CREATED, Json(program)))
}

async fn update_program(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<NewProgramRequest>,
) -> Result<Json<Program>, AppError> {
    let program = ProgramCatalog::new(state.db.clone())
        .update_program(&id, req)
        .await?;
    Ok(Json(program))
}

async fn delete_program(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    ProgramCatalog::new(state.db.clone()).delete_program(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Prices a plan without recording anything.
async fn quote_plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(fields): Json<PlanFields>,
) -> Result<Json<PlanQuote>, AppError> {
    let plan = fields.into_plan()?;
    let mut conn = state.db.acquire().await?;
    let program = repository::find_program_by_id(&mut conn, &id)
        .await?
        .ok_or_else(|| AppError::ProgramNotFound(id.clone()))?;
    Ok(Json(compute_plan(&program, plan)?))
}

async fn program_roster(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<RosterQueryParams>,
) -> Result<Json<Vec<RosterEntry>>, AppError> {
    let mut conn = state.db.acquire().await?;
    if repository::find_program_by_id(&mut conn, &id).await?.is_none() {
        return Err(AppError::ProgramNotFound(id));
    }
    let roster = repository::fetch_roster(&mut conn, &id, params.date).await?;
    Ok(Json(roster))
}

// Members

async fn list_members(State(state): State<AppState>) -> Result<Json<Vec<Member>>, AppError> {
    let mut conn = state.db.acquire().await?;
    let members = repository::fetch_members(&mut conn).await?;
    Ok(Json(members))
}

async fn get_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Member>, AppError> {
    let mut conn = state.db.acquire().await?;
    let member = repository::find_member_by_id(&mut conn, &id)
        .await?
        .ok_or_else(|| AppError::MemberNotFound(id.clone()))?;
    Ok(Json(member))
}

async fn register_member(
    State(state): State<AppState>,
    Json(req): Json<RegistrationRequest>,
) -> Result<(StatusCode, Json<EnrollmentReceipt>), AppError> {
    let receipt = MemberRegistry::new(state.db.clone()).register(req).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

async fn update_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateMemberRequest>,
) -> Result<Json<Member>, AppError> {
    let member = MemberRegistry::new(state.db.clone())
        .update_member(&id, req)
        .await?;
    Ok(Json(member))
}

async fn delete_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    MemberRegistry::new(state.db.clone()).delete_member(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_member_enrollments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Enrollment>>, AppError> {
    let mut conn = state.db.acquire().await?;
    if repository::find_member_by_id(&mut conn, &id).await?.is_none() {
        return Err(AppError::MemberNotFound(id));
    }
    let enrollments = repository::fetch_enrollments_for_member(&mut conn, &id).await?;
    Ok(Json(enrollments))
}

async fn enroll_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<NewEnrollmentRequest>,
) -> Result<Json<Enrollment>, AppError> {
    let enrollment = MemberRegistry::new(state.db.clone()).enroll(&id, req).await?;
    Ok(Json(enrollment))
}

// Enrollments

async fn list_enrollments(State(state): State<AppState>) -> Result<Json<Vec<Enrollment>>, AppError> {
    let mut conn = state.db.acquire().await?;
    let enrollments = repository::fetch_enrollments(&mut conn).await?;
    Ok(Json(enrollments))
}

async fn get_enrollment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Enrollment>, AppError> {
    let mut conn = state.db.acquire().await?;
    let enrollment = repository::find_enrollment_by_id(&mut conn, &id)
        .await?
        .ok_or_else(|| AppError::EnrollmentNotFound(id.clone()))?;
    Ok(Json(enrollment))
}

async fn update_enrollment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateEnrollmentRequest>,
) -> Result<Json<Enrollment>, AppError> {
    let plan = req.plan.into_plan()?;
    let ledger = EnrollmentLedger::new(state.db.clone());

    let enrollment = if req.is_extension {
        let current_program = {
            let mut conn = state.db.acquire().await?;
            repository::find_enrollment_by_id(&mut conn, &id)
                .await?
                .ok_or_else(|| AppError::EnrollmentNotFound(id.clone()))?
                .program_id
        };
        if current_program != req.program_id {
            return Err(AppError::BadRequest(
                "an extension must keep the enrolled program".to_string(),
            ));
        }
        ledger
            .extend_enrollment(&id, plan, Some(req.payment_status))
            .await?
    } else {
        ledger
            .update_enrollment(&id, &req.program_id, plan, req.payment_status, req.start_date)
            .await?
    };
    Ok(Json(enrollment))
}

async fn delete_enrollment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    EnrollmentLedger::new(state.db.clone())
        .delete_enrollment(&id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// Attendance

async fn list_attendance(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<AttendanceRecord>>, AppError> {
    let mut conn = state.db.acquire().await?;
    if repository::find_enrollment_by_id(&mut conn, &id).await?.is_none() {
        return Err(AppError::EnrollmentNotFound(id));
    }
    let records = repository::fetch_attendance_for_enrollment(&mut conn, &id).await?;
    Ok(Json(records))
}

async fn set_attendance(
    State(state): State<AppState>,
    Json(req): Json<AttendanceRequest>,
) -> Result<Json<AttendanceOutcome>, AppError> {
    let outcome = AttendanceRecorder::new(state.db.clone())
        .set_attendance(&req.enrollment_id, req.attendance_date, req.is_present)
        .await?;
    Ok(Json(outcome))
}

// Sales

async fn sales_summary(
    State(state): State<AppState>,
    Query(params): Query<SalesQueryParams>,
) -> Result<Json<Vec<SalesSummary>>, AppError> {
    let mut conn = state.db.acquire().await?;
    let summary = repository::fetch_sales_summary(&mut conn, params.from, params.to).await?;
    Ok(Json(summary))
}
