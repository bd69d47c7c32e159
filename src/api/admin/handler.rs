//! Admin Handlers
//!
//! Worker account management and manual report overrides.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use validator::Validate;

use crate::core::ServerState;
use crate::db::models::{AdminReportUpdate, Report, UserResponse, WorkerCreate};
use crate::db::repository::{ReportRepository, UserRepository};
use crate::utils::AppResult;

/// Create a worker account
pub async fn create_worker(
    State(state): State<ServerState>,
    Json(payload): Json<WorkerCreate>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    payload.validate()?;

    let users = UserRepository::new(state.get_db());
    let worker = users.create_worker(payload).await?;

    tracing::info!(email = %worker.email, city = %worker.city, "Worker account created");

    Ok((StatusCode::CREATED, Json(worker.into())))
}

/// List all workers, least-loaded first
pub async fn list_workers(State(state): State<ServerState>) -> AppResult<Json<Vec<UserResponse>>> {
    let users = UserRepository::new(state.get_db());
    let workers = users.find_workers().await?;
    Ok(Json(workers.into_iter().map(UserResponse::from).collect()))
}

/// List every report, newest first (includes declined)
pub async fn list_reports(State(state): State<ServerState>) -> AppResult<Json<Vec<Report>>> {
    let repo = ReportRepository::new(state.get_db());
    let reports = repo.find_all().await?;
    Ok(Json(reports))
}

/// Manual report override: edit fields, change status, reassign or
/// unassign. Counter reconciliation happens inside the transition
/// service.
pub async fn update_report(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<AdminReportUpdate>,
) -> AppResult<Json<Report>> {
    let report = state.transition.admin_update(&id, payload).await?;
    Ok(Json(report))
}
