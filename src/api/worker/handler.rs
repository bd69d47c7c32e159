//! Worker Handlers
//!
//! A worker sees their own active tasks and closes them out with a
//! completion photo. All other report mutations belong to the admin
//! surface.

use axum::{
    Extension, Json,
    extract::{Path, State},
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Report, WorkerReportUpdate};
use crate::db::repository::ReportRepository;
use crate::utils::{AppError, AppResult};

/// Active tasks for the calling worker, highest severity first
pub async fn list_tasks(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<Report>>> {
    let worker_id = user
        .id
        .parse()
        .map_err(|_| AppError::internal(format!("Invalid worker id in token: {}", user.id)))?;

    let repo = ReportRepository::new(state.get_db());
    let reports = repo.find_active_for_worker(&worker_id).await?;
    Ok(Json(reports))
}

/// Close out an assigned report as `Completed` or `Declined`
pub async fn update_report(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<WorkerReportUpdate>,
) -> AppResult<Json<Report>> {
    let report = state.transition.worker_update(&user.id, &id, payload).await?;
    Ok(Json(report))
}
