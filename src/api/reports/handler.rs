//! Public Report Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use validator::Validate;

use crate::core::ServerState;
use crate::db::models::{Report, ReportCreate};
use crate::db::repository::ReportRepository;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Serialize)]
pub struct ReportCreatedResponse {
    pub message: &'static str,
    pub report_id: String,
}

/// Submit a new report.
///
/// The report is stored as `Pending` and handed to the auto-assignment
/// service in the background; the response does not wait for (or reveal)
/// the assignment outcome. Reverse geocoding is best-effort: a failure
/// stores the report without an address.
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ReportCreate>,
) -> AppResult<(StatusCode, Json<ReportCreatedResponse>)> {
    payload.validate()?;

    // Geocode only when the citizen supplied no usable address
    let needs_geocode = payload
        .address
        .as_deref()
        .is_none_or(|a| a.trim().is_empty());
    let geocoded = if needs_geocode {
        state.geocode.reverse(payload.lat, payload.lng).await
    } else {
        None
    };

    let repo = ReportRepository::new(state.get_db());
    let report = repo.create(payload, geocoded).await?;

    let report_id = report
        .id
        .as_ref()
        .map(|id| id.to_string())
        .unwrap_or_default();
    tracing::info!(report = %report_id, city = %report.city, "Report submitted");

    state.assignment.spawn_assign(report);

    Ok((
        StatusCode::CREATED,
        Json(ReportCreatedResponse {
            message: "Report submitted successfully",
            report_id,
        }),
    ))
}

/// Public map listing: every non-declined report, newest first
pub async fn list_public(State(state): State<ServerState>) -> AppResult<Json<Vec<Report>>> {
    let repo = ReportRepository::new(state.get_db());
    let reports = repo.find_public().await?;
    Ok(Json(reports))
}

/// Get one report by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Report>> {
    let repo = ReportRepository::new(state.get_db());
    let report = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Report {} not found", id)))?;
    Ok(Json(report))
}
