//! Report Model
//!
//! Citizen-submitted waste reports. Lifecycle: created `Pending`,
//! auto-assigned shortly after creation, then closed out by the assigned
//! worker or overridden by an admin.

use super::serde_helpers;
use super::UserId;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use validator::Validate;

/// Report ID type
pub type ReportId = RecordId;

/// Report severity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
}

impl Severity {
    /// Ordering rank for worker task lists (High first)
    pub fn rank(&self) -> u8 {
        match self {
            Severity::High => 2,
            Severity::Medium => 1,
            Severity::Low => 0,
        }
    }
}

/// Report lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ReportStatus {
    #[default]
    Pending,
    Assigned,
    Completed,
    Declined,
}

impl ReportStatus {
    /// Terminal states set by workers or admins
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReportStatus::Completed | ReportStatus::Declined)
    }
}

/// Geographic point (WGS84)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Report model matching the `report` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<ReportId>,
    /// Opaque URL from the external image-storage collaborator
    pub image_url_before: String,
    pub description: String,
    pub city: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub severity: Severity,
    pub location: GeoPoint,
    #[serde(default)]
    pub status: ReportStatus,
    /// Kept on `Completed`/`Declined` reports as a historical record
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub assigned_worker: Option<UserId>,
    #[serde(default)]
    pub image_url_after: Option<String>,
    #[serde(default)]
    pub worker_notes: Option<String>,
    /// Optimistic concurrency counter; bumped on every write
    #[serde(default)]
    pub version: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create report payload (public)
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReportCreate {
    /// Opaque URL from the external upload collaborator
    #[validate(length(min = 1, message = "Image is required"))]
    pub image_url: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    pub address: Option<String>,
    #[serde(default)]
    pub severity: Severity,
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude out of range"))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude out of range"))]
    pub lng: f64,
}

/// Admin manual override payload
///
/// `worker_id` is tri-state: absent leaves the assignment untouched, an
/// empty string explicitly unassigns, a `"user:.."` id reassigns.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminReportUpdate {
    pub description: Option<String>,
    pub severity: Option<Severity>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub status: Option<ReportStatus>,
    pub worker_id: Option<String>,
}

/// Worker self-service payload (`Completed` / `Declined` only)
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerReportUpdate {
    pub status: ReportStatus,
    pub worker_notes: Option<String>,
    /// Completion photo; required when status is `Completed`
    pub image_url_after: Option<String>,
}
