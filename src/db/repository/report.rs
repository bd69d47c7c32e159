//! Report Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{GeoPoint, Report, ReportCreate, ReportId, ReportStatus, UserId};
use crate::utils::now_millis;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "report";

#[derive(Clone)]
pub struct ReportRepository {
    base: BaseRepository,
}

impl ReportRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Create a new report in status `Pending`.
    ///
    /// A caller-supplied address wins; `geocoded` is the reverse-geocoding
    /// fallback used only when the payload carries no usable address.
    pub async fn create(&self, data: ReportCreate, geocoded: Option<String>) -> RepoResult<Report> {
        let address = data
            .address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .or(geocoded);
        let now = now_millis();
        let report = Report {
            id: None,
            image_url_before: data.image_url,
            description: data.description,
            city: data.city,
            address,
            severity: data.severity,
            location: GeoPoint {
                lat: data.lat,
                lng: data.lng,
            },
            status: ReportStatus::Pending,
            assigned_worker: None,
            image_url_after: None,
            worker_notes: None,
            version: 1,
            created_at: now,
            updated_at: now,
        };

        let created: Option<Report> = self.base.db().create(TABLE).content(report).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create report".to_string()))
    }

    /// Find report by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Report>> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let report: Option<Report> = self.base.db().select(thing).await?;
        Ok(report)
    }

    /// All non-declined reports, newest first (public map markers)
    pub async fn find_public(&self) -> RepoResult<Vec<Report>> {
        let reports: Vec<Report> = self
            .base
            .db()
            .query("SELECT * FROM report WHERE status != $declined ORDER BY created_at DESC")
            .bind(("declined", ReportStatus::Declined))
            .await?
            .take(0)?;
        Ok(reports)
    }

    /// All reports, newest first (admin panel)
    pub async fn find_all(&self) -> RepoResult<Vec<Report>> {
        let reports: Vec<Report> = self
            .base
            .db()
            .query("SELECT * FROM report ORDER BY created_at DESC")
            .await?
            .take(0)?;
        Ok(reports)
    }

    /// Active tasks for one worker, highest severity first, then newest
    pub async fn find_active_for_worker(&self, worker: &UserId) -> RepoResult<Vec<Report>> {
        let mut reports: Vec<Report> = self
            .base
            .db()
            .query(
                "SELECT * FROM report WHERE assigned_worker = $worker \
                 AND status IN [$assigned, $pending]",
            )
            .bind(("worker", worker.clone()))
            .bind(("assigned", ReportStatus::Assigned))
            .bind(("pending", ReportStatus::Pending))
            .await?
            .take(0)?;
        reports.sort_by(|a, b| {
            b.severity
                .rank()
                .cmp(&a.severity.rank())
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(reports)
    }

    /// Version-checked write of the full mutable state of a report.
    ///
    /// The `WHERE version = $version` guard makes this a compare-and-swap:
    /// `Ok(None)` means another writer got there first (or the report is
    /// gone) and nothing was written. Callers must have read the report
    /// immediately beforehand to compute transition deltas from its prior
    /// state.
    pub async fn update_checked(
        &self,
        id: &ReportId,
        expected_version: i64,
        data: &Report,
    ) -> RepoResult<Option<Report>> {
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE report SET \
                    description = $description, \
                    city = $city, \
                    address = $address, \
                    severity = $severity, \
                    status = $status, \
                    assigned_worker = $assigned_worker, \
                    image_url_after = $image_url_after, \
                    worker_notes = $worker_notes, \
                    version = version + 1, \
                    updated_at = $updated_at \
                 WHERE id = $id AND version = $version \
                 RETURN AFTER",
            )
            .bind(("id", id.clone()))
            .bind(("version", expected_version))
            .bind(("description", data.description.clone()))
            .bind(("city", data.city.clone()))
            .bind(("address", data.address.clone()))
            .bind(("severity", data.severity))
            .bind(("status", data.status))
            .bind(("assigned_worker", data.assigned_worker.clone()))
            .bind(("image_url_after", data.image_url_after.clone()))
            .bind(("worker_notes", data.worker_notes.clone()))
            .bind(("updated_at", now_millis()))
            .await?;
        let updated: Vec<Report> = result.take(0)?;
        Ok(updated.into_iter().next())
    }
}
