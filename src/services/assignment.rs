//! Auto-Assignment Service
//!
//! Routes a freshly created report to the best eligible worker in the
//! report's city and bumps that worker's pending task counter.
//!
//! Runs detached from the creating request (`tokio::spawn`): the caller
//! gets its 201 immediately and must re-fetch the report to observe the
//! assignment. The report write is committed before the counter
//! increment, so a crash between the two leaves an undercounted worker —
//! accepted and logged, never retried. A report that stays `Pending`
//! (no coverage in that city, or a failure here) waits for a manual
//! admin assignment.

use crate::db::models::{Report, ReportStatus, User};
use crate::db::repository::{ReportRepository, RepoResult, UserRepository};
use crate::utils::now_millis;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

/// Outcome of one assignment attempt
#[derive(Debug)]
pub enum AssignOutcome {
    /// Report bound to a worker, counter incremented
    Assigned(Report),
    /// Empty eligible set — report stays `Pending`; a normal condition
    NoEligibleWorker,
    /// Nothing to do (missing city, report already touched by another writer)
    Skipped,
}

/// Pure selection: least-loaded eligible worker, ties broken by the
/// oldest account so a perpetually idle newcomer cannot starve seniors.
pub fn select_best(workers: &[User]) -> Option<&User> {
    workers.iter().min_by(|a, b| {
        a.pending_task_count
            .cmp(&b.pending_task_count)
            .then(a.created_at.cmp(&b.created_at))
    })
}

#[derive(Clone)]
pub struct AssignmentService {
    users: UserRepository,
    reports: ReportRepository,
}

impl AssignmentService {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            users: UserRepository::new(db.clone()),
            reports: ReportRepository::new(db),
        }
    }

    /// Fire-and-forget assignment for a just-created report.
    ///
    /// Failures are logged here; the creating request never sees them.
    pub fn spawn_assign(&self, report: Report) {
        let service = self.clone();
        tokio::spawn(async move {
            let report_id = report
                .id
                .as_ref()
                .map(|id| id.to_string())
                .unwrap_or_default();
            match service.assign(report).await {
                Ok(AssignOutcome::Assigned(report)) => {
                    let worker = report
                        .assigned_worker
                        .as_ref()
                        .map(|w| w.to_string())
                        .unwrap_or_default();
                    tracing::info!(report = %report_id, worker = %worker, "Report auto-assigned");
                }
                Ok(AssignOutcome::NoEligibleWorker) => {}
                Ok(AssignOutcome::Skipped) => {}
                Err(e) => {
                    tracing::error!(report = %report_id, error = %e, "Auto-assignment failed");
                }
            }
        });
    }

    /// One assignment attempt. Exposed separately from [`spawn_assign`]
    /// so tests can drive it deterministically.
    pub async fn assign(&self, report: Report) -> RepoResult<AssignOutcome> {
        let Some(report_id) = report.id.clone() else {
            tracing::warn!("Auto-assign skipped: report without id");
            return Ok(AssignOutcome::Skipped);
        };

        if report.city.trim().is_empty() {
            tracing::warn!(report = %report_id, "Auto-assign skipped: report missing city");
            return Ok(AssignOutcome::Skipped);
        }

        let workers = self.users.find_eligible_workers(&report.city).await?;
        let Some(best) = select_best(&workers) else {
            tracing::info!(city = %report.city, "No available workers in city");
            return Ok(AssignOutcome::NoEligibleWorker);
        };
        let worker_id = best
            .id
            .clone()
            .ok_or_else(|| super::missing_id_error("worker"))?;

        let mut next = report.clone();
        next.assigned_worker = Some(worker_id.clone());
        next.status = ReportStatus::Assigned;
        next.updated_at = now_millis();

        // Report first, counter second: a failure after this write leaves
        // an undercounted worker, by design (see module docs).
        let Some(saved) = self
            .reports
            .update_checked(&report_id, report.version, &next)
            .await?
        else {
            tracing::warn!(report = %report_id, "Auto-assign skipped: report modified concurrently");
            return Ok(AssignOutcome::Skipped);
        };

        if let Err(e) = self.users.adjust_pending_count(&worker_id, 1).await {
            tracing::error!(
                report = %report_id,
                worker = %worker_id,
                error = %e,
                "Report assigned but counter increment failed; worker is undercounted"
            );
        }

        Ok(AssignOutcome::Assigned(saved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::UserRole;
    use surrealdb::RecordId;

    fn worker(key: &str, pending: i64, created_at: i64) -> User {
        User {
            id: Some(RecordId::from_table_key("user", key)),
            name: key.to_string(),
            email: format!("{}@example.com", key),
            hash_pass: String::new(),
            role: UserRole::Worker,
            city: "Gwalior".to_string(),
            is_active: true,
            pending_task_count: pending,
            created_at,
        }
    }

    #[test]
    fn test_empty_set_selects_none() {
        assert!(select_best(&[]).is_none());
    }

    #[test]
    fn test_selects_least_loaded() {
        let workers = vec![worker("a", 3, 100), worker("b", 1, 200), worker("c", 2, 50)];
        let best = select_best(&workers).expect("worker expected");
        assert_eq!(best.name, "b");
    }

    #[test]
    fn test_tie_broken_by_oldest_account() {
        let workers = vec![worker("new", 1, 900), worker("old", 1, 100), worker("mid", 1, 500)];
        let best = select_best(&workers).expect("worker expected");
        assert_eq!(best.name, "old");
    }

    #[test]
    fn test_load_beats_seniority() {
        // A brand-new idle worker wins over a loaded veteran
        let workers = vec![worker("veteran", 4, 1), worker("rookie", 0, 9999)];
        let best = select_best(&workers).expect("worker expected");
        assert_eq!(best.name, "rookie");
    }
}
