//! Status Transition Service
//!
//! Single place where every report status/assignment change is applied
//! and worker counters are reconciled. Admin overrides and worker
//! self-service both converge here so the delta rules cannot drift apart
//! between call sites.
//!
//! The counter rules, computed from a before/after comparison of
//! (worker, status):
//!
//! - **A** — worker changed to a different, non-empty worker: +1 new,
//!   -1 old (if any). Setting a worker forces status `Assigned`.
//! - **B** — worker explicitly cleared: -1 old (if any); an `Assigned`
//!   report reverts to `Pending`.
//! - **C** — same worker, `Assigned` → `Completed`/`Declined`: -1.
//! - **D** — same worker, `Completed`/`Declined` → `Assigned`: +1.
//!
//! A is mutually exclusive with C/D: a transfer already accounts for the
//! load, so per update there is at most one increment and one decrement.
//!
//! Persistence order matches auto-assignment: the report write commits
//! first (version-checked), then the counter deltas are applied as
//! atomic increments. Counter failures after the report committed are
//! logged and absorbed — the caller never sees a partial-success signal.

use crate::db::models::{
    AdminReportUpdate, Report, ReportId, ReportStatus, UserId, UserRole, WorkerReportUpdate,
};
use crate::db::repository::{ReportRepository, UserRepository};
use crate::utils::{AppError, AppResult, now_millis};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

/// One atomic counter adjustment
#[derive(Debug, Clone, PartialEq)]
pub struct CounterDelta {
    pub worker: UserId,
    pub delta: i64,
}

/// Compute the counter adjustments for a report transition.
///
/// Pure over the before/after snapshots; at most one decrement and one
/// increment per call.
pub fn counter_deltas(
    old_worker: Option<&UserId>,
    old_status: ReportStatus,
    new_worker: Option<&UserId>,
    new_status: ReportStatus,
) -> Vec<CounterDelta> {
    let mut deltas = Vec::new();
    match (old_worker, new_worker) {
        // Rule A: load transferred to a different worker
        (old, Some(new)) if old != Some(new) => {
            deltas.push(CounterDelta {
                worker: new.clone(),
                delta: 1,
            });
            if let Some(old) = old {
                deltas.push(CounterDelta {
                    worker: old.clone(),
                    delta: -1,
                });
            }
        }
        // Rule B: worker explicitly cleared
        (Some(old), None) => {
            deltas.push(CounterDelta {
                worker: old.clone(),
                delta: -1,
            });
        }
        // Rules C/D: same worker, task crossing the active-pool boundary
        (Some(_), Some(worker)) => {
            if old_status == ReportStatus::Assigned && new_status.is_terminal() {
                deltas.push(CounterDelta {
                    worker: worker.clone(),
                    delta: -1,
                });
            } else if old_status.is_terminal() && new_status == ReportStatus::Assigned {
                deltas.push(CounterDelta {
                    worker: worker.clone(),
                    delta: 1,
                });
            }
        }
        (None, None) => {}
        // Unreachable: (None, Some(_)) always satisfies the rule-A guard
        // above, but guards don't count toward exhaustiveness.
        (None, Some(_)) => unreachable!("covered by the rule-A arm's guard"),
    }
    deltas
}

#[derive(Clone)]
pub struct TransitionService {
    users: UserRepository,
    reports: ReportRepository,
}

impl TransitionService {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            users: UserRepository::new(db.clone()),
            reports: ReportRepository::new(db),
        }
    }

    /// Admin manual override: field edits, status change, reassignment or
    /// unassignment, in one update.
    pub async fn admin_update(&self, id: &str, update: AdminReportUpdate) -> AppResult<Report> {
        let report = self
            .reports
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Report {} not found", id)))?;
        let report_id = report
            .id
            .clone()
            .ok_or_else(|| AppError::internal("stored report without id"))?;

        let old_worker = report.assigned_worker.clone();
        let old_status = report.status;

        let mut next = report.clone();

        // Field edits are applied first, then status/worker changes
        if let Some(description) = update.description {
            next.description = description;
        }
        if let Some(severity) = update.severity {
            next.severity = severity;
        }
        if let Some(city) = update.city {
            next.city = city;
        }
        if let Some(address) = update.address {
            next.address = Some(address);
        }
        if let Some(status) = update.status {
            next.status = status;
        }

        match update.worker_id.as_deref() {
            // Explicit reassignment wins over any requested status
            Some(worker_id) if !worker_id.trim().is_empty() => {
                let worker = self
                    .users
                    .find_by_id(worker_id)
                    .await?
                    .ok_or_else(|| AppError::not_found(format!("Worker {} not found", worker_id)))?;
                if worker.role != UserRole::Worker {
                    return Err(AppError::validation(format!(
                        "User {} is not a worker",
                        worker_id
                    )));
                }
                next.assigned_worker = worker.id;
                next.status = ReportStatus::Assigned;
            }
            // Empty sentinel: unassign
            Some(_) => {
                next.assigned_worker = None;
                if next.status == ReportStatus::Assigned {
                    next.status = ReportStatus::Pending;
                }
            }
            // Field not mentioned: assignment untouched
            None => {}
        }

        // `Assigned` always means a worker is bound
        if next.status == ReportStatus::Assigned && next.assigned_worker.is_none() {
            return Err(AppError::validation(
                "Cannot set status Assigned without an assigned worker".to_string(),
            ));
        }

        next.updated_at = now_millis();
        let saved = self
            .reports
            .update_checked(&report_id, report.version, &next)
            .await?
            .ok_or_else(|| AppError::conflict("Report was modified concurrently".to_string()))?;

        self.apply_deltas(
            &report_id,
            counter_deltas(
                old_worker.as_ref(),
                old_status,
                saved.assigned_worker.as_ref(),
                saved.status,
            ),
        )
        .await;

        Ok(saved)
    }

    /// Worker self-service: close out an own report as `Completed` or
    /// `Declined`.
    pub async fn worker_update(
        &self,
        worker_id: &str,
        report_id: &str,
        update: WorkerReportUpdate,
    ) -> AppResult<Report> {
        if !update.status.is_terminal() {
            return Err(AppError::validation("Invalid status value".to_string()));
        }
        let has_after_photo = update
            .image_url_after
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty());
        if update.status == ReportStatus::Completed && !has_after_photo {
            return Err(AppError::validation(
                "A completion photo is required to mark a report Completed".to_string(),
            ));
        }

        let report = self
            .reports
            .find_by_id(report_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Report {} not found", report_id)))?;
        let report_record = report
            .id
            .clone()
            .ok_or_else(|| AppError::internal("stored report without id"))?;

        let assigned_to_caller = report
            .assigned_worker
            .as_ref()
            .is_some_and(|w| w.to_string() == worker_id);
        if !assigned_to_caller {
            return Err(AppError::forbidden(
                "This report is not assigned to you".to_string(),
            ));
        }

        let old_worker = report.assigned_worker.clone();
        let old_status = report.status;

        let mut next = report.clone();
        next.status = update.status;
        if let Some(notes) = update.worker_notes {
            next.worker_notes = Some(notes);
        }
        if has_after_photo {
            next.image_url_after = update.image_url_after;
        }
        next.updated_at = now_millis();

        let saved = self
            .reports
            .update_checked(&report_record, report.version, &next)
            .await?
            .ok_or_else(|| AppError::conflict("Report was modified concurrently".to_string()))?;

        // Worker path never changes the assignment, so only rule C can fire
        self.apply_deltas(
            &report_record,
            counter_deltas(
                old_worker.as_ref(),
                old_status,
                saved.assigned_worker.as_ref(),
                saved.status,
            ),
        )
        .await;

        Ok(saved)
    }

    /// Second-phase counter adjustments. The report is already committed
    /// at this point, so failures here are logged and absorbed: primary
    /// report state wins over counter accuracy.
    async fn apply_deltas(&self, report_id: &ReportId, deltas: Vec<CounterDelta>) {
        for delta in deltas {
            if let Err(e) = self.users.adjust_pending_count(&delta.worker, delta.delta).await {
                tracing::error!(
                    report = %report_id,
                    worker = %delta.worker,
                    delta = delta.delta,
                    error = %e,
                    "Counter adjustment failed after report update; counter has drifted"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use surrealdb::RecordId;

    fn uid(key: &str) -> UserId {
        RecordId::from_table_key("user", key)
    }

    fn delta_for<'a>(deltas: &'a [CounterDelta], worker: &UserId) -> Option<&'a CounterDelta> {
        deltas.iter().find(|d| &d.worker == worker)
    }

    #[test]
    fn test_rule_a_fresh_assignment() {
        let b = uid("b");
        let deltas = counter_deltas(None, ReportStatus::Pending, Some(&b), ReportStatus::Assigned);
        assert_eq!(deltas.len(), 1);
        assert_eq!(delta_for(&deltas, &b).map(|d| d.delta), Some(1));
    }

    #[test]
    fn test_rule_a_transfer_moves_load() {
        let a = uid("a");
        let b = uid("b");
        let deltas =
            counter_deltas(Some(&a), ReportStatus::Assigned, Some(&b), ReportStatus::Assigned);
        assert_eq!(deltas.len(), 2);
        assert_eq!(delta_for(&deltas, &b).map(|d| d.delta), Some(1));
        assert_eq!(delta_for(&deltas, &a).map(|d| d.delta), Some(-1));
    }

    #[test]
    fn test_rule_a_excludes_rule_c() {
        // Transfer away from a completing report: the transfer accounts
        // for the load, the status change must not double-decrement.
        let a = uid("a");
        let b = uid("b");
        let deltas =
            counter_deltas(Some(&a), ReportStatus::Assigned, Some(&b), ReportStatus::Assigned);
        assert_eq!(delta_for(&deltas, &a).map(|d| d.delta), Some(-1));
        assert_eq!(deltas.iter().filter(|d| d.worker == a).count(), 1);
    }

    #[test]
    fn test_rule_b_unassignment() {
        let a = uid("a");
        let deltas = counter_deltas(Some(&a), ReportStatus::Assigned, None, ReportStatus::Pending);
        assert_eq!(deltas.len(), 1);
        assert_eq!(delta_for(&deltas, &a).map(|d| d.delta), Some(-1));
    }

    #[test]
    fn test_rule_c_completion_and_decline() {
        let a = uid("a");
        for terminal in [ReportStatus::Completed, ReportStatus::Declined] {
            let deltas = counter_deltas(Some(&a), ReportStatus::Assigned, Some(&a), terminal);
            assert_eq!(deltas.len(), 1);
            assert_eq!(delta_for(&deltas, &a).map(|d| d.delta), Some(-1));
        }
    }

    #[test]
    fn test_rule_d_reopening() {
        let a = uid("a");
        for terminal in [ReportStatus::Completed, ReportStatus::Declined] {
            let deltas = counter_deltas(Some(&a), terminal, Some(&a), ReportStatus::Assigned);
            assert_eq!(deltas.len(), 1);
            assert_eq!(delta_for(&deltas, &a).map(|d| d.delta), Some(1));
        }
    }

    #[test]
    fn test_no_op_produces_no_deltas() {
        let a = uid("a");
        assert!(counter_deltas(
            Some(&a),
            ReportStatus::Assigned,
            Some(&a),
            ReportStatus::Assigned
        )
        .is_empty());
        assert!(counter_deltas(None, ReportStatus::Pending, None, ReportStatus::Pending).is_empty());
    }

    #[test]
    fn test_terminal_shuffle_is_neutral() {
        // Completed -> Declined with the same worker never touches the counter
        let a = uid("a");
        assert!(counter_deltas(
            Some(&a),
            ReportStatus::Completed,
            Some(&a),
            ReportStatus::Declined
        )
        .is_empty());
    }
}
