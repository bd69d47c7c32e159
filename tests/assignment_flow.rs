//! End-to-end assignment and counter behavior over an embedded database.
//! Run: cargo test --test assignment_flow -- --nocapture

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use green_report_server::db::DbService;
use green_report_server::db::models::{
    AdminReportUpdate, Report, ReportCreate, ReportStatus, Severity, User, WorkerCreate,
};
use green_report_server::db::repository::{ReportRepository, UserRepository};
use green_report_server::services::{AssignOutcome, AssignmentService, TransitionService};
use green_report_server::utils::AppError;

async fn test_db() -> (tempfile::TempDir, Surreal<Db>) {
    let tmp = tempfile::tempdir().unwrap();
    let db = DbService::new(tmp.path()).await.unwrap().db;
    (tmp, db)
}

async fn make_worker(db: &Surreal<Db>, name: &str, city: &str) -> User {
    UserRepository::new(db.clone())
        .create_worker(WorkerCreate {
            name: name.to_string(),
            email: format!("{}@example.com", name),
            password: "secret123".to_string(),
            city: city.to_string(),
        })
        .await
        .unwrap()
}

async fn make_report(db: &Surreal<Db>, city: &str) -> Report {
    ReportRepository::new(db.clone())
        .create(
            ReportCreate {
                image_url: "https://images.example.com/before.jpg".to_string(),
                description: "Overflowing bin".to_string(),
                city: city.to_string(),
                address: None,
                severity: Severity::Medium,
                lat: 26.21,
                lng: 78.18,
            },
            None,
        )
        .await
        .unwrap()
}

async fn pending_count(db: &Surreal<Db>, worker: &User) -> i64 {
    UserRepository::new(db.clone())
        .find_by_id(&worker.id.clone().unwrap().to_string())
        .await
        .unwrap()
        .unwrap()
        .pending_task_count
}

async fn fetch_report(db: &Surreal<Db>, report: &Report) -> Report {
    ReportRepository::new(db.clone())
        .find_by_id(&report.id.clone().unwrap().to_string())
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn assigns_least_loaded_worker_in_city() {
    let (_tmp, db) = test_db().await;
    let users = UserRepository::new(db.clone());

    let busy = make_worker(&db, "busy", "Joura").await;
    let idle = make_worker(&db, "idle", "Joura").await;
    let elsewhere = make_worker(&db, "elsewhere", "Gwalior").await;
    users
        .adjust_pending_count(busy.id.as_ref().unwrap(), 2)
        .await
        .unwrap();

    let report = make_report(&db, "Joura").await;
    let outcome = AssignmentService::new(db.clone())
        .assign(report.clone())
        .await
        .unwrap();

    let assigned = match outcome {
        AssignOutcome::Assigned(r) => r,
        other => panic!("expected assignment, got {:?}", other),
    };
    assert_eq!(assigned.status, ReportStatus::Assigned);
    assert_eq!(assigned.assigned_worker, idle.id);

    assert_eq!(pending_count(&db, &idle).await, 1);
    assert_eq!(pending_count(&db, &busy).await, 2);
    assert_eq!(pending_count(&db, &elsewhere).await, 0);
}

#[tokio::test]
async fn city_match_ignores_case_and_whitespace() {
    let (_tmp, db) = test_db().await;
    let worker = make_worker(&db, "ravi", "Gwalior").await;

    let report = make_report(&db, "  gwalior ").await;
    let outcome = AssignmentService::new(db.clone())
        .assign(report)
        .await
        .unwrap();

    match outcome {
        AssignOutcome::Assigned(r) => assert_eq!(r.assigned_worker, worker.id),
        other => panic!("expected assignment, got {:?}", other),
    }
}

#[tokio::test]
async fn no_eligible_worker_leaves_report_pending() {
    let (_tmp, db) = test_db().await;
    make_worker(&db, "faraway", "Indore").await;

    let report = make_report(&db, "Joura").await;
    let outcome = AssignmentService::new(db.clone())
        .assign(report.clone())
        .await
        .unwrap();

    assert!(matches!(outcome, AssignOutcome::NoEligibleWorker));

    let stored = fetch_report(&db, &report).await;
    assert_eq!(stored.status, ReportStatus::Pending);
    assert!(stored.assigned_worker.is_none());
    assert_eq!(stored.version, report.version);
}

#[tokio::test]
async fn stale_assignment_attempt_is_skipped() {
    let (_tmp, db) = test_db().await;
    make_worker(&db, "ravi", "Joura").await;
    let reports = ReportRepository::new(db.clone());

    let report = make_report(&db, "Joura").await;

    // Another writer touches the report before assignment runs
    let mut edited = report.clone();
    edited.description = "edited concurrently".to_string();
    reports
        .update_checked(report.id.as_ref().unwrap(), report.version, &edited)
        .await
        .unwrap()
        .expect("first write should succeed");

    // Assignment still holds the stale snapshot
    let outcome = AssignmentService::new(db.clone())
        .assign(report.clone())
        .await
        .unwrap();
    assert!(matches!(outcome, AssignOutcome::Skipped));

    let stored = fetch_report(&db, &report).await;
    assert_eq!(stored.status, ReportStatus::Pending);
    assert!(stored.assigned_worker.is_none());
}

#[tokio::test]
async fn reassignment_transfers_load_between_workers() {
    let (_tmp, db) = test_db().await;
    let first = make_worker(&db, "first", "Joura").await;
    let second = make_worker(&db, "second", "Joura").await;
    let transition = TransitionService::new(db.clone());

    // Make `first` look idle relative to `second` so it wins
    UserRepository::new(db.clone())
        .adjust_pending_count(second.id.as_ref().unwrap(), 1)
        .await
        .unwrap();

    let report = make_report(&db, "Joura").await;
    AssignmentService::new(db.clone())
        .assign(report.clone())
        .await
        .unwrap();
    assert_eq!(pending_count(&db, &first).await, 1);

    let report_id = report.id.as_ref().unwrap().to_string();
    let updated = transition
        .admin_update(
            &report_id,
            AdminReportUpdate {
                worker_id: Some(second.id.clone().unwrap().to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.status, ReportStatus::Assigned);
    assert_eq!(updated.assigned_worker, second.id);
    assert_eq!(pending_count(&db, &first).await, 0);
    assert_eq!(pending_count(&db, &second).await, 2);
}

#[tokio::test]
async fn unassignment_reverts_to_pending_and_decrements() {
    let (_tmp, db) = test_db().await;
    let worker = make_worker(&db, "ravi", "Joura").await;
    let transition = TransitionService::new(db.clone());

    let report = make_report(&db, "Joura").await;
    AssignmentService::new(db.clone())
        .assign(report.clone())
        .await
        .unwrap();
    assert_eq!(pending_count(&db, &worker).await, 1);

    let report_id = report.id.as_ref().unwrap().to_string();
    let updated = transition
        .admin_update(
            &report_id,
            AdminReportUpdate {
                worker_id: Some(String::new()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.status, ReportStatus::Pending);
    assert!(updated.assigned_worker.is_none());
    assert_eq!(pending_count(&db, &worker).await, 0);
}

#[tokio::test]
async fn worker_completion_decrements_and_keeps_history() {
    let (_tmp, db) = test_db().await;
    let worker = make_worker(&db, "ravi", "Joura").await;
    let transition = TransitionService::new(db.clone());

    let report = make_report(&db, "Joura").await;
    AssignmentService::new(db.clone())
        .assign(report.clone())
        .await
        .unwrap();

    let worker_id = worker.id.clone().unwrap().to_string();
    let report_id = report.id.as_ref().unwrap().to_string();
    let updated = transition
        .worker_update(
            &worker_id,
            &report_id,
            green_report_server::db::models::WorkerReportUpdate {
                status: ReportStatus::Completed,
                worker_notes: Some("Cleared".to_string()),
                image_url_after: Some("https://images.example.com/after.jpg".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.status, ReportStatus::Completed);
    // Assignment is kept as a historical record
    assert_eq!(updated.assigned_worker, worker.id);
    assert_eq!(
        updated.image_url_after.as_deref(),
        Some("https://images.example.com/after.jpg")
    );
    assert_eq!(pending_count(&db, &worker).await, 0);
}

#[tokio::test]
async fn worker_decline_needs_no_photo() {
    let (_tmp, db) = test_db().await;
    let worker = make_worker(&db, "ravi", "Joura").await;
    let transition = TransitionService::new(db.clone());

    let report = make_report(&db, "Joura").await;
    AssignmentService::new(db.clone())
        .assign(report.clone())
        .await
        .unwrap();

    let updated = transition
        .worker_update(
            &worker.id.clone().unwrap().to_string(),
            &report.id.as_ref().unwrap().to_string(),
            green_report_server::db::models::WorkerReportUpdate {
                status: ReportStatus::Declined,
                worker_notes: Some("Not waste, construction material".to_string()),
                image_url_after: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.status, ReportStatus::Declined);
    assert_eq!(pending_count(&db, &worker).await, 0);
}

#[tokio::test]
async fn reopening_a_closed_report_increments() {
    let (_tmp, db) = test_db().await;
    let worker = make_worker(&db, "ravi", "Joura").await;
    let transition = TransitionService::new(db.clone());

    let report = make_report(&db, "Joura").await;
    AssignmentService::new(db.clone())
        .assign(report.clone())
        .await
        .unwrap();

    let report_id = report.id.as_ref().unwrap().to_string();
    transition
        .worker_update(
            &worker.id.clone().unwrap().to_string(),
            &report_id,
            green_report_server::db::models::WorkerReportUpdate {
                status: ReportStatus::Declined,
                worker_notes: None,
                image_url_after: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(pending_count(&db, &worker).await, 0);

    // Admin reopens; worker is still recorded on the report
    let reopened = transition
        .admin_update(
            &report_id,
            AdminReportUpdate {
                status: Some(ReportStatus::Assigned),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(reopened.status, ReportStatus::Assigned);
    assert_eq!(pending_count(&db, &worker).await, 1);
}

#[tokio::test]
async fn worker_cannot_touch_foreign_reports() {
    let (_tmp, db) = test_db().await;
    let owner = make_worker(&db, "owner", "Joura").await;
    let intruder = make_worker(&db, "intruder", "Joura").await;
    let transition = TransitionService::new(db.clone());

    // Force the report onto `owner`
    UserRepository::new(db.clone())
        .adjust_pending_count(intruder.id.as_ref().unwrap(), 5)
        .await
        .unwrap();
    let report = make_report(&db, "Joura").await;
    AssignmentService::new(db.clone())
        .assign(report.clone())
        .await
        .unwrap();
    let stored = fetch_report(&db, &report).await;
    assert_eq!(stored.assigned_worker, owner.id);

    let err = transition
        .worker_update(
            &intruder.id.clone().unwrap().to_string(),
            &report.id.as_ref().unwrap().to_string(),
            green_report_server::db::models::WorkerReportUpdate {
                status: ReportStatus::Declined,
                worker_notes: None,
                image_url_after: None,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Forbidden(_)));
    assert_eq!(pending_count(&db, &owner).await, 1);
}

#[tokio::test]
async fn worker_completion_requires_photo_and_terminal_status() {
    let (_tmp, db) = test_db().await;
    let worker = make_worker(&db, "ravi", "Joura").await;
    let transition = TransitionService::new(db.clone());

    let report = make_report(&db, "Joura").await;
    AssignmentService::new(db.clone())
        .assign(report.clone())
        .await
        .unwrap();

    let worker_id = worker.id.clone().unwrap().to_string();
    let report_id = report.id.as_ref().unwrap().to_string();

    let err = transition
        .worker_update(
            &worker_id,
            &report_id,
            green_report_server::db::models::WorkerReportUpdate {
                status: ReportStatus::Completed,
                worker_notes: None,
                image_url_after: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = transition
        .worker_update(
            &worker_id,
            &report_id,
            green_report_server::db::models::WorkerReportUpdate {
                status: ReportStatus::Pending,
                worker_notes: None,
                image_url_after: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Nothing changed
    assert_eq!(pending_count(&db, &worker).await, 1);
    assert_eq!(fetch_report(&db, &report).await.status, ReportStatus::Assigned);
}

#[tokio::test]
async fn plain_field_edit_does_not_move_counters() {
    let (_tmp, db) = test_db().await;
    let worker = make_worker(&db, "ravi", "Joura").await;
    let transition = TransitionService::new(db.clone());

    let report = make_report(&db, "Joura").await;
    AssignmentService::new(db.clone())
        .assign(report.clone())
        .await
        .unwrap();

    let updated = transition
        .admin_update(
            &report.id.as_ref().unwrap().to_string(),
            AdminReportUpdate {
                description: Some("Updated description".to_string()),
                severity: Some(Severity::High),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.description, "Updated description");
    assert_eq!(updated.severity, Severity::High);
    assert_eq!(updated.status, ReportStatus::Assigned);
    assert_eq!(updated.assigned_worker, worker.id);
    assert_eq!(pending_count(&db, &worker).await, 1);
}

#[tokio::test]
async fn version_check_rejects_stale_writes() {
    let (_tmp, db) = test_db().await;
    let reports = ReportRepository::new(db.clone());

    let report = make_report(&db, "Joura").await;
    let id = report.id.clone().unwrap();

    let mut first = report.clone();
    first.description = "first write".to_string();
    let saved = reports
        .update_checked(&id, report.version, &first)
        .await
        .unwrap()
        .expect("first write should land");
    assert_eq!(saved.version, report.version + 1);

    let mut second = report.clone();
    second.description = "stale write".to_string();
    let rejected = reports
        .update_checked(&id, report.version, &second)
        .await
        .unwrap();
    assert!(rejected.is_none());

    assert_eq!(fetch_report(&db, &report).await.description, "first write");
}

#[tokio::test]
async fn public_listing_hides_declined_reports() {
    let (_tmp, db) = test_db().await;
    let worker = make_worker(&db, "ravi", "Joura").await;
    let reports = ReportRepository::new(db.clone());
    let transition = TransitionService::new(db.clone());

    let visible = make_report(&db, "Joura").await;
    let declined = make_report(&db, "Joura").await;
    AssignmentService::new(db.clone())
        .assign(declined.clone())
        .await
        .unwrap();
    transition
        .worker_update(
            &worker.id.clone().unwrap().to_string(),
            &declined.id.as_ref().unwrap().to_string(),
            green_report_server::db::models::WorkerReportUpdate {
                status: ReportStatus::Declined,
                worker_notes: None,
                image_url_after: None,
            },
        )
        .await
        .unwrap();

    let public = reports.find_public().await.unwrap();
    assert_eq!(public.len(), 1);
    assert_eq!(public[0].id, visible.id);

    let all = reports.find_all().await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn worker_task_list_orders_by_severity_then_recency() {
    let (_tmp, db) = test_db().await;
    let worker = make_worker(&db, "ravi", "Joura").await;
    let reports = ReportRepository::new(db.clone());
    let assignment = AssignmentService::new(db.clone());

    for severity in [Severity::Low, Severity::High, Severity::Medium] {
        let report = reports
            .create(
                ReportCreate {
                    image_url: "https://images.example.com/before.jpg".to_string(),
                    description: format!("{:?} severity pile", severity),
                    city: "Joura".to_string(),
                    address: None,
                    severity,
                    lat: 26.21,
                    lng: 78.18,
                },
                None,
            )
            .await
            .unwrap();
        assignment.assign(report).await.unwrap();
    }

    let tasks = reports
        .find_active_for_worker(worker.id.as_ref().unwrap())
        .await
        .unwrap();

    assert_eq!(tasks.len(), 3);
    assert_eq!(tasks[0].severity, Severity::High);
    assert_eq!(tasks[1].severity, Severity::Medium);
    assert_eq!(tasks[2].severity, Severity::Low);
}

#[tokio::test]
async fn caller_supplied_address_wins_over_geocode_fallback() {
    let (_tmp, db) = test_db().await;
    let reports = ReportRepository::new(db.clone());

    let supplied = reports
        .create(
            ReportCreate {
                image_url: "https://images.example.com/before.jpg".to_string(),
                description: "Overflowing bin".to_string(),
                city: "Joura".to_string(),
                address: Some("MG Road, near the market".to_string()),
                severity: Severity::Low,
                lat: 26.21,
                lng: 78.18,
            },
            Some("Resolved by geocoder".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(supplied.address.as_deref(), Some("MG Road, near the market"));

    // A blank address counts as absent and falls back to the geocoder
    let blank = reports
        .create(
            ReportCreate {
                image_url: "https://images.example.com/before.jpg".to_string(),
                description: "Overflowing bin".to_string(),
                city: "Joura".to_string(),
                address: Some("   ".to_string()),
                severity: Severity::Low,
                lat: 26.21,
                lng: 78.18,
            },
            Some("Resolved by geocoder".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(blank.address.as_deref(), Some("Resolved by geocoder"));
}

#[tokio::test]
async fn admin_cannot_mark_assigned_without_worker() {
    let (_tmp, db) = test_db().await;
    let transition = TransitionService::new(db.clone());

    let report = make_report(&db, "Joura").await;
    let report_id = report.id.as_ref().unwrap().to_string();

    let err = transition
        .admin_update(
            &report_id,
            AdminReportUpdate {
                status: Some(ReportStatus::Assigned),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Rejected before any mutation
    let stored = fetch_report(&db, &report).await;
    assert_eq!(stored.status, ReportStatus::Pending);
    assert!(stored.assigned_worker.is_none());
    assert_eq!(stored.version, report.version);

    // Supplying a worker in the same request is the valid way in
    let worker = make_worker(&db, "ravi", "Joura").await;
    let updated = transition
        .admin_update(
            &report_id,
            AdminReportUpdate {
                status: Some(ReportStatus::Assigned),
                worker_id: Some(worker.id.clone().unwrap().to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, ReportStatus::Assigned);
    assert_eq!(updated.assigned_worker, worker.id);
    assert_eq!(pending_count(&db, &worker).await, 1);
}

#[tokio::test]
async fn duplicate_worker_email_is_rejected() {
    let (_tmp, db) = test_db().await;
    let users = UserRepository::new(db.clone());

    make_worker(&db, "ravi", "Joura").await;
    let err = users
        .create_worker(WorkerCreate {
            name: "Other Ravi".to_string(),
            email: "ravi@example.com".to_string(),
            password: "secret123".to_string(),
            city: "Indore".to_string(),
        })
        .await
        .unwrap_err();

    assert!(err.to_string().contains("already registered"));
}
