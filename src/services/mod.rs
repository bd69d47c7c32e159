//! Services Module
//!
//! Domain logic above the repositories: automatic report routing,
//! status transitions with counter reconciliation, and reverse
//! geocoding.

pub mod assignment;
pub mod geocode;
pub mod transition;

pub use assignment::{AssignOutcome, AssignmentService, select_best};
pub use geocode::GeocodeService;
pub use transition::{CounterDelta, TransitionService, counter_deltas};

use crate::db::repository::RepoError;

/// A record loaded from the database should always carry its id; treat a
/// missing one as a storage-level fault.
pub(crate) fn missing_id_error(entity: &str) -> RepoError {
    RepoError::Database(format!("stored {} without id", entity))
}
