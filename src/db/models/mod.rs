//! Database Models

pub mod report;
pub mod serde_helpers;
pub mod user;

pub use report::{
    AdminReportUpdate, GeoPoint, Report, ReportCreate, ReportId, ReportStatus, Severity,
    WorkerReportUpdate,
};
pub use user::{User, UserId, UserResponse, UserRole, WorkerCreate};
