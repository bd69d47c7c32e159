//! Utility module - shared helpers and types
//!
//! - [`AppError`] - application error type
//! - [`AppResponse`] - API response structure
//! - logging setup

pub mod error;
pub mod logger;
pub mod result;

pub use error::{AppError, AppResponse};
pub use result::AppResult;

/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
