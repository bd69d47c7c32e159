//! Auth API Module

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

/// Auth router - login is a public route
pub fn router() -> Router<ServerState> {
    Router::new().route("/api/auth/login", post(handler::login))
}
