//! Public Report API Module
//!
//! Citizen-facing surface: anyone can submit a report or browse the
//! public map, no account required.

mod handler;

use axum::{Router, routing::get, routing::post};

use crate::core::ServerState;

/// Report router - public routes
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/reports", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create).get(handler::list_public))
        .route("/{id}", get(handler::get_by_id))
}
