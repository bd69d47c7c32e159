//! Worker API Module

mod handler;

use axum::{Router, middleware, routing::get, routing::put};

use crate::auth::require_worker;
use crate::core::ServerState;

/// Worker router - every route requires the worker role
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/worker", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/reports", get(handler::list_tasks))
        .route("/reports/{id}", put(handler::update_report))
        .layer(middleware::from_fn(require_worker))
}
