//! Admin API Module

mod handler;

use axum::{Router, middleware, routing::get, routing::put};

use crate::auth::require_admin;
use crate::core::ServerState;

/// Admin router - every route requires the admin role
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/admin", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route(
            "/workers",
            get(handler::list_workers).post(handler::create_worker),
        )
        .route("/reports", get(handler::list_reports))
        .route("/reports/{id}", put(handler::update_report))
        .layer(middleware::from_fn(require_admin))
}
