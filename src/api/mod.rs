//! API Routing Module
//!
//! - [`health`] - health check
//! - [`auth`] - login
//! - [`reports`] - public citizen surface (submit, map, detail)
//! - [`admin`] - worker management and report overrides
//! - [`worker`] - worker task list and closure

pub mod admin;
pub mod auth;
pub mod health;
pub mod reports;
pub mod worker;

use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::require_auth;
use crate::core::ServerState;

/// Build the full application router with middleware applied.
///
/// `require_auth` is applied at router level; it internally skips the
/// public routes (login, citizen report surface, health).
pub fn build_app(state: ServerState) -> Router {
    Router::<ServerState>::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(reports::router())
        .merge(admin::router())
        .merge(worker::router())
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(log_request))
}

/// HTTP request logging middleware
async fn log_request(
    request: http::Request<axum::body::Body>,
    next: middleware::Next,
) -> http::Response<axum::body::Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status().as_u16(),
        elapsed_ms = %start.elapsed().as_millis(),
        "HTTP request"
    );

    response
}
