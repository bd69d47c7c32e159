//! Auth middleware
//!
//! Axum middleware for JWT authentication and role checks.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::{CurrentUser, JwtService};
use crate::core::ServerState;
use crate::utils::AppError;

/// Authentication middleware.
///
/// Extracts and validates the JWT from `Authorization: Bearer <token>`
/// and injects a [`CurrentUser`] into request extensions.
///
/// Skipped for:
/// - `OPTIONS *` (CORS preflight)
/// - non-`/api/` paths (health check; let them 404 normally)
/// - `/api/auth/login`
/// - `/api/reports...` (citizen submission and the public map need no account)
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path();

    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    if !path.starts_with("/api/") {
        return Ok(next.run(req).await);
    }

    let is_public_api_route = path == "/api/auth/login" || path.starts_with("/api/reports");
    if is_public_api_route {
        return Ok(next.run(req).await);
    }

    let jwt_service = state.get_jwt_service();
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
        None => {
            tracing::warn!(uri = %req.uri(), "Request without authorization header");
            return Err(AppError::unauthorized());
        }
    };

    match jwt_service.validate_token(token) {
        Ok(claims) => {
            let user = CurrentUser::from(claims);
            req.extensions_mut().insert(user);
            Ok(next.run(req).await)
        }
        Err(e) => {
            tracing::warn!(uri = %req.uri(), error = %e, "Token validation failed");
            match e {
                crate::auth::JwtError::ExpiredToken => Err(AppError::token_expired()),
                _ => Err(AppError::invalid_token("Invalid token")),
            }
        }
    }
}

/// Admin-only middleware; 403 for everyone else.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or(AppError::unauthorized())?;
    if !user.is_admin() {
        tracing::warn!(user = %user.id, role = %user.role, "Admin route denied");
        return Err(AppError::forbidden("Admin access required".to_string()));
    }

    Ok(next.run(req).await)
}

/// Worker-only middleware; 403 for everyone else.
pub async fn require_worker(req: Request, next: Next) -> Result<Response, AppError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or(AppError::unauthorized())?;
    if !user.is_worker() {
        tracing::warn!(user = %user.id, role = %user.role, "Worker route denied");
        return Err(AppError::forbidden("Worker access required".to_string()));
    }

    Ok(next.run(req).await)
}
