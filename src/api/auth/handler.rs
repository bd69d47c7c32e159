//! Authentication Handlers

use std::time::Duration;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::db::models::UserResponse;
use crate::db::repository::UserRepository;
use crate::utils::{AppError, AppResult};

/// Fixed delay for authentication to prevent timing attacks
const AUTH_FIXED_DELAY_MS: u64 = 500;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Login handler
///
/// Authenticates credentials and returns a JWT session token.
/// A single error message covers both unknown email and wrong password
/// so the endpoint cannot be used for account enumeration.
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let users = UserRepository::new(state.get_db());
    let user = users.find_by_email(&req.email).await?;

    // Fixed delay before acting on the lookup result
    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    let user = match user {
        Some(u) => {
            if !u.is_active {
                return Err(AppError::forbidden("Account has been disabled".to_string()));
            }

            let password_valid = u
                .verify_password(&req.password)
                .map_err(|e| AppError::internal(format!("Password verification failed: {}", e)))?;

            if !password_valid {
                tracing::warn!(email = %req.email, "Login failed - invalid credentials");
                return Err(AppError::invalid_credentials());
            }

            u
        }
        None => {
            tracing::warn!(email = %req.email, "Login failed - user not found");
            return Err(AppError::invalid_credentials());
        }
    };

    let jwt_service = state.get_jwt_service();
    let user_id = user.id.as_ref().map(|t| t.to_string()).unwrap_or_default();

    let token = jwt_service
        .generate_token(&user_id, &user.name, user.role.as_str(), &user.city)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {}", e)))?;

    tracing::info!(user_id = %user_id, role = %user.role.as_str(), "User logged in");

    Ok(Json(LoginResponse {
        token,
        user: user.into(),
    }))
}
