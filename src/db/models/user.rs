//! User Model
//!
//! One table for both roles: administrators manage the system, workers
//! receive report assignments. Workers carry the denormalized
//! `pending_task_count` used by the assignment selector.

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use validator::Validate;

/// User ID type
pub type UserId = RecordId;

/// Account role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UserRole {
    Admin,
    Worker,
}

impl UserRole {
    /// Lowercase role name as carried in JWT claims
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Worker => "worker",
        }
    }
}

/// User model matching the `user` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<UserId>,
    pub name: String,
    pub email: String,
    pub hash_pass: String,
    pub role: UserRole,
    #[serde(default)]
    pub city: String,
    #[serde(
        default = "default_true",
        deserialize_with = "serde_helpers::bool_true"
    )]
    pub is_active: bool,
    /// Number of reports currently `Assigned` to this worker.
    ///
    /// Denormalized for query efficiency; every mutation path adjusts it
    /// with an atomic delta. Treated as an eventually-consistent hint,
    /// not a ledger of record.
    #[serde(default)]
    pub pending_task_count: i64,
    /// Account creation time (epoch millis); tie-breaker for assignment
    pub created_at: i64,
}

fn default_true() -> bool {
    true
}

impl User {
    /// Verify password using argon2
    pub fn verify_password(&self, password: &str) -> Result<bool, argon2::password_hash::Error> {
        use argon2::{
            Argon2,
            password_hash::{PasswordHash, PasswordVerifier},
        };

        let parsed_hash = PasswordHash::new(&self.hash_pass)?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash password using argon2
    pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
        use argon2::{
            Argon2,
            password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
        };

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash = argon2.hash_password(password.as_bytes(), &salt)?;
        Ok(password_hash.to_string())
    }
}

/// Create worker payload (admin only)
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct WorkerCreate {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
}

/// User response (without password hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub city: String,
    pub is_active: bool,
    pub pending_task_count: i64,
    pub created_at: i64,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.map(|id| id.to_string()).unwrap_or_default(),
            name: user.name,
            email: user.email,
            role: user.role,
            city: user.city,
            is_active: user.is_active,
            pending_task_count: user.pending_task_count,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_and_verify() {
        let hash = User::hash_password("secret123").expect("Failed to hash password");
        assert_ne!(hash, "secret123");

        let user = User {
            id: None,
            name: "Test".to_string(),
            email: "test@example.com".to_string(),
            hash_pass: hash,
            role: UserRole::Worker,
            city: "Gwalior".to_string(),
            is_active: true,
            pending_task_count: 0,
            created_at: 0,
        };

        assert!(user.verify_password("secret123").expect("verify failed"));
        assert!(!user.verify_password("wrong").expect("verify failed"));
    }

    #[test]
    fn test_role_serializes_as_contract_string() {
        assert_eq!(
            serde_json::to_string(&UserRole::Worker).expect("serialize"),
            "\"Worker\""
        );
        assert_eq!(
            serde_json::to_string(&UserRole::Admin).expect("serialize"),
            "\"Admin\""
        );
    }
}
