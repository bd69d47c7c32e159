//! User Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{User, UserId, UserRole, WorkerCreate};
use crate::utils::now_millis;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "user";

#[derive(Clone)]
pub struct UserRepository {
    base: BaseRepository,
}

impl UserRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find user by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<User>> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let user: Option<User> = self.base.db().select(thing).await?;
        Ok(user)
    }

    /// Find user by email
    pub async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let email_owned = email.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM user WHERE email = $email LIMIT 1")
            .bind(("email", email_owned))
            .await?;
        let users: Vec<User> = result.take(0)?;
        Ok(users.into_iter().next())
    }

    /// All workers, least-loaded first (admin panel listing)
    pub async fn find_workers(&self) -> RepoResult<Vec<User>> {
        let workers: Vec<User> = self
            .base
            .db()
            .query("SELECT * FROM user WHERE role = $role ORDER BY pending_task_count ASC")
            .bind(("role", UserRole::Worker))
            .await?
            .take(0)?;
        Ok(workers)
    }

    /// Workers eligible for assignment in a city: active, role `Worker`,
    /// city equal under a case-insensitive, whitespace-trimmed comparison.
    ///
    /// Ranking happens in [`crate::services::assignment::select_best`];
    /// this query only filters.
    pub async fn find_eligible_workers(&self, city: &str) -> RepoResult<Vec<User>> {
        let needle = city.trim().to_lowercase();
        let workers: Vec<User> = self
            .base
            .db()
            .query(
                "SELECT * FROM user WHERE role = $role AND is_active = true \
                 AND string::lowercase(string::trim(city)) = $city",
            )
            .bind(("role", UserRole::Worker))
            .bind(("city", needle))
            .await?
            .take(0)?;
        Ok(workers)
    }

    /// Whether any admin account exists (startup seeding check)
    pub async fn any_admin(&self) -> RepoResult<bool> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM user WHERE role = $role LIMIT 1")
            .bind(("role", UserRole::Admin))
            .await?;
        let admins: Vec<User> = result.take(0)?;
        Ok(!admins.is_empty())
    }

    /// Create a new worker account
    pub async fn create_worker(&self, data: WorkerCreate) -> RepoResult<User> {
        self.create_user(data.name, data.email, &data.password, UserRole::Worker, data.city)
            .await
    }

    /// Create an admin account (startup seeding)
    pub async fn create_admin(
        &self,
        name: String,
        email: String,
        password: &str,
    ) -> RepoResult<User> {
        self.create_user(name, email, password, UserRole::Admin, "Global".to_string())
            .await
    }

    async fn create_user(
        &self,
        name: String,
        email: String,
        password: &str,
        role: UserRole,
        city: String,
    ) -> RepoResult<User> {
        // Check duplicate email
        if self.find_by_email(&email).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Email '{}' already registered",
                email
            )));
        }

        let hash_pass = User::hash_password(password)
            .map_err(|e| RepoError::Database(format!("Failed to hash password: {}", e)))?;

        let user = User {
            id: None,
            name,
            email,
            hash_pass,
            role,
            city,
            is_active: true,
            pending_task_count: 0,
            created_at: now_millis(),
        };

        let created: Option<User> = self.base.db().create(TABLE).content(user).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create user".to_string()))
    }

    /// Atomically adjust a worker's pending task counter.
    ///
    /// Always expressed as a delta statement, never read-modify-write:
    /// concurrent requests touching the same counter must not compound
    /// the lost-update problem.
    pub async fn adjust_pending_count(&self, worker: &UserId, delta: i64) -> RepoResult<()> {
        self.base
            .db()
            .query("UPDATE $worker SET pending_task_count += $delta")
            .bind(("worker", worker.clone()))
            .bind(("delta", delta))
            .await?;
        Ok(())
    }
}
