use std::path::PathBuf;
use std::sync::Arc;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::auth::JwtService;
use crate::core::Config;
use crate::db::DbService;
use crate::db::repository::UserRepository;
use crate::services::{AssignmentService, GeocodeService, TransitionService};
use crate::utils::{AppError, AppResult};

/// Server state, holding shared references to every service.
///
/// Cloning is cheap: the database handle and JWT service are
/// reference-counted, the domain services are thin repository wrappers.
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Config,
    /// Embedded database (SurrealDB)
    pub db: Surreal<Db>,
    /// JWT token service
    pub jwt_service: Arc<JwtService>,
    /// Reverse geocoding (Nominatim)
    pub geocode: GeocodeService,
    /// Automatic report routing
    pub assignment: AssignmentService,
    /// Status transitions and counter reconciliation
    pub transition: TransitionService,
}

impl ServerState {
    /// Initialize server state:
    ///
    /// 1. ensure the work dir exists
    /// 2. open the database at `work_dir/greenreport.db`
    /// 3. wire up services
    /// 4. seed the admin account if no admin exists yet
    pub async fn initialize(config: &Config) -> AppResult<Self> {
        let work_dir = PathBuf::from(&config.work_dir);
        std::fs::create_dir_all(&work_dir).map_err(|e| {
            AppError::internal(format!(
                "Failed to create work directory {}: {}",
                work_dir.display(),
                e
            ))
        })?;

        let db_path = work_dir.join("greenreport.db");
        let db_service = DbService::new(&db_path).await?;
        let db = db_service.db;

        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let geocode = GeocodeService::new(config.nominatim_url.clone());
        let assignment = AssignmentService::new(db.clone());
        let transition = TransitionService::new(db.clone());

        let state = Self {
            config: config.clone(),
            db,
            jwt_service,
            geocode,
            assignment,
            transition,
        };

        state.seed_admin().await?;

        Ok(state)
    }

    /// Create the bootstrap admin account unless one already exists.
    async fn seed_admin(&self) -> AppResult<()> {
        let users = UserRepository::new(self.db.clone());
        if users.any_admin().await? {
            return Ok(());
        }

        let admin = users
            .create_admin(
                self.config.admin_name.clone(),
                self.config.admin_email.clone(),
                &self.config.admin_password,
            )
            .await?;
        tracing::info!(email = %admin.email, "Seeded default admin account");
        Ok(())
    }

    pub fn get_db(&self) -> Surreal<Db> {
        self.db.clone()
    }

    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }
}
