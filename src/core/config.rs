use crate::auth::JwtConfig;

/// Server configuration
///
/// Every item can be overridden through environment variables:
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | ./data | Working directory (database, logs) |
/// | HTTP_PORT | 5000 | HTTP API port |
/// | ENVIRONMENT | development | Runtime environment |
/// | NOMINATIM_URL | https://nominatim.openstreetmap.org | Reverse geocoding endpoint |
/// | ADMIN_EMAIL | admin@gmail.com | Seeded admin login |
/// | ADMIN_PASSWORD | admin123 | Seeded admin password |
/// | ADMIN_NAME | Super Admin | Seeded admin display name |
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for the database and log files
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// JWT configuration
    pub jwt: JwtConfig,
    /// Runtime environment: development | staging | production
    pub environment: String,
    /// Nominatim base URL for reverse geocoding
    pub nominatim_url: String,
    /// Seed admin account, created on first startup if no admin exists
    pub admin_email: String,
    pub admin_password: String,
    pub admin_name: String,
}

impl Config {
    /// Load configuration from environment variables, with defaults.
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            jwt: JwtConfig::default(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            nominatim_url: std::env::var("NOMINATIM_URL")
                .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".into()),
            admin_email: std::env::var("ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@gmail.com".into()),
            admin_password: std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".into()),
            admin_name: std::env::var("ADMIN_NAME").unwrap_or_else(|_| "Super Admin".into()),
        }
    }

    /// Override work dir and port, keeping everything else from the
    /// environment. Used by tests.
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
