//! GreenReport Server - municipal waste-report tracking backend
//!
//! Citizens submit geotagged photo reports of uncollected waste; each
//! report is automatically routed to the least-loaded active worker in
//! the same city. Workers close reports with a completion photo; admins
//! manage worker accounts and override assignments manually.
//!
//! # Module structure
//!
//! ```text
//! src/
//! ├── core/          # Config, state, server lifecycle
//! ├── auth/          # JWT authentication, role middleware
//! ├── services/      # Assignment, transitions, geocoding
//! ├── api/           # HTTP routes and handlers
//! ├── db/            # Embedded SurrealDB, models, repositories
//! └── utils/         # Errors, logging, helpers
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod services;
pub mod utils;

pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use utils::{AppError, AppResponse, AppResult};

pub use utils::logger::{init_logger, init_logger_with_file};

/// Set up the process environment: load `.env` and initialize logging.
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenv::dotenv();
    init_logger();
    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
   ______                     ____                        __
  / ____/_______  ___  ____  / __ \___  ____  ____  _____/ /_
 / / __/ ___/ _ \/ _ \/ __ \/ /_/ / _ \/ __ \/ __ \/ ___/ __/
/ /_/ / /  /  __/  __/ / / / _, _/  __/ /_/ / /_/ / /  / /_
\____/_/   \___/\___/_/ /_/_/ |_|\___/ .___/\____/_/   \__/
                                    /_/
    "#
    );
}
