//! Database Module
//!
//! Embedded SurrealDB (RocksDB backend) setup and schema definition.

pub mod models;
pub mod repository;

use crate::utils::AppError;
use std::path::Path;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};

const NAMESPACE: &str = "greenreport";
const DATABASE: &str = "main";

/// Database service — owns the embedded SurrealDB handle
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open (or create) the database at `db_path` and apply schema
    pub async fn new(db_path: &Path) -> Result<Self, AppError> {
        let db: Surreal<Db> = Surreal::new::<RocksDb>(db_path)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {}", e)))?;

        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {}", e)))?;

        define_schema(&db).await?;

        tracing::info!(path = %db_path.display(), "Database ready (embedded SurrealDB)");

        Ok(Self { db })
    }
}

/// Table and index definitions. Idempotent; runs on every startup.
async fn define_schema(db: &Surreal<Db>) -> Result<(), AppError> {
    db.query(
        "DEFINE TABLE IF NOT EXISTS user SCHEMALESS; \
         DEFINE INDEX IF NOT EXISTS user_email ON TABLE user COLUMNS email UNIQUE; \
         DEFINE TABLE IF NOT EXISTS report SCHEMALESS;",
    )
    .await
    .map_err(|e| AppError::database(format!("Failed to define schema: {}", e)))?;
    Ok(())
}
