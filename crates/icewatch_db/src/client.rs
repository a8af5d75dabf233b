//! Database client for icewatch
//!
//! Owns the SQLite connection pool and hands out transactions wrapped in
//! [`StoreTx`], the only way the rest of the workspace touches the store.

use crate::error::DbError;
use crate::schema;
use crate::store::StoreTx;
use icewatch_config::{AppConfig, DatabaseConfig};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error, info};

/// Database client for icewatch
#[derive(Debug, Clone)]
pub struct DbClient {
    /// The database connection pool
    pool: SqlitePool,
}

impl DbClient {
    /// Create a new database client from the application configuration
    /// and make sure the schema exists.
    pub async fn new(config: &AppConfig) -> Result<Self, DbError> {
        Self::from_config(&config.database).await
    }

    /// Create a new database client from a database configuration
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    ///
    /// * The database URL is empty or invalid
    /// * The database connection fails
    /// * The schema cannot be created
    pub async fn from_config(db_config: &DatabaseConfig) -> Result<Self, DbError> {
        Self::from_url(&db_config.url).await
    }

    /// Create a new database client from a database URL such as
    /// `sqlite:ice-info.db`.
    pub async fn from_url(db_url: &str) -> Result<Self, DbError> {
        if db_url.is_empty() {
            return Err(DbError::ConfigError("Database URL is empty".to_string()));
        }

        let pool = Self::create_pool(db_url).await?;
        let client = Self { pool };
        client.init_schema().await?;
        Ok(client)
    }

    /// A private in-memory store, used by tests and dry runs.
    ///
    /// The pool is pinned to a single connection because every SQLite
    /// in-memory connection is a separate database.
    pub async fn in_memory() -> Result<Self, DbError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| DbError::PoolError(e.to_string()))?;
        let client = Self { pool };
        client.init_schema().await?;
        Ok(client)
    }

    async fn create_pool(db_url: &str) -> Result<SqlitePool, DbError> {
        debug!("Creating database pool with URL: {}", db_url);

        // Handle both "sqlite:example.db" and "sqlite://example.db" formats
        let db_path = db_url
            .strip_prefix("sqlite://")
            .or_else(|| db_url.strip_prefix("sqlite:"))
            .unwrap_or(db_url);

        if !db_path.contains(":memory:") && !db_path.is_empty() {
            if let Some(dir) = Path::new(db_path).parent() {
                if !dir.as_os_str().is_empty() && !dir.exists() {
                    debug!("Creating directory for SQLite database: {:?}", dir);
                    std::fs::create_dir_all(dir).map_err(|e| {
                        error!("Failed to create directory for SQLite database: {}", e);
                        DbError::PoolError(format!("Failed to create directory: {}", e))
                    })?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(db_url)?.create_if_missing(true);

        // Passes are serial; a single connection keeps SQLite's locking simple.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(|e| {
                error!("Failed to create database pool: {}", e);
                DbError::PoolError(e.to_string())
            })?;

        info!("Database pool created successfully");
        Ok(pool)
    }

    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing store schema");
        for statement in schema::STATEMENTS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Get the database connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Begin the write transaction of a pass. Nothing is visible to other
    /// readers until [`StoreTx::commit`].
    pub async fn begin_write(&self) -> Result<StoreTx, DbError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;
        Ok(StoreTx::new(tx, false))
    }

    /// Begin a read transaction for reporting. Writes through it are refused.
    pub async fn begin_read(&self) -> Result<StoreTx, DbError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;
        Ok(StoreTx::new(tx, true))
    }

    /// Check if the database is healthy
    pub async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

impl std::fmt::Display for DbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DbClient")
    }
}
