//! Database Infrastructure Layer
//!
//! Handles the connection pool and schema initialization. The record
//! operations live in [`sources`] and [`infos`]; each one runs on a
//! connection checked out by the caller for the duration of a request.

pub mod infos;
pub mod sources;

use std::{ops::Deref, str::FromStr};

use sqlx::{
    Sqlite, SqlitePool,
    pool::PoolConnection,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use thiserror::Error;
use tracing::info;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    Connection(#[source] sqlx::Error),
    #[error("Database query error: {0}")]
    Query(#[from] sqlx::Error),
    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Status value that keeps an info out of the per-source counts.
pub const ARCHIVED_STATUS: &str = "archived";

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Deref for Database {
    type Target = SqlitePool;
    fn deref(&self) -> &Self::Target {
        &self.pool
    }
}

impl Database {
    pub async fn new(config: &Config) -> Result<Self> {
        let database_config = SqliteConnectOptions::from_str(&config.database_url)
            .map_err(DatabaseError::Connection)?
            .create_if_missing(true)
            .foreign_keys(true);

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout());

        // An in-memory database lives only as long as its connection.
        if is_in_memory(&config.database_url) {
            pool_options = pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options.connect_lazy_with(database_config);

        let db = Self { pool };
        db.initialize_tables().await?;

        info!(database = config.database_url.as_str(), "Database initialized");
        Ok(db)
    }

    /// Check out a connection for one request. It goes back to the pool on drop.
    pub async fn connection(&self) -> Result<PoolConnection<Sqlite>> {
        self.pool.acquire().await.map_err(DatabaseError::Connection)
    }

    async fn initialize_tables(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS source (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                created TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Infos go away with their source.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS info (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_id INTEGER NOT NULL,
                agent TEXT NOT NULL,
                material TEXT NOT NULL,
                details TEXT NOT NULL,
                priority INTEGER NOT NULL,
                estimate TEXT,
                status TEXT NOT NULL,
                created TEXT NOT NULL,
                updated TEXT,
                FOREIGN KEY (source_id) REFERENCES source(id) ON DELETE CASCADE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_info_source_id ON info(source_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

fn is_in_memory(url: &str) -> bool {
    url.starts_with("sqlite::memory") || url.contains("mode=memory")
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Database;
    use crate::config::Config;

    pub async fn memory_db() -> Database {
        Database::new(&Config::in_memory()).await.unwrap()
    }
}
