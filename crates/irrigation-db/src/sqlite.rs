//! `SQLite` connection handling.
//!
//! The store is a single local file written by a single process, so the pool
//! is capped at one connection. Writes use `synchronous = FULL` so an
//! acknowledged append survives a power cut, which matters on a board that
//! shares its supply rail with a pump motor.

use std::path::{Path, PathBuf};
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteSynchronous};

use crate::error::DbError;

/// Default location of the store on the controller.
pub const DEFAULT_DATABASE_PATH: &str = "/home/pi/irrigationSystem.sqlite3";

/// Default time to wait for the connection.
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Default time to wait on a lock held by another process (e.g. a manual
/// `sqlite3` session).
const DEFAULT_BUSY_TIMEOUT_SECS: u64 = 5;

/// Where the store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// A database file, created if missing.
    File(PathBuf),
    /// A private in-memory database that lives as long as the pool.
    Memory,
}

/// Configuration for the `SQLite` connection pool.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Backing file or in-memory database.
    pub location: StoreLocation,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// How long a statement waits on a locked database.
    pub busy_timeout: Duration,
}

impl DatabaseConfig {
    /// Configuration for a database file at `path`.
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self::with_location(StoreLocation::File(path.as_ref().to_path_buf()))
    }

    /// Configuration for a throwaway in-memory database.
    pub const fn in_memory() -> Self {
        Self::with_location(StoreLocation::Memory)
    }

    const fn with_location(location: StoreLocation) -> Self {
        Self {
            location,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            busy_timeout: Duration::from_secs(DEFAULT_BUSY_TIMEOUT_SECS),
        }
    }

    fn connect_options(&self) -> Result<SqliteConnectOptions, DbError> {
        let options = match &self.location {
            StoreLocation::File(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true),
            StoreLocation::Memory => "sqlite::memory:"
                .parse::<SqliteConnectOptions>()
                .map_err(|e| DbError::Config(format!("Invalid in-memory options: {e}")))?,
        };
        Ok(options
            .synchronous(SqliteSynchronous::Full)
            .busy_timeout(self.busy_timeout))
    }
}

/// Connection pool handle to the `SQLite` store.
#[derive(Clone)]
pub struct DatabasePool {
    pool: SqlitePool,
}

impl DatabasePool {
    /// Open the database described by `config`, creating the file if absent.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the database cannot be opened.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DbError> {
        let options = config.connect_options()?;

        // One long-lived connection: an in-memory database disappears with
        // its connection, and a file store has a single writer anyway.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .acquire_timeout(config.connect_timeout)
            .connect_with(options)
            .await?;

        match &config.location {
            StoreLocation::File(path) => {
                tracing::info!(path = %path.display(), "Opened SQLite store");
            }
            StoreLocation::Memory => tracing::debug!("Opened in-memory SQLite store"),
        }

        Ok(Self { pool })
    }

    /// Open a database file at `path` with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the database cannot be opened.
    pub async fn connect_file(path: impl AsRef<Path>) -> Result<Self, DbError> {
        Self::connect(&DatabaseConfig::file(path)).await
    }

    /// Return a reference to the underlying [`SqlitePool`].
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the connection gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("SQLite store closed");
    }
}
