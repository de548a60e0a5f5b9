//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`] which wraps the underlying
//! [`sqlx`] error or describes a row that no longer maps onto a reading.

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `SQLite` operation failed.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] sqlx::Error),

    /// A stored row holds values outside the reading's domain.
    #[error("Invalid row {id}: {message}")]
    InvalidRow {
        /// Row id of the offending record.
        id: i64,
        /// What was wrong with it.
        message: String,
    },

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
