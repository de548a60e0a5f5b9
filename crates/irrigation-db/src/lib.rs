//! Data layer for the irrigation controller (`SQLite`).
//!
//! Every observation the control loop makes is appended to a single table
//! in a local `SQLite` file. The table is created on first use and only ever
//! grows; nothing in this workspace updates or deletes rows.
//!
//! # Architecture
//!
//! ```text
//! Control loop
//!     |
//!     +-- append(reading) --> EventStore --> irrigation_system table
//!     |
//! Presentation
//!     +-- recent(n) ------> EventStore (newest n rows, oldest first)
//! ```
//!
//! # Modules
//!
//! - [`sqlite`] -- Connection pool and configuration
//! - [`event_store`] -- Append and history queries
//! - [`error`] -- Shared error types

pub mod error;
pub mod event_store;
pub mod sqlite;

// Re-export primary types for convenience.
pub use error::DbError;
pub use event_store::{EventStore, ReadingRow, TABLE_NAME};
pub use sqlite::{DEFAULT_DATABASE_PATH, DatabaseConfig, DatabasePool, StoreLocation};
