//! Error types for the controller binary.
//!
//! [`EngineError`] wraps every failure that ends a run with a non-zero exit
//! status. Per-zone sensor and relay failures are not among them; the cycle
//! contains those and reports them in its summary.

/// Top-level error for the controller binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Settings or channel file could not be loaded.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: irrigation_core::config::ConfigError,
    },

    /// A peripheral could not be opened.
    #[error("hardware error: {source}")]
    Hardware {
        /// The underlying peripheral error.
        #[from]
        source: irrigation_hw::HardwareError,
    },

    /// The event store could not be opened or queried.
    #[error("storage error: {source}")]
    Storage {
        /// The underlying database error.
        #[from]
        source: irrigation_db::DbError,
    },

    /// The control cycle was aborted.
    #[error("cycle error: {source}")]
    Cycle {
        /// The underlying cycle error.
        #[from]
        source: irrigation_core::cycle::CycleError,
    },
}
