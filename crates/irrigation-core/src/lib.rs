//! Decision logic and orchestration for the irrigation controller.
//!
//! This crate owns the sense-decide-actuate-record cycle: for each configured
//! zone it samples the moisture sensor, classifies the sample, appends the
//! observation to the event store, and waters the zone when it is dry.
//!
//! # Modules
//!
//! - [`classifier`] -- Fixed-threshold dryness classification.
//! - [`config`] -- Settings from `irrigation.yaml` and the channel file.
//! - [`cycle`] -- The per-channel control loop, [`run_cycle`].
//! - [`report`] -- Console status lines and the history table.
//!
//! [`run_cycle`]: cycle::run_cycle

pub mod classifier;
pub mod config;
pub mod cycle;
pub mod report;
