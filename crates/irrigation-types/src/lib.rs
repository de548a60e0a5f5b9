//! Shared type definitions for the irrigation controller.
//!
//! Every crate in the workspace speaks in terms of these types: the hardware
//! layer addresses pins and ADC inputs through the identifier newtypes, the
//! control loop produces [`Reading`]s, and the data layer persists them.
//!
//! # Modules
//!
//! - [`ids`] -- Hardware addressing newtypes ([`RelayPin`], [`SensorChannel`])
//!   and the store-assigned [`RecordId`]
//! - [`channel`] -- Static per-zone wiring ([`ChannelConfig`])
//! - [`reading`] -- Immutable observations ([`Reading`], [`StoredReading`])

pub mod channel;
pub mod ids;
pub mod reading;

// Re-export all public types at crate root for convenience.
pub use channel::ChannelConfig;
pub use ids::{RecordId, RelayPin, SensorChannel};
pub use reading::{Reading, StoredReading};
