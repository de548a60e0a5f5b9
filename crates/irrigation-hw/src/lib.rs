//! Peripheral access for the irrigation controller.
//!
//! Two peripherals are involved in every cycle: an MCP3008 analog-to-digital
//! converter on the SPI bus that samples the moisture sensors, and the GPIO
//! outputs that switch the pump relays. Both are modelled as explicitly
//! constructed handles that the control loop borrows for the duration of a
//! cycle; nothing here holds process-wide state.
//!
//! # Modules
//!
//! - [`adc`] -- [`MoistureSensor`] trait and the [`Mcp3008`] driver
//! - [`relay`] -- [`RelayOutputs`] trait and the scoped [`RelayActuator`]
//! - [`fake`] -- In-memory peripherals for tests and bench runs
//! - [`rpi`] -- Raspberry Pi backends (feature `rpi`)
//! - [`error`] -- [`HardwareError`]

pub mod adc;
pub mod error;
pub mod fake;
pub mod relay;
#[cfg(feature = "rpi")]
pub mod rpi;

pub use adc::{ADC_MAX, MCP3008_CHANNELS, Mcp3008, MoistureSensor};
pub use error::HardwareError;
pub use relay::{DEFAULT_WATERING_DURATION, Level, RelayActuator, RelayOutputs, RelayPolarity};
