//! Error types for peripheral access.

use irrigation_types::{RelayPin, SensorChannel};

/// Errors raised by the ADC and relay peripherals.
///
/// Inside a cycle these never end the run: a failed read skips one channel and a
/// failed actuation is logged after the pin has been released.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HardwareError {
    /// An SPI transaction with the converter failed.
    #[error("SPI transfer failed: {0}")]
    Spi(String),

    /// A GPIO operation on a relay pin failed.
    #[error("GPIO operation on pin {pin} failed: {message}")]
    Gpio {
        /// The pin being driven.
        pin: RelayPin,
        /// Description of the failure.
        message: String,
    },

    /// The GPIO peripheral itself could not be opened.
    #[error("GPIO controller unavailable: {0}")]
    GpioUnavailable(String),

    /// The requested converter input does not exist.
    #[error("ADC channel {channel} out of range (device has {available} inputs)")]
    InvalidChannel {
        /// The requested input.
        channel: SensorChannel,
        /// Number of inputs on the device.
        available: u8,
    },
}
