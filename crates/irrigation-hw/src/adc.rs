//! Analog sensor reader.
//!
//! The MCP3008 is an 8-input, 10-bit successive-approximation converter.
//! A single-ended conversion is one three-byte full-duplex SPI transfer:
//!
//! ```text
//! MOSI: 0000_0001  1ccc_0000  xxxx_xxxx     (start bit, single-ended + channel)
//! MISO: xxxx_xxxx  xxxx_x0bb  bbbb_bbbb     (null bit, then 10 result bits)
//! ```

use embedded_hal::spi::{Error as _, SpiDevice};
use irrigation_types::SensorChannel;

use crate::error::HardwareError;

/// Number of single-ended inputs on the MCP3008.
pub const MCP3008_CHANNELS: u8 = 8;

/// Largest sample a 10-bit conversion can produce.
pub const ADC_MAX: u16 = 1023;

/// Start bit of a conversion request.
const START_BIT: u8 = 0x01;

/// Single-ended mode flag, placed above the 3-bit channel selector.
const SINGLE_ENDED: u8 = 0x08;

/// Source of raw moisture samples, one per converter input.
pub trait MoistureSensor {
    /// Sample the given input.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::InvalidChannel`] for an input the device does
    /// not have, or [`HardwareError::Spi`] if the bus transaction fails.
    fn read(&mut self, channel: SensorChannel) -> Result<u16, HardwareError>;
}

/// MCP3008 driver over any `embedded-hal` SPI device.
pub struct Mcp3008<SPI> {
    spi: SPI,
}

impl<SPI> Mcp3008<SPI>
where
    SPI: SpiDevice<u8>,
{
    /// Wrap an SPI device whose chip select is wired to the converter.
    pub const fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Give back the underlying SPI device.
    pub fn release(self) -> SPI {
        self.spi
    }

    /// Perform one single-ended conversion on `channel`.
    ///
    /// # Errors
    ///
    /// See [`MoistureSensor::read`].
    pub fn read_channel(&mut self, channel: SensorChannel) -> Result<u16, HardwareError> {
        if channel.into_inner() >= MCP3008_CHANNELS {
            return Err(HardwareError::InvalidChannel {
                channel,
                available: MCP3008_CHANNELS,
            });
        }

        let mut frame = command_frame(channel.into_inner());
        self.spi
            .transfer_in_place(&mut frame)
            .map_err(|e| HardwareError::Spi(format!("{:?}", e.kind())))?;

        let sample = decode_frame(frame);
        tracing::trace!(channel = %channel, sample, "ADC conversion");
        Ok(sample)
    }
}

impl<SPI> MoistureSensor for Mcp3008<SPI>
where
    SPI: SpiDevice<u8>,
{
    fn read(&mut self, channel: SensorChannel) -> Result<u16, HardwareError> {
        self.read_channel(channel)
    }
}

/// Build the request frame for a single-ended conversion.
const fn command_frame(channel: u8) -> [u8; 3] {
    [START_BIT, (SINGLE_ENDED | (channel & 0x07)) << 4, 0x00]
}

/// Extract the 10-bit result from a response frame.
fn decode_frame(frame: [u8; 3]) -> u16 {
    let [_, high, low] = frame;
    (u16::from(high & 0x03) << 8) | u16::from(low)
}
