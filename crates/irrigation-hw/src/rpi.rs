//! Raspberry Pi backends built on `rppal`.
//!
//! The converter sits on the hardware SPI controller (bus 0, CE0 in the
//! reference wiring) and the relays hang off BCM-numbered GPIO pins.

use std::collections::BTreeMap;

use irrigation_types::RelayPin;
use rppal::gpio::{Gpio, OutputPin};
use rppal::spi::{Bus, Mode, SimpleHalSpiDevice, SlaveSelect, Spi};

use crate::adc::Mcp3008;
use crate::error::HardwareError;
use crate::relay::{Level, RelayOutputs};

/// MCP3008 on a Raspberry Pi SPI controller.
pub type RpiAdc = Mcp3008<SimpleHalSpiDevice<Spi>>;

/// Open the MCP3008 on `/dev/spidev<bus>.<chip_select>`.
///
/// # Errors
///
/// Returns [`HardwareError::Spi`] if the bus or chip select is unsupported
/// or the device cannot be opened.
pub fn open_mcp3008(bus: u8, chip_select: u8, clock_hz: u32) -> Result<RpiAdc, HardwareError> {
    let bus = match bus {
        0 => Bus::Spi0,
        1 => Bus::Spi1,
        2 => Bus::Spi2,
        other => return Err(HardwareError::Spi(format!("unsupported SPI bus {other}"))),
    };
    let slave = match chip_select {
        0 => SlaveSelect::Ss0,
        1 => SlaveSelect::Ss1,
        2 => SlaveSelect::Ss2,
        other => {
            return Err(HardwareError::Spi(format!(
                "unsupported chip select {other}"
            )));
        }
    };

    let spi = Spi::new(bus, slave, clock_hz, Mode::Mode0)
        .map_err(|e| HardwareError::Spi(format!("cannot open SPI device: {e}")))?;
    tracing::debug!(clock_hz, "SPI device opened");

    Ok(Mcp3008::new(SimpleHalSpiDevice::new(spi)))
}

/// Relay outputs on the Raspberry Pi GPIO header.
///
/// Claimed pins are reset to their original mode when released.
pub struct RpiRelays {
    gpio: Gpio,
    claimed: BTreeMap<RelayPin, OutputPin>,
}

impl RpiRelays {
    /// Open the GPIO peripheral.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::GpioUnavailable`] if `/dev/gpiomem` cannot be
    /// opened.
    pub fn new() -> Result<Self, HardwareError> {
        let gpio = Gpio::new().map_err(|e| HardwareError::GpioUnavailable(e.to_string()))?;
        Ok(Self {
            gpio,
            claimed: BTreeMap::new(),
        })
    }
}

impl RelayOutputs for RpiRelays {
    fn configure_output(&mut self, pin: RelayPin) -> Result<(), HardwareError> {
        let mut output = self
            .gpio
            .get(pin.into_inner())
            .map_err(|e| HardwareError::Gpio {
                pin,
                message: e.to_string(),
            })?
            .into_output();
        output.set_reset_on_drop(true);
        self.claimed.insert(pin, output);
        Ok(())
    }

    fn write(&mut self, pin: RelayPin, level: Level) -> Result<(), HardwareError> {
        let output = self
            .claimed
            .get_mut(&pin)
            .ok_or_else(|| HardwareError::Gpio {
                pin,
                message: "pin is not configured as an output".to_owned(),
            })?;
        match level {
            Level::High => output.set_high(),
            Level::Low => output.set_low(),
        }
        Ok(())
    }

    fn release(&mut self, pin: RelayPin) -> Result<(), HardwareError> {
        // Dropping the OutputPin restores the pin's previous mode.
        self.claimed.remove(&pin);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adc::MoistureSensor;

    fn assert_sensor<S: MoistureSensor>() {}
    fn assert_outputs<R: RelayOutputs>() {}

    #[test]
    fn backends_implement_peripheral_traits() {
        assert_sensor::<RpiAdc>();
        assert_outputs::<RpiRelays>();
    }
}
