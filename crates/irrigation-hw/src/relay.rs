//! Relay actuator.
//!
//! Watering is a scoped acquisition of one relay pin: configure it as an
//! output, energize the relay, hold for the watering duration, de-energize,
//! and release the pin. Release is tied to a drop guard so it runs on every
//! exit path, including when configuration or either transition fails.

use std::time::Duration;

use irrigation_types::RelayPin;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::HardwareError;

/// How long the pump runs per watering when nothing else is configured.
pub const DEFAULT_WATERING_DURATION: Duration = Duration::from_secs(10);

/// Electrical level of a digital output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    /// Pin driven to ground.
    Low,
    /// Pin driven to the supply rail.
    High,
}

/// Which electrical level energizes the relay coil.
///
/// Most hobby relay boards switch on a high input; boards behind an
/// inverting driver, or with an opto-isolated low-trigger input, need
/// [`RelayPolarity::ActiveLow`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayPolarity {
    /// A high output switches the pump on.
    #[default]
    ActiveHigh,
    /// A low output switches the pump on.
    ActiveLow,
}

impl RelayPolarity {
    /// Level that switches the pump on.
    pub const fn active(self) -> Level {
        match self {
            Self::ActiveHigh => Level::High,
            Self::ActiveLow => Level::Low,
        }
    }

    /// Level that switches the pump off.
    pub const fn inactive(self) -> Level {
        match self {
            Self::ActiveHigh => Level::Low,
            Self::ActiveLow => Level::High,
        }
    }
}

/// Digital outputs that can drive relay pins.
///
/// Implementations must tolerate [`RelayOutputs::release`] on a pin whose
/// configuration failed; the actuator always releases what it tried to
/// acquire.
pub trait RelayOutputs {
    /// Configure `pin` as a digital output.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Gpio`] if the pin cannot be claimed.
    fn configure_output(&mut self, pin: RelayPin) -> Result<(), HardwareError>;

    /// Drive `pin` to `level`.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Gpio`] if the pin is not configured or the
    /// write fails.
    fn write(&mut self, pin: RelayPin, level: Level) -> Result<(), HardwareError>;

    /// Reset `pin` to its unclaimed state.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Gpio`] if the reset fails.
    fn release(&mut self, pin: RelayPin) -> Result<(), HardwareError>;
}

/// Runs the pump behind a relay for a bounded interval.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelayActuator {
    polarity: RelayPolarity,
}

impl RelayActuator {
    /// Create an actuator for relays with the given polarity.
    pub const fn new(polarity: RelayPolarity) -> Self {
        Self { polarity }
    }

    /// Energize the relay on `pin` for `duration`, then switch it off.
    ///
    /// The calling task is suspended for the whole interval and there is no
    /// way to cut it short. Whatever happens, the pin is released before this
    /// returns, and if it was ever driven active a final attempt is made to
    /// drive it inactive first.
    ///
    /// # Errors
    ///
    /// Returns the first [`HardwareError`] raised while configuring or
    /// switching the pin. Errors during cleanup are logged, not returned.
    pub async fn water<R>(
        self,
        outputs: &mut R,
        pin: RelayPin,
        duration: Duration,
    ) -> Result<(), HardwareError>
    where
        R: RelayOutputs + ?Sized,
    {
        let mut claim = PinClaim::acquire(outputs, pin, self.polarity)?;

        claim.switch(true)?;
        info!(pin = %pin, duration_secs = duration.as_secs_f64(), "Pump on");

        tokio::time::sleep(duration).await;

        claim.switch(false)?;
        info!(pin = %pin, "Pump off");
        Ok(())
    }
}

/// A relay pin held for the duration of one watering.
///
/// Dropping the claim releases the pin.
struct PinClaim<'a, R>
where
    R: RelayOutputs + ?Sized,
{
    outputs: &'a mut R,
    pin: RelayPin,
    polarity: RelayPolarity,
    /// Set once an active level may have reached the pin.
    energized: bool,
}

impl<'a, R> PinClaim<'a, R>
where
    R: RelayOutputs + ?Sized,
{
    /// Configure `pin` as an output. The returned claim, or the early-return
    /// path on failure, releases it.
    fn acquire(
        outputs: &'a mut R,
        pin: RelayPin,
        polarity: RelayPolarity,
    ) -> Result<Self, HardwareError> {
        let claim = Self {
            outputs,
            pin,
            polarity,
            energized: false,
        };
        // On failure `claim` drops here and still releases the pin.
        claim.outputs.configure_output(pin)?;
        Ok(claim)
    }

    fn switch(&mut self, on: bool) -> Result<(), HardwareError> {
        if on {
            self.energized = true;
            self.outputs.write(self.pin, self.polarity.active())
        } else {
            self.outputs.write(self.pin, self.polarity.inactive())?;
            self.energized = false;
            Ok(())
        }
    }
}

impl<R> Drop for PinClaim<'_, R>
where
    R: RelayOutputs + ?Sized,
{
    fn drop(&mut self) {
        if self.energized {
            if let Err(e) = self.outputs.write(self.pin, self.polarity.inactive()) {
                warn!(pin = %self.pin, error = %e, "Could not switch pump off before release");
            }
        }
        if let Err(e) = self.outputs.release(self.pin) {
            warn!(pin = %self.pin, error = %e, "Relay pin release failed");
        }
    }
}
