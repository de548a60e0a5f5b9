//! In-memory peripherals.
//!
//! [`FakeAdc`] and [`FakeRelays`] stand in for the MCP3008 and the GPIO
//! header so the control loop can be exercised without a Raspberry Pi.
//! Both record every call they receive and can be told to fail.

use std::collections::BTreeMap;
use std::time::Duration;

use irrigation_types::{RelayPin, SensorChannel};
use tokio::time::Instant;

use crate::adc::MoistureSensor;
use crate::error::HardwareError;
use crate::relay::{Level, RelayOutputs};

/// Converter returning scripted samples per input.
#[derive(Debug, Default)]
pub struct FakeAdc {
    samples: BTreeMap<SensorChannel, Result<u16, HardwareError>>,
    reads: Vec<SensorChannel>,
}

impl FakeAdc {
    /// Create a converter with no inputs wired.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `channel` return `sample`.
    #[must_use]
    pub fn with_sample(mut self, channel: SensorChannel, sample: u16) -> Self {
        self.samples.insert(channel, Ok(sample));
        self
    }

    /// Make reads of `channel` fail with a bus error.
    #[must_use]
    pub fn with_failure(mut self, channel: SensorChannel) -> Self {
        self.samples.insert(
            channel,
            Err(HardwareError::Spi(format!("injected failure on channel {channel}"))),
        );
        self
    }

    /// Inputs read so far, in order.
    pub fn reads(&self) -> &[SensorChannel] {
        &self.reads
    }
}

impl MoistureSensor for FakeAdc {
    fn read(&mut self, channel: SensorChannel) -> Result<u16, HardwareError> {
        self.reads.push(channel);
        self.samples
            .get(&channel)
            .cloned()
            .unwrap_or_else(|| Err(HardwareError::Spi(format!("nothing wired to channel {channel}"))))
    }
}

/// One call received by [`FakeRelays`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayCall {
    /// [`RelayOutputs::configure_output`].
    Configure(RelayPin),
    /// [`RelayOutputs::write`].
    Write(RelayPin, Level),
    /// [`RelayOutputs::release`].
    Release(RelayPin),
}

/// GPIO header that records calls and tracks pin levels.
#[derive(Debug, Default)]
pub struct FakeRelays {
    calls: Vec<RelayCall>,
    writes: Vec<(RelayPin, Level, Instant)>,
    levels: BTreeMap<RelayPin, Level>,
    fail_configure: bool,
    fail_writes: Vec<Level>,
}

impl FakeRelays {
    /// Create a header with every pin working.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `configure_output` fail.
    #[must_use]
    pub const fn failing_configure(mut self) -> Self {
        self.fail_configure = true;
        self
    }

    /// Make every write of `level` fail.
    #[must_use]
    pub fn failing_writes(mut self, level: Level) -> Self {
        self.fail_writes.push(level);
        self
    }

    /// All calls received so far, in order.
    pub fn calls(&self) -> &[RelayCall] {
        &self.calls
    }

    /// Number of `configure_output` calls.
    pub fn configure_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, RelayCall::Configure(_)))
            .count()
    }

    /// Number of `release` calls.
    pub fn release_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, RelayCall::Release(_)))
            .count()
    }

    /// Last level successfully written to `pin`.
    pub fn level(&self, pin: RelayPin) -> Option<Level> {
        self.levels.get(&pin).copied()
    }

    /// Time between consecutive successful writes on each pin, in order.
    ///
    /// One watering shows up as a single entry spanning the hold.
    pub fn pulses(&self) -> Vec<(RelayPin, Duration)> {
        let mut open: BTreeMap<RelayPin, Instant> = BTreeMap::new();
        let mut pulses = Vec::new();
        for &(pin, _, at) in &self.writes {
            match open.remove(&pin) {
                Some(start) => pulses.push((pin, at.saturating_duration_since(start))),
                None => {
                    open.insert(pin, at);
                }
            }
        }
        pulses
    }
}

impl RelayOutputs for FakeRelays {
    fn configure_output(&mut self, pin: RelayPin) -> Result<(), HardwareError> {
        self.calls.push(RelayCall::Configure(pin));
        if self.fail_configure {
            return Err(HardwareError::Gpio {
                pin,
                message: "injected configure failure".to_owned(),
            });
        }
        Ok(())
    }

    fn write(&mut self, pin: RelayPin, level: Level) -> Result<(), HardwareError> {
        self.calls.push(RelayCall::Write(pin, level));
        if self.fail_writes.contains(&level) {
            return Err(HardwareError::Gpio {
                pin,
                message: format!("injected {level:?} write failure"),
            });
        }
        self.levels.insert(pin, level);
        self.writes.push((pin, level, Instant::now()));
        Ok(())
    }

    fn release(&mut self, pin: RelayPin) -> Result<(), HardwareError> {
        self.calls.push(RelayCall::Release(pin));
        Ok(())
    }
}
