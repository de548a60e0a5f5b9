//! The sense-decide-actuate-record cycle.
//!
//! One call to [`run_cycle`] makes a single sequential pass over the
//! configured zones:
//!
//! 1. **Sense** -- sample the zone's ADC input. A failed read is logged and
//!    the zone is skipped; later zones still run.
//! 2. **Decide** -- classify the sample against the dryness threshold.
//! 3. **Record** -- append the reading to the event store. This happens
//!    before any watering so an observation survives a failed actuation.
//!    A failed append ends the cycle: the zone is not watered and no further
//!    zones are processed.
//! 4. **Actuate** -- if the zone is dry, run its pump for the configured
//!    duration and wait for it to finish. A failed actuation is logged; the
//!    relay pin has already been released by the actuator.
//!
//! Nothing runs concurrently with a watering. The pump shares the board's
//! power rail, and one zone at a time is the whole design.
//!
//! Two overlapping invocations would contend for the same pins and SPI
//! device; callers scheduling runs from cron must serialize them (e.g. with
//! `flock`).

use std::time::Duration;

use chrono::Utc;
use irrigation_db::{DbError, EventStore};
use irrigation_hw::{
    DEFAULT_WATERING_DURATION, HardwareError, MoistureSensor, RelayActuator, RelayOutputs,
    RelayPolarity,
};
use irrigation_types::{ChannelConfig, Reading, RecordId, StoredReading};
use tracing::{error, info, warn};

use crate::classifier::{DRYNESS_THRESHOLD, DrynessClassifier, Moisture};

/// Errors that end a cycle early.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    /// A reading could not be persisted.
    #[error("failed to record reading for relay {} / sensor {}: {source}", .channel.relay_pin, .channel.sensor_channel)]
    Storage {
        /// Zone whose reading was lost.
        channel: ChannelConfig,
        /// The underlying store error.
        source: DbError,
    },
}

/// Tunables for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleSettings {
    /// How long the pump runs for a dry zone.
    pub watering_duration: Duration,
    /// Threshold for zones without their own override.
    pub default_threshold: u16,
    /// Relay input polarity.
    pub polarity: RelayPolarity,
    /// Record readings but never run the pump.
    pub dry_run: bool,
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self {
            watering_duration: DEFAULT_WATERING_DURATION,
            default_threshold: DRYNESS_THRESHOLD,
            polarity: RelayPolarity::default(),
            dry_run: false,
        }
    }
}

/// What happened to the pump for a recorded reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actuation {
    /// The zone was moist.
    NotNeeded,
    /// The pump ran for the full duration and was switched off.
    Completed,
    /// The zone was dry but dry-run mode suppressed watering.
    Skipped,
    /// Watering failed; the pin was still released.
    Failed(HardwareError),
}

/// Result of processing one zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelOutcome {
    /// The sensor could not be read; nothing was recorded.
    SensorFailed {
        /// The zone.
        channel: ChannelConfig,
        /// The read failure.
        error: HardwareError,
    },
    /// A reading was recorded.
    Recorded {
        /// The persisted reading and its id.
        stored: StoredReading,
        /// What happened to the pump.
        actuation: Actuation,
    },
}

/// Summary of a completed cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// One outcome per zone, in configured order.
    pub outcomes: Vec<ChannelOutcome>,
}

impl CycleReport {
    /// Readings recorded during the cycle.
    pub fn recorded(&self) -> impl Iterator<Item = &StoredReading> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            ChannelOutcome::Recorded { stored, .. } => Some(stored),
            ChannelOutcome::SensorFailed { .. } => None,
        })
    }

    /// Number of zones whose pump ran to completion.
    pub fn waterings(&self) -> usize {
        self.count_actuations(|a| matches!(a, Actuation::Completed))
    }

    /// Number of zones whose watering failed.
    pub fn actuation_failures(&self) -> usize {
        self.count_actuations(|a| matches!(a, Actuation::Failed(_)))
    }

    /// Number of zones whose sensor could not be read.
    pub fn sensor_failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ChannelOutcome::SensorFailed { .. }))
            .count()
    }

    fn count_actuations(&self, pred: impl Fn(&Actuation) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ChannelOutcome::Recorded { actuation, .. } if pred(actuation)))
            .count()
    }
}

/// Callback invoked as each reading is recorded.
///
/// Runs after the append and before any watering, so a console observer can
/// announce a watering before the pump starts.
pub trait CycleObserver {
    /// Called once per recorded reading.
    fn on_recorded(&mut self, stored: &StoredReading);
}

/// A no-op observer.
pub struct NoOpObserver;

impl CycleObserver for NoOpObserver {
    fn on_recorded(&mut self, _stored: &StoredReading) {}
}

/// Run one pass over `channels`.
///
/// # Arguments
///
/// * `channels` - Zones in the order they are processed
/// * `sensor` - The moisture ADC, exclusively borrowed for the cycle
/// * `outputs` - The relay GPIO, exclusively borrowed for the cycle
/// * `store` - Event store receiving one reading per successfully read zone
/// * `settings` - Watering duration, threshold, polarity, dry-run flag
/// * `observer` - Notified after each reading is recorded
///
/// # Errors
///
/// Returns [`CycleError::Storage`] if a reading cannot be persisted. Sensor
/// and relay failures never end the cycle; they are reported per zone in the
/// returned [`CycleReport`].
pub async fn run_cycle<S, R>(
    channels: &[ChannelConfig],
    sensor: &mut S,
    outputs: &mut R,
    store: &EventStore<'_>,
    settings: &CycleSettings,
    observer: &mut dyn CycleObserver,
) -> Result<CycleReport, CycleError>
where
    S: MoistureSensor + ?Sized,
    R: RelayOutputs + ?Sized,
{
    let classifier = DrynessClassifier::new(settings.default_threshold);
    let actuator = RelayActuator::new(settings.polarity);
    let mut report = CycleReport {
        outcomes: Vec::with_capacity(channels.len()),
    };

    info!(
        zones = channels.len(),
        dry_run = settings.dry_run,
        "Cycle starting"
    );

    for &channel in channels {
        // --- Sense ---
        let moisture = match sensor.read(channel.sensor_channel) {
            Ok(sample) => sample,
            Err(e) => {
                warn!(
                    relay = %channel.relay_pin,
                    sensor = %channel.sensor_channel,
                    error = %e,
                    "Sensor read failed, skipping zone"
                );
                report.outcomes.push(ChannelOutcome::SensorFailed {
                    channel,
                    error: e,
                });
                continue;
            }
        };

        // --- Decide ---
        let watering = classifier.needs_water(channel, moisture);
        info!(
            relay = %channel.relay_pin,
            sensor = %channel.sensor_channel,
            moisture,
            threshold = classifier.threshold_for(channel),
            state = %Moisture::from_decision(watering),
            "Zone sampled"
        );

        // --- Record ---
        let reading = Reading::for_channel(channel, Utc::now(), moisture, watering);
        let id: RecordId = match store.append(&reading).await {
            Ok(id) => id,
            Err(source) => {
                error!(
                    relay = %channel.relay_pin,
                    sensor = %channel.sensor_channel,
                    error = %source,
                    "Could not record reading, aborting cycle"
                );
                return Err(CycleError::Storage {
                    channel,
                    source,
                });
            }
        };
        let stored = StoredReading { id, reading };
        observer.on_recorded(&stored);

        // --- Actuate ---
        let actuation = match (watering, settings.dry_run) {
            (false, _) => Actuation::NotNeeded,
            (true, true) => {
                info!(relay = %channel.relay_pin, "Dry run, pump not started");
                Actuation::Skipped
            }
            (true, false) => match actuator
                .water(outputs, channel.relay_pin, settings.watering_duration)
                .await
            {
                Ok(()) => Actuation::Completed,
                Err(e) => {
                    error!(relay = %channel.relay_pin, error = %e, "Watering failed");
                    Actuation::Failed(e)
                }
            },
        };

        report
            .outcomes
            .push(ChannelOutcome::Recorded { stored, actuation });
    }

    info!(
        recorded = report.recorded().count(),
        waterings = report.waterings(),
        sensor_failures = report.sensor_failures(),
        actuation_failures = report.actuation_failures(),
        "Cycle complete"
    );

    Ok(report)
}
