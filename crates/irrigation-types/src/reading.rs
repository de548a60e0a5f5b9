//! Moisture observations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::channel::ChannelConfig;
use crate::ids::{RecordId, RelayPin, SensorChannel};

/// One observation of one channel in one sampling cycle.
///
/// Created by the control loop after classification, appended to the event
/// store, and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    /// Wall-clock time the sample was captured.
    pub timestamp: DateTime<Utc>,
    /// Relay pin of the observed zone.
    pub relay_channel: RelayPin,
    /// ADC input of the observed zone.
    pub sensor_channel: SensorChannel,
    /// Raw ADC sample (0-1023 for the 10-bit converter).
    pub moisture: u16,
    /// Whether the zone was classified dry and scheduled for watering.
    pub watering: bool,
}

impl Reading {
    /// Build a reading for `channel` captured at `timestamp`.
    pub const fn for_channel(
        channel: ChannelConfig,
        timestamp: DateTime<Utc>,
        moisture: u16,
        watering: bool,
    ) -> Self {
        Self {
            timestamp,
            relay_channel: channel.relay_pin,
            sensor_channel: channel.sensor_channel,
            moisture,
            watering,
        }
    }
}

/// A [`Reading`] as returned from the event store, with its record id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredReading {
    /// Store-assigned identifier.
    pub id: RecordId,
    /// The persisted observation.
    pub reading: Reading,
}
