//! Static per-zone wiring.

use serde::{Deserialize, Serialize};

use crate::ids::{RelayPin, SensorChannel};

/// One monitored zone: the relay that drives its pump and the ADC input its
/// moisture sensor is wired to.
///
/// Loaded once at startup from the channel file and never mutated. The JSON
/// keys follow the installed wiring file format (`relay`, `MCP3008`).
/// Two zones sharing a pin is a wiring problem, not something this type
/// rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Digital output controlling this zone's pump.
    #[serde(rename = "relay")]
    pub relay_pin: RelayPin,

    /// ADC input wired to this zone's moisture sensor.
    #[serde(rename = "MCP3008")]
    pub sensor_channel: SensorChannel,

    /// Raw-sample cutoff above which this zone counts as dry. Falls back to
    /// the global threshold when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u16>,
}

impl ChannelConfig {
    /// Create a channel using the global dryness threshold.
    pub const fn new(relay_pin: RelayPin, sensor_channel: SensorChannel) -> Self {
        Self {
            relay_pin,
            sensor_channel,
            threshold: None,
        }
    }

    /// Override the dryness threshold for this channel.
    #[must_use]
    pub const fn with_threshold(mut self, threshold: u16) -> Self {
        self.threshold = Some(threshold);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wiring_file_keys() {
        let json = r#"[{"relay": 26, "MCP3008": 0}, {"relay": 19, "MCP3008": 1, "threshold": 700}]"#;
        let channels: Vec<ChannelConfig> = serde_json::from_str(json).unwrap_or_default();

        assert_eq!(channels.len(), 2);
        assert_eq!(
            channels.first(),
            Some(&ChannelConfig::new(RelayPin(26), SensorChannel(0)))
        );
        assert_eq!(
            channels.get(1),
            Some(&ChannelConfig::new(RelayPin(19), SensorChannel(1)).with_threshold(700))
        );
    }

    #[test]
    fn omits_missing_threshold_when_serialized() {
        let channel = ChannelConfig::new(RelayPin(26), SensorChannel(0));
        let json = serde_json::to_string(&channel).unwrap_or_default();
        assert_eq!(json, r#"{"relay":26,"MCP3008":0}"#);
    }
}
