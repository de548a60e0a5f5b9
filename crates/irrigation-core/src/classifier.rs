//! Dryness classification.
//!
//! The capacitive sensors read higher the drier the soil, so a zone needs
//! water when its raw sample exceeds the threshold.

use irrigation_types::ChannelConfig;

/// Raw sample (on the 0-1023 scale) above which soil counts as dry.
pub const DRYNESS_THRESHOLD: u16 = 800;

/// Whether `sample` is dry under the default threshold.
pub const fn is_dry(sample: u16) -> bool {
    is_dry_with(sample, DRYNESS_THRESHOLD)
}

/// Whether `sample` is dry under `threshold`.
pub const fn is_dry_with(sample: u16, threshold: u16) -> bool {
    sample > threshold
}

/// Classifies samples per channel, honoring per-channel overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrynessClassifier {
    default_threshold: u16,
}

impl Default for DrynessClassifier {
    fn default() -> Self {
        Self::new(DRYNESS_THRESHOLD)
    }
}

impl DrynessClassifier {
    /// Classifier using `default_threshold` for channels without an override.
    pub const fn new(default_threshold: u16) -> Self {
        Self { default_threshold }
    }

    /// Threshold in effect for `channel`.
    pub const fn threshold_for(self, channel: ChannelConfig) -> u16 {
        match channel.threshold {
            Some(threshold) => threshold,
            None => self.default_threshold,
        }
    }

    /// Whether `sample` taken on `channel` means the zone needs water.
    pub const fn needs_water(self, channel: ChannelConfig, sample: u16) -> bool {
        is_dry_with(sample, self.threshold_for(channel))
    }
}

/// Human-facing label for a watering decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Moisture {
    /// No watering needed.
    Moist,
    /// Zone will be watered.
    Dry,
}

impl Moisture {
    /// Label for a watering decision.
    pub const fn from_decision(watering: bool) -> Self {
        if watering { Self::Dry } else { Self::Moist }
    }
}

impl core::fmt::Display for Moisture {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Moist => write!(f, "Moist"),
            Self::Dry => write!(f, "Dry"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use irrigation_types::{RelayPin, SensorChannel};

    #[test]
    fn boundary_is_exclusive() {
        assert!(!is_dry(800));
        assert!(is_dry(801));
    }

    #[test]
    fn matches_threshold_over_full_range() {
        for sample in 0..=1023_u16 {
            assert_eq!(is_dry(sample), sample > 800, "sample {sample}");
        }
    }

    #[test]
    fn channel_override_wins() {
        let classifier = DrynessClassifier::default();
        let plain = ChannelConfig::new(RelayPin(26), SensorChannel(0));
        let tuned = plain.with_threshold(600);

        assert_eq!(classifier.threshold_for(plain), DRYNESS_THRESHOLD);
        assert_eq!(classifier.threshold_for(tuned), 600);
        assert!(!classifier.needs_water(plain, 700));
        assert!(classifier.needs_water(tuned, 700));
    }

    #[test]
    fn labels_decision() {
        assert_eq!(Moisture::from_decision(true), Moisture::Dry);
        assert_eq!(Moisture::from_decision(false).to_string(), "Moist");
    }
}
