//! Configuration loading and typed config structures for the controller.
//!
//! Two files configure a run:
//!
//! - `irrigation.yaml` -- optional settings (database location, watering
//!   duration, threshold, relay polarity, SPI wiring, log level). Every field
//!   has a default, and a missing file means all defaults.
//! - `channels.json` -- required list of zones, each pairing a relay pin with
//!   an MCP3008 input: `[{"relay": 26, "MCP3008": 0}]`.
//!
//! Both are read once at startup, before any hardware is touched; any error
//! here aborts the run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use irrigation_hw::{ADC_MAX, MCP3008_CHANNELS, RelayPolarity};
use irrigation_types::{ChannelConfig, SensorChannel};
use serde::Deserialize;

use crate::classifier::DRYNESS_THRESHOLD;
use crate::cycle::CycleSettings;

/// Environment variable overriding `database.path`.
pub const ENV_DB_PATH: &str = "IRRIGATION_DB_PATH";

/// Environment variable overriding `channels_file`.
pub const ENV_CHANNELS_FILE: &str = "IRRIGATION_CHANNELS";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read a configuration file from disk.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the settings YAML.
    #[error("failed to parse settings YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        #[from]
        source: serde_yml::Error,
    },

    /// Failed to parse the channel JSON.
    #[error("failed to parse channel JSON: {source}")]
    Json {
        /// The underlying JSON parse error.
        #[from]
        source: serde_json::Error,
    },

    /// The channel file lists no zones.
    #[error("channel file lists no zones")]
    EmptyChannels,

    /// A zone names an ADC input the converter does not have.
    #[error("zone {index} uses ADC input {channel}, but the MCP3008 has inputs 0-{max}")]
    InvalidChannel {
        /// Position of the zone in the channel file.
        index: usize,
        /// The offending input.
        channel: SensorChannel,
        /// Highest valid input.
        max: u8,
    },

    /// A dryness threshold lies outside the converter's range.
    #[error("dryness threshold {threshold} exceeds the converter maximum {max}")]
    InvalidThreshold {
        /// The offending threshold.
        threshold: u16,
        /// Largest possible sample.
        max: u16,
    },
}

/// Top-level controller settings.
///
/// Mirrors the structure of `irrigation.yaml`. All fields have defaults
/// matching the reference installation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ControllerConfig {
    /// Event store location.
    #[serde(default)]
    pub database: DatabaseSection,

    /// Path of the zone list.
    #[serde(default = "default_channels_file")]
    pub channels_file: PathBuf,

    /// Watering behavior.
    #[serde(default)]
    pub watering: WateringConfig,

    /// History printed at the end of a run.
    #[serde(default)]
    pub history: HistoryConfig,

    /// Converter wiring.
    #[serde(default)]
    pub adc: AdcConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            database: DatabaseSection::default(),
            channels_file: default_channels_file(),
            watering: WateringConfig::default(),
            history: HistoryConfig::default(),
            adc: AdcConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ControllerConfig {
    /// Load settings from a YAML file, then apply environment overrides.
    ///
    /// Environment variables override file values:
    /// - `IRRIGATION_DB_PATH` overrides `database.path`
    /// - `IRRIGATION_CHANNELS` overrides `channels_file`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if it is not valid YAML, or
    /// [`ConfigError::InvalidThreshold`] if the threshold is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&contents)?;
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load settings from `path` if it exists, otherwise use defaults.
    /// Environment overrides apply either way.
    ///
    /// # Errors
    ///
    /// See [`ControllerConfig::from_file`].
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::info!(path = %path.display(), "Settings file not found, using defaults");
            let mut config = Self::default();
            config.apply_overrides(|name| std::env::var(name).ok());
            Ok(config)
        }
    }

    /// Parse settings from a YAML string. No environment overrides apply.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::InvalidThreshold`] if the threshold is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup(ENV_DB_PATH) {
            self.database.path = PathBuf::from(val);
        }
        if let Some(val) = lookup(ENV_CHANNELS_FILE) {
            self.channels_file = PathBuf::from(val);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        check_threshold(self.watering.threshold)
    }

    /// Control-loop settings derived from the `watering` section.
    pub const fn cycle_settings(&self) -> CycleSettings {
        CycleSettings {
            watering_duration: Duration::from_secs(self.watering.duration_secs),
            default_threshold: self.watering.threshold,
            polarity: self.watering.polarity,
            dry_run: self.watering.dry_run,
        }
    }
}

/// Event store settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseSection {
    /// `SQLite` file, created if missing.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

/// Watering settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WateringConfig {
    /// Seconds the pump runs per watering.
    #[serde(default = "default_duration_secs")]
    pub duration_secs: u64,

    /// Raw sample above which a zone is dry.
    #[serde(default = "default_threshold")]
    pub threshold: u16,

    /// Relay input polarity.
    #[serde(default)]
    pub polarity: RelayPolarity,

    /// Record readings but never run the pump.
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for WateringConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_duration_secs(),
            threshold: default_threshold(),
            polarity: RelayPolarity::default(),
            dry_run: false,
        }
    }
}

/// History view settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HistoryConfig {
    /// Number of recent readings printed after a run.
    #[serde(default = "default_history_rows")]
    pub rows: u32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            rows: default_history_rows(),
        }
    }
}

/// MCP3008 wiring.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AdcConfig {
    /// SPI controller number (`/dev/spidev<bus>.*`).
    #[serde(default)]
    pub spi_bus: u8,

    /// Chip-select line (`/dev/spidev*.<cs>`).
    #[serde(default)]
    pub chip_select: u8,

    /// SPI clock in hertz.
    #[serde(default = "default_clock_hz")]
    pub clock_hz: u32,
}

impl Default for AdcConfig {
    fn default() -> Self {
        Self {
            spi_bus: 0,
            chip_select: 0,
            clock_hz: default_clock_hz(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) used when `RUST_LOG` is
    /// not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Load and validate the zone list from a JSON file.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read, or any error
/// from [`parse_channels`].
pub fn load_channels(path: &Path) -> Result<Vec<ChannelConfig>, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let channels = parse_channels(&contents)?;
    tracing::info!(path = %path.display(), zones = channels.len(), "Channel file loaded");
    Ok(channels)
}

/// Parse and validate a zone list.
///
/// # Errors
///
/// Returns [`ConfigError::Json`] for malformed JSON,
/// [`ConfigError::EmptyChannels`] for an empty list,
/// [`ConfigError::InvalidChannel`] for an input beyond the converter, or
/// [`ConfigError::InvalidThreshold`] for an out-of-range override.
pub fn parse_channels(json: &str) -> Result<Vec<ChannelConfig>, ConfigError> {
    let channels: Vec<ChannelConfig> = serde_json::from_str(json)?;
    if channels.is_empty() {
        return Err(ConfigError::EmptyChannels);
    }

    for (index, channel) in channels.iter().enumerate() {
        if channel.sensor_channel.into_inner() >= MCP3008_CHANNELS {
            return Err(ConfigError::InvalidChannel {
                index,
                channel: channel.sensor_channel,
                max: MCP3008_CHANNELS.saturating_sub(1),
            });
        }
        if let Some(threshold) = channel.threshold {
            check_threshold(threshold)?;
        }
    }
    Ok(channels)
}

fn check_threshold(threshold: u16) -> Result<(), ConfigError> {
    if threshold > ADC_MAX {
        return Err(ConfigError::InvalidThreshold {
            threshold,
            max: ADC_MAX,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Default value functions for serde
// ---------------------------------------------------------------------------

fn default_database_path() -> PathBuf {
    PathBuf::from(irrigation_db::DEFAULT_DATABASE_PATH)
}

fn default_channels_file() -> PathBuf {
    PathBuf::from("channels.json")
}

const fn default_duration_secs() -> u64 {
    10
}

const fn default_threshold() -> u16 {
    DRYNESS_THRESHOLD
}

const fn default_history_rows() -> u32 {
    10
}

const fn default_clock_hz() -> u32 {
    1_350_000
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use irrigation_types::RelayPin;

    #[test]
    fn default_config_matches_reference_installation() {
        let config = ControllerConfig::default();
        assert_eq!(
            config.database.path,
            PathBuf::from("/home/pi/irrigationSystem.sqlite3")
        );
        assert_eq!(config.channels_file, PathBuf::from("channels.json"));
        assert_eq!(config.watering.duration_secs, 10);
        assert_eq!(config.watering.threshold, 800);
        assert_eq!(config.watering.polarity, RelayPolarity::ActiveHigh);
        assert!(!config.watering.dry_run);
        assert_eq!(config.history.rows, 10);
        assert_eq!(config.adc.clock_hz, 1_350_000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r"
database:
  path: /var/lib/irrigation/store.sqlite3
channels_file: /etc/irrigation/channels.json
watering:
  duration_secs: 15
  threshold: 750
  polarity: active_low
  dry_run: true
history:
  rows: 25
adc:
  spi_bus: 1
  chip_select: 1
  clock_hz: 500000
logging:
  level: debug
";
        let config = ControllerConfig::parse(yaml).expect("valid yaml");
        assert_eq!(
            config.database.path,
            PathBuf::from("/var/lib/irrigation/store.sqlite3")
        );
        assert_eq!(config.watering.duration_secs, 15);
        assert_eq!(config.watering.polarity, RelayPolarity::ActiveLow);
        assert!(config.watering.dry_run);
        assert_eq!(config.history.rows, 25);
        assert_eq!(config.adc.spi_bus, 1);
        assert_eq!(config.logging.level, "debug");

        let settings = config.cycle_settings();
        assert_eq!(settings.watering_duration, Duration::from_secs(15));
        assert_eq!(settings.default_threshold, 750);
        assert!(settings.dry_run);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = ControllerConfig::parse("watering:\n  duration_secs: 5\n").expect("valid yaml");
        assert_eq!(config.watering.duration_secs, 5);
        assert_eq!(config.watering.threshold, DRYNESS_THRESHOLD);
        assert_eq!(config.history.rows, 10);
    }

    #[test]
    fn threshold_beyond_converter_is_rejected() {
        let result = ControllerConfig::parse("watering:\n  threshold: 2000\n");
        assert!(matches!(
            result,
            Err(ConfigError::InvalidThreshold { threshold: 2000, .. })
        ));
    }

    #[test]
    fn overrides_replace_paths() {
        let mut config = ControllerConfig::default();
        config.apply_overrides(|name| match name {
            ENV_DB_PATH => Some("/tmp/test.sqlite3".to_owned()),
            _ => None,
        });
        assert_eq!(config.database.path, PathBuf::from("/tmp/test.sqlite3"));
        assert_eq!(config.channels_file, PathBuf::from("channels.json"));
    }

    #[test]
    fn parses_reference_channel_file() {
        let channels = parse_channels(r#"[{"relay": 26, "MCP3008": 0}]"#).expect("valid json");
        assert_eq!(
            channels,
            vec![ChannelConfig::new(RelayPin(26), SensorChannel(0))]
        );
    }

    #[test]
    fn rejects_bad_channel_files() {
        assert!(matches!(parse_channels("[]"), Err(ConfigError::EmptyChannels)));
        assert!(matches!(
            parse_channels(r#"{"relay": 26}"#),
            Err(ConfigError::Json { .. })
        ));
        assert!(matches!(
            parse_channels(r#"[{"relay": 26, "MCP3008": 0}, {"relay": 19, "MCP3008": 8}]"#),
            Err(ConfigError::InvalidChannel { index: 1, max: 7, .. })
        ));
        assert!(matches!(
            parse_channels(r#"[{"relay": 26, "MCP3008": 0, "threshold": 1024}]"#),
            Err(ConfigError::InvalidThreshold { threshold: 1024, .. })
        ));
    }

    #[test]
    fn shipped_files_parse_to_defaults() {
        let config = ControllerConfig::parse(include_str!("../../../irrigation.yaml"))
            .expect("shipped settings parse");
        assert_eq!(config, ControllerConfig::default());

        let channels =
            parse_channels(include_str!("../../../channels.json")).expect("shipped channels parse");
        assert_eq!(channels.len(), 1);
    }

    #[test]
    fn missing_channel_file_is_io_error() {
        let result = load_channels(Path::new("/nonexistent/irrigation/channels.json"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
