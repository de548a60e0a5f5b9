//! Controller binary for the irrigation system.
//!
//! Each invocation makes one pass over the configured zones and exits; the
//! schedule lives in cron. It loads configuration, opens the event store and
//! the peripherals, runs the cycle, and prints the recent history.
//!
//! # Startup Sequence
//!
//! 1. Load settings from `irrigation.yaml` (or the path given as the first
//!    argument); defaults apply if the file is absent
//! 2. Initialize structured logging (tracing, to stderr)
//! 3. Load the zone list from the channel file
//! 4. Open the `SQLite` event store
//! 5. Open the MCP3008 on SPI and the GPIO header
//! 6. Run the cycle
//! 7. Print the most recent readings
//!
//! Configuration errors abort before any peripheral is touched.
//!
//! # Scheduling
//!
//! Two overlapping runs would fight over the relay pins and the SPI device.
//! Serialize cron invocations externally, for example:
//!
//! ```text
//! */30 * * * * flock -n /run/irrigation.lock irrigation-engine /etc/irrigation.yaml
//! ```

mod console;
mod error;

use std::io::IsTerminal as _;
use std::path::PathBuf;

use irrigation_core::config::{self, ControllerConfig};
use irrigation_core::cycle::run_cycle;
use irrigation_core::report;
use irrigation_db::{DatabasePool, EventStore};
use irrigation_hw::rpi::{self, RpiRelays};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::console::ConsoleObserver;
use crate::error::EngineError;

/// Settings file used when no path is given on the command line.
const DEFAULT_SETTINGS_FILE: &str = "irrigation.yaml";

/// Application entry point for the controller.
///
/// # Errors
///
/// Returns an error if configuration, the event store, or a peripheral
/// cannot be opened, or if a reading cannot be recorded.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let settings_path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE), PathBuf::from);
    let config = ControllerConfig::load_or_default(&settings_path)?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    info!("irrigation-engine starting");
    info!(
        settings = %settings_path.display(),
        database = %config.database.path.display(),
        channels_file = %config.channels_file.display(),
        duration_secs = config.watering.duration_secs,
        threshold = config.watering.threshold,
        polarity = ?config.watering.polarity,
        dry_run = config.watering.dry_run,
        "Configuration loaded"
    );

    run(&config).await?;

    info!("irrigation-engine finished");
    Ok(())
}

/// Open everything, run one cycle, and print the history.
async fn run(config: &ControllerConfig) -> Result<(), EngineError> {
    // 3. Load zones.
    let channels = config::load_channels(&config.channels_file)?;

    // 4. Open the event store.
    let db = DatabasePool::connect_file(&config.database.path).await?;
    let store = EventStore::open(db.pool()).await?;
    info!(path = %config.database.path.display(), "Event store ready");

    // 5. Open peripherals.
    let mut adc = rpi::open_mcp3008(
        config.adc.spi_bus,
        config.adc.chip_select,
        config.adc.clock_hz,
    )?;
    let mut relays = RpiRelays::new()?;
    info!(
        spi_bus = config.adc.spi_bus,
        chip_select = config.adc.chip_select,
        clock_hz = config.adc.clock_hz,
        "Peripherals opened"
    );

    // 6. Run the cycle.
    let mut observer = ConsoleObserver::new(std::io::stdout().is_terminal());
    let outcome = run_cycle(
        &channels,
        &mut adc,
        &mut relays,
        &store,
        &config.cycle_settings(),
        &mut observer,
    )
    .await;

    let summary = match outcome {
        Ok(summary) => summary,
        Err(e) => {
            db.close().await;
            return Err(e.into());
        }
    };

    // 7. Print history.
    let history = store.recent(config.history.rows).await?;
    println!("{}", report::history_table(&history));

    let total_readings = store.count().await?;
    info!(
        zones = channels.len(),
        waterings = summary.waterings(),
        sensor_failures = summary.sensor_failures(),
        actuation_failures = summary.actuation_failures(),
        total_readings,
        "Run summary"
    );

    db.close().await;
    Ok(())
}
