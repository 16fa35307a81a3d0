//! Reference tick driver for the Hourglass world simulation.
//!
//! This binary wires the scheduling core to real time. It loads
//! configuration, builds an [`EventManager`] from the configured epoch,
//! installs the day/night [`PeriodWatcher`] and the lamplighter NPC on
//! the permanent `world` queue, and runs the [`TickDriver`] until
//! `max_ticks` is reached or Ctrl-C is pressed.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `hourglass-config.yaml` (or the path given
//!    as the first argument or in `HOURGLASS_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Build the calendar and the event manager
//! 4. Install the period watcher and the lamplighter
//! 5. Run the tick driver
//! 6. Log the result

mod error;
mod lamplighter;

use std::path::{Path, PathBuf};

use hourglass_core::calendar::Calendar;
use hourglass_core::config::HourglassConfig;
use hourglass_core::driver::{DriverResult, TickDriver};
use hourglass_core::{EventManager, PeriodWatcher, QueueKind};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::lamplighter::{LAMP_COUNT, Lamplighter, MINUTES_PER_LAMP};

/// Environment variable naming the configuration file.
const CONFIG_ENV_VAR: &str = "HOURGLASS_CONFIG";

/// Configuration file used when neither an argument nor the environment
/// names one.
const DEFAULT_CONFIG_PATH: &str = "hourglass-config.yaml";

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if configuration, setup, or the tick loop fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging is not up yet, so the outcome is
    //    logged after step 2.
    let config_path = config_path();
    let (config, loaded_from_file) = load_config(&config_path)?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("hourglass-engine starting");
    if loaded_from_file {
        info!(path = %config_path.display(), "Configuration loaded");
    } else {
        info!(path = %config_path.display(), "Config file not found, using defaults");
    }
    info!(
        world_name = config.world.name,
        epoch = %config.world.epoch_time(),
        minutes_per_day = config.time.minutes_per_day,
        tick_interval_ms = config.driver.tick_interval_ms,
        minutes_per_tick = config.driver.minutes_per_tick,
        max_ticks = config.driver.max_ticks,
        "Configuration resolved"
    );

    let result = run(&config).await?;

    info!(
        end_reason = ?result.end_reason,
        ticks = result.ticks,
        final_time = %result.final_time,
        events_fired = result.events_fired,
        events_failed = result.events_failed,
        "hourglass-engine shutdown complete"
    );

    Ok(())
}

/// Build the world and drive it until the driver stops.
async fn run(config: &HourglassConfig) -> Result<DriverResult, EngineError> {
    // 3. Calendar and event manager.
    let calendar = Calendar::from_config(&config.time)?;
    let events = EventManager::new(config.world.epoch_time());
    let world = events.create_queue("world", QueueKind::Permanent)?;
    info!(
        now = %events.now(),
        period = %calendar.period_at(events.now()),
        "Event manager initialized"
    );

    // 4. Period watcher and lamplighter.
    let lamplighter = Lamplighter::new(world.clone(), LAMP_COUNT, MINUTES_PER_LAMP);
    let watcher = PeriodWatcher::install(world, calendar, move |period, now| {
        lamplighter.on_period(period, now);
        info!(
            %period,
            %now,
            dark = period.is_dark(),
            lamplighter_busy = lamplighter.manager().is_active(),
            "Day period changed"
        );
    })?;

    // 5. Tick driver, stopped by Ctrl-C.
    let driver = TickDriver::new(events, &config.driver)?;
    let control = driver.control();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, stopping after the current tick");
            control.request_stop();
        }
    });

    let result = driver.run().await;
    watcher.cancel();
    result.map_err(EngineError::from)
}

/// Resolve the configuration path: first argument, then
/// `HOURGLASS_CONFIG`, then `hourglass-config.yaml`.
fn config_path() -> PathBuf {
    std::env::args_os()
        .nth(1)
        .or_else(|| std::env::var_os(CONFIG_ENV_VAR))
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Load configuration from `path`, falling back to defaults (with
/// environment overrides) if the file does not exist.
///
/// Returns the configuration and whether it came from the file.
fn load_config(path: &Path) -> Result<(HourglassConfig, bool), EngineError> {
    if path.exists() {
        let config = HourglassConfig::from_file(path)?;
        Ok((config, true))
    } else {
        let mut config = HourglassConfig::default();
        config.world.apply_env_overrides()?;
        Ok((config, false))
    }
}
