//! Configuration loading and typed config structures for Hourglass.
//!
//! The canonical configuration lives in `hourglass-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror
//! the YAML structure, and provides a loader that reads the file. Every
//! field has a default, so an empty file is a valid configuration.

use std::path::Path;

use serde::Deserialize;

use crate::calendar::DayPeriod;
use crate::time::GameTime;

/// Environment variable that overrides `world.epoch`.
pub const EPOCH_ENV_VAR: &str = "HOURGLASS_EPOCH";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override could not be parsed.
    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv {
        /// The environment variable name.
        var: &'static str,
        /// The rejected value.
        value: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HourglassConfig {
    /// World identity and epoch.
    #[serde(default)]
    pub world: WorldConfig,

    /// Day length and day-period boundaries.
    #[serde(default)]
    pub time: TimeConfig,

    /// Reference tick driver settings.
    #[serde(default)]
    pub driver: DriverConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HourglassConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `HOURGLASS_EPOCH` overrides `world.epoch` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::InvalidEnv`] if the override is not a number.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::InvalidEnv`] if the epoch override is not a number.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // serde_yml yields an error for an empty document; treat it as `{}`.
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.world.apply_env_overrides()?;
        Ok(config)
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable world name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Game time at which the clock starts, in minutes.
    #[serde(default = "default_epoch")]
    pub epoch: u64,
}

impl WorldConfig {
    /// Game time at which the clock starts.
    pub const fn epoch_time(&self) -> GameTime {
        GameTime(self.epoch)
    }

    /// Apply environment variable overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] if `HOURGLASS_EPOCH` is set but
    /// is not an unsigned integer.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(value) = std::env::var(EPOCH_ENV_VAR) {
            self.epoch = value.trim().parse().map_err(|_err| ConfigError::InvalidEnv {
                var: EPOCH_ENV_VAR,
                value: value.clone(),
            })?;
        }
        Ok(())
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            epoch: default_epoch(),
        }
    }
}

/// Day length and the boundaries of each day period.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimeConfig {
    /// Game minutes in one day.
    #[serde(default = "default_minutes_per_day")]
    pub minutes_per_day: u64,

    /// Day periods in ascending start order.
    #[serde(default = "default_periods")]
    pub periods: Vec<PeriodConfig>,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            minutes_per_day: default_minutes_per_day(),
            periods: default_periods(),
        }
    }
}

/// One day-period boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PeriodConfig {
    /// Minute of the day at which the period begins.
    pub start: u64,
    /// The period that begins.
    pub period: DayPeriod,
}

/// Reference tick driver configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DriverConfig {
    /// Real-time milliseconds between ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Game minutes added to the clock per tick.
    #[serde(default = "default_minutes_per_tick")]
    pub minutes_per_tick: u64,

    /// Stop after this many ticks (0 = unlimited).
    #[serde(default)]
    pub max_ticks: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            minutes_per_tick: default_minutes_per_tick(),
            max_ticks: 0,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error), used when `RUST_LOG`
    /// is not set.
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

fn default_world_name() -> String {
    "Hourglass".to_owned()
}

const fn default_epoch() -> u64 {
    0
}

const fn default_minutes_per_day() -> u64 {
    1_440
}

fn default_periods() -> Vec<PeriodConfig> {
    vec![
        PeriodConfig {
            start: 300,
            period: DayPeriod::Dawn,
        },
        PeriodConfig {
            start: 420,
            period: DayPeriod::Day,
        },
        PeriodConfig {
            start: 1_140,
            period: DayPeriod::Dusk,
        },
        PeriodConfig {
            start: 1_260,
            period: DayPeriod::Night,
        },
    ]
}

const fn default_tick_interval_ms() -> u64 {
    1_000
}

const fn default_minutes_per_tick() -> u64 {
    1
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = HourglassConfig::default();
        assert_eq!(config.world.name, "Hourglass");
        assert_eq!(config.time.minutes_per_day, 1_440);
        assert_eq!(config.time.periods.len(), 4);
        assert_eq!(config.driver.minutes_per_tick, 1);
        assert_eq!(config.driver.max_ticks, 0);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
world:
  name: "Test Realm"
  epoch: 720

time:
  minutes_per_day: 100
  periods:
    - start: 10
      period: dawn
    - start: 20
      period: day
    - start: 70
      period: dusk
    - start: 80
      period: night

driver:
  tick_interval_ms: 250
  minutes_per_tick: 5
  max_ticks: 12

logging:
  level: "debug"
"#;

        let config = HourglassConfig::parse(yaml);
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_default();

        assert_eq!(config.world.name, "Test Realm");
        assert_eq!(config.time.minutes_per_day, 100);
        assert_eq!(
            config.time.periods.first().map(|p| p.period),
            Some(DayPeriod::Dawn)
        );
        assert_eq!(config.driver.tick_interval_ms, 250);
        assert_eq!(config.driver.minutes_per_tick, 5);
        assert_eq!(config.driver.max_ticks, 12);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn parse_minimal_yaml() {
        let yaml = "driver:\n  minutes_per_tick: 15\n";
        let config = HourglassConfig::parse(yaml);
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_default();

        // Overridden
        assert_eq!(config.driver.minutes_per_tick, 15);
        // Everything else uses defaults
        assert_eq!(config.driver.tick_interval_ms, 1_000);
        assert_eq!(config.time.minutes_per_day, 1_440);
    }

    #[test]
    fn parse_empty_yaml() {
        let config = HourglassConfig::parse("");
        assert!(config.is_ok());
    }

    #[test]
    fn unknown_period_name_is_rejected() {
        let yaml = "time:\n  periods:\n    - start: 0\n      period: eclipse\n";
        let config = HourglassConfig::parse(yaml);
        assert!(matches!(config, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("hourglass-config.yaml");
        if path.exists() {
            let config = HourglassConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
