//! Reference tick driver.
//!
//! The scheduler never advances itself. This module provides
//! [`TickDriver`], the loop that turns real time into game time: every
//! `tick_interval_ms` it calls [`EventManager::advance`] with
//! `minutes_per_tick`. It supports:
//!
//! - **Bounded runs**: stop after `max_ticks` (0 = unlimited)
//! - **Clean stop**: [`DriverControl::request_stop`] from any task
//! - **Manual stepping**: [`TickDriver::step`] for callers that own their
//!   own loop (tests, turn-based hosts)

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Notify;
use tokio::time::{self, MissedTickBehavior};
use tracing::{info, warn};

use crate::config::DriverConfig;
use crate::error::SchedulerError;
use crate::manager::{AdvanceSummary, EventManager};
use crate::time::GameTime;

/// Errors that can stop the driver.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The driver configuration cannot be used.
    #[error("invalid driver configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong.
        reason: String,
    },

    /// The manager rejected an advance.
    #[error("scheduler error: {source}")]
    Scheduler {
        /// The underlying scheduler error.
        #[from]
        source: SchedulerError,
    },
}

/// Why a driver run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverEndReason {
    /// Reached the configured `max_ticks` limit.
    MaxTicksReached,
    /// A stop was requested through [`DriverControl`].
    StopRequested,
}

/// Result of a driver run.
#[derive(Debug, Clone)]
pub struct DriverResult {
    /// Why the run ended.
    pub end_reason: DriverEndReason,
    /// Ticks executed during the run.
    pub ticks: u64,
    /// Game time when the run ended.
    pub final_time: GameTime,
    /// Total event bodies invoked during the run.
    pub events_fired: u64,
    /// Total event bodies that failed during the run.
    pub events_failed: u64,
    /// Wall-clock time when the run started.
    pub started_at: DateTime<Utc>,
}

/// Shared stop switch for a running driver.
#[derive(Debug, Default)]
pub struct DriverControl {
    /// Whether a stop has been requested.
    stop_requested: AtomicBool,
    /// Wakes the driver out of its interval sleep.
    stop_notify: Notify,
    /// Ticks completed so far.
    ticks: AtomicU64,
}

impl DriverControl {
    /// Create a control with no stop requested.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a clean stop. The driver finishes its current tick first.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.stop_notify.notify_one();
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Ticks completed by the driver so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }
}

/// Drives an [`EventManager`] from a tokio interval.
#[derive(Debug)]
pub struct TickDriver {
    /// The manager being driven.
    manager: EventManager,
    /// Real time between ticks.
    interval: Duration,
    /// Game minutes per tick.
    minutes_per_tick: u64,
    /// Tick limit (0 = unlimited).
    max_ticks: u64,
    /// Shared stop switch.
    control: Arc<DriverControl>,
}

impl TickDriver {
    /// Create a driver from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::InvalidConfig`] if `minutes_per_tick` or
    /// `tick_interval_ms` is zero.
    pub fn new(manager: EventManager, config: &DriverConfig) -> Result<Self, DriverError> {
        if config.minutes_per_tick == 0 {
            return Err(DriverError::InvalidConfig {
                reason: "minutes_per_tick must be at least 1".to_owned(),
            });
        }
        if config.tick_interval_ms == 0 {
            return Err(DriverError::InvalidConfig {
                reason: "tick_interval_ms must be at least 1".to_owned(),
            });
        }
        Ok(Self {
            manager,
            interval: Duration::from_millis(config.tick_interval_ms),
            minutes_per_tick: config.minutes_per_tick,
            max_ticks: config.max_ticks,
            control: Arc::new(DriverControl::new()),
        })
    }

    /// The shared stop switch for this driver.
    pub fn control(&self) -> Arc<DriverControl> {
        Arc::clone(&self.control)
    }

    /// The manager being driven.
    pub const fn manager(&self) -> &EventManager {
        &self.manager
    }

    /// Execute exactly one tick.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Scheduler`] if the manager rejects the
    /// advance (clock overflow or re-entrant call).
    pub fn step(&self) -> Result<AdvanceSummary, DriverError> {
        let summary = self.manager.advance(self.minutes_per_tick)?;
        self.control.ticks.fetch_add(1, Ordering::AcqRel);
        if summary.failed > 0 {
            warn!(now = %summary.now, failed = summary.failed, "Events failed during tick");
        }
        Ok(summary)
    }

    /// Run the tick loop until `max_ticks` is reached or a stop is
    /// requested.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Scheduler`] if an advance fails.
    pub async fn run(&self) -> Result<DriverResult, DriverError> {
        let started_at = Utc::now();
        let mut ticks: u64 = 0;
        let mut events_fired: u64 = 0;
        let mut events_failed: u64 = 0;

        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first interval tick completes immediately.
        interval.tick().await;

        info!(
            start = %self.manager.now(),
            minutes_per_tick = self.minutes_per_tick,
            tick_interval_ms = self.interval.as_millis(),
            max_ticks = self.max_ticks,
            "Tick driver starting"
        );

        let end_reason = loop {
            if self.control.is_stop_requested() {
                break DriverEndReason::StopRequested;
            }
            if self.max_ticks > 0 && ticks >= self.max_ticks {
                break DriverEndReason::MaxTicksReached;
            }

            tokio::select! {
                _ = interval.tick() => {}
                () = self.control.stop_notify.notified() => continue,
            }

            let summary = self.step()?;
            ticks = ticks.saturating_add(1);
            events_fired = events_fired.saturating_add(summary.fired);
            events_failed = events_failed.saturating_add(summary.failed);
        };

        let final_time = self.manager.now();
        info!(
            ?end_reason,
            ticks,
            %final_time,
            events_fired,
            events_failed,
            elapsed_ms = Utc::now().signed_duration_since(started_at).num_milliseconds(),
            "Tick driver stopped"
        );

        Ok(DriverResult {
            end_reason,
            ticks,
            final_time,
            events_fired,
            events_failed,
            started_at,
        })
    }
}
