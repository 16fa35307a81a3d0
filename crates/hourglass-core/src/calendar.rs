//! Day periods and day/night transitions.
//!
//! The [`Calendar`] maps game time onto the period of the day (dawn, day,
//! dusk, night). It is derived from game time and never stored
//! independently: the clock is the source of truth.
//!
//! The [`PeriodWatcher`] is a scheduler client. It keeps exactly one
//! pending event aimed at the next period boundary in its own
//! [`Holder`]; each firing reports the period in force and aims the
//! holder at the boundary after that. When a single advance spans several
//! boundaries, the watcher reports the period in force at the end of the
//! advance.

use core::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::TimeConfig;
use crate::error::SchedulerError;
use crate::event::{EventError, EventOutcome};
use crate::holder::Holder;
use crate::queue::EventQueue;
use crate::time::GameTime;

/// Errors that can occur when building a calendar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalendarError {
    /// Invalid time configuration (e.g. zero minutes per day).
    #[error("invalid calendar configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// A period of the game day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPeriod {
    /// First light.
    Dawn,
    /// Full daylight.
    Day,
    /// Evening twilight.
    Dusk,
    /// Darkness.
    Night,
}

impl DayPeriod {
    /// Whether the period counts as dark for light-dependent clients.
    pub const fn is_dark(self) -> bool {
        matches!(self, Self::Night)
    }
}

impl fmt::Display for DayPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Dawn => "dawn",
            Self::Day => "day",
            Self::Dusk => "dusk",
            Self::Night => "night",
        };
        f.write_str(name)
    }
}

/// Maps game time to day periods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calendar {
    /// Game minutes in one day (at least 1).
    minutes_per_day: u64,
    /// `(start minute, period)` in strictly ascending start order.
    periods: Vec<(u64, DayPeriod)>,
}

impl Calendar {
    /// Build a calendar from explicit boundaries.
    ///
    /// Boundaries must be non-empty, strictly ascending, and fall inside
    /// the day. Minutes before the first boundary belong to the last
    /// period (it wraps over midnight).
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidConfig`] if any of these rules is
    /// violated.
    pub fn new(minutes_per_day: u64, periods: Vec<(u64, DayPeriod)>) -> Result<Self, CalendarError> {
        if minutes_per_day == 0 {
            return Err(CalendarError::InvalidConfig {
                reason: "minutes_per_day must be at least 1".to_owned(),
            });
        }
        if periods.is_empty() {
            return Err(CalendarError::InvalidConfig {
                reason: "at least one day period must be configured".to_owned(),
            });
        }
        if let Some(&(start, period)) = periods.iter().find(|(start, _)| *start >= minutes_per_day) {
            return Err(CalendarError::InvalidConfig {
                reason: format!("{period} starts at minute {start}, outside a {minutes_per_day}-minute day"),
            });
        }
        if periods.windows(2).any(|pair| match pair {
            [(earlier, _), (later, _)] => earlier >= later,
            _ => false,
        }) {
            return Err(CalendarError::InvalidConfig {
                reason: "day periods must be in strictly ascending start order".to_owned(),
            });
        }
        Ok(Self {
            minutes_per_day,
            periods,
        })
    }

    /// Build a calendar from the `time` section of the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidConfig`] if the section is invalid.
    pub fn from_config(config: &TimeConfig) -> Result<Self, CalendarError> {
        Self::new(
            config.minutes_per_day,
            config
                .periods
                .iter()
                .map(|entry| (entry.start, entry.period))
                .collect(),
        )
    }

    /// Game minutes in one day.
    pub const fn minutes_per_day(&self) -> u64 {
        self.minutes_per_day
    }

    /// Minute within the current day (0-based).
    pub fn minute_of_day(&self, time: GameTime) -> u64 {
        time.minutes().checked_rem(self.minutes_per_day).unwrap_or(0)
    }

    /// Day number since the epoch (0-based).
    pub fn day(&self, time: GameTime) -> u64 {
        time.minutes().checked_div(self.minutes_per_day).unwrap_or(0)
    }

    /// The period in force at `time`.
    pub fn period_at(&self, time: GameTime) -> DayPeriod {
        let minute = self.minute_of_day(time);
        self.periods
            .iter()
            .rev()
            .find(|(start, _)| *start <= minute)
            .or_else(|| self.periods.last())
            .map_or(DayPeriod::Night, |&(_, period)| period)
    }

    /// Minutes from `time` until the next period boundary (always >= 1).
    pub fn minutes_until_next_transition(&self, time: GameTime) -> u64 {
        let minute = self.minute_of_day(time);
        if let Some(&(start, _)) = self.periods.iter().find(|(start, _)| *start > minute) {
            return start.saturating_sub(minute);
        }
        // Next boundary is the first one of tomorrow.
        let first = self.periods.first().map_or(0, |&(start, _)| start);
        self.minutes_per_day
            .saturating_sub(minute)
            .saturating_add(first)
            .max(1)
    }
}

/// Callback invoked on every observed period transition.
type TransitionFn = Box<dyn FnMut(DayPeriod, GameTime) + Send>;

/// State shared between a watcher handle and its scheduled events.
struct WatcherShared {
    /// Queue the boundary events live on.
    queue: EventQueue,
    /// The day model.
    calendar: Calendar,
    /// The one pending boundary event.
    holder: Holder,
    /// Period reported most recently.
    current: Mutex<DayPeriod>,
    /// Client callback.
    on_transition: Mutex<TransitionFn>,
}

/// Reports day/night transitions by keeping one event aimed at the next
/// period boundary.
pub struct PeriodWatcher {
    /// Shared watcher state.
    shared: Arc<WatcherShared>,
}

impl PeriodWatcher {
    /// Start watching period transitions on `queue`.
    ///
    /// The callback is invoked from inside the queue's execution loop
    /// whenever the period changes; it must not block.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError`] if the first boundary event cannot be
    /// scheduled (for example because the queue was removed).
    pub fn install<F>(queue: EventQueue, calendar: Calendar, on_transition: F) -> Result<Self, SchedulerError>
    where
        F: FnMut(DayPeriod, GameTime) + Send + 'static,
    {
        let now = queue.now();
        let current = calendar.period_at(now);
        let shared = Arc::new(WatcherShared {
            queue,
            calendar,
            holder: Holder::new(),
            current: Mutex::new(current),
            on_transition: Mutex::new(Box::new(on_transition)),
        });
        schedule_next(&shared)?;
        info!(queue = shared.queue.name(), %now, period = %current, "Period watcher installed");
        Ok(Self { shared })
    }

    /// The period most recently observed.
    pub fn current(&self) -> DayPeriod {
        *self.shared.current.lock()
    }

    /// Game time of the next scheduled boundary check, if still watching.
    pub fn next_boundary(&self) -> Option<GameTime> {
        self.shared
            .holder
            .current()
            .filter(|reference| reference.is_pending())
            .map(|reference| reference.scheduled_at())
    }

    /// Stop watching. Pending boundary events are cancelled.
    pub fn cancel(&self) {
        self.shared.holder.cancel();
        debug!(queue = self.shared.queue.name(), "Period watcher cancelled");
    }
}

impl fmt::Debug for PeriodWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeriodWatcher")
            .field("queue", &self.shared.queue.name())
            .field("current", &self.current())
            .finish_non_exhaustive()
    }
}

impl Drop for PeriodWatcher {
    fn drop(&mut self) {
        self.shared.holder.cancel();
    }
}

/// Aim the holder at the next boundary after the queue's current time.
fn schedule_next(shared: &Arc<WatcherShared>) -> Result<(), SchedulerError> {
    let delay = shared
        .calendar
        .minutes_until_next_transition(shared.queue.now());
    let weak = Arc::downgrade(shared);
    let reference = shared.queue.add(move || on_boundary(&weak), delay)?;
    shared.holder.set(reference)
}

/// Body of each boundary event.
fn on_boundary(weak: &Weak<WatcherShared>) -> Result<EventOutcome, EventError> {
    let Some(shared) = weak.upgrade() else {
        return Ok(EventOutcome::Done);
    };
    let now = shared.queue.now();
    let period = shared.calendar.period_at(now);
    let changed = {
        let mut current = shared.current.lock();
        let changed = *current != period;
        *current = period;
        changed
    };
    if changed {
        debug!(%now, %period, "Day period changed");
        let mut callback = shared.on_transition.lock();
        (*callback)(period, now);
    }
    schedule_next(&shared).map_err(|err| EventError::new(err.to_string()))?;
    Ok(EventOutcome::Done)
}
