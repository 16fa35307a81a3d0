//! Game time and the shared game clock.
//!
//! Game time is the simulation's monotonic clock, measured in game
//! minutes since the world's epoch. It is decoupled from wall-clock time:
//! it only moves when the tick driver calls
//! [`EventManager::advance`](crate::manager::EventManager::advance).
//!
//! # Design Principles
//!
//! - All clock arithmetic is checked (no silent overflow).
//! - The clock is read lock-free so event bodies can ask for the current
//!   time while the manager is mid-advance.
//! - Only the manager writes the clock, under its advance lock.

use core::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;

/// Minutes in one game day, used for display only.
const DISPLAY_MINUTES_PER_DAY: u64 = 1_440;

/// Minutes in one game hour, used for display only.
const DISPLAY_MINUTES_PER_HOUR: u64 = 60;

/// A point on the game clock, in game minutes since the epoch.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct GameTime(pub u64);

impl GameTime {
    /// The first instant of game time.
    pub const ZERO: Self = Self(0);

    /// Create a game time from a raw minute count.
    pub const fn from_minutes(minutes: u64) -> Self {
        Self(minutes)
    }

    /// Return the raw minute count.
    pub const fn minutes(self) -> u64 {
        self.0
    }

    /// Return this time shifted `duration` minutes into the future, or
    /// `None` on overflow.
    pub const fn checked_add(self, duration: u64) -> Option<Self> {
        match self.0.checked_add(duration) {
            Some(minutes) => Some(Self(minutes)),
            None => None,
        }
    }

    /// Return this time shifted `duration` minutes into the future.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::ClockOverflow`] if the result would
    /// exceed `u64::MAX` minutes.
    pub const fn plus(self, duration: u64) -> Result<Self, SchedulerError> {
        match self.checked_add(duration) {
            Some(time) => Ok(time),
            None => Err(SchedulerError::ClockOverflow),
        }
    }

    /// Minutes elapsed since `earlier`, saturating at zero.
    pub const fn saturating_since(self, earlier: Self) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for GameTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let day = self.0.checked_div(DISPLAY_MINUTES_PER_DAY).unwrap_or(0);
        let minute_of_day = self.0.checked_rem(DISPLAY_MINUTES_PER_DAY).unwrap_or(0);
        let hour = minute_of_day
            .checked_div(DISPLAY_MINUTES_PER_HOUR)
            .unwrap_or(0);
        let minute = minute_of_day
            .checked_rem(DISPLAY_MINUTES_PER_HOUR)
            .unwrap_or(0);
        write!(f, "day {day} {hour:02}:{minute:02}")
    }
}

impl From<u64> for GameTime {
    fn from(minutes: u64) -> Self {
        Self(minutes)
    }
}

/// The current game time, shared between a manager and its queues.
///
/// Reads are lock-free. Writes happen only through
/// [`advance`](Self::advance), which the manager calls while holding its
/// advance lock, so the stored value never decreases.
#[derive(Debug)]
pub struct GameClock {
    /// Current time in game minutes since the epoch.
    now: AtomicU64,
}

impl GameClock {
    /// Create a clock initialized from the world's epoch.
    pub const fn new(epoch: GameTime) -> Self {
        Self {
            now: AtomicU64::new(epoch.0),
        }
    }

    /// Return the current game time.
    pub fn now(&self) -> GameTime {
        GameTime(self.now.load(Ordering::Acquire))
    }

    /// Move the clock forward by `delta` minutes and return the new time.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidDelta`] if `delta` is zero, or
    /// [`SchedulerError::ClockOverflow`] if the clock would overflow.
    pub(crate) fn advance(&self, delta: u64) -> Result<GameTime, SchedulerError> {
        if delta == 0 {
            return Err(SchedulerError::InvalidDelta);
        }
        let next = self.now().plus(delta)?;
        self.now.store(next.0, Ordering::Release);
        Ok(next)
    }
}
