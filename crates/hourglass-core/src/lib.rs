//! Game clock, event queues, and the scheduling manager for the Hourglass
//! world simulation.
//!
//! This crate is the temporal core of the world: a discrete-event
//! scheduler that advances a monotonic game clock and fires callbacks at
//! precise future instants. Every other time-based behavior (decay
//! timers, shop resets, repair completion, day/night transitions) is a
//! client of the types defined here.
//!
//! # Modules
//!
//! - [`calendar`] -- Day-period derivation and the [`PeriodWatcher`] that
//!   reports day/night transitions through a queue.
//! - [`config`] -- Configuration loading from `hourglass-config.yaml` into
//!   strongly-typed structs.
//! - [`driver`] -- Reference tick driver that calls
//!   [`EventManager::advance`] from a tokio interval.
//! - [`error`] -- [`SchedulerError`], the usage-error type shared by all
//!   scheduling operations.
//! - [`event`] -- The [`Event`] callback contract.
//! - [`holder`] -- [`Holder`], a single-slot replace-and-cancel handle.
//! - [`manager`] -- [`EventManager`], the authority for current game time.
//! - [`queue`] -- [`EventQueue`] and its [`EventRef`] entry handles.
//! - [`time`] -- [`GameTime`] and the shared [`GameClock`].
//!
//! [`PeriodWatcher`]: calendar::PeriodWatcher
//! [`SchedulerError`]: error::SchedulerError
//! [`Event`]: event::Event
//! [`Holder`]: holder::Holder
//! [`EventManager`]: manager::EventManager
//! [`EventManager::advance`]: manager::EventManager::advance
//! [`EventQueue`]: queue::EventQueue
//! [`EventRef`]: queue::EventRef
//! [`GameTime`]: time::GameTime
//! [`GameClock`]: time::GameClock

pub mod calendar;
pub mod config;
pub mod driver;
pub mod error;
pub mod event;
pub mod holder;
pub mod manager;
pub mod queue;
pub mod time;

// Re-export primary types at crate root for convenience.
pub use calendar::{Calendar, DayPeriod, PeriodWatcher};
pub use error::SchedulerError;
pub use event::{Event, EventError, EventOutcome};
pub use holder::Holder;
pub use manager::{AdvanceSummary, EventManager};
pub use queue::{EventQueue, EventRef, QueueKind};
pub use time::{GameClock, GameTime};
