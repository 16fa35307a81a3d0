//! Error types for the hourglass-induction crate.
//!
//! [`InductionError`] covers slot contract violations: starting a second
//! occupant, interrupting or stopping an empty slot, completing an
//! instance that no longer holds its slot. Domain failures reported by an
//! induction's own `complete` are not errors here; they travel to the
//! listener as a [`Failure`](crate::instance::Failure).

use hourglass_core::SchedulerError;

use crate::descriptor::Slot;
use crate::ids::{ActorId, InductionId};

/// Usage errors raised by [`InductionManager`](crate::manager::InductionManager).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InductionError {
    /// The slot the instance needs is already held by another instance.
    #[error("actor {actor}: {slot} slot already held by {occupant}")]
    SlotOccupied {
        /// The actor whose slot is occupied.
        actor: ActorId,
        /// The slot in question.
        slot: Slot,
        /// The instance currently holding the slot.
        occupant: InductionId,
    },

    /// `interrupt` was called with no active induction.
    #[error("actor {actor} has no active induction to interrupt")]
    ActiveSlotEmpty {
        /// The actor.
        actor: ActorId,
    },

    /// `stop` was called with no primary induction.
    #[error("actor {actor} has no primary induction to stop")]
    PrimarySlotEmpty {
        /// The actor.
        actor: ActorId,
    },

    /// The instance does not currently occupy its slot.
    #[error("induction {induction} does not occupy the {slot} slot")]
    NotOccupant {
        /// The instance.
        induction: InductionId,
        /// The slot it would occupy.
        slot: Slot,
    },

    /// The instance's behavior is already running (for example `interrupt`
    /// called from inside its own `complete`).
    #[error("induction {induction} is busy")]
    Busy {
        /// The instance.
        induction: InductionId,
    },

    /// The scheduler rejected the completion callback.
    #[error("scheduler error: {source}")]
    Scheduler {
        /// The underlying scheduler error.
        #[from]
        source: SchedulerError,
    },
}
