//! Error types for the hourglass-core crate.
//!
//! Every variant of [`SchedulerError`] is a caller contract violation: a
//! non-positive duration, a double cancel, removing a permanent queue.
//! These indicate state-tracking bugs in the caller and are always
//! returned, never swallowed.
//!
//! Failures raised by event bodies while they run are a different
//! category; they are caught and logged by the queue loop and never
//! surface here.

/// Usage errors raised by the scheduling primitives.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    /// An event was registered with a duration of zero.
    #[error("invalid duration {duration}: events must be scheduled at least 1 minute ahead")]
    InvalidDuration {
        /// The rejected duration.
        duration: u64,
    },

    /// The clock was asked to advance by zero minutes.
    #[error("invalid advance: delta must be at least 1")]
    InvalidDelta,

    /// Game time would overflow `u64::MAX` minutes.
    #[error("game clock overflow: cannot schedule or advance beyond u64::MAX")]
    ClockOverflow,

    /// A reference that was already cancelled was cancelled again.
    #[error("event reference already cancelled")]
    AlreadyCancelled,

    /// A holder was handed a reference that is already cancelled.
    #[error("cannot hold a cancelled event reference")]
    CancelledReference,

    /// A permanent queue cannot be removed.
    #[error("queue '{name}' is permanent and cannot be removed")]
    PermanentQueue {
        /// Name of the queue.
        name: String,
    },

    /// The queue was removed from its manager and no longer accepts work.
    #[error("queue '{name}' has been removed")]
    QueueDetached {
        /// Name of the queue.
        name: String,
    },

    /// A queue with this name is already registered on the manager.
    #[error("queue '{name}' already exists")]
    DuplicateQueue {
        /// Name of the queue.
        name: String,
    },

    /// `advance` was called from inside an event body of the same manager.
    #[error("advance called re-entrantly from an event body")]
    ReentrantAdvance,
}
