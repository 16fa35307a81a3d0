//! The event callback contract.
//!
//! An [`Event`] is pure behavior: "run, then report whether to repeat."
//! All state it closes over belongs to its owner, not to the scheduler.
//! Closures returning `Result<EventOutcome, EventError>` implement the
//! trait directly; [`once`] and [`repeating`] adapt infallible closures.

/// What the queue should do with an entry after its event ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventOutcome {
    /// Reschedule at the previous scheduled time plus the original duration.
    Repeat,
    /// Discard the entry.
    Done,
}

impl EventOutcome {
    /// Map a "repeat?" flag to an outcome.
    pub const fn from_repeat(repeat: bool) -> Self {
        if repeat { Self::Repeat } else { Self::Done }
    }

    /// Whether the entry should be rescheduled.
    pub const fn is_repeat(self) -> bool {
        matches!(self, Self::Repeat)
    }
}

/// An unexpected failure reported by an event body.
///
/// The queue logs it and treats the entry as completed and non-repeating.
/// It never stops other entries from firing in the same advance.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct EventError {
    /// Description of what went wrong.
    message: String,
}

impl EventError {
    /// Create an error with the given description.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Return the description.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A zero-argument, time-triggered callback.
///
/// Event bodies are synchronous and must not block. Any "wait" is
/// modeled by scheduling a later event, never by suspending here.
pub trait Event: Send {
    /// Run the event and report whether it should fire again.
    ///
    /// # Errors
    ///
    /// Returns [`EventError`] when the body fails unexpectedly. The entry
    /// is then discarded as if it had returned [`EventOutcome::Done`].
    fn execute(&mut self) -> Result<EventOutcome, EventError>;
}

impl<F> Event for F
where
    F: FnMut() -> Result<EventOutcome, EventError> + Send,
{
    fn execute(&mut self) -> Result<EventOutcome, EventError> {
        self()
    }
}

/// Adapt an infallible closure into an event that fires exactly once.
pub fn once<F>(mut body: F) -> impl Event
where
    F: FnMut() + Send,
{
    move || {
        body();
        Ok(EventOutcome::Done)
    }
}

/// Adapt a closure returning a "repeat?" flag into an event.
pub fn repeating<F>(mut body: F) -> impl Event
where
    F: FnMut() -> bool + Send,
{
    move || Ok(EventOutcome::from_repeat(body()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn once_reports_done() {
        let mut calls = 0_u32;
        let mut event = once(|| calls = calls.saturating_add(1));
        assert_eq!(event.execute().unwrap(), EventOutcome::Done);
        drop(event);
        assert_eq!(calls, 1);
    }

    #[test]
    fn repeating_follows_flag() {
        let mut remaining = 2_u32;
        let mut event = repeating(move || {
            remaining = remaining.saturating_sub(1);
            remaining > 0
        });
        assert_eq!(event.execute().unwrap(), EventOutcome::Repeat);
        assert_eq!(event.execute().unwrap(), EventOutcome::Done);
    }

    #[test]
    fn closures_can_fail() {
        let mut event = || -> Result<EventOutcome, EventError> { Err(EventError::new("boom")) };
        let err = event.execute().unwrap_err();
        assert_eq!(err.message(), "boom");
    }
}
