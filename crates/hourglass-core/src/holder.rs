//! Single-slot, replace-and-cancel handle to one outstanding event.
//!
//! Entities that must abandon a previously scheduled follow-up when it is
//! superseded (a lock's reset timer, an induction's completion callback)
//! keep the reference in a [`Holder`]. Setting a new reference cancels
//! the old one if it is still live.

use parking_lot::Mutex;

use crate::error::SchedulerError;
use crate::queue::EventRef;

/// Holds at most one live [`EventRef`] at a time.
#[derive(Debug, Default)]
pub struct Holder {
    /// The currently held reference, if any.
    current: Mutex<Option<EventRef>>,
}

impl Holder {
    /// Create an empty holder.
    pub const fn new() -> Self {
        Self {
            current: parking_lot::const_mutex(None),
        }
    }

    /// Replace the held reference, cancelling the previous one if it has
    /// not been cancelled yet.
    ///
    /// Setting the reference that is already held is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::CancelledReference`] if `reference` is
    /// already cancelled; the previously held reference is left untouched.
    pub fn set(&self, reference: EventRef) -> Result<(), SchedulerError> {
        if reference.is_cancelled() {
            return Err(SchedulerError::CancelledReference);
        }
        let mut current = self.current.lock();
        if current
            .as_ref()
            .is_some_and(|held| held.ptr_eq(&reference))
        {
            return Ok(());
        }
        if let Some(previous) = current.replace(reference) {
            previous.cancel_if_live();
        }
        Ok(())
    }

    /// Cancel the held reference if it is still live and empty the slot.
    ///
    /// A no-op when nothing is held.
    pub fn cancel(&self) {
        if let Some(previous) = self.current.lock().take() {
            previous.cancel_if_live();
        }
    }

    /// Whether a reference that has not been cancelled is held.
    pub fn is_holding(&self) -> bool {
        self.current
            .lock()
            .as_ref()
            .is_some_and(|held| !held.is_cancelled())
    }

    /// A clone of the held reference, if any.
    pub fn current(&self) -> Option<EventRef> {
        self.current.lock().clone()
    }
}
