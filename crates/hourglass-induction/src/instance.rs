//! Induction instances and the behavior contract.
//!
//! An [`Instance`] pairs a shared [`Descriptor`] with one actor-specific
//! [`Induction`] behavior and a [`Holder`] for its pending completion
//! callback, so the callback can be cancelled when the instance is
//! interrupted or stopped.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use hourglass_core::Holder;
use parking_lot::Mutex;

use crate::descriptor::Descriptor;
use crate::ids::InductionId;

/// Outcome text of a successful completion or an interruption, destined
/// for the actor through the listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// What the actor is told.
    text: String,
}

impl Response {
    /// Create a response with the given text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The response text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A domain failure: the induction can no longer succeed (the lock
/// jammed, the target left the room).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct Failure {
    /// Description of why the induction failed.
    reason: String,
}

impl Failure {
    /// Create a failure with the given description.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// The failure description.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Behavior of one timed action.
pub trait Induction: Send {
    /// Finish one iteration of the action.
    ///
    /// # Errors
    ///
    /// Returns [`Failure`] when the action can no longer succeed. The
    /// failure goes to the listener; active inductions are then released.
    fn complete(&mut self) -> Result<Response, Failure>;

    /// Called when the actor abandons an active induction. The returned
    /// response, if any, goes to the listener.
    fn interrupt(&mut self) -> Option<Response> {
        None
    }
}

/// Result of running one iteration of an induction's behavior.
#[derive(Debug)]
pub(crate) enum Iteration {
    /// `complete` returned a response.
    Completed(Response),
    /// `complete` reported a domain failure.
    Failed(Failure),
    /// `complete` panicked. The induction is treated as finished.
    Panicked(Failure),
}

/// One running (or startable) induction.
pub struct Instance {
    /// Unique identifier, for logs and errors.
    id: InductionId,
    /// Timing and slot.
    descriptor: Arc<Descriptor>,
    /// Actor-specific behavior. Locked only while it runs.
    behavior: Mutex<Box<dyn Induction>>,
    /// The pending completion callback, if one is scheduled.
    holder: Holder,
}

impl Instance {
    /// Create an instance of `descriptor` with the given behavior.
    pub fn new<I>(descriptor: Arc<Descriptor>, behavior: I) -> Arc<Self>
    where
        I: Induction + 'static,
    {
        Arc::new(Self {
            id: InductionId::new(),
            descriptor,
            behavior: Mutex::new(Box::new(behavior)),
            holder: Holder::new(),
        })
    }

    /// The instance identifier.
    pub const fn id(&self) -> InductionId {
        self.id
    }

    /// The shared descriptor.
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// The holder of the pending completion callback.
    pub const fn holder(&self) -> &Holder {
        &self.holder
    }

    /// Whether a completion callback is pending.
    pub fn is_scheduled(&self) -> bool {
        self.holder
            .current()
            .is_some_and(|reference| reference.is_pending())
    }

    /// Run `complete`, or return `None` if the behavior is already running.
    ///
    /// A panic inside `complete` is caught and reported as
    /// [`Iteration::Panicked`].
    pub(crate) fn try_complete(&self) -> Option<Iteration> {
        let mut behavior = self.behavior.try_lock()?;
        let iteration = match panic::catch_unwind(AssertUnwindSafe(|| behavior.complete())) {
            Ok(Ok(response)) => Iteration::Completed(response),
            Ok(Err(failure)) => Iteration::Failed(failure),
            Err(payload) => Iteration::Panicked(Failure::new(panic_message(payload.as_ref()))),
        };
        Some(iteration)
    }

    /// Run the interrupt hook, or return `None` if the behavior is already
    /// running.
    pub(crate) fn try_interrupt(&self) -> Option<Option<Response>> {
        self.behavior
            .try_lock()
            .map(|mut behavior| behavior.interrupt())
    }
}

/// Best-effort extraction of a panic payload's message.
fn panic_message(payload: &(dyn core::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "induction panicked".to_owned()
    }
}

impl core::fmt::Debug for Instance {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Instance")
            .field("id", &self.id)
            .field("descriptor", &self.descriptor)
            .field("scheduled", &self.is_scheduled())
            .finish_non_exhaustive()
    }
}
