//! Per-actor induction manager.
//!
//! Each actor owns one [`InductionManager`] with two independent slots.
//! Per slot the state machine is `EMPTY -> RUNNING -> EMPTY`, with a
//! self-loop for repeating inductions:
//!
//! ```text
//!            start                update (done or failed*)
//!   EMPTY ----------> RUNNING ---------------------------> EMPTY
//!                      |  ^       interrupt (active)
//!                      |  |       stop (primary)
//!                      +--+
//!              update (repeating)
//! ```
//!
//! `*` A failed iteration releases the active slot only. A primary
//! induction (combat, drowning) is a world-imposed state: it stays until
//! the world calls [`InductionManager::stop`].
//!
//! Slot locks are never held while behavior hooks or the listener run,
//! so both may call back into the manager.

use std::sync::{Arc, Weak};

use hourglass_core::{EventError, EventOutcome, EventQueue};
use parking_lot::Mutex;
use tracing::{debug, error, info};

use crate::descriptor::Slot;
use crate::error::InductionError;
use crate::ids::ActorId;
use crate::instance::{Instance, Iteration};
use crate::listener::InductionListener;

/// The two slots of one actor.
#[derive(Debug, Default)]
struct Slots {
    /// Voluntary in-progress action.
    active: Option<Arc<Instance>>,
    /// Involuntary or environmental state.
    primary: Option<Arc<Instance>>,
}

impl Slots {
    const fn get(&self, slot: Slot) -> Option<&Arc<Instance>> {
        match slot {
            Slot::Active => self.active.as_ref(),
            Slot::Primary => self.primary.as_ref(),
        }
    }

    const fn get_mut(&mut self, slot: Slot) -> &mut Option<Arc<Instance>> {
        match slot {
            Slot::Active => &mut self.active,
            Slot::Primary => &mut self.primary,
        }
    }

    fn holds(&self, slot: Slot, instance: &Arc<Instance>) -> bool {
        self.get(slot).is_some_and(|held| Arc::ptr_eq(held, instance))
    }
}

/// State shared between the manager handle and its scheduled callbacks.
struct ManagerShared {
    /// The owning actor.
    actor: ActorId,
    /// Queue on which completion callbacks are scheduled.
    queue: EventQueue,
    /// Where outcomes are reported.
    listener: Arc<dyn InductionListener>,
    /// Active and primary slots.
    slots: Mutex<Slots>,
}

/// Per-actor induction state machine.
///
/// Cloning the handle does not clone the state.
#[derive(Clone)]
pub struct InductionManager {
    /// Shared state.
    shared: Arc<ManagerShared>,
}

impl InductionManager {
    /// Create a manager for `actor` whose callbacks run on `queue` and
    /// whose outcomes go to `listener`.
    pub fn new(actor: ActorId, queue: EventQueue, listener: Arc<dyn InductionListener>) -> Self {
        Self {
            shared: Arc::new(ManagerShared {
                actor,
                queue,
                listener,
                slots: Mutex::new(Slots::default()),
            }),
        }
    }

    /// The owning actor.
    pub fn actor(&self) -> ActorId {
        self.shared.actor
    }

    /// Whether an active induction is running.
    pub fn is_active(&self) -> bool {
        self.shared.slots.lock().active.is_some()
    }

    /// Whether a primary induction is running.
    pub fn is_primary(&self) -> bool {
        self.shared.slots.lock().primary.is_some()
    }

    /// The running active induction, if any.
    pub fn active(&self) -> Option<Arc<Instance>> {
        self.shared.slots.lock().active.clone()
    }

    /// The running primary induction, if any.
    pub fn primary(&self) -> Option<Arc<Instance>> {
        self.shared.slots.lock().primary.clone()
    }

    /// Start `instance` in the slot its descriptor names.
    ///
    /// With a non-zero period, a completion callback is scheduled that
    /// many minutes ahead and kept in the instance's holder. With period
    /// zero nothing is scheduled and the caller completes the instance
    /// through [`update`](Self::update).
    ///
    /// # Errors
    ///
    /// Returns [`InductionError::SlotOccupied`] if the slot is held (the
    /// occupant is left undisturbed), or [`InductionError::Scheduler`] if
    /// the callback cannot be scheduled.
    pub fn start(&self, instance: Arc<Instance>) -> Result<(), InductionError> {
        let descriptor = instance.descriptor();
        let slot = descriptor.slot();
        let mut slots = self.shared.slots.lock();

        if let Some(occupant) = slots.get(slot) {
            return Err(InductionError::SlotOccupied {
                actor: self.shared.actor,
                slot,
                occupant: occupant.id(),
            });
        }

        let period = descriptor.period();
        if period != 0 {
            let callback = self.callback(&instance);
            let reference = self.shared.queue.add(callback, period)?;
            instance.holder().set(reference)?;
        }

        info!(
            actor = %self.shared.actor,
            induction = %instance.id(),
            %slot,
            period,
            repeating = descriptor.is_repeating(),
            "Induction started"
        );
        *slots.get_mut(slot) = Some(instance);
        Ok(())
    }

    /// Complete one iteration of `instance`.
    ///
    /// Called by the scheduled callback, or by the action layer for
    /// period-zero inductions. A success is reported to the listener and
    /// releases the slot unless the induction repeats. A failure is
    /// reported to the listener and releases the slot unless it is the
    /// primary slot. A panic inside `complete` is reported as a failure
    /// and always releases the slot. The slot is updated before the
    /// listener runs.
    ///
    /// Returns whether the instance still occupies its slot.
    ///
    /// # Errors
    ///
    /// Returns [`InductionError::NotOccupant`] if the instance does not
    /// hold its slot, or [`InductionError::Busy`] if its behavior is
    /// already running.
    pub fn update(&self, instance: &Arc<Instance>) -> Result<bool, InductionError> {
        let descriptor = instance.descriptor();
        let slot = descriptor.slot();
        if !self.shared.slots.lock().holds(slot, instance) {
            return Err(InductionError::NotOccupant {
                induction: instance.id(),
                slot,
            });
        }

        let iteration = instance.try_complete().ok_or(InductionError::Busy {
            induction: instance.id(),
        })?;

        let listener = &self.shared.listener;
        match iteration {
            Iteration::Completed(response) => {
                let still_running = descriptor.is_repeating();
                if !still_running {
                    self.release(slot, instance);
                }
                debug!(
                    actor = %self.shared.actor,
                    induction = %instance.id(),
                    %slot,
                    still_running,
                    "Induction iteration completed"
                );
                listener.completed(self.shared.actor, instance, response);
                Ok(still_running)
            }
            Iteration::Failed(failure) => {
                let still_running = slot == Slot::Primary;
                if !still_running {
                    self.release(slot, instance);
                }
                info!(
                    actor = %self.shared.actor,
                    induction = %instance.id(),
                    %slot,
                    still_running,
                    reason = failure.reason(),
                    "Induction iteration failed"
                );
                listener.failed(self.shared.actor, instance, failure);
                Ok(still_running)
            }
            Iteration::Panicked(failure) => {
                self.release(slot, instance);
                error!(
                    actor = %self.shared.actor,
                    induction = %instance.id(),
                    %slot,
                    reason = failure.reason(),
                    "Induction panicked"
                );
                listener.failed(self.shared.actor, instance, failure);
                Ok(false)
            }
        }
    }

    /// Interrupt the active induction: run its interrupt hook, cancel its
    /// pending callback, and release the slot.
    ///
    /// Returns the interrupted instance.
    ///
    /// # Errors
    ///
    /// Returns [`InductionError::ActiveSlotEmpty`] if nothing is active,
    /// or [`InductionError::Busy`] if the instance's behavior is running.
    pub fn interrupt(&self) -> Result<Arc<Instance>, InductionError> {
        let instance = self
            .active()
            .ok_or(InductionError::ActiveSlotEmpty {
                actor: self.shared.actor,
            })?;

        let response = instance.try_interrupt().ok_or(InductionError::Busy {
            induction: instance.id(),
        })?;
        self.release(Slot::Active, &instance);

        info!(actor = %self.shared.actor, induction = %instance.id(), "Induction interrupted");
        self.shared
            .listener
            .interrupted(self.shared.actor, &instance, response);
        Ok(instance)
    }

    /// Stop the primary induction: cancel its pending callback and release
    /// the slot. No hook runs and the listener is not told.
    ///
    /// Returns the stopped instance.
    ///
    /// # Errors
    ///
    /// Returns [`InductionError::PrimarySlotEmpty`] if nothing is primary.
    pub fn stop(&self) -> Result<Arc<Instance>, InductionError> {
        let instance = self
            .shared
            .slots
            .lock()
            .primary
            .take()
            .ok_or(InductionError::PrimarySlotEmpty {
                actor: self.shared.actor,
            })?;
        instance.holder().cancel();

        info!(actor = %self.shared.actor, induction = %instance.id(), "Induction stopped");
        Ok(instance)
    }

    /// Cancel the instance's callback and empty `slot` if `instance` still
    /// holds it.
    fn release(&self, slot: Slot, instance: &Arc<Instance>) {
        instance.holder().cancel();
        let mut slots = self.shared.slots.lock();
        if slots.holds(slot, instance) {
            *slots.get_mut(slot) = None;
        }
    }

    /// Build the scheduled completion callback for `instance`.
    ///
    /// The callback holds only weak references, so a dropped manager or
    /// a released instance turns it into a no-op.
    fn callback(
        &self,
        instance: &Arc<Instance>,
    ) -> impl FnMut() -> Result<EventOutcome, EventError> + Send + 'static {
        let shared: Weak<ManagerShared> = Arc::downgrade(&self.shared);
        let target = Arc::downgrade(instance);
        move || {
            let (Some(shared), Some(instance)) = (shared.upgrade(), target.upgrade()) else {
                return Ok(EventOutcome::Done);
            };
            let manager = Self { shared };
            match manager.update(&instance) {
                Ok(still_running) => Ok(EventOutcome::from_repeat(
                    still_running && instance.descriptor().is_repeating(),
                )),
                Err(InductionError::NotOccupant { .. }) => Ok(EventOutcome::Done),
                Err(err) => Err(EventError::new(err.to_string())),
            }
        }
    }
}

impl core::fmt::Debug for InductionManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let slots = self.shared.slots.lock();
        f.debug_struct("InductionManager")
            .field("actor", &self.shared.actor)
            .field("queue", &self.shared.queue.name())
            .field("active", &slots.active.as_ref().map(|held| held.id()))
            .field("primary", &slots.primary.as_ref().map(|held| held.id()))
            .finish()
    }
}
