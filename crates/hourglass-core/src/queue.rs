//! Time-ordered queues of pending events.
//!
//! An [`EventQueue`] belongs to exactly one [`EventManager`] and holds the
//! pending callbacks of one subsystem (decay timers, shop resets, actor
//! inductions). Entries are ordered by scheduled time, with ties broken by
//! insertion order.
//!
//! # Cancellation
//!
//! Cancelling an [`EventRef`] is synchronous from the caller's point of
//! view but lazy in storage: the entry stays in the heap until the queue
//! next scans past it, at which point it is discarded without running.
//! Callers may rely on "it will not fire", never on immediate
//! reclamation.
//!
//! # Locking
//!
//! Each queue guards its heap with its own lock. The lock is released
//! before an event body runs, so bodies may add to or cancel entries on
//! any queue, including the one currently executing.
//!
//! [`EventManager`]: crate::manager::EventManager

use core::cmp::{Ordering as CmpOrdering, Reverse};
use core::fmt;
use std::collections::BinaryHeap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::error::SchedulerError;
use crate::event::{Event, EventError, EventOutcome};
use crate::manager::{AdvanceSummary, ManagerShared};
use crate::time::{GameClock, GameTime};

/// Entry is waiting to fire (or is firing right now).
const STATE_PENDING: u8 = 0;
/// Entry ran and will not run again.
const STATE_COMPLETED: u8 = 1;
/// Entry was cancelled and will never run (again).
const STATE_CANCELLED: u8 = 2;

/// Lifetime of a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueKind {
    /// Lives for the lifetime of its manager and cannot be removed.
    Permanent,
    /// May be removed explicitly, which clears all of its entries.
    Transient,
}

/// Shared state of one scheduled entry.
///
/// The same entry is re-inserted into the heap on every repeat, so an
/// [`EventRef`] stays valid across repeats.
struct EntryShared {
    /// The callback. Locked only while it runs.
    event: Mutex<Box<dyn Event>>,
    /// One of the `STATE_*` constants.
    state: AtomicU8,
    /// Game time at which the entry was added.
    registered_at: GameTime,
    /// Original duration; also the repeat period.
    duration: u64,
    /// Time of the next (or last) firing.
    scheduled_at: AtomicU64,
}

impl EntryShared {
    fn state(&self) -> u8 {
        self.state.load(Ordering::Acquire)
    }

    /// Move `Pending -> Completed`. A cancelled entry stays cancelled.
    fn complete(&self) {
        let _ = self.state.compare_exchange(
            STATE_PENDING,
            STATE_COMPLETED,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Move to cancelled. Returns the previous state.
    fn cancel(&self) -> u8 {
        self.state.swap(STATE_CANCELLED, Ordering::AcqRel)
    }
}

/// Handle to one entry on an [`EventQueue`].
///
/// Cloning the handle does not clone the entry; every clone observes and
/// controls the same entry.
#[derive(Clone)]
pub struct EventRef {
    /// The shared entry.
    entry: Arc<EntryShared>,
    /// Name of the owning queue, for diagnostics.
    queue_name: Arc<str>,
}

impl EventRef {
    /// Cancel the entry. It will never fire (again).
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::AlreadyCancelled`] if the entry was
    /// already cancelled. Double cancels indicate that the caller lost
    /// track of its own state. Entries still pending when their transient
    /// queue was removed count as cancelled too.
    pub fn cancel(&self) -> Result<(), SchedulerError> {
        if self.entry.cancel() == STATE_CANCELLED {
            return Err(SchedulerError::AlreadyCancelled);
        }
        debug!(queue = %self.queue_name, scheduled_at = %self.scheduled_at(), "Event cancelled");
        Ok(())
    }

    /// Cancel the entry unless it is already cancelled. Returns whether
    /// this call performed the cancellation.
    pub(crate) fn cancel_if_live(&self) -> bool {
        self.entry
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |state| {
                (state != STATE_CANCELLED).then_some(STATE_CANCELLED)
            })
            .is_ok()
    }

    /// Whether the entry has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.entry.state() == STATE_CANCELLED
    }

    /// Whether the entry is still waiting to fire.
    pub fn is_pending(&self) -> bool {
        self.entry.state() == STATE_PENDING
    }

    /// Game time at which the entry was added.
    pub fn registered_at(&self) -> GameTime {
        self.entry.registered_at
    }

    /// The entry's original duration, which is also its repeat period.
    pub fn duration(&self) -> u64 {
        self.entry.duration
    }

    /// Game time of the next firing, or of the last firing once the entry
    /// has completed.
    pub fn scheduled_at(&self) -> GameTime {
        GameTime(self.entry.scheduled_at.load(Ordering::Acquire))
    }

    /// Name of the queue the entry belongs to.
    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    /// Whether two handles refer to the same entry.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.entry, &other.entry)
    }
}

impl fmt::Debug for EventRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRef")
            .field("queue", &self.queue_name)
            .field("scheduled_at", &self.scheduled_at())
            .field("duration", &self.entry.duration)
            .field("state", &self.entry.state())
            .finish()
    }
}

/// One heap slot: an entry at a concrete scheduled time.
struct Scheduled {
    /// When this slot becomes due.
    due: GameTime,
    /// Insertion sequence, breaks ties between equal `due` values.
    seq: u64,
    /// The entry to run.
    entry: Arc<EntryShared>,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

/// The ordered pending set of one queue.
#[derive(Default)]
struct PendingSet {
    /// Min-heap on `(due, seq)`.
    heap: BinaryHeap<Reverse<Scheduled>>,
    /// Next insertion sequence number.
    next_seq: u64,
}

impl PendingSet {
    fn push(&mut self, due: GameTime, entry: Arc<EntryShared>) {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.heap.push(Reverse(Scheduled { due, seq, entry }));
    }

    /// Pop the earliest slot if it is due at or before `now`.
    fn pop_due(&mut self, now: GameTime) -> Option<Scheduled> {
        let Reverse(head) = self.heap.peek()?;
        if head.due > now {
            return None;
        }
        self.heap.pop().map(|Reverse(scheduled)| scheduled)
    }
}

/// Internal state shared by all handles to one queue.
pub(crate) struct QueueShared {
    /// Queue name, unique within its manager.
    name: Arc<str>,
    /// Permanent or transient.
    kind: QueueKind,
    /// The owning manager's clock.
    clock: Arc<GameClock>,
    /// Pending entries.
    pending: Mutex<PendingSet>,
    /// Set once the queue has been removed.
    detached: AtomicBool,
    /// Back-reference used to detach on removal.
    manager: Weak<ManagerShared>,
}

/// A named, time-ordered collection of pending events.
///
/// Created through
/// [`EventManager::create_queue`](crate::manager::EventManager::create_queue).
/// Cloning the handle shares the queue.
#[derive(Clone)]
pub struct EventQueue {
    /// Shared queue state.
    shared: Arc<QueueShared>,
}

/// What happened when one entry's event ran.
enum Invocation {
    /// The body returned normally.
    Returned(EventOutcome),
    /// The body returned an error.
    Failed(EventError),
    /// The body panicked.
    Panicked(String),
}

impl EventQueue {
    pub(crate) fn new(
        name: &str,
        kind: QueueKind,
        clock: Arc<GameClock>,
        manager: Weak<ManagerShared>,
    ) -> Self {
        Self {
            shared: Arc::new(QueueShared {
                name: Arc::from(name),
                kind,
                clock,
                pending: Mutex::new(PendingSet::default()),
                detached: AtomicBool::new(false),
                manager,
            }),
        }
    }

    /// The queue's name.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Whether the queue is permanent or transient.
    pub fn kind(&self) -> QueueKind {
        self.shared.kind
    }

    /// Current game time of the owning manager.
    pub fn now(&self) -> GameTime {
        self.shared.clock.now()
    }

    /// Whether the queue has been removed from its manager.
    pub fn is_detached(&self) -> bool {
        self.shared.detached.load(Ordering::Acquire)
    }

    /// Schedule `event` to fire `duration` minutes from now.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidDuration`] if `duration` is zero,
    /// [`SchedulerError::QueueDetached`] if the queue was removed, or
    /// [`SchedulerError::ClockOverflow`] if the target time overflows.
    pub fn add<E>(&self, event: E, duration: u64) -> Result<EventRef, SchedulerError>
    where
        E: Event + 'static,
    {
        if duration == 0 {
            return Err(SchedulerError::InvalidDuration { duration });
        }
        if self.is_detached() {
            return Err(SchedulerError::QueueDetached {
                name: self.name().to_owned(),
            });
        }

        let registered_at = self.now();
        let due = registered_at.plus(duration)?;
        let entry = Arc::new(EntryShared {
            event: Mutex::new(Box::new(event)),
            state: AtomicU8::new(STATE_PENDING),
            registered_at,
            duration,
            scheduled_at: AtomicU64::new(due.0),
        });

        self.shared.pending.lock().push(due, Arc::clone(&entry));
        debug!(queue = %self.shared.name, %registered_at, %due, duration, "Event scheduled");

        Ok(EventRef {
            entry,
            queue_name: Arc::clone(&self.shared.name),
        })
    }

    /// Number of live pending entries.
    ///
    /// Cancelled entries that have not been purged yet are not counted.
    pub fn len(&self) -> usize {
        self.shared
            .pending
            .lock()
            .heap
            .iter()
            .filter(|Reverse(scheduled)| scheduled.entry.state() == STATE_PENDING)
            .count()
    }

    /// Whether the queue has no live pending entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scheduled time of the earliest live pending entry.
    pub fn next_due(&self) -> Option<GameTime> {
        self.shared
            .pending
            .lock()
            .heap
            .iter()
            .filter(|Reverse(scheduled)| scheduled.entry.state() == STATE_PENDING)
            .map(|Reverse(scheduled)| scheduled.due)
            .min()
    }

    /// Remove a transient queue: cancel every pending entry and detach
    /// from the manager.
    ///
    /// Outstanding [`EventRef`]s to those entries report
    /// [`EventRef::is_cancelled`], and a later [`EventRef::cancel`] on them
    /// returns [`SchedulerError::AlreadyCancelled`]. Owners that may outlive
    /// the queue should drop their references or use a [`Holder`], whose
    /// `cancel` tolerates already-cancelled entries.
    ///
    /// [`Holder`]: crate::holder::Holder
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::PermanentQueue`] for a permanent queue and
    /// [`SchedulerError::QueueDetached`] if it was already removed.
    pub fn remove(&self) -> Result<(), SchedulerError> {
        if self.shared.kind == QueueKind::Permanent {
            return Err(SchedulerError::PermanentQueue {
                name: self.name().to_owned(),
            });
        }
        if self.shared.detached.swap(true, Ordering::AcqRel) {
            return Err(SchedulerError::QueueDetached {
                name: self.name().to_owned(),
            });
        }

        let drained: Vec<Scheduled> = {
            let mut pending = self.shared.pending.lock();
            core::mem::take(&mut pending.heap)
                .into_iter()
                .map(|Reverse(scheduled)| scheduled)
                .collect()
        };
        let cleared = drained
            .iter()
            .filter(|scheduled| scheduled.entry.cancel() == STATE_PENDING)
            .count();

        if let Some(manager) = self.shared.manager.upgrade() {
            manager.detach(&self.shared);
        }
        info!(queue = %self.shared.name, cleared, "Queue removed");
        Ok(())
    }

    /// Whether `shared` is this queue's state.
    pub(crate) fn is(&self, shared: &QueueShared) -> bool {
        core::ptr::eq(Arc::as_ptr(&self.shared), shared)
    }

    /// Fire every entry whose scheduled time is at or before `now`, in
    /// non-decreasing scheduled-time order.
    ///
    /// A repeating entry whose next scheduled time is still at or before
    /// `now` fires again within the same call.
    pub(crate) fn run_due(&self, now: GameTime, summary: &mut AdvanceSummary) {
        loop {
            // The heap lock is released before the body runs.
            let next = self.shared.pending.lock().pop_due(now);
            let Some(scheduled) = next else {
                break;
            };

            if scheduled.entry.state() == STATE_CANCELLED {
                summary.record_purged();
                continue;
            }

            let outcome = match invoke(&scheduled.entry) {
                Invocation::Returned(outcome) => outcome,
                Invocation::Failed(err) => {
                    warn!(queue = %self.shared.name, due = %scheduled.due, %err, "Event failed");
                    summary.record_failed();
                    EventOutcome::Done
                }
                Invocation::Panicked(message) => {
                    error!(queue = %self.shared.name, due = %scheduled.due, reason = %message, "Event panicked");
                    summary.record_failed();
                    EventOutcome::Done
                }
            };
            summary.record_fired();
            debug!(queue = %self.shared.name, due = %scheduled.due, ?outcome, "Event fired");

            if outcome.is_repeat() {
                self.reschedule(&scheduled, summary);
            } else {
                scheduled.entry.complete();
            }
        }
    }

    /// Re-insert a repeating entry at `previous due + duration`.
    fn reschedule(&self, scheduled: &Scheduled, summary: &mut AdvanceSummary) {
        let entry = &scheduled.entry;
        if entry.state() != STATE_PENDING {
            return;
        }
        if self.is_detached() {
            entry.cancel();
            return;
        }
        match scheduled.due.plus(entry.duration) {
            Ok(due) => {
                entry.scheduled_at.store(due.0, Ordering::Release);
                self.shared.pending.lock().push(due, Arc::clone(entry));
                summary.record_repeated();
            }
            Err(err) => {
                warn!(queue = %self.shared.name, %err, "Repeating event cannot be rescheduled");
                entry.complete();
            }
        }
    }
}

impl fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventQueue")
            .field("name", &self.shared.name)
            .field("kind", &self.shared.kind)
            .field("detached", &self.is_detached())
            .finish_non_exhaustive()
    }
}

/// Run one entry's event, converting panics into [`Invocation::Panicked`].
fn invoke(entry: &EntryShared) -> Invocation {
    let mut event = entry.event.lock();
    match panic::catch_unwind(AssertUnwindSafe(|| event.execute())) {
        Ok(Ok(outcome)) => Invocation::Returned(outcome),
        Ok(Err(err)) => Invocation::Failed(err),
        Err(payload) => Invocation::Panicked(panic_message(payload.as_ref())),
    }
}

/// Best-effort extraction of a panic payload's message.
fn panic_message(payload: &(dyn core::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::sync::atomic::AtomicU32;

    use super::*;
    use crate::event;
    use crate::manager::EventManager;

    fn counter() -> Arc<AtomicU32> {
        Arc::new(AtomicU32::new(0))
    }

    fn count_once(hits: &Arc<AtomicU32>) -> impl Event + 'static {
        let hits = Arc::clone(hits);
        event::once(move || {
            hits.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn zero_duration_is_rejected() {
        let manager = EventManager::new(GameTime::ZERO);
        let queue = manager.create_queue("decay", QueueKind::Permanent).unwrap();
        let err = queue.add(event::once(|| {}), 0).unwrap_err();
        assert_eq!(err, SchedulerError::InvalidDuration { duration: 0 });
        assert!(queue.is_empty());
    }

    #[test]
    fn event_fires_only_once_due() {
        let manager = EventManager::new(GameTime::ZERO);
        let queue = manager.create_queue("decay", QueueKind::Permanent).unwrap();
        let hits = counter();
        queue.add(count_once(&hits), 10).unwrap();

        manager.advance(5).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(queue.len(), 1);

        manager.advance(5).unwrap();
        assert_eq!(manager.now(), GameTime(10));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn schedule_is_relative_to_now() {
        let manager = EventManager::new(GameTime(100));
        let queue = manager.create_queue("shop", QueueKind::Permanent).unwrap();
        let reference = queue.add(event::once(|| {}), 30).unwrap();
        assert_eq!(reference.registered_at(), GameTime(100));
        assert_eq!(reference.scheduled_at(), GameTime(130));
        assert_eq!(queue.next_due(), Some(GameTime(130)));
    }

    #[test]
    fn cancelled_entry_never_fires() {
        let manager = EventManager::new(GameTime::ZERO);
        let queue = manager.create_queue("light", QueueKind::Permanent).unwrap();
        let hits = counter();
        let reference = queue.add(count_once(&hits), 3).unwrap();

        reference.cancel().unwrap();
        assert!(reference.is_cancelled());
        assert!(!reference.is_pending());
        assert_eq!(queue.len(), 0);

        let summary = manager.advance(10).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(summary.purged_cancelled, 1);
        assert_eq!(summary.fired, 0);
    }

    #[test]
    fn double_cancel_is_an_error() {
        let manager = EventManager::new(GameTime::ZERO);
        let queue = manager.create_queue("light", QueueKind::Permanent).unwrap();
        let reference = queue.add(event::once(|| {}), 3).unwrap();
        reference.cancel().unwrap();
        assert_eq!(reference.cancel(), Err(SchedulerError::AlreadyCancelled));
    }

    #[test]
    fn completed_entry_reports_not_pending() {
        let manager = EventManager::new(GameTime::ZERO);
        let queue = manager.create_queue("repair", QueueKind::Permanent).unwrap();
        let reference = queue.add(event::once(|| {}), 2).unwrap();
        manager.advance(2).unwrap();
        assert!(!reference.is_pending());
        assert!(!reference.is_cancelled());
        // A completed entry is already inert; cancelling it once is allowed.
        reference.cancel().unwrap();
        assert!(reference.is_cancelled());
    }

    #[test]
    fn entries_fire_in_scheduled_order() {
        let manager = EventManager::new(GameTime::ZERO);
        let queue = manager.create_queue("order", QueueKind::Permanent).unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));

        for (label, duration) in [("c", 9_u64), ("a", 2), ("late", 20), ("b", 5), ("a2", 2)] {
            let log = Arc::clone(&log);
            queue
                .add(event::once(move || log.lock().push(label)), duration)
                .unwrap();
        }

        manager.advance(10).unwrap();
        assert_eq!(*log.lock(), vec!["a", "a2", "b", "c"]);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn repeat_uses_previous_scheduled_time() {
        let manager = EventManager::new(GameTime::ZERO);
        let queue = manager.create_queue("tick", QueueKind::Permanent).unwrap();
        let fired_at = Arc::new(Mutex::new(Vec::new()));
        let clock_queue = queue.clone();
        let log = Arc::clone(&fired_at);
        let reference = queue
            .add(event::repeating(move || {
                log.lock().push(clock_queue.now());
                true
            }), 4)
            .unwrap();

        // Advances that overshoot the schedule must not drift the period.
        manager.advance(5).unwrap();
        manager.advance(5).unwrap();
        manager.advance(3).unwrap();
        assert_eq!(
            *fired_at.lock(),
            vec![GameTime(5), GameTime(10), GameTime(13)]
        );
        assert_eq!(reference.scheduled_at(), GameTime(16));
        assert!(reference.is_pending());
    }

    #[test]
    fn repeating_entry_catches_up_within_one_advance() {
        let manager = EventManager::new(GameTime::ZERO);
        let queue = manager.create_queue("tick", QueueKind::Permanent).unwrap();
        let hits = counter();
        let counted = Arc::clone(&hits);
        queue
            .add(event::repeating(move || {
                counted.fetch_add(1, Ordering::SeqCst);
                true
            }), 3)
            .unwrap();

        let summary = manager.advance(10).unwrap();
        // Due at 3, 6 and 9; the next slot (12) is after now.
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert_eq!(summary.fired, 3);
        assert_eq!(summary.repeated, 3);
        assert_eq!(queue.next_due(), Some(GameTime(12)));
    }

    #[test]
    fn repeat_interleaves_with_other_entries() {
        let manager = EventManager::new(GameTime::ZERO);
        let queue = manager.create_queue("mix", QueueKind::Permanent).unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));

        let repeat_log = Arc::clone(&log);
        let tick_queue = queue.clone();
        queue
            .add(event::repeating(move || {
                repeat_log.lock().push(("tick", tick_queue.now()));
                true
            }), 2)
            .unwrap();
        let once_log = Arc::clone(&log);
        queue
            .add(event::once(move || once_log.lock().push(("once", GameTime(3)))), 3)
            .unwrap();

        manager.advance(5).unwrap();
        let labels: Vec<&str> = log.lock().iter().map(|(label, _)| *label).collect();
        assert_eq!(labels, vec!["tick", "once", "tick"]);
    }

    #[test]
    fn cancelling_inside_body_stops_repeat() {
        let manager = EventManager::new(GameTime::ZERO);
        let queue = manager.create_queue("self", QueueKind::Permanent).unwrap();
        let slot: Arc<Mutex<Option<EventRef>>> = Arc::new(Mutex::new(None));
        let hits = counter();

        let own = Arc::clone(&slot);
        let counted = Arc::clone(&hits);
        let reference = queue
            .add(event::repeating(move || {
                counted.fetch_add(1, Ordering::SeqCst);
                if let Some(me) = own.lock().as_ref() {
                    me.cancel().unwrap();
                }
                true
            }), 1)
            .unwrap();
        *slot.lock() = Some(reference.clone());

        manager.advance(5).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(reference.is_cancelled());
        assert!(queue.is_empty());
    }

    #[test]
    fn events_added_during_execution_wait_for_a_later_advance() {
        let manager = EventManager::new(GameTime::ZERO);
        let queue = manager.create_queue("chain", QueueKind::Permanent).unwrap();
        let hits = counter();

        let follow_up_queue = queue.clone();
        let follow_up_hits = Arc::clone(&hits);
        queue
            .add(event::once(move || {
                let hits = Arc::clone(&follow_up_hits);
                follow_up_queue
                    .add(event::once(move || {
                        hits.fetch_add(1, Ordering::SeqCst);
                    }), 1)
                    .unwrap();
            }), 1)
            .unwrap();

        manager.advance(10).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(queue.next_due(), Some(GameTime(11)));

        manager.advance(1).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failing_event_does_not_stop_others() {
        let manager = EventManager::new(GameTime::ZERO);
        let queue = manager.create_queue("faulty", QueueKind::Permanent).unwrap();
        let hits = counter();

        let failing = queue
            .add(|| -> Result<EventOutcome, EventError> { Err(EventError::new("broken")) }, 1)
            .unwrap();
        queue
            .add(|| -> Result<EventOutcome, EventError> { panic!("boom") }, 1)
            .unwrap();
        queue.add(count_once(&hits), 2).unwrap();

        let summary = manager.advance(2).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.fired, 3);
        assert!(!failing.is_pending());
        assert!(queue.is_empty());
    }

    #[test]
    fn permanent_queue_cannot_be_removed() {
        let manager = EventManager::new(GameTime::ZERO);
        let queue = manager.create_queue("world", QueueKind::Permanent).unwrap();
        assert_eq!(
            queue.remove(),
            Err(SchedulerError::PermanentQueue {
                name: "world".to_owned()
            })
        );
        assert_eq!(manager.queue_count(), 1);
    }

    #[test]
    fn transient_queue_removal_clears_entries() {
        let manager = EventManager::new(GameTime::ZERO);
        let queue = manager.create_queue("duel", QueueKind::Transient).unwrap();
        let hits = counter();
        let reference = queue.add(count_once(&hits), 2).unwrap();

        queue.remove().unwrap();
        assert!(reference.is_cancelled());
        assert!(queue.is_empty());
        assert!(queue.is_detached());
        assert_eq!(manager.queue_count(), 0);

        manager.advance(5).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        assert!(matches!(
            queue.add(event::once(|| {}), 1),
            Err(SchedulerError::QueueDetached { .. })
        ));
        assert!(matches!(queue.remove(), Err(SchedulerError::QueueDetached { .. })));
    }

    #[test]
    fn references_outliving_a_removed_queue_read_as_cancelled() {
        let manager = EventManager::new(GameTime::ZERO);
        let queue = manager.create_queue("fair", QueueKind::Transient).unwrap();
        let hits = counter();
        let direct = queue.add(count_once(&hits), 3).unwrap();
        let held = queue.add(count_once(&hits), 4).unwrap();
        let holder = crate::holder::Holder::new();
        holder.set(held).unwrap();

        queue.remove().unwrap();

        assert!(!direct.is_pending());
        assert_eq!(direct.cancel(), Err(SchedulerError::AlreadyCancelled));
        assert!(!holder.is_holding());
        holder.cancel();
        assert!(holder.current().is_none());
    }
}
