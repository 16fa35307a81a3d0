//! The process-wide authority for current game time.
//!
//! An [`EventManager`] holds the game clock and the queues it drives.
//! Advancing time by a delta moves the clock forward first, then runs
//! every owned queue (in creation order) so each fires all entries whose
//! scheduled time has arrived.
//!
//! # Concurrency
//!
//! The model is single-writer and cooperative: no background thread
//! drives time. A tick driver calls [`EventManager::advance`]
//! synchronously and every queue finishes executing before it returns.
//! Concurrent `advance` calls from different threads are serialized by
//! an advance lock; calling `advance` from inside an event body of the
//! same manager is rejected with [`SchedulerError::ReentrantAdvance`].
//!
//! Managers are passed explicitly to the components that need them.
//! There are no process-wide queues, so independent simulations (tests
//! included) never share state.

use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::error::SchedulerError;
use crate::queue::{EventQueue, QueueKind, QueueShared};
use crate::time::{GameClock, GameTime};

/// Counters describing one call to [`EventManager::advance`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdvanceSummary {
    /// Game time after the advance.
    pub now: GameTime,
    /// Event bodies invoked (including failed ones).
    pub fired: u64,
    /// Entries rescheduled because their event asked to repeat.
    pub repeated: u64,
    /// Event bodies that returned an error or panicked.
    pub failed: u64,
    /// Cancelled entries discarded without running.
    pub purged_cancelled: u64,
}

impl AdvanceSummary {
    pub(crate) const fn record_fired(&mut self) {
        self.fired = self.fired.saturating_add(1);
    }

    pub(crate) const fn record_repeated(&mut self) {
        self.repeated = self.repeated.saturating_add(1);
    }

    pub(crate) const fn record_failed(&mut self) {
        self.failed = self.failed.saturating_add(1);
    }

    pub(crate) const fn record_purged(&mut self) {
        self.purged_cancelled = self.purged_cancelled.saturating_add(1);
    }
}

/// State shared by every handle to one manager.
pub(crate) struct ManagerShared {
    /// The game clock, also shared with every queue.
    clock: Arc<GameClock>,
    /// Owned queues in creation order.
    queues: Mutex<Vec<EventQueue>>,
    /// Serializes `advance` across threads.
    advance_lock: Mutex<()>,
    /// Thread currently inside `advance`, for re-entrancy detection.
    advancing: Mutex<Option<ThreadId>>,
}

impl ManagerShared {
    /// Drop `queue` from the set driven by `advance`.
    pub(crate) fn detach(&self, queue: &QueueShared) {
        self.queues.lock().retain(|owned| !owned.is(queue));
    }
}

/// Holder of current game time and the queues it drives.
///
/// Cloning the handle shares the manager.
#[derive(Clone)]
pub struct EventManager {
    /// Shared manager state.
    shared: Arc<ManagerShared>,
}

impl EventManager {
    /// Create a manager whose clock starts at `epoch`.
    pub fn new(epoch: GameTime) -> Self {
        info!(%epoch, "Event manager initialized");
        Self {
            shared: Arc::new(ManagerShared {
                clock: Arc::new(GameClock::new(epoch)),
                queues: Mutex::new(Vec::new()),
                advance_lock: Mutex::new(()),
                advancing: Mutex::new(None),
            }),
        }
    }

    /// Current game time.
    pub fn now(&self) -> GameTime {
        self.shared.clock.now()
    }

    /// Create a queue driven by this manager.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::DuplicateQueue`] if a queue with the same
    /// name is already registered.
    pub fn create_queue(&self, name: &str, kind: QueueKind) -> Result<EventQueue, SchedulerError> {
        let mut queues = self.shared.queues.lock();
        if queues.iter().any(|queue| queue.name() == name) {
            return Err(SchedulerError::DuplicateQueue {
                name: name.to_owned(),
            });
        }
        let queue = EventQueue::new(
            name,
            kind,
            Arc::clone(&self.shared.clock),
            Arc::downgrade(&self.shared),
        );
        queues.push(queue.clone());
        debug!(queue = name, ?kind, "Queue created");
        Ok(queue)
    }

    /// Look up a registered queue by name.
    pub fn queue(&self, name: &str) -> Option<EventQueue> {
        self.shared
            .queues
            .lock()
            .iter()
            .find(|queue| queue.name() == name)
            .cloned()
    }

    /// Number of queues currently driven by this manager.
    pub fn queue_count(&self) -> usize {
        self.shared.queues.lock().len()
    }

    /// Advance game time by `delta` minutes and fire everything now due.
    ///
    /// The clock moves first; then each queue runs in creation order.
    /// Failures inside event bodies are logged and counted in the returned
    /// summary; they never stop other entries from firing.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidDelta`] if `delta` is zero,
    /// [`SchedulerError::ClockOverflow`] if the clock would overflow, or
    /// [`SchedulerError::ReentrantAdvance`] if called from inside an event
    /// body of this manager.
    pub fn advance(&self, delta: u64) -> Result<AdvanceSummary, SchedulerError> {
        if delta == 0 {
            return Err(SchedulerError::InvalidDelta);
        }
        let current = thread::current().id();
        if *self.shared.advancing.lock() == Some(current) {
            return Err(SchedulerError::ReentrantAdvance);
        }

        let _guard = self.shared.advance_lock.lock();
        *self.shared.advancing.lock() = Some(current);
        let result = self.run_queues(delta);
        *self.shared.advancing.lock() = None;
        result
    }

    /// Move the clock and run every queue. Caller holds the advance lock.
    fn run_queues(&self, delta: u64) -> Result<AdvanceSummary, SchedulerError> {
        let now = self.shared.clock.advance(delta)?;
        let mut summary = AdvanceSummary {
            now,
            ..AdvanceSummary::default()
        };

        // Snapshot so bodies can create or remove queues while we run.
        let queues: Vec<EventQueue> = self.shared.queues.lock().clone();
        for queue in &queues {
            queue.run_due(now, &mut summary);
        }

        debug!(
            %now,
            delta,
            fired = summary.fired,
            repeated = summary.repeated,
            failed = summary.failed,
            purged = summary.purged_cancelled,
            "Advanced game clock"
        );
        Ok(summary)
    }
}

impl core::fmt::Debug for EventManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventManager")
            .field("now", &self.now())
            .field("queues", &self.queue_count())
            .finish()
    }
}
