//! Integration tests for the induction state machine.
//!
//! These drive inductions through a real [`EventManager`] the way the
//! action layer does: lock-picking as a repeating active induction,
//! combat as a primary one running alongside it.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use hourglass_core::{EventManager, GameTime, QueueKind};
use hourglass_induction::{
    ActorId, Descriptor, Failure, Induction, InductionError, InductionListener, InductionManager,
    Instance, Response, Slot,
};
use parking_lot::Mutex;

#[derive(Default)]
struct Outcomes {
    completed: Mutex<Vec<String>>,
    failed: Mutex<Vec<String>>,
}

impl InductionListener for Outcomes {
    fn completed(&self, _actor: ActorId, _instance: &Instance, response: Response) {
        self.completed.lock().push(response.text().to_owned());
    }

    fn failed(&self, _actor: ActorId, _instance: &Instance, failure: Failure) {
        self.failed.lock().push(failure.reason().to_owned());
    }
}

/// Lock-picking: succeeds twice, then the pick breaks.
struct PickLock {
    attempts: Arc<AtomicU32>,
}

impl Induction for PickLock {
    fn complete(&mut self) -> Result<Response, Failure> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt >= 2 {
            return Err(Failure::new("your pick snaps"));
        }
        Ok(Response::new("a tumbler clicks"))
    }
}

/// Combat round: always lands.
struct Combat;

impl Induction for Combat {
    fn complete(&mut self) -> Result<Response, Failure> {
        Ok(Response::new("you trade blows"))
    }
}

fn actor() -> (EventManager, InductionManager, Arc<Outcomes>) {
    let events = EventManager::new(GameTime::from_minutes(480));
    let queue = events.create_queue("inductions", QueueKind::Permanent).unwrap();
    let outcomes = Arc::new(Outcomes::default());
    let listener: Arc<dyn InductionListener> = Arc::clone(&outcomes) as _;
    let manager = InductionManager::new(ActorId::new(), queue, listener);
    (events, manager, outcomes)
}

#[test]
fn repeating_active_stops_after_reported_failure() {
    let (events, manager, outcomes) = actor();
    let attempts = Arc::new(AtomicU32::new(0));
    let descriptor = Descriptor::builder().period(3).repeating().spinner().build();
    let pick = Instance::new(
        descriptor,
        PickLock {
            attempts: Arc::clone(&attempts),
        },
    );
    manager.start(Arc::clone(&pick)).unwrap();

    for _ in 0..3 {
        events.advance(3).unwrap();
    }

    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert_eq!(outcomes.completed.lock().len(), 2);
    assert_eq!(*outcomes.failed.lock(), vec!["your pick snaps"]);
    assert!(!manager.is_active());
    assert!(!pick.is_scheduled());

    events.advance(3).unwrap();
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[test]
fn primary_and_active_coexist_but_not_two_primaries() {
    let (events, manager, outcomes) = actor();
    let combat = Descriptor::builder().period(2).repeating().primary().build();

    let fight = Instance::new(Arc::clone(&combat), Combat);
    manager.start(Arc::clone(&fight)).unwrap();

    let pick = Instance::new(
        Descriptor::builder().period(5).build(),
        PickLock {
            attempts: Arc::new(AtomicU32::new(0)),
        },
    );
    manager.start(pick).unwrap();
    assert!(manager.is_primary());
    assert!(manager.is_active());

    let second_fight = Instance::new(combat, Combat);
    let err = manager.start(second_fight).unwrap_err();
    assert!(matches!(
        err,
        InductionError::SlotOccupied {
            slot: Slot::Primary,
            ..
        }
    ));
    assert!(Arc::ptr_eq(&manager.primary().unwrap(), &fight));

    events.advance(6).unwrap();
    // Combat rounds at +2, +4, +6; the pick finishes at +5.
    let completed = outcomes.completed.lock();
    assert_eq!(completed.iter().filter(|r| *r == "you trade blows").count(), 3);
    assert_eq!(completed.iter().filter(|r| *r == "a tumbler clicks").count(), 1);
    assert!(manager.is_primary());
    assert!(!manager.is_active());
}

#[test]
fn interrupting_pick_leaves_combat_running() {
    let (events, manager, outcomes) = actor();
    manager
        .start(Instance::new(
            Descriptor::builder().period(4).repeating().primary().build(),
            Combat,
        ))
        .unwrap();
    manager
        .start(Instance::new(
            Descriptor::builder().period(10).build(),
            PickLock {
                attempts: Arc::new(AtomicU32::new(0)),
            },
        ))
        .unwrap();

    events.advance(4).unwrap();
    manager.interrupt().unwrap();
    assert!(!manager.is_active());
    assert!(manager.is_primary());

    events.advance(8).unwrap();
    assert_eq!(*outcomes.completed.lock(), vec!["you trade blows"; 3]);

    manager.stop().unwrap();
    assert_eq!(
        manager.stop().unwrap_err(),
        InductionError::PrimarySlotEmpty {
            actor: manager.actor()
        }
    );
}

#[test]
fn stale_instance_cannot_be_updated_after_interrupt() {
    let (_events, manager, _outcomes) = actor();
    let pick = Instance::new(
        Descriptor::builder().build(),
        PickLock {
            attempts: Arc::new(AtomicU32::new(0)),
        },
    );
    manager.start(Arc::clone(&pick)).unwrap();
    manager.interrupt().unwrap();

    assert_eq!(
        manager.update(&pick).unwrap_err(),
        InductionError::NotOccupant {
            induction: pick.id(),
            slot: Slot::Active,
        }
    );
}
