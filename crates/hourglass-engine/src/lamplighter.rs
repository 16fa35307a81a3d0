//! The town lamplighter, an NPC driven entirely by inductions.
//!
//! At dusk the lamplighter starts a repeating active induction that lights
//! one street lamp per iteration. Once every lamp burns, the next
//! iteration reports a failure, which ends the rounds. If dawn arrives
//! first, the rounds are interrupted and the lamplighter heads home.

use std::sync::Arc;

use hourglass_core::{DayPeriod, EventQueue, GameTime};
use hourglass_induction::{
    ActorId, Descriptor, Failure, Induction, InductionError, InductionManager, Instance, Response,
    TracingListener,
};
use tracing::{debug, warn};

/// Number of street lamps in town.
pub const LAMP_COUNT: u32 = 6;

/// Game minutes needed to light one lamp.
pub const MINUTES_PER_LAMP: u64 = 15;

/// One evening's rounds.
struct Rounds {
    /// Lamps on the route.
    lamps: u32,
    /// Lamps lit so far.
    lit: u32,
}

impl Induction for Rounds {
    fn complete(&mut self) -> Result<Response, Failure> {
        if self.lit >= self.lamps {
            return Err(Failure::new("every lamp is already lit"));
        }
        self.lit = self.lit.saturating_add(1);
        Ok(Response::new(format!("lamp {} of {} lit", self.lit, self.lamps)))
    }

    fn interrupt(&mut self) -> Option<Response> {
        Some(Response::new(format!(
            "the lamplighter heads home with {} of {} lamps lit",
            self.lit, self.lamps
        )))
    }
}

/// NPC that lights the town's lamps every evening.
#[derive(Debug)]
pub struct Lamplighter {
    /// The lamplighter's induction slots.
    manager: InductionManager,
    /// Timing of the rounds.
    rounds: Arc<Descriptor>,
    /// Lamps on the route.
    lamps: u32,
}

impl Lamplighter {
    /// Create a lamplighter whose rounds are scheduled on `queue`.
    pub fn new(queue: EventQueue, lamps: u32, minutes_per_lamp: u64) -> Self {
        Self {
            manager: InductionManager::new(ActorId::new(), queue, Arc::new(TracingListener)),
            rounds: Descriptor::builder()
                .period(minutes_per_lamp)
                .repeating()
                .spinner()
                .build(),
            lamps,
        }
    }

    /// The lamplighter's induction manager.
    pub const fn manager(&self) -> &InductionManager {
        &self.manager
    }

    /// React to a day-period change.
    pub fn on_period(&self, period: DayPeriod, now: GameTime) {
        match period {
            DayPeriod::Dusk => self.begin_rounds(now),
            DayPeriod::Dawn | DayPeriod::Day => self.end_rounds(now),
            DayPeriod::Night => {}
        }
    }

    fn begin_rounds(&self, now: GameTime) {
        let rounds = Instance::new(
            Arc::clone(&self.rounds),
            Rounds {
                lamps: self.lamps,
                lit: 0,
            },
        );
        match self.manager.start(rounds) {
            Ok(()) => debug!(%now, lamps = self.lamps, "Lamplighter begins rounds"),
            Err(err @ InductionError::SlotOccupied { .. }) => {
                debug!(%now, %err, "Lamplighter still on last evening's rounds");
            }
            Err(err) => warn!(%now, %err, "Lamplighter cannot begin rounds"),
        }
    }

    fn end_rounds(&self, now: GameTime) {
        if !self.manager.is_active() {
            return;
        }
        if let Err(err) = self.manager.interrupt() {
            warn!(%now, %err, "Lamplighter cannot be called home");
        }
    }
}
