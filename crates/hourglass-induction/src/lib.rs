//! Per-actor induction state machine for the Hourglass world simulation.
//!
//! An induction is an actor action that takes game time to complete
//! (lock-picking, spell-casting, swimming, combat) and that can be
//! interrupted, superseded, or repeated. Each actor owns one
//! [`InductionManager`] with two independent slots:
//!
//! - **active** -- the actor's one voluntary in-progress action;
//! - **primary** -- the actor's one involuntary or environmental state,
//!   which may run alongside an active induction.
//!
//! # Modules
//!
//! - [`descriptor`] -- Immutable [`Descriptor`]: iteration period and
//!   [`InductionFlags`].
//! - [`error`] -- [`InductionError`] for slot contract violations.
//! - [`ids`] -- Strongly-typed [`ActorId`] and [`InductionId`].
//! - [`instance`] -- [`Instance`] and the [`Induction`] behavior trait.
//! - [`listener`] -- [`InductionListener`], the path from completions and
//!   failures to player-visible text.
//! - [`manager`] -- [`InductionManager`], the two-slot state machine.

pub mod descriptor;
pub mod error;
pub mod ids;
pub mod instance;
pub mod listener;
pub mod manager;

// Re-export primary types at crate root for convenience.
pub use descriptor::{Descriptor, DescriptorBuilder, InductionFlags, Slot};
pub use error::InductionError;
pub use ids::{ActorId, InductionId};
pub use instance::{Failure, Induction, Instance, Response};
pub use listener::{InductionListener, TracingListener};
pub use manager::InductionManager;
