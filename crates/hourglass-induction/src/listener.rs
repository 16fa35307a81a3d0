//! The response path from inductions to the actor.
//!
//! The scheduler has no user-facing surface. Everything an actor is told
//! about its inductions goes through an [`InductionListener`], which the
//! actor's owner turns into player-visible text.

use tracing::{info, warn};

use crate::ids::ActorId;
use crate::instance::{Failure, Instance, Response};

/// Receives the outcome of every induction iteration for one actor.
///
/// Calls happen after the slot has been updated, so a listener may start
/// a follow-up induction on the same manager.
pub trait InductionListener: Send + Sync {
    /// An iteration completed successfully.
    fn completed(&self, actor: ActorId, instance: &Instance, response: Response);

    /// An iteration reported a domain failure.
    fn failed(&self, actor: ActorId, instance: &Instance, failure: Failure);

    /// An active induction was interrupted.
    fn interrupted(&self, actor: ActorId, instance: &Instance, response: Option<Response>) {
        let _ = (actor, instance, response);
    }
}

/// Listener that records every outcome as a structured log event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingListener;

impl InductionListener for TracingListener {
    fn completed(&self, actor: ActorId, instance: &Instance, response: Response) {
        info!(
            %actor,
            induction = %instance.id(),
            slot = %instance.descriptor().slot(),
            response = response.text(),
            "Induction completed"
        );
    }

    fn failed(&self, actor: ActorId, instance: &Instance, failure: Failure) {
        warn!(
            %actor,
            induction = %instance.id(),
            slot = %instance.descriptor().slot(),
            reason = failure.reason(),
            "Induction failed"
        );
    }

    fn interrupted(&self, actor: ActorId, instance: &Instance, response: Option<Response>) {
        info!(
            %actor,
            induction = %instance.id(),
            response = response.as_ref().map(Response::text),
            "Induction interrupted"
        );
    }
}
