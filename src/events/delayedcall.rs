//! Delayed call expiration events.
//!
//! When a call scheduled in
//! [`DelayedCalls`](crate::resources::delayedcalls::DelayedCalls) comes due, a
//! [`DelayedCallEvent`] is triggered. The
//! [`delayed_call_observer`](crate::systems::delayedcalls::delayed_call_observer)
//! hands the signal to the owner's behavior, or logs and drops it if the owner
//! no longer exists.

use bevy_ecs::prelude::*;

#[derive(Event, Debug, Clone, PartialEq)]
pub struct DelayedCallEvent {
    /// The entity that scheduled the call.
    pub entity: Entity,
    /// Behavior-defined signal name, e.g. `"game-over"`.
    pub signal: String,
}
