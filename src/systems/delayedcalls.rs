//! Delayed call systems.
//!
//! - [`update_delayed_calls`] – advances [`DelayedCalls`] by the tick delta and
//!   triggers a [`DelayedCallEvent`] for every call that came due
//! - [`delayed_call_observer`] – hands the signal to the owner's behavior

use bevy_ecs::prelude::*;
use log::{error, warn};

use crate::components::actor::Actor;
use crate::events::delayedcall::DelayedCallEvent;
use crate::resources::delayedcalls::DelayedCalls;
use crate::resources::worldtime::WorldTime;

pub fn update_delayed_calls(
    world_time: Res<WorldTime>,
    mut calls: ResMut<DelayedCalls>,
    mut commands: Commands,
) {
    for due in calls.advance(world_time.delta) {
        commands.trigger(DelayedCallEvent {
            entity: due.owner,
            signal: due.signal,
        });
    }
}

/// Deliver a due call to its owner.
///
/// Owners are normally cancelled at despawn, so a call for a missing or
/// behavior-less entity only logs a warning.
pub fn delayed_call_observer(trigger: On<DelayedCallEvent>, mut actors: Query<&mut Actor>) {
    let event = trigger.event();
    let Ok(mut actor) = actors.get_mut(event.entity) else {
        warn!(
            "delayed call '{}' for {:?} dropped: no such actor",
            event.signal, event.entity
        );
        return;
    };
    if let Err(err) = actor.behavior.on_delayed(&event.signal) {
        error!("{} {:?}: {err}", actor.behavior.kind(), event.entity);
        panic!("unrecoverable state machine error: {err}");
    }
}
