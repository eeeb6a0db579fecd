//! Actor update and outbox flushing.
//!
//! - [`update_actors`] runs every behavior's state machine for the tick
//! - [`flush_outboxes`] moves what behaviors queued into the ECS: render
//!   commands, delayed calls and despawn requests

use bevy_ecs::prelude::*;
use log::{error, trace};

use crate::components::actor::Actor;
use crate::events::render::RenderCmd;
use crate::resources::delayedcalls::DelayedCalls;
use crate::resources::input::InputState;
use crate::resources::worldtime::WorldTime;
use crate::systems::lifecycle::PendingDespawns;

/// Update every actor with the scaled tick delta and the current input.
///
/// A transition to an unregistered state is a wiring bug that leaves the
/// behavior in an undefined state, so it stops the simulation.
pub fn update_actors(
    mut actors: Query<(Entity, &mut Actor)>,
    input: Res<InputState>,
    time: Res<WorldTime>,
) {
    for (entity, mut actor) in actors.iter_mut() {
        if let Err(err) = actor.behavior.update(time.delta, &input) {
            error!("{} {entity:?}: {err}", actor.behavior.kind());
            panic!("unrecoverable state machine error: {err}");
        }
    }
}

pub fn flush_outboxes(
    mut actors: Query<(Entity, &mut Actor)>,
    mut render: MessageWriter<RenderCmd>,
    mut calls: ResMut<DelayedCalls>,
    mut despawns: ResMut<PendingDespawns>,
) {
    for (entity, mut actor) in actors.iter_mut() {
        let outbox = actor.behavior.outbox();
        if outbox.is_empty() {
            continue;
        }
        let outbox = outbox.take();
        trace!(
            "flush {entity:?}: {} render, {} scheduled, {} despawn",
            outbox.render.len(),
            outbox.schedule.len(),
            outbox.despawn.len()
        );
        render.write_batch(outbox.render.into_iter().map(|op| RenderCmd { entity, op }));
        for (delay, signal) in outbox.schedule {
            calls.schedule(entity, delay, signal);
        }
        for target in outbox.despawn {
            despawns.request(target);
        }
    }
}
