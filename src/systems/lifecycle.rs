//! Entity teardown.
//!
//! Despawning a behavior-driven entity has to release everything that still
//! refers to it from outside the ECS. [`despawn_actor`] does it in one
//! synchronous step:
//!
//! 1. the behavior's own [`teardown`](crate::components::actor::Behavior::teardown)
//! 2. every bus subscription owned by the entity
//! 3. its pending delayed calls
//! 4. its obstacle registrations
//! 5. the entity itself
//!
//! Behaviors cannot despawn from inside a hook; they queue the request and
//! [`process_despawns`] carries it out later in the same tick.

use bevy_ecs::prelude::*;
use log::{debug, info};

use crate::components::actor::Actor;
use crate::resources::delayedcalls::DelayedCalls;
use crate::resources::eventbus::EventBus;
use crate::resources::obstacles::ObstacleRegistry;

/// Despawn requests queued during the tick.
#[derive(Resource, Debug, Default)]
pub struct PendingDespawns {
    queue: Vec<Entity>,
}

impl PendingDespawns {
    /// Queue `entity` once; repeated requests are merged.
    pub fn request(&mut self, entity: Entity) {
        if !self.queue.contains(&entity) {
            self.queue.push(entity);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn take(&mut self) -> Vec<Entity> {
        std::mem::take(&mut self.queue)
    }
}

/// Tear down and despawn `entity`. Returns `false` if it no longer exists.
pub fn despawn_actor(world: &mut World, entity: Entity) -> bool {
    if world.get_entity(entity).is_err() {
        debug!("despawn {entity:?}: already gone");
        return false;
    }

    if let Some(mut actor) = world.get_mut::<Actor>(entity) {
        actor.behavior.teardown();
    }
    let subscriptions = world.resource::<EventBus>().unsubscribe_owner(entity);
    let calls = world.resource_mut::<DelayedCalls>().cancel_owner(entity);
    let obstacles = world.resource_mut::<ObstacleRegistry>().remove_body(entity);
    world.despawn(entity);

    info!(
        "despawned {entity:?} ({subscriptions} subscription(s), {calls} delayed call(s), {obstacles} obstacle name(s))"
    );
    true
}

/// Carry out every queued despawn request.
pub fn process_despawns(world: &mut World) {
    let queued = world.resource_mut::<PendingDespawns>().take();
    for entity in queued {
        despawn_actor(world, entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::eventbus::{Payload, subscriber};

    fn world() -> World {
        let mut world = World::new();
        world.insert_resource(EventBus::new());
        world.insert_resource(DelayedCalls::new());
        world.insert_resource(ObstacleRegistry::new());
        world.insert_resource(PendingDespawns::default());
        world
    }

    #[test]
    fn test_despawn_releases_everything_owned() {
        let mut world = world();
        let doomed = world.spawn_empty().id();
        let survivor = world.spawn_empty().id();

        let bus = world.resource::<EventBus>().clone();
        bus.subscribe("x", subscriber(|_| {}), Some(doomed));
        bus.subscribe("x", subscriber(|_| {}), Some(survivor));
        world.resource_mut::<DelayedCalls>().schedule(doomed, 1.0, "later");
        world
            .resource_mut::<ObstacleRegistry>()
            .register("spikes", doomed)
            .unwrap();

        assert!(despawn_actor(&mut world, doomed));

        assert!(world.get_entity(doomed).is_err());
        assert_eq!(bus.subscriber_count("x"), 1);
        assert_eq!(bus.publish("x", Payload::Empty), 1);
        assert!(world.resource::<DelayedCalls>().is_empty());
        assert!(world.resource::<ObstacleRegistry>().is_empty());

        assert!(!despawn_actor(&mut world, doomed));
    }

    #[test]
    fn test_process_despawns_merges_duplicates() {
        let mut world = world();
        let e = world.spawn_empty().id();
        {
            let mut pending = world.resource_mut::<PendingDespawns>();
            pending.request(e);
            pending.request(e);
        }

        process_despawns(&mut world);

        assert!(world.get_entity(e).is_err());
        assert!(world.resource::<PendingDespawns>().is_empty());
    }
}
