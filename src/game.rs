//! Simulation session.
//!
//! [`Simulation`] owns the ECS [`World`] and the per-tick [`Schedule`] and is
//! the single entry point for hosts: spawn the level, feed input and contacts,
//! call [`Simulation::tick`].
//!
//! # Tick order
//!
//! 1. [`update_world_time`] advances [`WorldTime`] by the scaled delta
//! 2. [`route_contacts`] dispatches this tick's contacts to every actor involved
//! 3. [`update_actors`] runs every state machine
//! 4. [`update_delayed_calls`] fires due delayed calls
//! 5. [`flush_outboxes`] collects render commands, delayed calls and despawns
//! 6. [`process_despawns`] tears down entities queued for removal
//! 7. [`log_render_cmds`] forwards render commands, then message queues advance

use bevy_ecs::observer::Observer;
use bevy_ecs::prelude::*;
use glam::Vec2;
use log::info;
use rustc_hash::FxHashMap;

use crate::components::actor::{Actor, Behavior};
use crate::components::label::Label;
use crate::components::mapposition::MapPosition;
use crate::controllers::hud::{Hud, HudState};
use crate::controllers::patroller::PatrollerController;
use crate::controllers::player::PlayerController;
use crate::controllers::SNOWMAN_OBSTACLE;
use crate::error::{ConfigurationError, ListenerError};
use crate::events::contact::{BodyRef, ContactEvent, Edge, TaggedObject};
use crate::events::render::RenderCmd;
use crate::resources::delayedcalls::DelayedCalls;
use crate::resources::eventbus::EventBus;
use crate::resources::gameconfig::GameConfig;
use crate::resources::input::{Action, InputState};
use crate::resources::listenererrors::ListenerErrors;
use crate::resources::obstacles::ObstacleRegistry;
use crate::resources::worldtime::WorldTime;
use crate::systems::actors::{flush_outboxes, update_actors};
use crate::systems::contacts::{route_contacts, update_contact_messages};
use crate::systems::delayedcalls::{delayed_call_observer, update_delayed_calls};
use crate::systems::lifecycle::{PendingDespawns, despawn_actor, process_despawns};
use crate::systems::render::{RenderJournal, log_render_cmds, update_render_messages};
use crate::systems::time::update_world_time;

pub struct Simulation {
    world: World,
    schedule: Schedule,
    hud: Hud,
    labels: FxHashMap<String, Entity>,
    spawned_patrollers: u64,
}

impl Simulation {
    pub fn new(config: GameConfig) -> Self {
        let mut world = World::new();
        let bus = EventBus::new();

        world.insert_resource(WorldTime::default().with_time_scale(config.time_scale));
        world.insert_resource(bus.clone());
        world.insert_resource(ObstacleRegistry::new());
        world.insert_resource(DelayedCalls::new());
        world.insert_resource(InputState::default());
        world.insert_resource(ListenerErrors::default());
        world.insert_resource(PendingDespawns::default());
        world.insert_resource(RenderJournal::default());
        world.init_resource::<Messages<ContactEvent>>();
        world.init_resource::<Messages<RenderCmd>>();
        let hud = Hud::attach(bus, config.player.max_health);
        world.insert_resource(config);

        world.spawn(Observer::new(delayed_call_observer));
        // Ensure the observer is registered before any system triggers.
        world.flush();

        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                route_contacts,
                update_actors,
                update_delayed_calls,
                flush_outboxes,
                process_despawns,
                log_render_cmds,
                update_contact_messages,
                update_render_messages,
            )
                .chain(),
        );

        Self {
            world,
            schedule,
            hud,
            labels: FxHashMap::default(),
            spawned_patrollers: 0,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn bus(&self) -> EventBus {
        self.world.resource::<EventBus>().clone()
    }

    pub fn config(&self) -> &GameConfig {
        self.world.resource::<GameConfig>()
    }

    pub fn hud(&self) -> HudState {
        self.hud.state()
    }

    pub fn time(&self) -> WorldTime {
        *self.world.resource::<WorldTime>()
    }

    pub fn entity(&self, label: &str) -> Option<Entity> {
        self.labels.get(label).copied()
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.world.get_entity(entity).is_ok()
    }

    pub fn actor(&self, entity: Entity) -> Option<&Actor> {
        self.world.get::<Actor>(entity)
    }

    pub fn listener_errors(&self) -> &[ListenerError] {
        self.world.resource::<ListenerErrors>().errors()
    }

    pub fn render_journal(&self) -> &RenderJournal {
        self.world.resource::<RenderJournal>()
    }

    fn spawn_body(&mut self, label: &str, position: Vec2) -> Entity {
        let entity = self
            .world
            .spawn((Label::new(label), MapPosition { pos: position }))
            .id();
        self.labels.insert(label.to_string(), entity);
        entity
    }

    fn attach_or_despawn<B>(
        &mut self,
        entity: Entity,
        behavior: Result<B, ConfigurationError>,
    ) -> Result<Entity, ConfigurationError>
    where
        B: Behavior,
    {
        match behavior {
            Ok(behavior) => {
                self.world.entity_mut(entity).insert(Actor::new(behavior));
                Ok(entity)
            }
            Err(err) => {
                despawn_actor(&mut self.world, entity);
                Err(err)
            }
        }
    }

    pub fn spawn_player(
        &mut self,
        label: &str,
        position: Vec2,
    ) -> Result<Entity, ConfigurationError> {
        let entity = self.spawn_body(label, position);
        let controller = PlayerController::new(entity, self.config().player, self.bus());
        let entity = self.attach_or_despawn(entity, controller)?;
        info!("spawned player '{label}' {entity:?}");
        Ok(entity)
    }

    /// Spawn a patroller and register it as a `"snowman"` obstacle.
    pub fn spawn_patroller(
        &mut self,
        label: &str,
        position: Vec2,
    ) -> Result<Entity, ConfigurationError> {
        let entity = self.spawn_body(label, position);
        self.spawned_patrollers += 1;
        let seed = self.config().seed.wrapping_add(self.spawned_patrollers);
        let controller =
            PatrollerController::new(entity, self.config().patroller, self.bus(), seed);
        let entity = self.attach_or_despawn(entity, controller)?;
        self.register_obstacle(SNOWMAN_OBSTACLE, entity)?;
        info!("spawned patroller '{label}' {entity:?}");
        Ok(entity)
    }

    /// Spawn a static body registered under obstacle `name`.
    pub fn spawn_obstacle(
        &mut self,
        label: &str,
        name: &str,
        position: Vec2,
    ) -> Result<Entity, ConfigurationError> {
        let entity = self.spawn_body(label, position);
        self.register_obstacle(name, entity)?;
        Ok(entity)
    }

    /// Spawn a body carrying an application object, e.g. a pickup.
    pub fn spawn_object(&mut self, label: &str, object: TaggedObject, position: Vec2) -> Entity {
        let entity = self.spawn_body(label, position);
        self.world.entity_mut(entity).insert(object);
        entity
    }

    /// Spawn a bare body: ground, walls, platforms.
    pub fn spawn_terrain(&mut self, label: &str, position: Vec2) -> Entity {
        self.spawn_body(label, position)
    }

    pub fn register_obstacle(
        &mut self,
        name: &str,
        body: Entity,
    ) -> Result<(), ConfigurationError> {
        self.world
            .resource_mut::<ObstacleRegistry>()
            .register(name, body)
    }

    /// Describe `entity` the way physics would: position and attached object.
    pub fn body_ref(&self, entity: Entity) -> BodyRef {
        let position = self
            .world
            .get::<MapPosition>(entity)
            .map_or(Vec2::ZERO, |p| p.pos);
        let body = BodyRef::new(entity, position);
        match self.world.get::<TaggedObject>(entity) {
            Some(object) => body.with_object(object.clone()),
            None => body,
        }
    }

    pub fn set_position(&mut self, entity: Entity, position: Vec2) {
        if let Some(mut p) = self.world.get_mut::<MapPosition>(entity) {
            p.pos = position;
        }
    }

    /// Queue a raw contact for the next tick.
    pub fn push_contact(&mut self, event: ContactEvent) {
        self.world
            .resource_mut::<Messages<ContactEvent>>()
            .write(event);
    }

    /// Queue a contact between two spawned entities using their current
    /// positions and objects.
    pub fn contact(&mut self, edge: Edge, a: Entity, b: Entity) {
        let event = ContactEvent {
            edge,
            a: self.body_ref(a),
            b: self.body_ref(b),
        };
        self.push_contact(event);
    }

    /// Set the actions held for the next tick.
    pub fn set_input(&mut self, held: &[Action]) {
        self.world.resource_mut::<InputState>().apply_held(held);
    }

    pub fn despawn(&mut self, entity: Entity) -> bool {
        despawn_actor(&mut self.world, entity)
    }

    /// Advance the simulation by `dt` unscaled seconds.
    pub fn tick(&mut self, dt: f32) {
        update_world_time(&mut self.world, dt);
        self.schedule.run(&mut self.world);
        self.world.clear_trackers();
    }
}
