//! Behavior-driven entities.
//!
//! An [`Actor`] component holds the boxed [`Behavior`] of one entity: the
//! player, a patrolling enemy, or anything else built from a
//! [`StateMachine`] and a
//! [`CollisionRouter`](crate::components::collisionrouter::CollisionRouter).
//! The actor systems only talk to the trait, so new behaviors need no new
//! systems.
//!
//! Behaviors never touch the world directly. Anything they want done outside
//! their own state goes into their [`Outbox`], which
//! [`flush_outboxes`](crate::systems::actors::flush_outboxes) drains every
//! tick:
//!
//! - render operations become [`RenderCmd`](crate::events::render::RenderCmd) messages
//! - schedule requests become [`DelayedCalls`](crate::resources::delayedcalls::DelayedCalls) entries
//! - despawn requests are queued in [`PendingDespawns`](crate::systems::lifecycle::PendingDespawns)
//!
//! Cross-entity notifications go through the
//! [`EventBus`](crate::resources::eventbus::EventBus) handle a behavior keeps.

use std::any::Any;
use std::fmt;

use bevy_ecs::prelude::{Component, Entity};

use crate::components::collisionrouter::DispatchReport;
use crate::components::statemachine::{HookResult, StateId, StateMachine};
use crate::events::contact::Contact;
use crate::events::render::RenderOp;
use crate::resources::input::InputState;
use crate::resources::listenererrors::ErrorSink;
use crate::resources::obstacles::ObstacleRegistry;

/// Requests queued by a behavior for the systems to carry out.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Outbox {
    pub render: Vec<RenderOp>,
    /// `(delay seconds, signal)` pairs.
    pub schedule: Vec<(f32, String)>,
    pub despawn: Vec<Entity>,
}

impl Outbox {
    pub fn render(&mut self, op: RenderOp) {
        self.render.push(op);
    }

    pub fn velocity_x(&mut self, x: f32) {
        self.render(RenderOp::SetVelocity { x: Some(x), y: None });
    }

    pub fn velocity_y(&mut self, y: f32) {
        self.render(RenderOp::SetVelocity { x: None, y: Some(y) });
    }

    pub fn animation(&mut self, name: &str) {
        self.render(RenderOp::PlayAnimation(name.to_string()));
    }

    pub fn schedule(&mut self, delay: f32, signal: impl Into<String>) {
        self.schedule.push((delay, signal.into()));
    }

    pub fn despawn(&mut self, entity: Entity) {
        self.despawn.push(entity);
    }

    pub fn is_empty(&self) -> bool {
        self.render.is_empty() && self.schedule.is_empty() && self.despawn.is_empty()
    }

    pub fn take(&mut self) -> Outbox {
        std::mem::take(self)
    }
}

/// A state machine together with the context its hooks operate on.
///
/// This is what collision listeners receive: enough to inspect the current
/// state and trigger transitions.
pub struct Driven<S, C> {
    pub machine: StateMachine<S, C>,
    pub ctx: C,
}

impl<S: StateId, C> Driven<S, C> {
    pub fn new(machine: StateMachine<S, C>, ctx: C) -> Self {
        Self { machine, ctx }
    }

    pub fn set_state(&mut self, state: S) -> HookResult {
        self.machine.set_state(&mut self.ctx, state)
    }

    pub fn update(&mut self, dt: f32) -> HookResult {
        self.machine.update(&mut self.ctx, dt)
    }

    pub fn is_current_state(&self, state: &S) -> bool {
        self.machine.is_current_state(state)
    }
}

/// Per-entity behavior driven by the actor systems.
pub trait Behavior: Send + Sync + 'static {
    /// Short behavior name for logs, e.g. `"player"`.
    fn kind(&self) -> &'static str;

    /// Debug rendering of the current state.
    fn state_name(&self) -> String;

    /// Run one tick.
    fn update(&mut self, dt: f32, input: &InputState) -> HookResult;

    /// Handle one contact seen from this entity's side.
    fn handle_contact(
        &mut self,
        contact: &Contact,
        obstacles: &ObstacleRegistry,
        sink: &mut dyn ErrorSink,
    ) -> DispatchReport;

    /// A delayed call scheduled through the outbox came due.
    fn on_delayed(&mut self, signal: &str) -> HookResult;

    fn outbox(&mut self) -> &mut Outbox;

    /// Release everything the behavior holds outside itself. Called once,
    /// right before the entity is despawned.
    fn teardown(&mut self) {}

    fn as_any(&self) -> &dyn Any;
}

#[derive(Component)]
pub struct Actor {
    pub behavior: Box<dyn Behavior>,
}

impl Actor {
    pub fn new(behavior: impl Behavior) -> Self {
        Self {
            behavior: Box::new(behavior),
        }
    }

    /// Borrow the behavior as its concrete type.
    pub fn downcast<B: Behavior>(&self) -> Option<&B> {
        self.behavior.as_any().downcast_ref::<B>()
    }
}

impl fmt::Debug for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actor")
            .field("kind", &self.behavior.kind())
            .field("state", &self.behavior.state_name())
            .finish()
    }
}
