//! Patrolling enemy ("snowman") behavior.
//!
//! The patroller walks left or right at a constant speed and turns around
//! every `patrol_duration` seconds. Its first direction is picked at random
//! when it enters `Idle`.
//!
//! The player reports stomps on the bus rather than touching the patroller
//! directly. The patroller subscribes to [`SNOWMAN_STOMPED`] with itself as
//! owner; the subscriber forwards stomps aimed at this entity to an inbox
//! channel that is drained at the start of the next update. A stomped
//! patroller stops, drops its subscription, squashes and asks to be removed
//! after `squash_delay` seconds.

use std::any::Any;
use std::fmt;

use bevy_ecs::prelude::Entity;
use crossbeam_channel::{Receiver, Sender, unbounded};
use fastrand::Rng;
use log::{debug, info};

use crate::components::actor::{Behavior, Driven, Outbox};
use crate::components::collisionrouter::DispatchReport;
use crate::components::statemachine::{HookResult, StateHooks, StateMachine};
use crate::controllers::SNOWMAN_STOMPED;
use crate::error::ConfigurationError;
use crate::events::contact::Contact;
use crate::events::render::RenderOp;
use crate::resources::eventbus::{EventBus, Payload, SubscriptionId, subscriber};
use crate::resources::gameconfig::PatrollerConfig;
use crate::resources::input::InputState;
use crate::resources::listenererrors::ErrorSink;
use crate::resources::obstacles::ObstacleRegistry;

const REMOVE_SIGNAL: &str = "remove";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatrollerState {
    Idle,
    Left,
    Right,
    Die,
}

impl fmt::Display for PatrollerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PatrollerState::Idle => "idle",
            PatrollerState::Left => "left",
            PatrollerState::Right => "right",
            PatrollerState::Die => "die",
        };
        f.write_str(name)
    }
}

pub struct Patroller {
    entity: Entity,
    config: PatrollerConfig,
    rng: Rng,
    action_time: f32,
    outbox: Outbox,
}

type PatrollerMachine = StateMachine<PatrollerState, Patroller>;
type PatrollerDriven = Driven<PatrollerState, Patroller>;

fn walk_on_enter(
    animation: &'static str,
) -> impl Fn(&mut PatrollerMachine, &mut Patroller) -> HookResult {
    move |_, p| {
        p.action_time = 0.0;
        p.outbox.animation(animation);
        Ok(())
    }
}

fn walk_on_update(
    direction: f32,
    next: PatrollerState,
) -> impl Fn(&mut PatrollerMachine, &mut Patroller, f32) -> HookResult {
    move |machine, p, dt| {
        p.action_time += dt;
        p.outbox.velocity_x(direction * p.config.speed);
        if p.action_time > p.config.patrol_duration {
            machine.set_state(p, next)?;
        }
        Ok(())
    }
}

fn build_machine() -> Result<PatrollerMachine, ConfigurationError> {
    let mut machine = StateMachine::new("patroller");
    machine
        .add_state(
            PatrollerState::Idle,
            StateHooks::new().on_enter(|machine, p: &mut Patroller| {
                p.outbox.animation("idle");
                let next = if p.rng.bool() {
                    PatrollerState::Left
                } else {
                    PatrollerState::Right
                };
                machine.set_state(p, next)
            }),
        )?
        .add_state(
            PatrollerState::Left,
            StateHooks::new()
                .on_enter(walk_on_enter("move-left"))
                .on_update(walk_on_update(-1.0, PatrollerState::Right)),
        )?
        .add_state(
            PatrollerState::Right,
            StateHooks::new()
                .on_enter(walk_on_enter("move-right"))
                .on_update(walk_on_update(1.0, PatrollerState::Left)),
        )?
        .add_state(
            PatrollerState::Die,
            StateHooks::new().on_enter(|_, p: &mut Patroller| {
                info!("patroller {:?} stomped", p.entity);
                p.outbox.render(RenderOp::SetVelocity {
                    x: Some(0.0),
                    y: Some(0.0),
                });
                p.outbox.render(RenderOp::Squash {
                    duration: p.config.squash_delay,
                });
                p.outbox.schedule(p.config.squash_delay, REMOVE_SIGNAL);
                Ok(())
            }),
        )?;
    Ok(machine)
}

/// Patrolling enemy behavior.
pub struct PatrollerController {
    driven: PatrollerDriven,
    bus: EventBus,
    stomp_subscription: Option<SubscriptionId>,
    stomps: Receiver<Entity>,
}

impl PatrollerController {
    /// Build the controller for `entity`, subscribe to stomps and enter
    /// `Idle`, which immediately picks a direction.
    pub fn new(
        entity: Entity,
        config: PatrollerConfig,
        bus: EventBus,
        seed: u64,
    ) -> Result<Self, ConfigurationError> {
        let (tx, rx): (Sender<Entity>, Receiver<Entity>) = unbounded();
        let stomp_subscription = bus.subscribe(
            SNOWMAN_STOMPED,
            subscriber(move |payload: &Payload| {
                if payload.as_entity() == Some(entity) && tx.send(entity).is_err() {
                    debug!("patroller {entity:?}: stomp inbox closed, stomp dropped");
                }
            }),
            Some(entity),
        );

        let patroller = Patroller {
            entity,
            config,
            rng: Rng::with_seed(seed),
            action_time: 0.0,
            outbox: Outbox::default(),
        };
        let mut driven = Driven::new(build_machine()?, patroller);
        driven.set_state(PatrollerState::Idle)?;

        Ok(Self {
            driven,
            bus,
            stomp_subscription: Some(stomp_subscription),
            stomps: rx,
        })
    }

    pub fn state(&self) -> Option<PatrollerState> {
        self.driven.machine.current().copied()
    }

    pub fn is_subscribed(&self) -> bool {
        self.stomp_subscription.is_some()
    }

    fn unsubscribe(&mut self) {
        if let Some(id) = self.stomp_subscription.take() {
            self.bus.unsubscribe(id);
        }
    }

    fn handle_stomps(&mut self) -> HookResult {
        let stomped = self.stomps.try_iter().count() > 0;
        if stomped && !self.driven.is_current_state(&PatrollerState::Die) {
            self.unsubscribe();
            self.driven.set_state(PatrollerState::Die)?;
        }
        Ok(())
    }
}

impl Behavior for PatrollerController {
    fn kind(&self) -> &'static str {
        "patroller"
    }

    fn state_name(&self) -> String {
        self.state().map_or_else(|| "-".to_string(), |s| s.to_string())
    }

    fn update(&mut self, dt: f32, _input: &InputState) -> HookResult {
        self.handle_stomps()?;
        self.driven.update(dt)
    }

    /// Patrollers react to stomps through the bus, not to their own
    /// contacts.
    fn handle_contact(
        &mut self,
        _contact: &Contact,
        _obstacles: &ObstacleRegistry,
        _sink: &mut dyn ErrorSink,
    ) -> DispatchReport {
        DispatchReport::default()
    }

    fn on_delayed(&mut self, signal: &str) -> HookResult {
        match signal {
            REMOVE_SIGNAL => {
                let entity = self.driven.ctx.entity;
                self.driven.ctx.outbox.despawn(entity);
            }
            other => debug!("patroller: ignoring delayed signal '{other}'"),
        }
        Ok(())
    }

    fn outbox(&mut self) -> &mut Outbox {
        &mut self.driven.ctx.outbox
    }

    fn teardown(&mut self) {
        self.unsubscribe();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
