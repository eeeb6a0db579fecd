//! Player behavior.
//!
//! States and what drives them:
//!
//! | state            | entered when                              | leaves to            |
//! |------------------|-------------------------------------------|----------------------|
//! | `Idle`           | start, landing, after any hit             | `Walk`, `Jump`       |
//! | `Walk`           | left or right held while idle             | `Idle`, `Jump`       |
//! | `Jump`           | jump pressed while idle or walking        | `Idle` on landing    |
//! | `SpikeHit`       | contact with a `"spikes"` obstacle        | `Idle` immediately   |
//! | `SnowmanHit`     | side contact with a `"snowman"` obstacle  | `Idle` immediately   |
//! | `SnowmanStomp`   | landing on a `"snowman"` obstacle         | `Idle` immediately   |
//! | `Dead`           | health reaches zero                       | never                |
//!
//! The hit states are transient: their `on_enter` applies the effect and
//! moves on to `Idle` in the same call. Losing the last health point from
//! inside `SpikeHit` therefore chains `SpikeHit -> Idle -> Dead` before the
//! contact dispatch returns.
//!
//! Once dead the player ignores every further contact and publishes
//! [`GAME_OVER`] after `death_delay` seconds.

use std::any::Any;
use std::fmt;

use bevy_ecs::prelude::Entity;
use log::{debug, info};

use crate::components::actor::{Behavior, Driven, Outbox};
use crate::components::collisionrouter::{CollisionRouter, DispatchReport};
use crate::components::statemachine::{HookResult, StateHooks, StateMachine};
use crate::controllers::{
    GAME_OVER, HEALTH_CHANGED, HEALTH_TAG, SNOWMAN_OBSTACLE, SNOWMAN_STOMPED, SPIKE_HIT,
    SPIKES_OBSTACLE, STAR_COLLECTED, STAR_TAG,
};
use crate::error::ConfigurationError;
use crate::events::contact::{Contact, Edge};
use crate::events::render::RenderOp;
use crate::resources::eventbus::{EventBus, Payload};
use crate::resources::gameconfig::PlayerConfig;
use crate::resources::input::InputState;
use crate::resources::listenererrors::ErrorSink;
use crate::resources::obstacles::ObstacleRegistry;

const HIT_FLASH_DURATION: f32 = 0.1;
const HIT_FLASH_REPEAT: u32 = 2;
const SPIKE_TINT: u32 = 0xff0000;
const SNOWMAN_TINT: u32 = 0x00ff00;
const DEAD_TINT: u32 = 0xff0000;

const GAME_OVER_SIGNAL: &str = "game-over";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerState {
    Idle,
    Walk,
    Jump,
    SpikeHit,
    SnowmanHit,
    SnowmanStomp,
    Dead,
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlayerState::Idle => "idle",
            PlayerState::Walk => "walk",
            PlayerState::Jump => "jump",
            PlayerState::SpikeHit => "spike-hit",
            PlayerState::SnowmanHit => "snowman-hit",
            PlayerState::SnowmanStomp => "snowman-stomp",
            PlayerState::Dead => "dead",
        };
        f.write_str(name)
    }
}

/// The snowman last touched, with both x positions at contact time.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SnowmanContact {
    snowman: Entity,
    player_x: f32,
    snowman_x: f32,
}

/// Player data the state hooks work on.
pub struct Player {
    entity: Entity,
    config: PlayerConfig,
    health: f32,
    input: InputState,
    last_snowman: Option<SnowmanContact>,
    contacts_detached: bool,
    bus: EventBus,
    outbox: Outbox,
}

impl Player {
    pub fn health(&self) -> f32 {
        self.health
    }

    fn flash(&mut self, color: u32) {
        self.outbox.render(RenderOp::FlashTint {
            color,
            repeat: HIT_FLASH_REPEAT,
            duration: HIT_FLASH_DURATION,
        });
    }
}

type PlayerMachine = StateMachine<PlayerState, Player>;
type PlayerDriven = Driven<PlayerState, Player>;

/// Clamp and store the new health, tell the HUD, and die at zero.
fn set_health(machine: &mut PlayerMachine, player: &mut Player, health: f32) -> HookResult {
    player.health = health.clamp(0.0, player.config.max_health);
    player
        .bus
        .publish(HEALTH_CHANGED, Payload::Number(player.health));

    if player.health <= 0.0 {
        machine.set_state(player, PlayerState::Dead)?;
    }
    Ok(())
}

fn idle_on_update(machine: &mut PlayerMachine, player: &mut Player, _dt: f32) -> HookResult {
    if player.input.left.active || player.input.right.active {
        machine.set_state(player, PlayerState::Walk)?;
    }
    if player.input.jump.just_pressed {
        machine.set_state(player, PlayerState::Jump)?;
    }
    Ok(())
}

fn walk_on_update(machine: &mut PlayerMachine, player: &mut Player, _dt: f32) -> HookResult {
    let speed = player.config.walk_speed;
    if player.input.left.active {
        player.outbox.render(RenderOp::SetFlipX(true));
        player.outbox.velocity_x(-speed);
    } else if player.input.right.active {
        player.outbox.render(RenderOp::SetFlipX(false));
        player.outbox.velocity_x(speed);
    } else {
        player.outbox.velocity_x(0.0);
        machine.set_state(player, PlayerState::Idle)?;
    }

    if player.input.jump.just_pressed {
        machine.set_state(player, PlayerState::Jump)?;
    }
    Ok(())
}

fn jump_on_update(_machine: &mut PlayerMachine, player: &mut Player, _dt: f32) -> HookResult {
    let speed = player.config.walk_speed;
    if player.input.left.active {
        player.outbox.velocity_x(-speed);
    } else if player.input.right.active {
        player.outbox.velocity_x(speed);
    }
    Ok(())
}

fn spike_hit_on_enter(machine: &mut PlayerMachine, player: &mut Player) -> HookResult {
    player.outbox.velocity_y(-player.config.knockback);
    player.flash(SPIKE_TINT);
    machine.set_state(player, PlayerState::Idle)?;
    let health = player.health - player.config.hit_damage;
    set_health(machine, player, health)
}

fn snowman_hit_on_enter(machine: &mut PlayerMachine, player: &mut Player) -> HookResult {
    let knockback = player.config.knockback;
    match player.last_snowman {
        // pushed away from the snowman
        Some(hit) if hit.player_x < hit.snowman_x => player.outbox.velocity_x(-knockback),
        Some(_) => player.outbox.velocity_x(knockback),
        None => player.outbox.velocity_y(-knockback),
    }
    player.flash(SNOWMAN_TINT);
    machine.set_state(player, PlayerState::Idle)?;
    let health = player.health - player.config.hit_damage;
    set_health(machine, player, health)
}

fn snowman_stomp_on_enter(machine: &mut PlayerMachine, player: &mut Player) -> HookResult {
    player.outbox.velocity_y(-player.config.knockback);
    let payload = match player.last_snowman {
        Some(hit) => Payload::Entity(hit.snowman),
        None => Payload::Empty,
    };
    player.bus.publish(SNOWMAN_STOMPED, payload);
    machine.set_state(player, PlayerState::Idle)
}

fn dead_on_enter(_machine: &mut PlayerMachine, player: &mut Player) -> HookResult {
    info!("player {:?} died", player.entity);
    player.outbox.render(RenderOp::SetTint(DEAD_TINT));
    player.outbox.velocity_y(-player.config.knockback);
    player.outbox.animation("penguin-die");
    player.contacts_detached = true;
    player
        .outbox
        .schedule(player.config.death_delay, GAME_OVER_SIGNAL);
    Ok(())
}

fn build_machine() -> Result<PlayerMachine, ConfigurationError> {
    let mut machine = StateMachine::new("player");
    machine
        .add_state(
            PlayerState::Idle,
            StateHooks::new()
                .on_enter(|_, p: &mut Player| {
                    p.outbox.animation("penguin-idle");
                    Ok(())
                })
                .on_update(idle_on_update),
        )?
        .add_state(
            PlayerState::Walk,
            StateHooks::new()
                .on_enter(|_, p: &mut Player| {
                    p.outbox.animation("penguin-walk");
                    Ok(())
                })
                .on_update(walk_on_update),
        )?
        .add_state(
            PlayerState::Jump,
            StateHooks::new()
                .on_enter(|_, p: &mut Player| {
                    p.outbox.velocity_y(-p.config.jump_velocity);
                    p.outbox.animation("penguin-jump");
                    Ok(())
                })
                .on_update(jump_on_update),
        )?
        .add_state(
            PlayerState::SpikeHit,
            StateHooks::new().on_enter(spike_hit_on_enter),
        )?
        .add_state(
            PlayerState::SnowmanHit,
            StateHooks::new().on_enter(snowman_hit_on_enter),
        )?
        .add_state(
            PlayerState::SnowmanStomp,
            StateHooks::new().on_enter(snowman_stomp_on_enter),
        )?
        .add_state(PlayerState::Dead, StateHooks::new().on_enter(dead_on_enter))?;
    Ok(machine)
}

fn build_router() -> CollisionRouter<PlayerDriven> {
    let mut router = CollisionRouter::new();

    // landing on bare terrain ends a jump
    router.on_any_contact_keyed("landing", Edge::Start, |d: &mut PlayerDriven, c: &Contact| {
        let below = c.other.position.y >= c.this.position.y;
        if c.other.object.is_none() && below && d.is_current_state(&PlayerState::Jump) {
            d.set_state(PlayerState::Idle)?;
        }
        Ok(())
    });

    router.on_obstacle(SPIKES_OBSTACLE, Edge::Start, |d: &mut PlayerDriven, _c: &Contact| {
        d.set_state(PlayerState::SpikeHit)?;
        d.ctx.bus.publish(SPIKE_HIT, Payload::Empty);
        Ok(())
    });

    router.on_obstacle(SNOWMAN_OBSTACLE, Edge::Start, |d: &mut PlayerDriven, c: &Contact| {
        d.ctx.last_snowman = Some(SnowmanContact {
            snowman: c.other.entity,
            player_x: c.this.position.x,
            snowman_x: c.other.position.x,
        });
        if c.this.position.y < c.other.position.y {
            d.set_state(PlayerState::SnowmanStomp)?;
        } else {
            d.set_state(PlayerState::SnowmanHit)?;
        }
        Ok(())
    });

    router.on_tag(STAR_TAG, Edge::Start, |d: &mut PlayerDriven, c: &Contact| {
        d.ctx.bus.publish(STAR_COLLECTED, Payload::Count(1));
        d.ctx.outbox.despawn(c.other.entity);
        Ok(())
    });

    router.on_tag(HEALTH_TAG, Edge::Start, |d: &mut PlayerDriven, c: &Contact| {
        let amount = c
            .other
            .object
            .as_ref()
            .and_then(|o| o.value)
            .unwrap_or(d.ctx.config.health_pickup);
        let health = d.ctx.health + amount;
        set_health(&mut d.machine, &mut d.ctx, health)?;
        d.ctx.outbox.despawn(c.other.entity);
        Ok(())
    });

    router
}

/// Player entity behavior: state machine, contact listeners and health.
pub struct PlayerController {
    router: CollisionRouter<PlayerDriven>,
    driven: PlayerDriven,
}

impl PlayerController {
    /// Build the controller for `entity` and enter `Idle`.
    pub fn new(
        entity: Entity,
        config: PlayerConfig,
        bus: EventBus,
    ) -> Result<Self, ConfigurationError> {
        let player = Player {
            entity,
            config,
            health: config.max_health,
            input: InputState::default(),
            last_snowman: None,
            contacts_detached: false,
            bus,
            outbox: Outbox::default(),
        };
        let mut driven = Driven::new(build_machine()?, player);
        driven.set_state(PlayerState::Idle)?;
        Ok(Self {
            router: build_router(),
            driven,
        })
    }

    pub fn state(&self) -> Option<PlayerState> {
        self.driven.machine.current().copied()
    }

    pub fn machine(&self) -> &PlayerMachine {
        &self.driven.machine
    }

    pub fn health(&self) -> f32 {
        self.driven.ctx.health
    }

    pub fn contacts_detached(&self) -> bool {
        self.driven.ctx.contacts_detached
    }

    pub fn router(&self) -> &CollisionRouter<PlayerDriven> {
        &self.router
    }

    fn detach_if_dead(&mut self) {
        if self.driven.ctx.contacts_detached && self.router.listener_count() > 0 {
            debug!("player {:?}: contacts detached", self.driven.ctx.entity);
            self.router.clear();
        }
    }
}

impl Behavior for PlayerController {
    fn kind(&self) -> &'static str {
        "player"
    }

    fn state_name(&self) -> String {
        self.state().map_or_else(|| "-".to_string(), |s| s.to_string())
    }

    fn update(&mut self, dt: f32, input: &InputState) -> HookResult {
        self.driven.ctx.input = input.clone();
        let result = self.driven.update(dt);
        self.detach_if_dead();
        result
    }

    fn handle_contact(
        &mut self,
        contact: &Contact,
        obstacles: &ObstacleRegistry,
        sink: &mut dyn ErrorSink,
    ) -> DispatchReport {
        let report = self
            .router
            .dispatch(&mut self.driven, contact, obstacles, sink);
        self.detach_if_dead();
        report
    }

    fn on_delayed(&mut self, signal: &str) -> HookResult {
        match signal {
            GAME_OVER_SIGNAL => {
                info!("game over");
                self.driven.ctx.bus.publish(GAME_OVER, Payload::Empty);
            }
            other => debug!("player: ignoring delayed signal '{other}'"),
        }
        Ok(())
    }

    fn outbox(&mut self) -> &mut Outbox {
        &mut self.driven.ctx.outbox
    }

    fn teardown(&mut self) {
        self.router.clear();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
