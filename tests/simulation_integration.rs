//! Simulation Integration Tests
//!
//! Drive a headless [`Simulation`] tick by tick and check what the host can
//! observe: controller states, the HUD mirror, render commands, despawns and
//! listener failures.
//!
//! # Test Categories
//!
//! 1. **Player movement** - idle, walk and jump from held input
//! 2. **Pickups** - stars and health packs
//! 3. **Hazards** - spikes, death and the delayed game over
//! 4. **Patroller** - stomp, squash and removal
//! 5. **Teardown** - despawn releases subscriptions and delayed calls
//! 6. **Listener failures** - reported and isolated
//! 7. **Scenarios** - the built-in demo end to end
//!
//! Most tests tick at 0.25 s so that delayed calls land on exact tick
//! boundaries.

use std::any::Any;
use std::sync::{Arc, Mutex};

use bevy_ecs::prelude::*;
use glam::Vec2;
use proptest::prelude::*;

use frostbite::components::actor::{Actor, Behavior, Outbox};
use frostbite::components::collisionrouter::{CollisionRouter, DispatchReport};
use frostbite::components::statemachine::HookResult;
use frostbite::controllers::patroller::{PatrollerController, PatrollerState};
use frostbite::controllers::player::{PlayerController, PlayerState};
use frostbite::controllers::{SNOWMAN_STOMPED, SPIKES_OBSTACLE, STAR_COLLECTED, STAR_TAG};
use frostbite::error::ListenerClass;
use frostbite::events::contact::{Contact, Edge, TaggedObject};
use frostbite::events::render::RenderOp;
use frostbite::game::Simulation;
use frostbite::resources::delayedcalls::DelayedCalls;
use frostbite::resources::eventbus::{Payload, subscriber};
use frostbite::resources::gameconfig::GameConfig;
use frostbite::resources::input::{Action, InputState};
use frostbite::resources::listenererrors::ErrorSink;
use frostbite::resources::obstacles::ObstacleRegistry;
use frostbite::scenario::{DEMO_SCENARIO, Scenario};

const DT: f32 = 0.25;

// =============================================================================
// Helpers
// =============================================================================

fn sim() -> Simulation {
    Simulation::new(GameConfig::new())
}

fn player_state(sim: &Simulation, player: Entity) -> Option<PlayerState> {
    sim.actor(player)
        .and_then(|a| a.downcast::<PlayerController>())
        .and_then(|p| p.state())
}

fn player_health(sim: &Simulation, player: Entity) -> f32 {
    sim.actor(player)
        .and_then(|a| a.downcast::<PlayerController>())
        .map_or(f32::NAN, |p| p.health())
}

fn patroller_state(sim: &Simulation, entity: Entity) -> Option<PatrollerState> {
    sim.actor(entity)
        .and_then(|a| a.downcast::<PatrollerController>())
        .and_then(|p| p.state())
}

/// Count publishes of `event` on the simulation's bus.
fn counter(sim: &Simulation, event: &str) -> Arc<Mutex<u32>> {
    let count = Arc::new(Mutex::new(0));
    let c = count.clone();
    sim.bus().subscribe(
        event,
        subscriber(move |_: &Payload| *c.lock().unwrap() += 1),
        None,
    );
    count
}

fn ticks(sim: &mut Simulation, n: usize) {
    for _ in 0..n {
        sim.tick(DT);
    }
}

fn spike_level() -> (Simulation, Entity, Entity) {
    let mut sim = sim();
    let player = sim.spawn_player("penguin", Vec2::ZERO).unwrap();
    let spikes = sim
        .spawn_obstacle("spikes", SPIKES_OBSTACLE, Vec2::new(16.0, 0.0))
        .unwrap();
    (sim, player, spikes)
}

// =============================================================================
// Player movement
// =============================================================================

#[test]
fn test_player_idle_walk_jump_through_ticks() {
    let mut sim = sim();
    let player = sim.spawn_player("penguin", Vec2::ZERO).unwrap();
    assert_eq!(player_state(&sim, player), Some(PlayerState::Idle));

    sim.tick(DT);
    assert_eq!(player_state(&sim, player), Some(PlayerState::Idle));

    sim.set_input(&[Action::Right]);
    sim.tick(DT);
    assert_eq!(player_state(&sim, player), Some(PlayerState::Walk));

    sim.set_input(&[Action::Right, Action::Jump]);
    sim.tick(DT);
    assert_eq!(player_state(&sim, player), Some(PlayerState::Jump));

    let walked = sim
        .render_journal()
        .for_entity(player)
        .any(|op| *op == RenderOp::PlayAnimation("penguin-walk".into()));
    assert!(walked);
}

#[test]
fn test_landing_on_terrain_ends_jump() {
    let mut sim = sim();
    let player = sim.spawn_player("penguin", Vec2::ZERO).unwrap();
    let ground = sim.spawn_terrain("ground", Vec2::new(0.0, 16.0));

    sim.set_input(&[Action::Jump]);
    sim.tick(DT);
    assert_eq!(player_state(&sim, player), Some(PlayerState::Jump));

    sim.set_input(&[]);
    sim.contact(Edge::Start, ground, player);
    sim.tick(DT);
    assert_eq!(player_state(&sim, player), Some(PlayerState::Idle));
}

// =============================================================================
// Pickups
// =============================================================================

#[test]
fn test_star_is_collected_once_and_removed() {
    let mut sim = sim();
    let stars = counter(&sim, STAR_COLLECTED);
    let player = sim.spawn_player("penguin", Vec2::ZERO).unwrap();
    let star = sim.spawn_object("star", TaggedObject::tagged(STAR_TAG), Vec2::new(8.0, 0.0));

    sim.contact(Edge::Start, player, star);
    sim.tick(DT);

    assert!(!sim.is_alive(star));
    assert_eq!(*stars.lock().unwrap(), 1);
    assert_eq!(sim.hud().stars, 1);
    assert_eq!(player_state(&sim, player), Some(PlayerState::Idle));
}

#[test]
fn test_end_edge_does_not_collect() {
    let mut sim = sim();
    let player = sim.spawn_player("penguin", Vec2::ZERO).unwrap();
    let star = sim.spawn_object("star", TaggedObject::tagged(STAR_TAG), Vec2::new(8.0, 0.0));

    sim.contact(Edge::End, player, star);
    sim.tick(DT);

    assert!(sim.is_alive(star));
    assert_eq!(sim.hud().stars, 0);
}

#[test]
fn test_health_pack_heals_up_to_max() {
    let (mut sim, player, spikes) = spike_level();
    let pack = sim.spawn_object(
        "health",
        TaggedObject::tagged("collectible:health").with_value(25.0),
        Vec2::new(-8.0, 0.0),
    );

    sim.contact(Edge::Start, player, spikes);
    sim.tick(DT);
    assert_eq!(player_health(&sim, player), 90.0);

    sim.contact(Edge::Start, player, pack);
    sim.tick(DT);
    assert_eq!(player_health(&sim, player), 100.0);
    assert_eq!(sim.hud().health, 100.0);
    assert!(!sim.is_alive(pack));
}

// =============================================================================
// Hazards
// =============================================================================

#[test]
fn test_spike_hit_damages_flashes_and_counts() {
    let (mut sim, player, spikes) = spike_level();

    sim.contact(Edge::Start, player, spikes);
    sim.tick(DT);

    let hud = sim.hud();
    assert_eq!(hud.health, 90.0);
    assert_eq!(hud.spike_hits, 1);
    assert_eq!(player_state(&sim, player), Some(PlayerState::Idle));

    let flashed = sim
        .render_journal()
        .for_entity(player)
        .any(|op| matches!(op, RenderOp::FlashTint { .. }));
    assert!(flashed);
    assert!(sim.listener_errors().is_empty());
}

#[test]
fn test_death_detaches_contacts_and_ends_game_after_delay() {
    let (mut sim, player, spikes) = spike_level();

    for _ in 0..12 {
        sim.contact(Edge::Start, player, spikes);
        sim.tick(DT);
    }

    assert_eq!(player_state(&sim, player), Some(PlayerState::Dead));
    assert_eq!(player_health(&sim, player), 0.0);
    // hits after death reach no listener
    assert_eq!(sim.hud().spike_hits, 10);
    let controller = sim.actor(player).and_then(|a| a.downcast::<PlayerController>());
    assert!(controller.is_some_and(|c| c.contacts_detached()));
    assert!(controller.is_some_and(|c| c.router().listener_count() == 0));

    // died on tick 10; default death_delay is 1 s = 4 ticks
    sim.tick(DT);
    assert!(!sim.hud().game_over);
    sim.tick(DT);
    assert!(sim.hud().game_over);
    assert!(sim.is_alive(player));
}

#[test]
fn test_game_over_fires_exactly_at_death_delay() {
    let (mut sim, player, spikes) = spike_level();
    let game_over = counter(&sim, frostbite::controllers::GAME_OVER);

    for _ in 0..10 {
        sim.contact(Edge::Start, player, spikes);
        sim.tick(DT);
    }
    assert_eq!(player_state(&sim, player), Some(PlayerState::Dead));

    ticks(&mut sim, 3);
    assert_eq!(*game_over.lock().unwrap(), 0);
    sim.tick(DT);
    assert_eq!(*game_over.lock().unwrap(), 1);
    ticks(&mut sim, 8);
    assert_eq!(*game_over.lock().unwrap(), 1);
}

#[test]
fn test_game_over_on_exact_tick_at_default_rate() {
    let (mut sim, player, spikes) = spike_level();
    let dt = sim.config().tick_delta();
    let ticks_per_second = sim.config().tick_rate as usize;

    for _ in 0..10 {
        sim.contact(Edge::Start, player, spikes);
        sim.tick(dt);
    }
    assert_eq!(player_state(&sim, player), Some(PlayerState::Dead));

    for _ in 0..ticks_per_second - 1 {
        sim.tick(dt);
    }
    assert!(!sim.hud().game_over);
    sim.tick(dt);
    assert!(sim.hud().game_over);
}

// =============================================================================
// Patroller
// =============================================================================

#[test]
fn test_stomp_squashes_and_removes_patroller() {
    let mut sim = sim();
    let stomps = counter(&sim, SNOWMAN_STOMPED);
    let player = sim.spawn_player("penguin", Vec2::new(96.0, 0.0)).unwrap();
    let snowman = sim.spawn_patroller("snowman", Vec2::new(96.0, 16.0)).unwrap();
    assert_eq!(sim.bus().subscriber_count(SNOWMAN_STOMPED), 2);

    sim.contact(Edge::Start, player, snowman);
    sim.tick(DT);

    assert_eq!(*stomps.lock().unwrap(), 1);
    assert_eq!(patroller_state(&sim, snowman), Some(PatrollerState::Die));
    assert_eq!(player_state(&sim, player), Some(PlayerState::Idle));
    assert_eq!(player_health(&sim, player), 100.0);
    // only the test counter is left
    assert_eq!(sim.bus().subscriber_count(SNOWMAN_STOMPED), 1);

    // default squash_delay is 0.5 s = 2 ticks
    sim.tick(DT);
    assert!(sim.is_alive(snowman));
    sim.tick(DT);
    assert!(!sim.is_alive(snowman));
    assert!(sim.world().resource::<ObstacleRegistry>().is_empty());

    let squashed = sim
        .render_journal()
        .for_entity(snowman)
        .any(|op| matches!(op, RenderOp::Squash { .. }));
    assert!(squashed);
}

#[test]
fn test_side_contact_hurts_player_and_spares_patroller() {
    let mut sim = sim();
    let player = sim.spawn_player("penguin", Vec2::new(80.0, 16.0)).unwrap();
    let snowman = sim.spawn_patroller("snowman", Vec2::new(96.0, 16.0)).unwrap();

    sim.contact(Edge::Start, player, snowman);
    sim.tick(DT);

    assert_eq!(player_health(&sim, player), 90.0);
    assert_eq!(sim.hud().spike_hits, 0);
    assert!(matches!(
        patroller_state(&sim, snowman),
        Some(PatrollerState::Left | PatrollerState::Right)
    ));

    let knocked_left = sim.render_journal().for_entity(player).any(|op| {
        matches!(op, RenderOp::SetVelocity { x: Some(x), .. } if *x < 0.0)
    });
    assert!(knocked_left);
}

#[test]
fn test_stomp_only_reaches_the_stomped_patroller() {
    let mut sim = sim();
    let player = sim.spawn_player("penguin", Vec2::new(96.0, 0.0)).unwrap();
    let first = sim.spawn_patroller("snowman-1", Vec2::new(96.0, 16.0)).unwrap();
    let second = sim.spawn_patroller("snowman-2", Vec2::new(200.0, 16.0)).unwrap();

    sim.contact(Edge::Start, player, first);
    sim.tick(DT);

    assert_eq!(patroller_state(&sim, first), Some(PatrollerState::Die));
    assert_ne!(patroller_state(&sim, second), Some(PatrollerState::Die));
}

// =============================================================================
// Teardown
// =============================================================================

#[test]
fn test_despawn_cancels_delayed_calls_and_subscriptions() {
    let (mut sim, player, spikes) = spike_level();
    let snowman = sim.spawn_patroller("snowman", Vec2::new(64.0, 16.0)).unwrap();

    for _ in 0..10 {
        sim.contact(Edge::Start, player, spikes);
        sim.tick(DT);
    }
    assert_eq!(sim.world().resource::<DelayedCalls>().pending_for(player), 1);

    assert!(sim.despawn(player));
    assert!(sim.world().resource::<DelayedCalls>().is_empty());

    assert!(sim.despawn(snowman));
    assert_eq!(sim.bus().subscriber_count(SNOWMAN_STOMPED), 0);
    assert!(!sim.despawn(snowman));

    ticks(&mut sim, 8);
    assert!(!sim.hud().game_over);
    assert!(!sim.is_alive(player));
}

#[test]
fn test_delayed_call_for_destroyed_entity_is_a_noop() {
    let (mut sim, player, spikes) = spike_level();

    for _ in 0..10 {
        sim.contact(Edge::Start, player, spikes);
        sim.tick(DT);
    }
    assert_eq!(sim.world().resource::<DelayedCalls>().pending_for(player), 1);

    // removed behind the engine's back, so the call is never cancelled
    assert!(sim.world_mut().despawn(player));
    assert!(!sim.is_alive(player));

    ticks(&mut sim, 8);
    assert!(!sim.hud().game_over);
    assert!(sim.world().resource::<DelayedCalls>().is_empty());
    assert!(sim.listener_errors().is_empty());
}

#[test]
fn test_despawned_obstacle_stops_matching() {
    let (mut sim, player, spikes) = spike_level();
    assert!(sim.despawn(spikes));

    let other = sim.spawn_terrain("rock", Vec2::new(16.0, 0.0));
    sim.contact(Edge::Start, player, other);
    sim.tick(DT);

    assert_eq!(sim.hud().spike_hits, 0);
    assert_eq!(player_health(&sim, player), 100.0);
}

// =============================================================================
// Listener failures
// =============================================================================

#[derive(Default)]
struct Hits {
    obstacle: u32,
}

/// Behavior whose any-contact listener always fails.
struct Faulty {
    router: CollisionRouter<Hits>,
    hits: Hits,
    outbox: Outbox,
}

impl Faulty {
    fn new() -> Self {
        let mut router = CollisionRouter::new();
        router.on_any_contact(Edge::Start, |_: &mut Hits, _: &Contact| Err("boom".into()));
        router.on_obstacle(SPIKES_OBSTACLE, Edge::Start, |h: &mut Hits, _: &Contact| {
            h.obstacle += 1;
            Ok(())
        });
        Self {
            router,
            hits: Hits::default(),
            outbox: Outbox::default(),
        }
    }
}

impl Behavior for Faulty {
    fn kind(&self) -> &'static str {
        "faulty"
    }

    fn state_name(&self) -> String {
        "-".into()
    }

    fn update(&mut self, _dt: f32, _input: &InputState) -> HookResult {
        Ok(())
    }

    fn handle_contact(
        &mut self,
        contact: &Contact,
        obstacles: &ObstacleRegistry,
        sink: &mut dyn ErrorSink,
    ) -> DispatchReport {
        self.router.dispatch(&mut self.hits, contact, obstacles, sink)
    }

    fn on_delayed(&mut self, _signal: &str) -> HookResult {
        Ok(())
    }

    fn outbox(&mut self) -> &mut Outbox {
        &mut self.outbox
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[test]
fn test_failing_listener_is_reported_and_isolated() {
    let (mut sim, _player, spikes) = spike_level();
    let faulty_body = sim.spawn_terrain("faulty", Vec2::new(16.0, -16.0));
    sim.world_mut().entity_mut(faulty_body).insert(Actor::new(Faulty::new()));

    sim.contact(Edge::Start, faulty_body, spikes);
    sim.tick(DT);

    let errors = sim.listener_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].class, ListenerClass::Any);
    assert_eq!(errors[0].body, faulty_body);
    assert_eq!(errors[0].message, "boom");

    let faulty = sim.actor(faulty_body).and_then(|a| a.downcast::<Faulty>());
    assert_eq!(faulty.map(|f| f.hits.obstacle), Some(1));
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_demo_scenario_end_to_end() {
    let mut sim = sim();
    let scenario: Scenario = DEMO_SCENARIO.parse().unwrap();
    let dt = sim.config().tick_delta();

    let ran = scenario.run(&mut sim, dt).unwrap();
    assert_eq!(ran, scenario.tick_count());

    let hud = sim.hud();
    assert_eq!(hud.stars, 2);
    assert_eq!(hud.health, 0.0);
    assert_eq!(hud.spike_hits, 11);
    assert!(!hud.game_over);

    for label in ["star-1", "star-2", "health-1", "snowman-1"] {
        let entity = sim.entity(label).unwrap();
        assert!(!sim.is_alive(entity), "{label} should be gone");
    }
    let penguin = sim.entity("penguin").unwrap();
    assert_eq!(player_state(&sim, penguin), Some(PlayerState::Dead));

    // one second of death delay, with slack for accumulated rounding
    for _ in 0..(sim.config().tick_rate + 5) {
        sim.tick(dt);
    }
    assert!(sim.hud().game_over);
    assert!(sim.listener_errors().is_empty());
}

#[test]
fn test_scenario_rejects_duplicate_labels() {
    let mut sim = sim();
    let scenario: Scenario = r#"{
        "spawns": [
            { "label": "penguin", "kind": "player" },
            { "label": "penguin", "kind": "terrain" }
        ]
    }"#
    .parse()
    .unwrap();

    let err = scenario.run(&mut sim, DT).unwrap_err();
    assert!(matches!(err, frostbite::error::ScenarioError::DuplicateLabel(l) if l == "penguin"));
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_spike_hits_drain_health_until_death(hits in 0usize..16) {
        let (mut sim, player, spikes) = spike_level();
        for _ in 0..hits {
            sim.contact(Edge::Start, player, spikes);
            sim.tick(DT);
        }

        let expected = (100.0 - 10.0 * hits as f32).max(0.0);
        prop_assert_eq!(player_health(&sim, player), expected);
        prop_assert_eq!(sim.hud().health, expected);
        prop_assert_eq!(sim.hud().spike_hits as usize, hits.min(10));
        prop_assert_eq!(
            player_state(&sim, player) == Some(PlayerState::Dead),
            hits >= 10
        );
    }
}
