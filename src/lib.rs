//! Frostbite entity-behavior engine.
//!
//! Per-entity state machines driven by a fixed tick, collision routing from
//! raw physics contacts to named listeners, and a publish/subscribe bus for
//! everything that crosses entity boundaries. Built on `bevy_ecs`; physics,
//! rendering and input devices stay outside and talk to the engine through
//! messages and resources.
//!
//! - [`components`] – state machine, collision router, actors
//! - [`controllers`] – player, patroller and HUD behaviors
//! - [`events`] – contact, render and delayed-call messages
//! - [`resources`] – event bus, obstacle registry, delayed calls, config, input
//! - [`systems`] – the per-tick systems
//! - [`game`] – the [`Simulation`](game::Simulation) session
//! - [`scenario`] – scripted scenarios for the headless runner

pub mod components;
pub mod controllers;
pub mod error;
pub mod events;
pub mod game;
pub mod resources;
pub mod scenario;
pub mod systems;
