//! ECS components and the per-entity engines they carry.
//!
//! Submodules overview:
//! - [`actor`] – the [`Actor`](actor::Actor) component and the [`Behavior`](actor::Behavior) trait
//! - [`collisionrouter`] – fan-out of contacts to any-contact, obstacle and tag listeners
//! - [`label`] – human-readable entity name
//! - [`mapposition`] – world-space position of a body
//! - [`statemachine`] – finite-state engine with enter/update/exit hooks

pub mod actor;
pub mod collisionrouter;
pub mod label;
pub mod mapposition;
pub mod statemachine;
