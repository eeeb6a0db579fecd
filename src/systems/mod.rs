//! Per-tick systems, in the order [`Simulation`](crate::game::Simulation)
//! runs them.
//!
//! - [`time`] – advance the world clock
//! - [`contacts`] – route physics contacts to actors
//! - [`actors`] – update behaviors and flush their outboxes
//! - [`delayedcalls`] – fire due delayed calls
//! - [`lifecycle`] – tear down despawned actors
//! - [`render`] – forward render commands

pub mod actors;
pub mod contacts;
pub mod delayedcalls;
pub mod lifecycle;
pub mod render;
pub mod time;
