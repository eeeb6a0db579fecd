//! ECS resources shared across systems and behaviors.
//!
//! - [`delayedcalls`] – one-shot calls scheduled against an owner entity
//! - [`eventbus`] – publish/subscribe bus for cross-entity notifications
//! - [`gameconfig`] – INI-backed tuning values
//! - [`input`] – per-tick action state written by the host
//! - [`listenererrors`] – sink for failing collision listeners
//! - [`obstacles`] – semantic obstacle names to bodies
//! - [`worldtime`] – simulation clock

pub mod delayedcalls;
pub mod eventbus;
pub mod gameconfig;
pub mod input;
pub mod listenererrors;
pub mod obstacles;
pub mod worldtime;
