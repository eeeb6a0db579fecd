//! Entity behaviors built on the engine core.
//!
//! - [`player`] – the player character: movement, jumping, hits, pickups, death
//! - [`patroller`] – an enemy walking back and forth until stomped
//! - [`hud`] – bus subscriber mirroring score and health for the UI
//!
//! The names below are the shared vocabulary between behaviors, level setup
//! and the UI.

pub mod hud;
pub mod patroller;
pub mod player;

/// Bus event: a star was picked up. Payload `Count(1)`.
pub const STAR_COLLECTED: &str = "star-collected";
/// Bus event: player health changed. Payload `Number(new health)`.
pub const HEALTH_CHANGED: &str = "health-changed";
/// Bus event: the player touched spikes.
pub const SPIKE_HIT: &str = "spike-hit";
/// Bus event: the player landed on a snowman. Payload `Entity(snowman)`.
pub const SNOWMAN_STOMPED: &str = "snowman-stomped";
/// Bus event: the player is dead and the run is over.
pub const GAME_OVER: &str = "game-over";

pub const SPIKES_OBSTACLE: &str = "spikes";
pub const SNOWMAN_OBSTACLE: &str = "snowman";

pub const STAR_TAG: &str = "collectible:star";
pub const HEALTH_TAG: &str = "collectible:health";
