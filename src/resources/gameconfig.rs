//! Game configuration resource.
//!
//! Tuning values for the controllers and the simulation driver, loaded from
//! an INI configuration file. Defaults are safe to run with when the file is
//! missing.
//!
//! # Configuration File Format
//!
//! ```ini
//! [player]
//! max_health = 100
//! walk_speed = 4
//! jump_velocity = 15
//! knockback = 12
//! hit_damage = 10
//! health_pickup = 10
//! death_delay = 1
//!
//! [patroller]
//! speed = 2
//! patrol_duration = 2
//! squash_delay = 0.5
//!
//! [simulation]
//! tick_rate = 60
//! time_scale = 1
//! seed = 42
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::{info, warn};
use std::path::PathBuf;

use crate::error::ConfigFileError;

const DEFAULT_CONFIG_PATH: &str = "./frostbite.ini";

/// Player controller tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerConfig {
    pub max_health: f32,
    pub walk_speed: f32,
    pub jump_velocity: f32,
    /// Velocity applied when bounced by a hit or a stomp.
    pub knockback: f32,
    pub hit_damage: f32,
    /// Health restored by a pickup that carries no value of its own.
    pub health_pickup: f32,
    /// Seconds between dying and `game-over`.
    pub death_delay: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            walk_speed: 4.0,
            jump_velocity: 15.0,
            knockback: 12.0,
            hit_damage: 10.0,
            health_pickup: 10.0,
            death_delay: 1.0,
        }
    }
}

/// Patrolling enemy tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatrollerConfig {
    pub speed: f32,
    /// Seconds spent walking one way before turning around.
    pub patrol_duration: f32,
    /// Seconds between being stomped and being removed.
    pub squash_delay: f32,
}

impl Default for PatrollerConfig {
    fn default() -> Self {
        Self {
            speed: 2.0,
            patrol_duration: 2.0,
            squash_delay: 0.5,
        }
    }
}

/// Game configuration resource.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub player: PlayerConfig,
    pub patroller: PatrollerConfig,
    /// Fixed ticks per second used by the headless runner.
    pub tick_rate: u32,
    pub time_scale: f32,
    /// Seed for behavior randomness (patrol direction).
    pub seed: u64,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn read_f32(ini: &Ini, section: &str, key: &str, target: &mut f32) {
    if let Some(value) = ini.getfloat(section, key).ok().flatten() {
        *target = value as f32;
    }
}

impl GameConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            player: PlayerConfig::default(),
            patroller: PatrollerConfig::default(),
            tick_rate: 60,
            time_scale: 1.0,
            seed: 42,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Fixed tick delta in seconds.
    pub fn tick_delta(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), ConfigFileError> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|reason| ConfigFileError::Load {
                path: self.config_path.clone(),
                reason,
            })?;

        // [player] section
        let player = &mut self.player;
        read_f32(&config, "player", "max_health", &mut player.max_health);
        read_f32(&config, "player", "walk_speed", &mut player.walk_speed);
        read_f32(&config, "player", "jump_velocity", &mut player.jump_velocity);
        read_f32(&config, "player", "knockback", &mut player.knockback);
        read_f32(&config, "player", "hit_damage", &mut player.hit_damage);
        read_f32(&config, "player", "health_pickup", &mut player.health_pickup);
        read_f32(&config, "player", "death_delay", &mut player.death_delay);

        // [patroller] section
        let patroller = &mut self.patroller;
        read_f32(&config, "patroller", "speed", &mut patroller.speed);
        read_f32(&config, "patroller", "patrol_duration", &mut patroller.patrol_duration);
        read_f32(&config, "patroller", "squash_delay", &mut patroller.squash_delay);

        // [simulation] section
        if let Some(rate) = config.getuint("simulation", "tick_rate").ok().flatten() {
            match u32::try_from(rate) {
                Ok(rate) => self.tick_rate = rate,
                Err(_) => warn!(
                    "tick_rate {rate} out of range, keeping {}",
                    self.tick_rate
                ),
            }
        }
        read_f32(&config, "simulation", "time_scale", &mut self.time_scale);
        if let Some(seed) = config.getuint("simulation", "seed").ok().flatten() {
            self.seed = seed;
        }

        info!(
            "Loaded config: max_health={}, hit_damage={}, tick_rate={}, time_scale={}, seed={}",
            self.player.max_health,
            self.player.hit_damage,
            self.tick_rate,
            self.time_scale,
            self.seed
        );

        Ok(())
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), ConfigFileError> {
        let mut config = Ini::new();
        let mut set = |section: &str, key: &str, value: String| {
            config.set(section, key, Some(value));
        };

        let p = &self.player;
        set("player", "max_health", p.max_health.to_string());
        set("player", "walk_speed", p.walk_speed.to_string());
        set("player", "jump_velocity", p.jump_velocity.to_string());
        set("player", "knockback", p.knockback.to_string());
        set("player", "hit_damage", p.hit_damage.to_string());
        set("player", "health_pickup", p.health_pickup.to_string());
        set("player", "death_delay", p.death_delay.to_string());

        let s = &self.patroller;
        set("patroller", "speed", s.speed.to_string());
        set("patroller", "patrol_duration", s.patrol_duration.to_string());
        set("patroller", "squash_delay", s.squash_delay.to_string());

        set("simulation", "tick_rate", self.tick_rate.to_string());
        set("simulation", "time_scale", self.time_scale.to_string());
        set("simulation", "seed", self.seed.to_string());

        config
            .write(&self.config_path)
            .map_err(|source| ConfigFileError::Save {
                path: self.config_path.clone(),
                source,
            })?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }
}
