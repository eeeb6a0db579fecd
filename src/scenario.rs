//! Scripted scenarios for the headless runner.
//!
//! A scenario is a JSON document listing the bodies of a level and a sequence
//! of frames. Each frame sets the held actions and the contacts physics
//! reports for one tick, optionally repeated for several ticks.
//!
//! ```json
//! {
//!   "spawns": [
//!     { "label": "penguin", "kind": "player", "position": [0, 0] },
//!     { "label": "ground", "kind": "terrain", "position": [0, 16] },
//!     { "label": "star", "kind": { "object": { "tag": "collectible:star" } } }
//!   ],
//!   "frames": [
//!     { "hold": ["right"], "repeat": 10 },
//!     { "contacts": [ { "a": "penguin", "b": "star" } ] }
//!   ]
//! }
//! ```
//!
//! Contacts name bodies by label. A contact with a body that has already been
//! despawned is dropped, the same way physics stops reporting destroyed
//! bodies.

use std::path::Path;
use std::str::FromStr;

use glam::Vec2;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::ScenarioError;
use crate::events::contact::{ContactEvent, Edge, TaggedObject};
use crate::game::Simulation;
use crate::resources::input::Action;

/// Built-in demo level: walk, grab a star and a health pack, stomp a
/// snowman, then run into spikes until the penguin dies.
pub const DEMO_SCENARIO: &str = r#"{
  "spawns": [
    { "label": "penguin", "kind": "player", "position": [0, 0] },
    { "label": "ground", "kind": "terrain", "position": [0, 16] },
    { "label": "star-1", "kind": { "object": { "tag": "collectible:star" } }, "position": [32, 0] },
    { "label": "star-2", "kind": { "object": { "tag": "collectible:star" } }, "position": [48, 0] },
    { "label": "health-1", "kind": { "object": { "tag": "collectible:health", "value": 25 } }, "position": [64, 0] },
    { "label": "snowman-1", "kind": "patroller", "position": [96, 16] },
    { "label": "spikes-1", "kind": { "obstacle": { "name": "spikes" } }, "position": [128, 16] }
  ],
  "frames": [
    { "hold": ["right"], "repeat": 20 },
    { "hold": ["right"], "contacts": [ { "a": "penguin", "b": "star-1" } ] },
    { "hold": ["right"], "repeat": 10 },
    { "hold": ["right"], "contacts": [ { "a": "penguin", "b": "star-2" } ] },
    { "hold": ["right", "jump"] },
    { "hold": ["right"], "repeat": 20 },
    { "contacts": [ { "a": "ground", "b": "penguin" } ] },
    { "contacts": [ { "a": "penguin", "b": "snowman-1", "a_position": [96, 0] } ] },
    { "repeat": 40 },
    { "contacts": [ { "a": "penguin", "b": "spikes-1" } ] },
    { "contacts": [ { "a": "penguin", "b": "spikes-1", "edge": "end" } ] },
    { "repeat": 5 },
    { "contacts": [ { "a": "penguin", "b": "health-1" } ] },
    { "contacts": [ { "a": "penguin", "b": "spikes-1" } ], "repeat": 12 }
  ]
}"#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpawnKind {
    Player,
    Patroller,
    Terrain,
    Obstacle { name: String },
    Object(TaggedObject),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spawn {
    pub label: String,
    pub kind: SpawnKind,
    #[serde(default)]
    pub position: Vec2,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioContact {
    #[serde(default)]
    pub edge: Edge,
    pub a: String,
    pub b: String,
    /// Overrides the body's stored position for this contact.
    #[serde(default)]
    pub a_position: Option<Vec2>,
    #[serde(default)]
    pub b_position: Option<Vec2>,
}

fn one() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(default)]
    pub hold: Vec<Action>,
    #[serde(default)]
    pub contacts: Vec<ScenarioContact>,
    /// Number of ticks this frame lasts. Contacts are reported on each.
    #[serde(default = "one")]
    pub repeat: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub spawns: Vec<Spawn>,
    #[serde(default)]
    pub frames: Vec<Frame>,
}

impl FromStr for Scenario {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(serde_json::from_str(s)?)
    }
}

impl Scenario {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        text.parse()
    }

    pub fn tick_count(&self) -> u64 {
        self.frames.iter().map(|f| u64::from(f.repeat)).sum()
    }

    /// Spawn every body into `sim`. Labels must be unique.
    pub fn spawn_into(&self, sim: &mut Simulation) -> Result<(), ScenarioError> {
        for spawn in &self.spawns {
            if sim.entity(&spawn.label).is_some() {
                return Err(ScenarioError::DuplicateLabel(spawn.label.clone()));
            }
            let label = spawn.label.as_str();
            match &spawn.kind {
                SpawnKind::Player => {
                    sim.spawn_player(label, spawn.position)?;
                }
                SpawnKind::Patroller => {
                    sim.spawn_patroller(label, spawn.position)?;
                }
                SpawnKind::Terrain => {
                    sim.spawn_terrain(label, spawn.position);
                }
                SpawnKind::Obstacle { name } => {
                    sim.spawn_obstacle(label, name, spawn.position)?;
                }
                SpawnKind::Object(object) => {
                    sim.spawn_object(label, object.clone(), spawn.position);
                }
            }
        }
        info!("scenario spawned {} bodies", self.spawns.len());
        Ok(())
    }

    /// Check that every contact names a spawned label.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let known = |label: &str| self.spawns.iter().any(|s| s.label == label);
        for contact in self.frames.iter().flat_map(|f| &f.contacts) {
            for label in [&contact.a, &contact.b] {
                if !known(label.as_str()) {
                    return Err(ScenarioError::UnknownLabel(label.clone()));
                }
            }
        }
        Ok(())
    }

    /// Spawn the level and play every frame at a fixed `dt`. Returns the
    /// number of ticks run.
    pub fn run(&self, sim: &mut Simulation, dt: f32) -> Result<u64, ScenarioError> {
        self.validate()?;
        self.spawn_into(sim)?;

        let mut ticks = 0;
        for frame in &self.frames {
            for _ in 0..frame.repeat {
                sim.set_input(&frame.hold);
                for contact in &frame.contacts {
                    push_contact(sim, contact)?;
                }
                sim.tick(dt);
                ticks += 1;
            }
        }
        Ok(ticks)
    }
}

fn push_contact(sim: &mut Simulation, contact: &ScenarioContact) -> Result<(), ScenarioError> {
    let lookup = |label: &str| {
        sim.entity(label)
            .ok_or_else(|| ScenarioError::UnknownLabel(label.to_string()))
    };
    let a = lookup(contact.a.as_str())?;
    let b = lookup(contact.b.as_str())?;
    if !sim.is_alive(a) || !sim.is_alive(b) {
        debug!("contact {} <-> {} dropped: body despawned", contact.a, contact.b);
        return Ok(());
    }

    let mut event = ContactEvent {
        edge: contact.edge,
        a: sim.body_ref(a),
        b: sim.body_ref(b),
    };
    if let Some(pos) = contact.a_position {
        event.a.position = pos;
    }
    if let Some(pos) = contact.b_position {
        event.b.position = pos;
    }
    sim.push_contact(event);
    Ok(())
}
