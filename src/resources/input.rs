//! Per-tick input resource.
//!
//! The host polls its devices and writes the actions the behaviors care about
//! into [`InputState`] before each tick. Behaviors only ever read it.
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Boolean action state for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoolState {
    /// Whether the action is currently held.
    pub active: bool,
    /// Whether the action went down this tick.
    pub just_pressed: bool,
    /// Whether the action went up this tick.
    pub just_released: bool,
}

impl BoolState {
    /// Advance to a new held/not-held reading, deriving the edge flags from
    /// the previous reading.
    pub fn set(&mut self, active: bool) {
        self.just_pressed = active && !self.active;
        self.just_released = !active && self.active;
        self.active = active;
    }
}

/// Actions that drive the controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Left,
    Right,
    Jump,
    Stop,
}

/// Resource capturing the per-tick action state relevant to gameplay.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct InputState {
    pub left: BoolState,
    pub right: BoolState,
    pub jump: BoolState,
    pub stop: BoolState,
}

impl InputState {
    pub fn action(&self, action: Action) -> &BoolState {
        match action {
            Action::Left => &self.left,
            Action::Right => &self.right,
            Action::Jump => &self.jump,
            Action::Stop => &self.stop,
        }
    }

    pub fn action_mut(&mut self, action: Action) -> &mut BoolState {
        match action {
            Action::Left => &mut self.left,
            Action::Right => &mut self.right,
            Action::Jump => &mut self.jump,
            Action::Stop => &mut self.stop,
        }
    }

    /// Apply one tick's reading: every action in `held` is active, every
    /// other action is released.
    pub fn apply_held(&mut self, held: &[Action]) {
        for action in [Action::Left, Action::Right, Action::Jump, Action::Stop] {
            self.action_mut(action).set(held.contains(&action));
        }
    }
}
