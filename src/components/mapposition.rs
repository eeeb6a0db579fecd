use bevy_ecs::prelude::Component;
use glam::Vec2;

/// World-space position of a body as last reported by physics.
///
/// `y` grows downwards: a body with a smaller `y` is above one with a larger
/// `y`.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct MapPosition {
    pub pos: Vec2,
}

impl MapPosition {
    pub fn new(x: f32, y: f32) -> Self {
        Self { pos: Vec2::new(x, y) }
    }
}
