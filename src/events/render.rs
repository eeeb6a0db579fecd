use bevy_ecs::message::Message;
use bevy_ecs::prelude::Entity;

/// Presentation operations requested by behaviors.
///
/// The engine never renders; these are forwarded to whatever draws the world.
/// Colors are `0xRRGGBB`.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOp {
    PlayAnimation(String),
    /// Only the given axes change.
    SetVelocity { x: Option<f32>, y: Option<f32> },
    SetFlipX(bool),
    /// Flash from white to `color` and back, `repeat` times.
    FlashTint { color: u32, repeat: u32, duration: f32 },
    SetTint(u32),
    /// Shrink vertically to nothing over `duration` seconds.
    Squash { duration: f32 },
}

/// Commands sent *to* the render collaborator.
#[derive(Message, Debug, Clone, PartialEq)]
pub struct RenderCmd {
    pub entity: Entity,
    pub op: RenderOp,
}
