//! Contact messages delivered by the physics collaborator.
//!
//! The physics layer reports every pair of bodies whose shapes start or stop
//! touching as a [`ContactEvent`]. The engine needs only a stable identity per
//! body, its position at contact time, and the optional [`TaggedObject`]
//! attached to it.
//!
//! [`route_contacts`](crate::systems::contacts::route_contacts) turns each
//! event into one [`Contact`] per participating actor, seen from that actor's
//! side, and hands it to the actor's
//! [`CollisionRouter`](crate::components::collisionrouter::CollisionRouter).

use bevy_ecs::message::Message;
use bevy_ecs::prelude::{Component, Entity};
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Begin-touching or stop-touching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    #[default]
    Start,
    End,
}

/// Application object attached to a body.
///
/// `tag` answers "what kind of thing is this" (`"star"`, `"health"`);
/// `value` carries an optional amount such as the health restored by a
/// pickup. Either may be absent.
#[derive(Component, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaggedObject {
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub value: Option<f32>,
}

impl TaggedObject {
    pub fn tagged(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            value: None,
        }
    }

    pub fn with_value(mut self, value: f32) -> Self {
        self.value = Some(value);
        self
    }
}

/// One participant of a contact.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyRef {
    pub entity: Entity,
    pub position: Vec2,
    /// Attached object, if the body has one.
    pub object: Option<TaggedObject>,
}

impl BodyRef {
    pub fn new(entity: Entity, position: Vec2) -> Self {
        Self {
            entity,
            position,
            object: None,
        }
    }

    pub fn with_object(mut self, object: TaggedObject) -> Self {
        self.object = Some(object);
        self
    }

    /// The attached object's tag. `None` for bare bodies and untagged objects.
    pub fn tag(&self) -> Option<&str> {
        self.object.as_ref().and_then(|o| o.tag.as_deref())
    }
}

/// Raw pairwise contact reported by physics. No ordering between `a` and `b`.
#[derive(Message, Debug, Clone, PartialEq)]
pub struct ContactEvent {
    pub edge: Edge,
    pub a: BodyRef,
    pub b: BodyRef,
}

/// A contact as seen by one of its participants.
#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    pub edge: Edge,
    /// The body owning the router being dispatched.
    pub this: BodyRef,
    /// The body it touched.
    pub other: BodyRef,
}

impl ContactEvent {
    /// Split into the two per-participant views: `(a's view, b's view)`.
    pub fn views(&self) -> (Contact, Contact) {
        (
            Contact {
                edge: self.edge,
                this: self.a.clone(),
                other: self.b.clone(),
            },
            Contact {
                edge: self.edge,
                this: self.b.clone(),
                other: self.a.clone(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::world::World;

    #[test]
    fn test_tag_absent_for_bare_and_untagged_bodies() {
        let mut world = World::new();
        let e = world.spawn_empty().id();

        let bare = BodyRef::new(e, Vec2::ZERO);
        assert_eq!(bare.tag(), None);

        let untagged = BodyRef::new(e, Vec2::ZERO).with_object(TaggedObject::default());
        assert_eq!(untagged.tag(), None);

        let star = BodyRef::new(e, Vec2::ZERO).with_object(TaggedObject::tagged("star"));
        assert_eq!(star.tag(), Some("star"));
    }

    #[test]
    fn test_views_swap_participants() {
        let mut world = World::new();
        let a = world.spawn_empty().id();
        let b = world.spawn_empty().id();
        let event = ContactEvent {
            edge: Edge::End,
            a: BodyRef::new(a, Vec2::new(1.0, 2.0)),
            b: BodyRef::new(b, Vec2::new(3.0, 4.0)),
        };

        let (from_a, from_b) = event.views();
        assert_eq!(from_a.this.entity, a);
        assert_eq!(from_a.other.entity, b);
        assert_eq!(from_b.this.entity, b);
        assert_eq!(from_b.other.position, Vec2::new(1.0, 2.0));
        assert_eq!(from_b.edge, Edge::End);
    }
}
