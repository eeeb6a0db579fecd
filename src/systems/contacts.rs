//! Contact routing system.
//!
//! Reads the [`ContactEvent`]s written by the physics collaborator this tick
//! and hands each participant its own view of the contact. Bodies without an
//! [`Actor`] (terrain, pickups, spikes) have no behavior and are skipped.

use bevy_ecs::prelude::*;
use log::trace;

use crate::components::actor::Actor;
use crate::events::contact::ContactEvent;
use crate::resources::listenererrors::ListenerErrors;
use crate::resources::obstacles::ObstacleRegistry;

pub fn route_contacts(
    mut reader: MessageReader<ContactEvent>,
    mut actors: Query<&mut Actor>,
    obstacles: Res<ObstacleRegistry>,
    mut errors: ResMut<ListenerErrors>,
) {
    for event in reader.read() {
        let (from_a, from_b) = event.views();
        for contact in [from_a, from_b] {
            let Ok(mut actor) = actors.get_mut(contact.this.entity) else {
                continue;
            };
            let report = actor
                .behavior
                .handle_contact(&contact, &obstacles, &mut *errors);
            trace!(
                "{} {:?}: {} listener(s) for {:?} contact",
                actor.behavior.kind(),
                contact.this.entity,
                report.invoked,
                contact.edge
            );
        }
    }
}

/// Advance the contact message queue. Runs once per tick after routing.
pub fn update_contact_messages(mut messages: ResMut<Messages<ContactEvent>>) {
    messages.update();
}
