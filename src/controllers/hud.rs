//! Score and health mirror for the UI.
//!
//! [`Hud`] subscribes to the player's bus events and keeps a [`HudState`]
//! that a UI layer can poll. It is not an entity: its subscriptions are
//! removed by [`Hud::detach`] using the same callback values it subscribed
//! with.

use std::sync::{Arc, Mutex, PoisonError};

use log::debug;

use crate::controllers::{GAME_OVER, HEALTH_CHANGED, SPIKE_HIT, STAR_COLLECTED};
use crate::resources::eventbus::{EventBus, Payload, Subscriber, subscriber};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HudState {
    pub stars: u32,
    pub health: f32,
    pub spike_hits: u32,
    pub game_over: bool,
}

impl HudState {
    pub fn new(health: f32) -> Self {
        Self {
            stars: 0,
            health,
            spike_hits: 0,
            game_over: false,
        }
    }
}

pub struct Hud {
    bus: EventBus,
    state: Arc<Mutex<HudState>>,
    handlers: Vec<(&'static str, Subscriber)>,
}

impl Hud {
    /// Subscribe to the HUD events on `bus`, starting from `health`.
    pub fn attach(bus: EventBus, health: f32) -> Self {
        let state = Arc::new(Mutex::new(HudState::new(health)));

        let handler = |update: fn(&mut HudState, &Payload)| {
            let state = state.clone();
            subscriber(move |payload: &Payload| {
                let mut hud = state.lock().unwrap_or_else(PoisonError::into_inner);
                update(&mut hud, payload);
            })
        };

        let handlers: Vec<(&'static str, Subscriber)> = vec![
            (STAR_COLLECTED, handler(|hud, p| {
                hud.stars += p.as_number().map_or(1, |n| n as u32);
            })),
            (HEALTH_CHANGED, handler(|hud, p| {
                if let Some(health) = p.as_number() {
                    hud.health = health;
                }
            })),
            (SPIKE_HIT, handler(|hud, _| hud.spike_hits += 1)),
            (GAME_OVER, handler(|hud, _| hud.game_over = true)),
        ];
        for (event, callback) in &handlers {
            bus.subscribe(*event, callback.clone(), None);
        }
        debug!("hud attached to {} event(s)", handlers.len());

        Self {
            bus,
            state,
            handlers,
        }
    }

    pub fn state(&self) -> HudState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Remove every subscription made by [`Self::attach`]. Safe to call twice.
    pub fn detach(&mut self) -> usize {
        let removed: usize = self
            .handlers
            .drain(..)
            .map(|(event, callback)| self.bus.unsubscribe_matching(event, &callback, None))
            .sum();
        debug!("hud detached, {removed} subscription(s) removed");
        removed
    }
}

impl Drop for Hud {
    fn drop(&mut self) {
        self.detach();
    }
}
