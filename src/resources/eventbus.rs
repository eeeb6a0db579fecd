//! Publish/subscribe bus for cross-entity notifications.
//!
//! The [`EventBus`] carries named notifications such as `"star-collected"` or
//! `"health-changed"` between parts of the simulation that do not know about
//! each other: controllers publish, the HUD and other controllers subscribe.
//!
//! The bus is a cheap cloneable handle. The simulation owns one instance as an
//! ECS resource and hands clones to every controller that needs it, so there
//! is no global singleton.
//!
//! # Delivery rules
//!
//! - `publish` is synchronous: every subscriber runs before it returns.
//! - Subscribers run in subscription order.
//! - The subscriber list is snapshotted when `publish` starts. A subscriber
//!   added by a handler is not called by the publish in progress, only by
//!   later ones.
//! - A subscriber removed while a publish is in progress is skipped if its
//!   turn has not come yet.
//! - Unsubscribing is idempotent. Removing something already gone is a no-op.
//!
//! The subscriber table sits behind an `RwLock` that is released before any
//! subscriber runs, so handlers may publish, subscribe and unsubscribe freely.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bevy_ecs::prelude::{Entity, Resource};
use log::trace;
use rustc_hash::FxHashMap;

/// Data attached to a published event.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Payload {
    #[default]
    Empty,
    Number(f32),
    Count(u32),
    Entity(Entity),
    Text(String),
}

impl Payload {
    pub fn as_number(&self) -> Option<f32> {
        match self {
            Payload::Number(n) => Some(*n),
            Payload::Count(c) => Some(*c as f32),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<Entity> {
        match self {
            Payload::Entity(e) => Some(*e),
            _ => None,
        }
    }
}

/// Subscriber callback. Kept behind an `Arc` so the same callback value can
/// later be used to unsubscribe.
pub type Subscriber = Arc<dyn Fn(&Payload) + Send + Sync>;

/// Wrap a closure as a [`Subscriber`].
pub fn subscriber<F>(callback: F) -> Subscriber
where
    F: Fn(&Payload) + Send + Sync + 'static,
{
    Arc::new(callback)
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    callback: Subscriber,
    owner: Option<Entity>,
    active: AtomicBool,
}

impl Subscription {
    fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }
}

#[derive(Default)]
struct Table {
    next_id: u64,
    topics: FxHashMap<String, Vec<Arc<Subscription>>>,
    index: FxHashMap<SubscriptionId, String>,
}

impl Table {
    /// Remove every subscription of `event` matching `pred`.
    fn remove_where(&mut self, event: &str, pred: impl Fn(&Subscription) -> bool) -> usize {
        let Some(subs) = self.topics.get_mut(event) else {
            return 0;
        };
        let mut removed = Vec::new();
        subs.retain(|sub| {
            if pred(sub) {
                sub.deactivate();
                removed.push(sub.id);
                false
            } else {
                true
            }
        });
        if subs.is_empty() {
            self.topics.remove(event);
        }
        for id in &removed {
            self.index.remove(id);
        }
        removed.len()
    }
}

/// Shared publish/subscribe channel.
#[derive(Clone, Default, Resource)]
pub struct EventBus {
    table: Arc<RwLock<Table>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Table> {
        self.table.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Table> {
        self.table.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe `callback` to `event`. `owner` lets an entity drop all of its
    /// subscriptions at teardown with [`Self::unsubscribe_owner`].
    pub fn subscribe(
        &self,
        event: impl Into<String>,
        callback: Subscriber,
        owner: Option<Entity>,
    ) -> SubscriptionId {
        let event = event.into();
        let mut table = self.write();
        table.next_id += 1;
        let id = SubscriptionId(table.next_id);
        table.index.insert(id, event.clone());
        table.topics.entry(event).or_default().push(Arc::new(Subscription {
            id,
            callback,
            owner,
            active: AtomicBool::new(true),
        }));
        id
    }

    /// Deliver `payload` to the current subscribers of `event`.
    ///
    /// Returns how many subscribers were called. Publishing an event nobody
    /// listens to is not an error.
    pub fn publish(&self, event: &str, payload: Payload) -> usize {
        let snapshot: Vec<Arc<Subscription>> = self
            .read()
            .topics
            .get(event)
            .cloned()
            .unwrap_or_default();

        let mut delivered = 0;
        for sub in snapshot {
            if sub.active.load(Ordering::Acquire) {
                (sub.callback)(&payload);
                delivered += 1;
            }
        }
        trace!("publish '{event}' {payload:?} -> {delivered} subscriber(s)");
        delivered
    }

    /// Remove one subscription by handle. Returns whether it was still live.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut table = self.write();
        let Some(event) = table.index.get(&id).cloned() else {
            return false;
        };
        table.remove_where(&event, |sub| sub.id == id) > 0
    }

    /// Remove every subscription equal to the (event, callback, owner) triple.
    /// Callbacks compare by identity.
    pub fn unsubscribe_matching(
        &self,
        event: &str,
        callback: &Subscriber,
        owner: Option<Entity>,
    ) -> usize {
        self.write().remove_where(event, |sub| {
            Arc::ptr_eq(&sub.callback, callback) && sub.owner == owner
        })
    }

    /// Remove every subscription owned by `owner`, on every event.
    pub fn unsubscribe_owner(&self, owner: Entity) -> usize {
        let mut table = self.write();
        let events: Vec<String> = table.topics.keys().cloned().collect();
        events
            .iter()
            .map(|event| table.remove_where(event, |sub| sub.owner == Some(owner)))
            .sum()
    }

    pub fn subscriber_count(&self, event: &str) -> usize {
        self.read().topics.get(event).map_or(0, Vec::len)
    }

    /// Drop every subscription.
    pub fn clear(&self) {
        let mut table = self.write();
        for sub in table.topics.values().flatten() {
            sub.deactivate();
        }
        table.topics.clear();
        table.index.clear();
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.read();
        let mut counts: Vec<(&String, usize)> =
            table.topics.iter().map(|(k, v)| (k, v.len())).collect();
        counts.sort();
        f.debug_struct("EventBus").field("topics", &counts).finish()
    }
}
