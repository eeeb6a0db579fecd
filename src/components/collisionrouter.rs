//! Per-entity collision router.
//!
//! A [`CollisionRouter`] receives the contacts of one body and fans them out
//! to three independent listener classes:
//!
//! - **any-contact** listeners see every contact of the body
//! - **obstacle** listeners fire only when the other body is registered in the
//!   [`ObstacleRegistry`] under the listener's name
//! - **tag** listeners fire only when the other body's attached object carries
//!   the listener's tag
//!
//! Every class keeps separate listener lists for the start and the end edge
//! of a contact, and a listener registered for one edge never sees the other.
//!
//! # Dispatch order
//!
//! For one contact, all any-contact listeners run first, then the matching
//! obstacle listeners, then the matching tag listeners. Within a class,
//! listeners run in registration order. Registration order across classes
//! does not matter.
//!
//! # Keys
//!
//! Obstacle and tag listeners are keyed by the obstacle name or tag.
//! Registering the same key again for the same class and edge replaces the
//! previous listener in place: last registration wins. Any-contact listeners
//! get a fresh key per registration unless one is given explicitly.
//!
//! # Failures
//!
//! A listener returns a [`ListenerResult`]. A failure is reported to the
//! [`ErrorSink`] as a [`ListenerError`] and the remaining listeners of the
//! contact still run.

use std::fmt;
use std::sync::Arc;

use log::trace;
use smallvec::SmallVec;

use crate::error::{ListenerClass, ListenerError, ListenerResult};
use crate::events::contact::{Contact, Edge};
use crate::resources::listenererrors::ErrorSink;
use crate::resources::obstacles::ObstacleRegistry;

/// Listener signature. `T` is whatever the owning controller exposes to its
/// listeners, typically its state machine and context.
pub type ContactListener<T> = Arc<dyn Fn(&mut T, &Contact) -> ListenerResult + Send + Sync>;

struct Keyed<T> {
    key: String,
    listener: ContactListener<T>,
}

type ListenerList<T> = SmallVec<[Keyed<T>; 4]>;

struct EdgeListeners<T> {
    any: ListenerList<T>,
    obstacles: ListenerList<T>,
    tags: ListenerList<T>,
}

impl<T> Default for EdgeListeners<T> {
    fn default() -> Self {
        Self {
            any: SmallVec::new(),
            obstacles: SmallVec::new(),
            tags: SmallVec::new(),
        }
    }
}

impl<T> EdgeListeners<T> {
    fn list_mut(&mut self, class: ListenerClass) -> &mut ListenerList<T> {
        match class {
            ListenerClass::Any => &mut self.any,
            ListenerClass::Obstacle => &mut self.obstacles,
            ListenerClass::Tag => &mut self.tags,
        }
    }

    fn len(&self) -> usize {
        self.any.len() + self.obstacles.len() + self.tags.len()
    }
}

fn upsert<T>(list: &mut ListenerList<T>, key: String, listener: ContactListener<T>) {
    match list.iter_mut().find(|entry| entry.key == key) {
        Some(entry) => entry.listener = listener,
        None => list.push(Keyed { key, listener }),
    }
}

/// How many listeners a dispatch invoked and how many of them failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub invoked: usize,
    pub failed: usize,
}

/// Routes one body's contacts to semantic listeners.
pub struct CollisionRouter<T> {
    start: EdgeListeners<T>,
    end: EdgeListeners<T>,
    next_any: u64,
}

impl<T> Default for CollisionRouter<T> {
    fn default() -> Self {
        Self {
            start: EdgeListeners::default(),
            end: EdgeListeners::default(),
            next_any: 0,
        }
    }
}

impl<T> CollisionRouter<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn edge_mut(&mut self, edge: Edge) -> &mut EdgeListeners<T> {
        match edge {
            Edge::Start => &mut self.start,
            Edge::End => &mut self.end,
        }
    }

    fn edge(&self, edge: Edge) -> &EdgeListeners<T> {
        match edge {
            Edge::Start => &self.start,
            Edge::End => &self.end,
        }
    }

    /// Listen to every contact on `edge`. Each call adds a new listener and
    /// returns the key generated for it.
    pub fn on_any_contact<F>(&mut self, edge: Edge, listener: F) -> String
    where
        F: Fn(&mut T, &Contact) -> ListenerResult + Send + Sync + 'static,
    {
        self.next_any += 1;
        let key = format!("any#{}", self.next_any);
        self.on_any_contact_keyed(key.clone(), edge, listener);
        key
    }

    /// Listen to every contact on `edge` under an explicit key.
    pub fn on_any_contact_keyed<F>(&mut self, key: impl Into<String>, edge: Edge, listener: F)
    where
        F: Fn(&mut T, &Contact) -> ListenerResult + Send + Sync + 'static,
    {
        upsert(&mut self.edge_mut(edge).any, key.into(), Arc::new(listener));
    }

    /// Listen to contacts with bodies registered under obstacle `name`.
    pub fn on_obstacle<F>(&mut self, name: impl Into<String>, edge: Edge, listener: F)
    where
        F: Fn(&mut T, &Contact) -> ListenerResult + Send + Sync + 'static,
    {
        upsert(&mut self.edge_mut(edge).obstacles, name.into(), Arc::new(listener));
    }

    /// Listen to contacts with bodies whose attached object carries `tag`.
    pub fn on_tag<F>(&mut self, tag: impl Into<String>, edge: Edge, listener: F)
    where
        F: Fn(&mut T, &Contact) -> ListenerResult + Send + Sync + 'static,
    {
        upsert(&mut self.edge_mut(edge).tags, tag.into(), Arc::new(listener));
    }

    /// Remove one listener. Returns whether it existed.
    pub fn remove(&mut self, class: ListenerClass, key: &str, edge: Edge) -> bool {
        let list = self.edge_mut(edge).list_mut(class);
        let before = list.len();
        list.retain(|entry| entry.key != key);
        list.len() != before
    }

    /// Drop every listener on both edges.
    pub fn clear(&mut self) {
        self.start = EdgeListeners::default();
        self.end = EdgeListeners::default();
    }

    pub fn listener_count(&self) -> usize {
        self.start.len() + self.end.len()
    }

    /// Deliver one contact to the matching listeners.
    ///
    /// See the module docs for the order and the failure policy.
    pub fn dispatch(
        &self,
        target: &mut T,
        contact: &Contact,
        obstacles: &ObstacleRegistry,
        sink: &mut dyn ErrorSink,
    ) -> DispatchReport {
        let listeners = self.edge(contact.edge);
        let other = contact.other.entity;
        let other_tag = contact.other.tag();
        let mut report = DispatchReport::default();

        let mut invoke = |class: ListenerClass, entry: &Keyed<T>, target: &mut T| {
            report.invoked += 1;
            if let Err(err) = (entry.listener)(target, contact) {
                report.failed += 1;
                sink.report(ListenerError {
                    class,
                    key: entry.key.clone(),
                    body: contact.this.entity,
                    message: err.to_string(),
                });
            }
        };

        for entry in &listeners.any {
            invoke(ListenerClass::Any, entry, target);
        }
        for entry in &listeners.obstacles {
            if obstacles.is_registered(&entry.key, other) {
                invoke(ListenerClass::Obstacle, entry, target);
            }
        }
        for entry in &listeners.tags {
            if other_tag == Some(entry.key.as_str()) {
                invoke(ListenerClass::Tag, entry, target);
            }
        }

        trace!(
            "contact {:?} {:?} -> {:?}: {} listener(s), {} failed",
            contact.edge, contact.this.entity, other, report.invoked, report.failed
        );
        report
    }
}

impl<T> fmt::Debug for CollisionRouter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys = |list: &ListenerList<T>| list.iter().map(|e| e.key.clone()).collect::<Vec<_>>();
        f.debug_struct("CollisionRouter")
            .field("start_any", &keys(&self.start.any))
            .field("start_obstacles", &keys(&self.start.obstacles))
            .field("start_tags", &keys(&self.start.tags))
            .field("end_any", &keys(&self.end.any))
            .field("end_obstacles", &keys(&self.end.obstacles))
            .field("end_tags", &keys(&self.end.tags))
            .finish()
    }
}
