//! One-shot delayed calls scheduled against an owner entity.
//!
//! Behaviors ask for "call me back with `signal` in `delay` seconds" through
//! their outbox; the flush system turns those requests into entries here.
//! [`update_delayed_calls`](crate::systems::delayedcalls::update_delayed_calls)
//! advances the clock every tick and fires due calls as
//! [`DelayedCallEvent`](crate::events::delayedcall::DelayedCallEvent)s.
//!
//! Calls are cancellable by id, or all at once for an owner when it is torn
//! down. Due calls fire once each, ordered by due time and then by schedule
//! order.

use bevy_ecs::prelude::{Entity, Resource};

/// Slack for fixed-step sums such as sixty `1/60` steps adding up to one
/// second.
const DUE_TOLERANCE: f64 = 1e-6;

/// Handle returned by [`DelayedCalls::schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DelayedCallId(u64);

#[derive(Debug, Clone)]
struct PendingCall {
    id: DelayedCallId,
    owner: Entity,
    due: f64,
    signal: String,
}

/// A call that came due.
#[derive(Debug, Clone, PartialEq)]
pub struct DueCall {
    pub owner: Entity,
    pub signal: String,
}

#[derive(Debug, Default, Resource)]
pub struct DelayedCalls {
    now: f64,
    next_id: u64,
    pending: Vec<PendingCall>,
}

impl DelayedCalls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `signal` for `owner`, `delay` seconds from now.
    pub fn schedule(&mut self, owner: Entity, delay: f32, signal: impl Into<String>) -> DelayedCallId {
        self.next_id += 1;
        let id = DelayedCallId(self.next_id);
        self.pending.push(PendingCall {
            id,
            owner,
            due: self.now + f64::from(delay.max(0.0)),
            signal: signal.into(),
        });
        id
    }

    /// Cancel one call. Returns whether it was still pending.
    pub fn cancel(&mut self, id: DelayedCallId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|call| call.id != id);
        self.pending.len() != before
    }

    /// Cancel every pending call of `owner`.
    pub fn cancel_owner(&mut self, owner: Entity) -> usize {
        let before = self.pending.len();
        self.pending.retain(|call| call.owner != owner);
        before - self.pending.len()
    }

    /// Advance the clock by `dt` and take every call now due.
    pub fn advance(&mut self, dt: f32) -> Vec<DueCall> {
        self.now += f64::from(dt.max(0.0));
        let now = self.now + DUE_TOLERANCE;
        let (mut due, pending): (Vec<PendingCall>, Vec<PendingCall>) =
            self.pending.drain(..).partition(|call| call.due <= now);
        self.pending = pending;
        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.id.cmp(&b.id)));
        due.into_iter()
            .map(|call| DueCall {
                owner: call.owner,
                signal: call.signal,
            })
            .collect()
    }

    pub fn pending_for(&self, owner: Entity) -> usize {
        self.pending.iter().filter(|call| call.owner == owner).count()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::world::World;

    fn owners(n: usize) -> Vec<Entity> {
        let mut world = World::new();
        (0..n).map(|_| world.spawn_empty().id()).collect()
    }

    fn signals(due: &[DueCall]) -> Vec<&str> {
        due.iter().map(|c| c.signal.as_str()).collect()
    }

    #[test]
    fn test_fires_once_when_due() {
        let o = owners(1);
        let mut calls = DelayedCalls::new();
        calls.schedule(o[0], 1.0, "game-over");

        assert!(calls.advance(0.5).is_empty());
        let due = calls.advance(0.5);
        assert_eq!(due, vec![DueCall { owner: o[0], signal: "game-over".into() }]);
        assert!(calls.advance(5.0).is_empty());
    }

    #[test]
    fn test_due_calls_in_time_then_schedule_order() {
        let o = owners(1);
        let mut calls = DelayedCalls::new();
        calls.schedule(o[0], 0.3, "late");
        calls.schedule(o[0], 0.1, "early");
        calls.schedule(o[0], 0.1, "early-second");

        let due = calls.advance(1.0);
        assert_eq!(signals(&due), vec!["early", "early-second", "late"]);
    }

    #[test]
    fn test_cancel_by_id_and_owner() {
        let o = owners(2);
        let mut calls = DelayedCalls::new();
        let id = calls.schedule(o[0], 0.1, "a");
        calls.schedule(o[0], 0.1, "b");
        calls.schedule(o[1], 0.1, "c");

        assert!(calls.cancel(id));
        assert!(!calls.cancel(id));
        assert_eq!(calls.cancel_owner(o[0]), 1);
        assert_eq!(calls.pending_for(o[0]), 0);

        assert_eq!(signals(&calls.advance(1.0)), vec!["c"]);
        assert!(calls.is_empty());
    }

    #[test]
    fn test_delay_is_relative_to_schedule_time() {
        let o = owners(1);
        let mut calls = DelayedCalls::new();
        calls.advance(10.0);
        calls.schedule(o[0], 0.5, "x");
        assert!(calls.advance(0.4).is_empty());
        assert_eq!(calls.advance(0.1).len(), 1);
    }

    fn fired_on_tick(delay: f32, dt: f32) -> Option<u32> {
        let o = owners(1);
        let mut calls = DelayedCalls::new();
        calls.schedule(o[0], delay, "x");
        (1..=1000).find(|_| !calls.advance(dt).is_empty())
    }

    #[test]
    fn test_fixed_step_delays_fire_on_the_exact_tick() {
        let dt = 1.0 / 60.0;
        assert_eq!(fired_on_tick(1.0, dt), Some(60));
        assert_eq!(fired_on_tick(0.5, dt), Some(30));
        assert_eq!(fired_on_tick(2.0, dt), Some(120));
        assert_eq!(fired_on_tick(1.0, 1.0 / 30.0), Some(30));
        assert_eq!(fired_on_tick(0.1, 1.0 / 50.0), Some(5));
    }

    #[test]
    fn test_long_running_clock_keeps_tick_accuracy() {
        let o = owners(1);
        let mut calls = DelayedCalls::new();
        let dt = 1.0 / 60.0;
        for _ in 0..60 * 60 * 10 {
            calls.advance(dt);
        }
        calls.schedule(o[0], 1.0, "late");
        let tick = (1..=200).find(|_| !calls.advance(dt).is_empty());
        assert_eq!(tick, Some(60));
    }
}
