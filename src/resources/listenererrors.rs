//! Host-side sink for collision listener failures.
//!
//! A listener that fails during dispatch must not stop the remaining
//! listeners of the same contact. The router wraps the failure in a
//! [`ListenerError`] and hands it to an [`ErrorSink`]; dispatch then carries
//! on with the next listener.
//!
//! [`ListenerErrors`] is the sink used by the ECS driver: it logs every
//! failure at warn level and keeps them so the host can inspect or drain them
//! after the tick.

use bevy_ecs::prelude::Resource;
use log::warn;

use crate::error::ListenerError;

/// Receives listener failures during collision dispatch.
pub trait ErrorSink {
    fn report(&mut self, error: ListenerError);
}

/// Collect-and-report.
impl ErrorSink for Vec<ListenerError> {
    fn report(&mut self, error: ListenerError) {
        self.push(error);
    }
}

/// Log-and-continue, keeping nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ErrorSink for LogSink {
    fn report(&mut self, error: ListenerError) {
        warn!("{error}");
    }
}

/// Listener failures collected over the ticks since the last drain.
#[derive(Debug, Default, Resource)]
pub struct ListenerErrors {
    errors: Vec<ListenerError>,
}

impl ListenerErrors {
    pub fn errors(&self) -> &[ListenerError] {
        &self.errors
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn drain(&mut self) -> Vec<ListenerError> {
        std::mem::take(&mut self.errors)
    }
}

impl ErrorSink for ListenerErrors {
    fn report(&mut self, error: ListenerError) {
        warn!("{error}");
        self.errors.push(error);
    }
}
