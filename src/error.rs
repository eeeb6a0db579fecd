//! Error taxonomy for the behavior engine.
//!
//! - [`ConfigurationError`] – duplicate registrations found while wiring an
//!   entity. Always a programmer error, surfaced at setup.
//! - [`UnknownStateError`] – a transition named a state that was never
//!   registered. Fatal.
//! - [`ListenerError`] – a collision listener failed during dispatch. Isolated
//!   per listener and handed to an [`ErrorSink`](crate::resources::listenererrors::ErrorSink).
//! - [`ConfigFileError`] – the INI configuration could not be read or written.
//! - [`ScenarioError`] – a scripted scenario could not be loaded or replayed.
//!
//! Lookup misses (unregistered obstacle, untagged body, event without
//! subscribers) are not errors anywhere in the crate.

use std::fmt;
use std::path::PathBuf;

use bevy_ecs::prelude::Entity;

/// Boxed error returned by collision listeners.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type of collision listeners.
pub type ListenerResult = Result<(), BoxError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("state {state} is already registered on machine '{machine}'")]
    DuplicateState { machine: String, state: String },
    #[error("obstacle '{name}' is already registered for body {body:?}")]
    DuplicateObstacle { name: String, body: Entity },
    /// A builder tried to start a machine in a state it never registered.
    #[error(transparent)]
    UnknownInitialState(#[from] UnknownStateError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("machine '{machine}' has no state {state}")]
pub struct UnknownStateError {
    pub machine: String,
    pub state: String,
}

/// Which listener mapping a failing listener belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerClass {
    Any,
    Obstacle,
    Tag,
}

impl fmt::Display for ListenerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ListenerClass::Any => "any-contact",
            ListenerClass::Obstacle => "obstacle",
            ListenerClass::Tag => "tag",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{class} listener '{key}' on body {body:?} failed: {message}")]
pub struct ListenerError {
    pub class: ListenerClass,
    pub key: String,
    pub body: Entity,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("failed to load config file {path:?}: {reason}")]
    Load { path: PathBuf, reason: String },
    #[error("failed to save config file {path:?}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("failed to read scenario {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scenario: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("scenario references unknown entity '{0}'")]
    UnknownLabel(String),
    #[error("scenario spawns '{0}' twice")]
    DuplicateLabel(String),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}
