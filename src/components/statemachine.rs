//! Per-entity finite state machine with enter/update/exit hooks.
//!
//! A [`StateMachine`] holds a set of named states, each with optional hooks:
//!
//! - `on_enter` – called once when the machine enters the state
//! - `on_update` – called on every [`StateMachine::update`] while current
//! - `on_exit` – called once when the machine leaves the state
//!
//! Hooks receive the machine itself and the owning entity's context `C`, so a
//! hook can request another transition directly. Transitions are synchronous
//! and depth-first: when an `on_enter` hook calls [`StateMachine::set_state`],
//! the nested exit/enter pair runs to completion before the outer call
//! returns. Nothing is queued and there is no "in transition" flag.
//!
//! # Example
//!
//! ```ignore
//! let mut machine: StateMachine<Mode, Player> = StateMachine::new("player");
//! machine
//!     .add_state(Mode::Idle, StateHooks::new().on_update(idle_update))?
//!     .add_state(Mode::Walk, StateHooks::new().on_enter(walk_enter))?;
//! machine.set_state(&mut player, Mode::Idle)?;
//!
//! // every tick
//! machine.update(&mut player, dt)?;
//! ```
//!
//! # Related
//!
//! - [`crate::components::actor`] – how controllers own a machine next to its context
//! - [`crate::systems::actors`] – the system that ticks every machine

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use log::debug;
use rustc_hash::FxHashMap;

use crate::error::{ConfigurationError, UnknownStateError};

/// Anything usable as a state name: enum tags for closed vocabularies,
/// `&'static str` or `String` for open ones.
pub trait StateId: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static {}

impl<T> StateId for T where T: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static {}

/// Result of a hook. The only failure a hook can produce on its own is a
/// nested transition to an unknown state.
pub type HookResult = Result<(), UnknownStateError>;

/// `on_enter` / `on_exit` hook.
pub type TransitionHook<S, C> =
    Arc<dyn Fn(&mut StateMachine<S, C>, &mut C) -> HookResult + Send + Sync>;

/// `on_update` hook. The last parameter is the tick delta in seconds.
pub type UpdateHook<S, C> =
    Arc<dyn Fn(&mut StateMachine<S, C>, &mut C, f32) -> HookResult + Send + Sync>;

/// The three optional hooks of one state.
pub struct StateHooks<S, C> {
    on_enter: Option<TransitionHook<S, C>>,
    on_update: Option<UpdateHook<S, C>>,
    on_exit: Option<TransitionHook<S, C>>,
}

impl<S, C> Default for StateHooks<S, C> {
    fn default() -> Self {
        Self {
            on_enter: None,
            on_update: None,
            on_exit: None,
        }
    }
}

impl<S: StateId, C> StateHooks<S, C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the hook run once when the state is entered (builder pattern).
    pub fn on_enter<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut StateMachine<S, C>, &mut C) -> HookResult + Send + Sync + 'static,
    {
        self.on_enter = Some(Arc::new(hook));
        self
    }

    /// Set the hook run on every update while the state is current.
    pub fn on_update<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut StateMachine<S, C>, &mut C, f32) -> HookResult + Send + Sync + 'static,
    {
        self.on_update = Some(Arc::new(hook));
        self
    }

    /// Set the hook run once when the state is left.
    pub fn on_exit<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut StateMachine<S, C>, &mut C) -> HookResult + Send + Sync + 'static,
    {
        self.on_exit = Some(Arc::new(hook));
        self
    }
}

/// State machine driving one entity's behavior.
///
/// # Fields
///
/// - `name` – diagnostic name used in logs and errors (e.g. `"player"`)
/// - `current` – the active state; `None` only before the first `set_state`
/// - `previous` – the state before the last transition, if any
/// - `time_in_state` – seconds accumulated by `update` since the last transition
/// - `transitions` – number of completed `set_state` calls
pub struct StateMachine<S, C> {
    name: String,
    states: FxHashMap<S, StateHooks<S, C>>,
    current: Option<S>,
    previous: Option<S>,
    time_in_state: f32,
    transitions: u64,
}

impl<S: StateId, C> StateMachine<S, C> {
    /// Create an empty machine. No state is current until [`Self::set_state`].
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            states: FxHashMap::default(),
            current: None,
            previous: None,
            time_in_state: 0.0,
            transitions: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a state. Returns the machine for chaining.
    ///
    /// Fails with [`ConfigurationError::DuplicateState`] if `name` is taken.
    pub fn add_state(
        &mut self,
        name: S,
        hooks: StateHooks<S, C>,
    ) -> Result<&mut Self, ConfigurationError> {
        if self.states.contains_key(&name) {
            return Err(ConfigurationError::DuplicateState {
                machine: self.name.clone(),
                state: format!("{name:?}"),
            });
        }
        self.states.insert(name, hooks);
        Ok(self)
    }

    /// Transition to `name`.
    ///
    /// Runs, in order: the current state's `on_exit`, the switch of the
    /// current state, the new state's `on_enter`. Re-entering the current
    /// state is allowed and runs both hooks again.
    ///
    /// Hooks may call `set_state` themselves; the nested transition completes
    /// before this call returns, so after a chain `A.on_enter -> set_state(B)`
    /// the machine is in `B`.
    pub fn set_state(&mut self, ctx: &mut C, name: S) -> HookResult {
        let Some(next) = self.states.get(&name) else {
            return Err(self.unknown(&name));
        };
        let on_enter = next.on_enter.clone();
        let on_exit = self
            .current
            .as_ref()
            .and_then(|current| self.states.get(current))
            .and_then(|state| state.on_exit.clone());

        if let Some(hook) = on_exit {
            hook(self, ctx)?;
        }

        debug!(
            "[{}] {:?} -> {:?}",
            self.name,
            self.current.as_ref(),
            name
        );
        self.previous = self.current.replace(name);
        self.time_in_state = 0.0;
        self.transitions += 1;

        if let Some(hook) = on_enter {
            hook(self, ctx)?;
        }
        Ok(())
    }

    /// Run the current state's `on_update` hook, if it has one.
    ///
    /// Does nothing before the first transition.
    pub fn update(&mut self, ctx: &mut C, dt: f32) -> HookResult {
        let hook = match self.current.as_ref() {
            Some(current) => self
                .states
                .get(current)
                .and_then(|state| state.on_update.clone()),
            None => return Ok(()),
        };
        self.time_in_state += dt;
        match hook {
            Some(hook) => hook(self, ctx, dt),
            None => Ok(()),
        }
    }

    pub fn is_current_state(&self, name: &S) -> bool {
        self.current.as_ref() == Some(name)
    }

    pub fn current(&self) -> Option<&S> {
        self.current.as_ref()
    }

    pub fn previous(&self) -> Option<&S> {
        self.previous.as_ref()
    }

    pub fn has_state(&self, name: &S) -> bool {
        self.states.contains_key(name)
    }

    /// Seconds spent in the current state, as accumulated by `update`.
    pub fn time_in_state(&self) -> f32 {
        self.time_in_state
    }

    pub fn transition_count(&self) -> u64 {
        self.transitions
    }

    fn unknown(&self, name: &S) -> UnknownStateError {
        UnknownStateError {
            machine: self.name.clone(),
            state: format!("{name:?}"),
        }
    }
}

impl<S: StateId, C> fmt::Debug for StateMachine<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("name", &self.name)
            .field("current", &self.current)
            .field("previous", &self.previous)
            .field("time_in_state", &self.time_in_state)
            .field("states", &self.states.keys().collect::<Vec<_>>())
            .finish()
    }
}
