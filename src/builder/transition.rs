//! Builder for transitions.

use crate::chart::Action;
use crate::core::{Fault, Guard};

/// Fluent description of a transition whose target is still a name.
///
/// Targets are resolved when the machine is built, relative to the siblings
/// of the state declaring the transition. Dotted names descend
/// (`"Login.Loading"`).
pub struct TransitionBuilder<C, E, Env> {
    pub(crate) target: Option<String>,
    pub(crate) guard: Option<Guard<C>>,
    pub(crate) actions: Vec<Action<C, E, Env>>,
}

impl<C, E, Env> TransitionBuilder<C, E, Env> {
    /// Transition to the named state.
    pub fn to(target: &str) -> Self {
        Self {
            target: Some(target.to_string()),
            guard: None,
            actions: Vec::new(),
        }
    }

    /// Transition that runs its actions without changing state.
    pub fn targetless() -> Self {
        Self {
            target: None,
            guard: None,
            actions: Vec::new(),
        }
    }

    /// Add a guard (optional). Replaces any previous guard.
    pub fn guard(mut self, guard: Guard<C>) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Add a guard using a closure (optional).
    pub fn when<F>(mut self, name: &'static str, predicate: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        self.guard = Some(Guard::new(name, predicate));
        self
    }

    /// Add a guard whose evaluation can fail.
    pub fn when_fallible<F>(mut self, name: &'static str, predicate: F) -> Self
    where
        F: Fn(&C) -> Result<bool, Fault> + Send + Sync + 'static,
    {
        self.guard = Some(Guard::fallible(name, predicate));
        self
    }

    /// Append an action; actions run in the order they are added.
    pub fn action(mut self, action: Action<C, E, Env>) -> Self {
        self.actions.push(action);
        self
    }
}
