//! Builders for state nodes and their invoked services.

use crate::builder::transition::TransitionBuilder;
use crate::chart::{Action, ServiceDef, TransitionKey};
use crate::core::{ServiceError, Trigger};
use serde_json::Value;
use stillwater::effect::BoxedEffect;

/// Builder for one state node and, recursively, its children.
///
/// A state with children is compound and needs an initial child; a state
/// created with [`StateBuilder::final_state`] completes its parent when
/// entered.
pub struct StateBuilder<C, E, Env> {
    pub(crate) key: String,
    pub(crate) initial: Option<String>,
    pub(crate) is_final: bool,
    pub(crate) children: Vec<StateBuilder<C, E, Env>>,
    pub(crate) transitions: Vec<(TransitionKey, TransitionBuilder<C, E, Env>)>,
    pub(crate) entry: Vec<Action<C, E, Env>>,
    pub(crate) exit: Vec<Action<C, E, Env>>,
    pub(crate) invoke: Option<ServiceBuilder<C, E, Env>>,
}

impl<C, E, Env> StateBuilder<C, E, Env> {
    /// Atomic state, or compound once children are added.
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            initial: None,
            is_final: false,
            children: Vec::new(),
            transitions: Vec::new(),
            entry: Vec::new(),
            exit: Vec::new(),
            invoke: None,
        }
    }

    /// Final state.
    pub fn final_state(key: &str) -> Self {
        Self {
            is_final: true,
            ..Self::new(key)
        }
    }

    /// Set the initial child (required for compound states).
    pub fn initial(mut self, key: &str) -> Self {
        self.initial = Some(key.to_string());
        self
    }

    /// Add a child state.
    pub fn child(mut self, child: StateBuilder<C, E, Env>) -> Self {
        self.children.push(child);
        self
    }

    /// Handle the event tagged `kind`. Several handlers for the same kind
    /// are tried in the order they are added.
    pub fn on(mut self, kind: &'static str, transition: TransitionBuilder<C, E, Env>) -> Self {
        self.transitions.push((TransitionKey::Event(kind), transition));
        self
    }

    /// Transition taken when this compound state reaches a final child.
    pub fn on_done(mut self, transition: TransitionBuilder<C, E, Env>) -> Self {
        self.transitions.push((TransitionKey::Done, transition));
        self
    }

    /// Eventless transition, taken as soon as its guard passes.
    pub fn always(mut self, transition: TransitionBuilder<C, E, Env>) -> Self {
        self.transitions.push((TransitionKey::Always, transition));
        self
    }

    /// Action run each time the state is entered.
    pub fn entry(mut self, action: Action<C, E, Env>) -> Self {
        self.entry.push(action);
        self
    }

    /// Action run each time the state is exited.
    pub fn exit(mut self, action: Action<C, E, Env>) -> Self {
        self.exit.push(action);
        self
    }

    /// Invoke a service while this (atomic) state is active.
    pub fn invoke(mut self, service: ServiceBuilder<C, E, Env>) -> Self {
        self.invoke = Some(service);
        self
    }
}

/// Builder for an invoked service and its outcome transitions.
pub struct ServiceBuilder<C, E, Env> {
    pub(crate) service: ServiceDef<C, E, Env>,
    pub(crate) on_done: Vec<TransitionBuilder<C, E, Env>>,
    pub(crate) on_error: Vec<TransitionBuilder<C, E, Env>>,
}

impl<C, E, Env> ServiceBuilder<C, E, Env> {
    /// Service named `id` whose effect is produced by `factory` on each
    /// entry of the owning state.
    pub fn new<F>(id: &'static str, factory: F) -> Self
    where
        F: Fn(&C, &Trigger<E>) -> BoxedEffect<Value, ServiceError, Env> + Send + Sync + 'static,
    {
        Self {
            service: ServiceDef::new(id, factory),
            on_done: Vec::new(),
            on_error: Vec::new(),
        }
    }

    /// Transition taken when the service resolves.
    pub fn on_done(mut self, transition: TransitionBuilder<C, E, Env>) -> Self {
        self.on_done.push(transition);
        self
    }

    /// Transition taken when the service fails.
    pub fn on_error(mut self, transition: TransitionBuilder<C, E, Env>) -> Self {
        self.on_error.push(transition);
        self
    }
}
