//! Transition and action definitions.

use super::node::NodeId;
use crate::core::{Fault, Guard, Trigger};
use std::fmt;
use std::sync::Arc;
use stillwater::effect::{BoxedEffect, Effect};

/// What a transition answers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransitionKey {
    /// An external event with this tag.
    Event(&'static str),

    /// Completion of the node's compound region.
    Done,

    /// Successful resolution of the node's invoked service.
    ServiceDone,

    /// Failure of the node's invoked service.
    ServiceError,

    /// Eventless transition, checked after every microstep.
    Always,
}

impl TransitionKey {
    /// Key under which a trigger is looked up.
    ///
    /// `Start` has no key: initial entry never selects a transition.
    pub fn for_trigger<E: crate::core::Event>(trigger: &Trigger<E>) -> Option<Self> {
        match trigger {
            Trigger::Start => None,
            Trigger::Event(event) => Some(Self::Event(event.kind())),
            Trigger::Done { .. } => Some(Self::Done),
            Trigger::ServiceDone { .. } => Some(Self::ServiceDone),
            Trigger::ServiceError { .. } => Some(Self::ServiceError),
            Trigger::Always => Some(Self::Always),
        }
    }

    /// Whether lookup continues into ancestors when the origin node has no
    /// passing transition.
    ///
    /// Completion and service results belong to one specific node and
    /// never bubble.
    pub fn bubbles(&self) -> bool {
        matches!(self, Self::Event(_) | Self::Always)
    }
}

impl fmt::Display for TransitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Event(kind) => f.write_str(kind),
            Self::Done => f.write_str("onDone"),
            Self::ServiceDone => f.write_str("invoke.onDone"),
            Self::ServiceError => f.write_str("invoke.onError"),
            Self::Always => f.write_str("always"),
        }
    }
}

/// Pure context update: returns the replacement context.
pub type AssignFn<C, E> = Arc<dyn Fn(&C, &Trigger<E>) -> Result<C, Fault> + Send + Sync>;

/// Side effect run against the environment and awaited before the next
/// action.
pub type EffectFn<C, E, Env> =
    Arc<dyn Fn(&C, &Trigger<E>) -> BoxedEffect<(), Fault, Env> + Send + Sync>;

enum ActionKind<C, E, Env> {
    Assign(AssignFn<C, E>),
    Effect(EffectFn<C, E, Env>),
}

impl<C, E, Env> Clone for ActionKind<C, E, Env> {
    fn clone(&self) -> Self {
        match self {
            Self::Assign(f) => Self::Assign(Arc::clone(f)),
            Self::Effect(f) => Self::Effect(Arc::clone(f)),
        }
    }
}

/// A named action run on entry, exit or while taking a transition.
///
/// Actions never receive a mutable context. An assign action hands back the
/// new context and the engine applies it; an effect action only touches the
/// environment.
pub struct Action<C, E, Env> {
    name: &'static str,
    kind: ActionKind<C, E, Env>,
}

impl<C, E, Env> Action<C, E, Env>
where
    C: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
    Env: Clone + Send + Sync + 'static,
{
    /// Pure context update.
    pub fn assign<F>(name: &'static str, f: F) -> Self
    where
        F: Fn(&C, &Trigger<E>) -> Result<C, Fault> + Send + Sync + 'static,
    {
        Self {
            name,
            kind: ActionKind::Assign(Arc::new(f)),
        }
    }

    /// Effectful action built from a fresh stillwater effect per run.
    pub fn effect<F>(name: &'static str, f: F) -> Self
    where
        F: Fn(&C, &Trigger<E>) -> BoxedEffect<(), Fault, Env> + Send + Sync + 'static,
    {
        Self {
            name,
            kind: ActionKind::Effect(Arc::new(f)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Run the action. Returns the replacement context for assign actions.
    pub(crate) async fn run(
        &self,
        context: &C,
        trigger: &Trigger<E>,
        env: &Env,
    ) -> Result<Option<C>, Fault> {
        match &self.kind {
            ActionKind::Assign(f) => f(context, trigger).map(Some),
            ActionKind::Effect(f) => f(context, trigger).run(env).await.map(|_| None),
        }
    }
}

impl<C, E, Env> Clone for Action<C, E, Env> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            kind: self.kind.clone(),
        }
    }
}

impl<C, E, Env> fmt::Debug for Action<C, E, Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ActionKind::Assign(_) => "assign",
            ActionKind::Effect(_) => "effect",
        };
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("kind", &kind)
            .finish()
    }
}

/// A resolved transition: key, optional target, guard and actions.
pub struct TransitionDef<C, E, Env> {
    pub(crate) key: TransitionKey,
    pub(crate) target: Option<NodeId>,
    pub(crate) guard: Option<Guard<C>>,
    pub(crate) actions: Vec<Action<C, E, Env>>,
}

impl<C, E, Env> TransitionDef<C, E, Env> {
    pub fn key(&self) -> TransitionKey {
        self.key
    }

    /// Target node; `None` for targetless transitions that only run actions.
    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    pub fn guard(&self) -> Option<&Guard<C>> {
        self.guard.as_ref()
    }

    pub fn actions(&self) -> &[Action<C, E, Env>] {
        &self.actions
    }

    /// Check whether the guard (if any) lets this transition fire.
    pub fn is_enabled(&self, context: &C) -> Result<bool, Fault> {
        self.guard.as_ref().map_or(Ok(true), |g| g.check(context))
    }
}

impl<C, E, Env> fmt::Debug for TransitionDef<C, E, Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionDef")
            .field("key", &self.key)
            .field("target", &self.target)
            .field("guard", &self.guard)
            .field("actions", &self.actions)
            .finish()
    }
}
