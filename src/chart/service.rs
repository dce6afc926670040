//! Invoked services: asynchronous operations owned by a state entry.

use crate::core::{ServiceError, StatePath, Trigger};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use stillwater::effect::{BoxedEffect, Effect};
use uuid::Uuid;

/// Builds a fresh service effect from the context and the trigger that
/// entered the owning state.
pub type ServiceFactory<C, E, Env> =
    Arc<dyn Fn(&C, &Trigger<E>) -> BoxedEffect<Value, ServiceError, Env> + Send + Sync>;

/// Service declared on an atomic state.
pub struct ServiceDef<C, E, Env> {
    id: &'static str,
    factory: ServiceFactory<C, E, Env>,
}

impl<C, E, Env> ServiceDef<C, E, Env> {
    pub fn new<F>(id: &'static str, factory: F) -> Self
    where
        F: Fn(&C, &Trigger<E>) -> BoxedEffect<Value, ServiceError, Env> + Send + Sync + 'static,
    {
        Self {
            id,
            factory: Arc::new(factory),
        }
    }

    /// Name of the service (the `src` of the invocation).
    pub fn id(&self) -> &'static str {
        self.id
    }

    pub(crate) fn create(&self, context: &C, trigger: &Trigger<E>) -> BoxedEffect<Value, ServiceError, Env> {
        (self.factory)(context, trigger)
    }
}

impl<C, E, Env> fmt::Debug for ServiceDef<C, E, Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDef").field("id", &self.id).finish()
    }
}

/// Identity of one invocation, unique per state entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvocationId(Uuid);

impl InvocationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InvocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An invocation started by the engine that still has to be run.
///
/// The engine only creates the effect; whoever drains
/// `Machine::take_invocations` runs it and reports the outcome back.
pub struct PendingInvocation<Env> {
    id: InvocationId,
    state: StatePath,
    service: &'static str,
    effect: BoxedEffect<Value, ServiceError, Env>,
}

impl<Env> PendingInvocation<Env> {
    pub(crate) fn new(
        id: InvocationId,
        state: StatePath,
        service: &'static str,
        effect: BoxedEffect<Value, ServiceError, Env>,
    ) -> Self {
        Self {
            id,
            state,
            service,
            effect,
        }
    }

    pub fn id(&self) -> InvocationId {
        self.id
    }

    /// Path of the state that owns the invocation.
    pub fn state(&self) -> &StatePath {
        &self.state
    }

    pub fn service(&self) -> &'static str {
        self.service
    }
}

impl<Env: Clone + Send + Sync + 'static> PendingInvocation<Env> {
    /// Run the service effect to completion.
    pub async fn run(self, env: &Env) -> Result<Value, ServiceError> {
        self.effect.run(env).await
    }
}

impl<Env> fmt::Debug for PendingInvocation<Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingInvocation")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("service", &self.service)
            .finish()
    }
}
