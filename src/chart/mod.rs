//! Static state graph: nodes, transitions, actions and invoked services.
//!
//! Definitions are plain data built once by the [`builder`](crate::builder)
//! API. The [`engine`](crate::engine) interprets them.

mod definition;
mod node;
mod service;
mod transition;

pub use definition::MachineDefinition;
pub use node::{NodeId, NodeKind, StateNode};
pub use service::{InvocationId, PendingInvocation, ServiceDef, ServiceFactory};
pub use transition::{Action, AssignFn, EffectFn, TransitionDef, TransitionKey};
