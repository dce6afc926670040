//! State nodes of the static hierarchy.

use super::service::ServiceDef;
use super::transition::{Action, TransitionDef, TransitionKey};
use crate::core::StatePath;
use std::fmt;

/// Index of a node inside its [`MachineDefinition`](super::MachineDefinition).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Shape of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// Leaf without children.
    Atomic,
    /// Has children; entering it enters `initial`.
    Compound { initial: NodeId },
    /// Leaf whose entry completes the parent.
    Final,
}

/// Immutable node of the state graph.
pub struct StateNode<C, E, Env> {
    pub(crate) id: NodeId,
    pub(crate) path: StatePath,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) kind: NodeKind,
    pub(crate) transitions: Vec<TransitionDef<C, E, Env>>,
    pub(crate) entry: Vec<Action<C, E, Env>>,
    pub(crate) exit: Vec<Action<C, E, Env>>,
    pub(crate) invoke: Option<ServiceDef<C, E, Env>>,
}

impl<C, E, Env> StateNode<C, E, Env> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn path(&self) -> &StatePath {
        &self.path
    }

    /// Key of the node among its siblings; empty for the root.
    pub fn key(&self) -> &str {
        self.path.key().unwrap_or("")
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_final(&self) -> bool {
        self.kind == NodeKind::Final
    }

    pub fn is_compound(&self) -> bool {
        matches!(self.kind, NodeKind::Compound { .. })
    }

    pub fn invoke(&self) -> Option<&ServiceDef<C, E, Env>> {
        self.invoke.as_ref()
    }

    /// Transitions for `key`, in declaration order.
    pub fn transitions_for(
        &self,
        key: TransitionKey,
    ) -> impl Iterator<Item = &TransitionDef<C, E, Env>> {
        self.transitions.iter().filter(move |t| t.key == key)
    }

    /// Tags of the external events this node declares handlers for.
    pub fn event_kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.transitions.iter().filter_map(|t| match t.key {
            TransitionKey::Event(kind) => Some(kind),
            _ => None,
        })
    }
}

impl<C, E, Env> fmt::Debug for StateNode<C, E, Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateNode")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("kind", &self.kind)
            .field("transitions", &self.transitions)
            .field("invoke", &self.invoke)
            .finish()
    }
}
