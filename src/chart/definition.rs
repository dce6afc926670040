//! The immutable state graph shared by every machine instance.

use super::node::{NodeId, NodeKind, StateNode};
use crate::core::StatePath;
use std::fmt;

/// Arena of state nodes plus the initial context.
///
/// Built once by [`MachineBuilder`](crate::builder::MachineBuilder) and then
/// shared read-only, usually behind an `Arc`. Node `0` is the root.
pub struct MachineDefinition<C, E, Env> {
    id: String,
    nodes: Vec<StateNode<C, E, Env>>,
    initial_context: C,
}

impl<C, E, Env> MachineDefinition<C, E, Env> {
    pub(crate) fn from_parts(id: String, nodes: Vec<StateNode<C, E, Env>>, initial_context: C) -> Self {
        Self {
            id,
            nodes,
            initial_context,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn initial_context(&self) -> &C {
        &self.initial_context
    }

    pub fn node(&self, id: NodeId) -> &StateNode<C, E, Env> {
        &self.nodes[id.0]
    }

    pub fn nodes(&self) -> &[StateNode<C, E, Env>] {
        &self.nodes
    }

    /// Look a node up by its full path.
    pub fn find(&self, path: &StatePath) -> Option<NodeId> {
        self.nodes.iter().find(|n| &n.path == path).map(|n| n.id)
    }

    /// `id` followed by each of its ancestors up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |current| self.node(*current).parent)
    }

    /// Whether `node` lies strictly below `ancestor`.
    pub fn is_descendant(&self, node: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(node).skip(1).any(|a| a == ancestor)
    }

    /// Initial descendants entered when `from` is entered, outermost first.
    ///
    /// Empty when `from` is a leaf.
    pub fn initial_descent(&self, from: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = from;
        while let NodeKind::Compound { initial } = self.node(current).kind {
            path.push(initial);
            current = initial;
        }
        path
    }

    /// Nearest proper ancestor of `source` that is also a proper ancestor of
    /// `target`.
    ///
    /// Everything active below the domain is exited by the transition. A
    /// self-transition therefore exits and re-enters its source.
    pub fn transition_domain(&self, source: NodeId, target: NodeId) -> NodeId {
        self.ancestors(source)
            .skip(1)
            .find(|candidate| self.is_descendant(target, *candidate))
            .unwrap_or_else(|| self.root())
    }

    /// Nodes entered by a transition into `target` within `domain`:
    /// the path from just below the domain down to the target, followed by
    /// the target's initial descendants. Outermost first.
    pub fn entry_path(&self, domain: NodeId, target: NodeId) -> Vec<NodeId> {
        let mut path: Vec<NodeId> = self
            .ancestors(target)
            .take_while(|node| *node != domain)
            .collect();
        path.reverse();
        path.extend(self.initial_descent(target));
        path
    }

    /// The leaf reached when the machine starts.
    pub fn initial_leaf(&self) -> NodeId {
        self.initial_descent(self.root())
            .last()
            .copied()
            .unwrap_or_else(|| self.root())
    }
}

impl<C: fmt::Debug, E, Env> fmt::Debug for MachineDefinition<C, E, Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MachineDefinition")
            .field("id", &self.id)
            .field("nodes", &self.nodes)
            .field("initial_context", &self.initial_context)
            .finish()
    }
}
