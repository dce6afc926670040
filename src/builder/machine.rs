//! Builder for machine definitions.

use crate::builder::error::{BuildError, BuildErrors};
use crate::builder::state::StateBuilder;
use crate::builder::transition::TransitionBuilder;
use crate::chart::{
    Action, MachineDefinition, NodeId, NodeKind, ServiceDef, StateNode, TransitionDef,
    TransitionKey,
};
use crate::core::{Event, StatePath};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

type Check = Validation<(), NonEmptyVec<BuildError>>;

/// Builder for constructing machine definitions with a fluent API.
///
/// `build` validates the whole graph and reports every problem at once
/// instead of stopping at the first.
pub struct MachineBuilder<C, E, Env> {
    id: String,
    initial_context: C,
    root: StateBuilder<C, E, Env>,
}

impl<C, E: Event, Env> MachineBuilder<C, E, Env> {
    /// Create a builder for machine `id` starting with `initial_context`.
    pub fn new(id: &str, initial_context: C) -> Self {
        Self {
            id: id.to_string(),
            initial_context,
            root: StateBuilder::new(""),
        }
    }

    /// Set the initial top-level state (required).
    pub fn initial(mut self, key: &str) -> Self {
        self.root = self.root.initial(key);
        self
    }

    /// Add a top-level state.
    pub fn state(mut self, state: StateBuilder<C, E, Env>) -> Self {
        self.root = self.root.child(state);
        self
    }

    /// Add several top-level states at once.
    pub fn states(mut self, states: Vec<StateBuilder<C, E, Env>>) -> Self {
        for state in states {
            self.root = self.root.child(state);
        }
        self
    }

    /// Build the definition, or every validation error found.
    pub fn build(self) -> Result<MachineDefinition<C, E, Env>, BuildErrors> {
        let mut shapes = Vec::new();
        let mut bodies = Vec::new();
        flatten(self.root, StatePath::root(), None, &mut shapes, &mut bodies);

        let mut checks: Vec<Check> = vec![check(!shapes[0].children.is_empty(), || {
            BuildError::EmptyMachine
        })];

        for shape in &shapes {
            checks.extend(check_child_keys(shape, &shapes));
        }

        let mut nodes = Vec::with_capacity(bodies.len());
        for (index, body) in bodies.into_iter().enumerate() {
            let shape = &shapes[index];
            let kind = resolve_kind(index, &body, &shapes, &mut checks);

            let mut pending: Vec<(TransitionKey, TransitionBuilder<C, E, Env>)> = body.transitions;
            let mut invoke: Option<ServiceDef<C, E, Env>> = None;
            if let Some(service) = body.invoke {
                if kind != NodeKind::Atomic {
                    checks.push(Validation::fail(BuildError::InvalidInvocation {
                        state: shape.path.to_string(),
                        service: service.service.id().to_string(),
                    }));
                }
                pending.extend(service.on_done.into_iter().map(|t| (TransitionKey::ServiceDone, t)));
                pending.extend(service.on_error.into_iter().map(|t| (TransitionKey::ServiceError, t)));
                invoke = Some(service.service);
            }

            let mut transitions = Vec::with_capacity(pending.len());
            for (key, transition) in pending {
                if let TransitionKey::Event(kind) = key {
                    checks.push(check(E::kinds().contains(&kind), || BuildError::UnknownEvent {
                        state: shape.path.to_string(),
                        event: kind.to_string(),
                    }));
                }

                let target = match &transition.target {
                    None => None,
                    Some(name) => match resolve_target(index, name, &shapes) {
                        Some(id) => Some(id),
                        None => {
                            checks.push(Validation::fail(BuildError::UnknownTarget {
                                from: shape.path.to_string(),
                                target: name.clone(),
                            }));
                            continue;
                        }
                    },
                };

                transitions.push(TransitionDef {
                    key,
                    target,
                    guard: transition.guard,
                    actions: transition.actions,
                });
            }

            nodes.push(StateNode {
                id: NodeId(index),
                path: shape.path.clone(),
                parent: shape.parent.map(NodeId),
                children: shape.children.iter().copied().map(NodeId).collect(),
                kind,
                transitions,
                entry: body.entry,
                exit: body.exit,
                invoke,
            });
        }

        match Validation::all_vec(checks) {
            Validation::Success(_) => Ok(MachineDefinition::from_parts(
                self.id,
                nodes,
                self.initial_context,
            )),
            Validation::Failure(errors) => Err(BuildErrors::from(errors)),
        }
    }
}

/// Position of a node in the tree, kept apart from its body so targets can
/// be resolved while bodies are consumed.
struct Shape {
    key: String,
    path: StatePath,
    parent: Option<usize>,
    children: Vec<usize>,
}

struct Body<C, E, Env> {
    initial: Option<String>,
    is_final: bool,
    transitions: Vec<(TransitionKey, TransitionBuilder<C, E, Env>)>,
    entry: Vec<Action<C, E, Env>>,
    exit: Vec<Action<C, E, Env>>,
    invoke: Option<crate::builder::state::ServiceBuilder<C, E, Env>>,
}

fn flatten<C, E, Env>(
    builder: StateBuilder<C, E, Env>,
    path: StatePath,
    parent: Option<usize>,
    shapes: &mut Vec<Shape>,
    bodies: &mut Vec<Body<C, E, Env>>,
) -> usize {
    let StateBuilder {
        key,
        initial,
        is_final,
        children,
        transitions,
        entry,
        exit,
        invoke,
    } = builder;

    let index = shapes.len();
    shapes.push(Shape {
        key,
        path: path.clone(),
        parent,
        children: Vec::new(),
    });
    bodies.push(Body {
        initial,
        is_final,
        transitions,
        entry,
        exit,
        invoke,
    });

    for child in children {
        let child_path = path.child(&child.key);
        let child_index = flatten(child, child_path, Some(index), shapes, bodies);
        shapes[index].children.push(child_index);
    }
    index
}

fn check(condition: bool, error: impl FnOnce() -> BuildError) -> Check {
    if condition {
        Validation::success(())
    } else {
        Validation::fail(error())
    }
}

fn check_child_keys(shape: &Shape, shapes: &[Shape]) -> Vec<Check> {
    let mut checks = Vec::new();
    let mut seen: Vec<&str> = Vec::new();
    for &child in &shape.children {
        let key = shapes[child].key.as_str();
        if key.is_empty() || key.contains('.') {
            checks.push(Validation::fail(BuildError::InvalidStateKey {
                parent: shape.path.to_string(),
                key: key.to_string(),
            }));
        }
        if seen.contains(&key) {
            checks.push(Validation::fail(BuildError::DuplicateState {
                path: shapes[child].path.to_string(),
            }));
        }
        seen.push(key);
    }
    checks
}

fn child_by_key(parent: usize, key: &str, shapes: &[Shape]) -> Option<usize> {
    shapes[parent]
        .children
        .iter()
        .copied()
        .find(|&child| shapes[child].key == key)
}

fn resolve_kind<C, E, Env>(
    index: usize,
    body: &Body<C, E, Env>,
    shapes: &[Shape],
    checks: &mut Vec<Check>,
) -> NodeKind {
    let shape = &shapes[index];
    let state = shape.path.to_string();

    if body.is_final {
        checks.push(check(shape.children.is_empty(), || BuildError::FinalWithChildren {
            state: state.clone(),
        }));
        return NodeKind::Final;
    }

    match (&body.initial, shape.children.is_empty()) {
        (None, true) => NodeKind::Atomic,
        (None, false) => {
            checks.push(Validation::fail(BuildError::MissingInitialState { state }));
            NodeKind::Atomic
        }
        (Some(initial), _) => match child_by_key(index, initial, shapes) {
            Some(child) => NodeKind::Compound {
                initial: NodeId(child),
            },
            None => {
                checks.push(Validation::fail(BuildError::UnknownInitialState {
                    state,
                    initial: initial.clone(),
                }));
                NodeKind::Atomic
            }
        },
    }
}

/// Resolve `target` among the siblings of `source`, descending through
/// dotted segments. Transitions declared on the root resolve among its
/// children.
fn resolve_target(source: usize, target: &str, shapes: &[Shape]) -> Option<NodeId> {
    let segments: Vec<&str> = target.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return None;
    }
    let mut current = shapes[source].parent.unwrap_or(source);
    for segment in segments {
        current = child_by_key(current, segment, shapes)?;
    }
    Some(NodeId(current))
}
