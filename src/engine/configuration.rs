//! Snapshots of the active state.

use crate::core::StatePath;
use serde::Serialize;

/// Active path and context after a step.
///
/// A new configuration is produced for every step; existing ones are never
/// updated.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StateConfiguration<C> {
    /// Path of the active leaf, e.g. `Login.Loading`.
    pub value: StatePath,

    /// Context snapshot.
    pub context: C,

    /// Event tags handled by the active leaf or one of its ancestors, in
    /// lookup order. A tag listed here may still be refused by a guard.
    pub next_events: Vec<&'static str>,

    /// Whether the machine reached a top-level final state.
    pub done: bool,
}

impl<C> StateConfiguration<C> {
    /// Whether the active path starts with the dotted `path`.
    ///
    /// `matches("Login")` holds in `Login.Idle` and `Login.Loading`, but
    /// not in `LoginHelp`.
    pub fn matches(&self, path: &str) -> bool {
        self.value.matches(path)
    }

    /// Whether an event with tag `kind` has a handler somewhere on the
    /// active path.
    pub fn handles(&self, kind: &str) -> bool {
        self.next_events.iter().any(|k| *k == kind)
    }
}
