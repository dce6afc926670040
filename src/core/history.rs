//! Transition history tracking.
//!
//! The engine records every microstep it commits as an immutable
//! [`StateTransition`]. History values are never mutated in place.

use super::state::StatePath;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Record of a single microstep.
///
/// # Example
///
/// ```rust
/// use appflow::core::{StatePath, StateTransition};
/// use chrono::Utc;
///
/// let transition = StateTransition {
///     from: StatePath::parse("Home"),
///     to: StatePath::parse("Settings.Idle"),
///     trigger: "OPEN_SETTINGS".to_string(),
///     timestamp: Utc::now(),
/// };
/// assert_eq!(transition.to.top_level(), Some("Settings"));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    /// Active path before the microstep
    pub from: StatePath,
    /// Active path after the microstep
    pub to: StatePath,
    /// Name of the trigger that selected the transition
    pub trigger: String,
    /// When the microstep was committed
    pub timestamp: DateTime<Utc>,
}

/// Ordered, optionally bounded history of transitions.
///
/// `record` returns a new history; the original is left untouched. When a
/// limit is set, the oldest entries are dropped first.
///
/// # Example
///
/// ```rust
/// use appflow::core::{StateHistory, StatePath, StateTransition};
/// use chrono::Utc;
///
/// let history = StateHistory::with_limit(8);
///
/// let history = history.record(StateTransition {
///     from: StatePath::parse("Init.Loading"),
///     to: StatePath::parse("Init.Success"),
///     trigger: "done.invoke.bootstrapApp".to_string(),
///     timestamp: Utc::now(),
/// });
/// let history = history.record(StateTransition {
///     from: StatePath::parse("Init.Success"),
///     to: StatePath::parse("Home"),
///     trigger: "done.state.Init".to_string(),
///     timestamp: Utc::now(),
/// });
///
/// let path = history.get_path();
/// assert_eq!(path.len(), 3);
/// assert_eq!(path[2], &StatePath::parse("Home"));
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StateHistory {
    transitions: VecDeque<StateTransition>,
    limit: Option<usize>,
}

impl StateHistory {
    /// Create an unbounded, empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty history that keeps at most `limit` transitions.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            transitions: VecDeque::new(),
            limit: Some(limit),
        }
    }

    /// Record a transition, returning a new history.
    pub fn record(&self, transition: StateTransition) -> Self {
        let mut next = self.clone();
        next.transitions.push_back(transition);
        if let Some(limit) = next.limit {
            while next.transitions.len() > limit {
                next.transitions.pop_front();
            }
        }
        next
    }

    /// Path of states traversed: the first `from`, then every `to`.
    pub fn get_path(&self) -> Vec<&StatePath> {
        let mut path = Vec::new();
        if let Some(first) = self.transitions.front() {
            path.push(&first.from);
        }
        for transition in &self.transitions {
            path.push(&transition.to);
        }
        path
    }

    /// Elapsed time between the first and last recorded transition.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.front(), self.transitions.back()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    /// Recorded transitions, oldest first.
    pub fn transitions(&self) -> impl ExactSizeIterator<Item = &StateTransition> {
        self.transitions.iter()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn last(&self) -> Option<&StateTransition> {
        self.transitions.back()
    }
}
