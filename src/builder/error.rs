//! Errors reported while building a machine definition.

use std::fmt;
use stillwater::NonEmptyVec;
use thiserror::Error;

/// A single problem found in a machine definition.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("Machine has no states. Add at least one with .state(...)")]
    EmptyMachine,

    #[error("Compound state '{state}' has no initial child. Call .initial(key)")]
    MissingInitialState { state: String },

    #[error("State '{state}' names unknown initial child '{initial}'")]
    UnknownInitialState { state: String, initial: String },

    #[error("State '{path}' is declared more than once")]
    DuplicateState { path: String },

    #[error("Invalid state key '{key}' under '{parent}': keys must be non-empty and contain no '.'")]
    InvalidStateKey { parent: String, key: String },

    #[error("Transition from '{from}' targets unknown state '{target}'")]
    UnknownTarget { from: String, target: String },

    #[error("State '{state}' handles unknown event '{event}'")]
    UnknownEvent { state: String, event: String },

    #[error("Final state '{state}' cannot have children")]
    FinalWithChildren { state: String },

    #[error("State '{state}' invokes '{service}', but only atomic states can invoke services")]
    InvalidInvocation { state: String, service: String },
}

/// Every problem found in a definition, in discovery order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildErrors(Vec<BuildError>);

impl BuildErrors {
    pub fn errors(&self) -> &[BuildError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, error: &BuildError) -> bool {
        self.0.contains(error)
    }
}

impl From<NonEmptyVec<BuildError>> for BuildErrors {
    fn from(errors: NonEmptyVec<BuildError>) -> Self {
        Self(errors.iter().cloned().collect())
    }
}

impl fmt::Display for BuildErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid machine definition ({} error(s))", self.0.len())?;
        for error in &self.0 {
            write!(f, "\n  - {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for BuildErrors {}
