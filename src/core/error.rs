//! Error values produced by guards, actions and invoked services.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A fatal failure inside a guard or action.
///
/// Faults are programming errors in condition or mutation logic. They abort
/// the in-progress `send` and leave the machine where it was.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Fault {
    message: String,
}

impl Fault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Failure reported by an invoked service.
///
/// Unlike a [`Fault`], this is an expected outcome: it is routed to the
/// owning state's error transition.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ServiceError {
    message: String,
}

impl ServiceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("could not encode service result: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_displays_message() {
        let fault = Fault::new("guard exploded");
        assert_eq!(fault.to_string(), "guard exploded");
        assert_eq!(fault.message(), "guard exploded");
    }

    #[test]
    fn service_error_serializes() {
        let error = ServiceError::new("network down");
        let json = serde_json::to_string(&error).unwrap();
        let back: ServiceError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, error);
    }
}
