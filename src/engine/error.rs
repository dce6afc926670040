//! Runtime errors for machines and interpreters.

use thiserror::Error;

/// Errors returned by a running machine.
///
/// Every failure leaves the machine exactly as it was before the call.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MachineError {
    #[error("Machine has not been started")]
    NotStarted,

    #[error("Machine has already been started")]
    AlreadyStarted,

    #[error("Guard '{guard}' failed in state '{state}': {message}")]
    GuardFailed {
        guard: String,
        state: String,
        message: String,
    },

    #[error("Action '{action}' failed: {message}")]
    ActionFailed { action: String, message: String },

    #[error("Exceeded {limit} microsteps in one step; check for eventless cycles")]
    MicrostepLimit { limit: usize },

    #[error("Interpreter has stopped")]
    Stopped,
}
