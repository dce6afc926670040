//! Core value types shared by the engine and machine definitions.
//!
//! This module contains the pure pieces of the state machine:
//! - State paths naming positions in the hierarchy
//! - The event trait and the triggers actions observe
//! - Guard predicates over the context
//! - Immutable transition history
//!
//! Nothing in here performs I/O.

mod error;
mod event;
mod guard;
mod history;
mod state;

pub use error::{Fault, ServiceError};
pub use event::{Event, Trigger};
pub use guard::Guard;
pub use history::{StateHistory, StateTransition};
pub use state::StatePath;
