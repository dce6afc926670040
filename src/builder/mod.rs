//! Builder API for ergonomic statechart construction.
//!
//! This module provides fluent builders and the [`event_enum!`](crate::event_enum)
//! macro for declaring state graphs with minimal boilerplate. Building
//! validates the whole graph and accumulates every error.

pub mod error;
pub mod machine;
pub mod macros;
pub mod state;
pub mod transition;

pub use error::{BuildError, BuildErrors};
pub use machine::MachineBuilder;
pub use state::{ServiceBuilder, StateBuilder};
pub use transition::TransitionBuilder;

use crate::chart::Action;
use crate::core::{Fault, Trigger};

/// Action that replaces the context with the result of `f`.
///
/// Shorthand for [`Action::assign`] when the update cannot fail.
///
/// # Example
///
/// ```
/// use appflow::builder::assign;
/// use appflow::core::Trigger;
///
/// let reset = assign::<u32, (), (), _>("reset", |_: &u32, _: &Trigger<()>| 0);
/// assert_eq!(reset.name(), "reset");
/// ```
pub fn assign<C, E, Env, F>(name: &'static str, f: F) -> Action<C, E, Env>
where
    C: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
    Env: Clone + Send + Sync + 'static,
    F: Fn(&C, &Trigger<E>) -> C + Send + Sync + 'static,
{
    Action::assign(name, move |context: &C, trigger: &Trigger<E>| -> Result<C, Fault> {
        Ok(f(context, trigger))
    })
}

/// Unguarded transition to `target`.
pub fn goto<C, E, Env>(target: &str) -> TransitionBuilder<C, E, Env> {
    TransitionBuilder::to(target)
}
