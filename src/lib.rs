//! Appflow: a hierarchical state machine for app navigation and auth flow
//!
//! Appflow follows Stillwater's "pure core, imperative shell" philosophy.
//! State graphs are immutable data, guards are pure predicates, context
//! updates are pure functions returning a new context, and everything that
//! touches the outside world is a Stillwater effect run against an injected
//! environment.
//!
//! # Core Concepts
//!
//! - **Statechart**: nested states with initial children, final states and
//!   completion transitions
//! - **Events**: tagged values declared with [`event_enum!`]
//! - **Invocations**: async services owned by a state while it is active
//! - **Interpreter**: an actor that serializes events and service results
//!
//! # Example
//!
//! ```rust
//! use appflow::builder::{goto, MachineBuilder, StateBuilder};
//! use appflow::config::EngineConfig;
//! use appflow::engine::Interpreter;
//! use appflow::event_enum;
//! use appflow::Machine;
//! use std::sync::Arc;
//!
//! event_enum! {
//!     enum Wizard {
//!         Next => "NEXT",
//!         Back => "BACK",
//!     }
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let definition = MachineBuilder::<(), Wizard, ()>::new("wizard", ())
//!     .initial("Steps")
//!     .state(
//!         StateBuilder::new("Steps")
//!             .initial("One")
//!             .child(StateBuilder::new("One").on("NEXT", goto("Two")))
//!             .child(StateBuilder::new("Two").on("NEXT", goto("Finished")))
//!             .child(StateBuilder::final_state("Finished"))
//!             .on_done(goto("Summary")),
//!     )
//!     .state(StateBuilder::new("Summary").on("BACK", goto("Steps")))
//!     .build()
//!     .unwrap();
//!
//! let machine = Machine::new(Arc::new(definition), EngineConfig::default());
//! let handle = Interpreter::spawn(machine, ()).await.unwrap();
//!
//! handle.send(Wizard::Next).await.unwrap();
//! let config = handle.send(Wizard::Next).await.unwrap();
//! assert!(config.matches("Summary"));
//! # });
//! ```

pub mod app;
pub mod builder;
pub mod chart;
pub mod config;
pub mod core;
pub mod engine;
pub mod logging;

// Re-export commonly used types
pub use builder::{MachineBuilder, StateBuilder, TransitionBuilder};
pub use config::EngineConfig;
pub use core::{Event, Guard, StateHistory, StatePath, StateTransition, Trigger};
pub use engine::{Interpreter, Machine, MachineError, MachineHandle, StateConfiguration};
