//! Running statecharts.
//!
//! - [`Machine`]: synchronous-core interpreter stepping a definition
//! - [`Interpreter`] / [`MachineHandle`]: async actor that owns a machine
//!   and runs its invoked services on tokio tasks
//!
//! # Example
//!
//! ```rust
//! use appflow::builder::{goto, MachineBuilder, StateBuilder};
//! use appflow::config::EngineConfig;
//! use appflow::engine::Machine;
//! use appflow::event_enum;
//! use std::sync::Arc;
//!
//! event_enum! {
//!     enum Door {
//!         Open => "OPEN",
//!         Close => "CLOSE",
//!     }
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let definition = MachineBuilder::<(), Door, ()>::new("door", ())
//!     .initial("Closed")
//!     .state(StateBuilder::new("Closed").on("OPEN", goto("Opened")))
//!     .state(StateBuilder::new("Opened").on("CLOSE", goto("Closed")))
//!     .build()
//!     .unwrap();
//!
//! let mut machine = Machine::new(Arc::new(definition), EngineConfig::default());
//! machine.start(&()).await.unwrap();
//! let config = machine.send(Door::Open, &()).await.unwrap();
//! assert!(config.matches("Opened"));
//! # });
//! ```

mod configuration;
mod error;
mod interpreter;
mod machine;

pub use configuration::StateConfiguration;
pub use error::MachineError;
pub use interpreter::{Interpreter, MachineHandle};
pub use machine::Machine;
