//! The app navigation and authentication machine.
//!
//! Decides which screen is active, sequences bootstrap, registration, login
//! and logout through an injected [`AuthAdapter`], and keeps the signed-in
//! user id in [`AppContext`].
//!
//! # Example
//!
//! ```rust,no_run
//! use appflow::app::{self, AppEvent, AuthAdapter, Screen};
//! use appflow::config::EngineConfig;
//! use std::sync::Arc;
//!
//! async fn run(auth: Arc<dyn AuthAdapter>) -> Result<(), Box<dyn std::error::Error>> {
//!     let handle = app::spawn(auth, EngineConfig::default()).await?;
//!     let settled = handle.wait_for(|c| !c.matches("Init")).await?;
//!
//!     if Screen::for_configuration(&settled) == Some(Screen::Welcome) {
//!         handle.send(AppEvent::OpenLogin).await?;
//!         handle.send(AppEvent::submit_login("a@b.com")).await?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod context;
pub mod event;
pub mod machine;
pub mod screen;

pub use auth::{AnonymousSession, AuthAdapter, AuthError, AuthUser, BootstrapResult, LoginResult};
pub use context::AppContext;
pub use event::AppEvent;
pub use machine::{
    definition, is_logged_in, machine, spawn, AppDefinition, AppEnv, AppError, AppHandle,
    AppMachine,
};
pub use screen::Screen;
