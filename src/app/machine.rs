//! The app navigation and auth statechart.
//!
//! ```text
//! Init ──(isLoggedIn)──> Home <──> Review
//!   └──────────────────> Welcome ──START──> Onboarding ──CONTINUE──> Home
//!                          └──OPEN_LOGIN──> Login ──(isLoggedIn)──> Home
//!                                             └─────BACK─────────> Welcome
//! Home ──OPEN_SETTINGS──> Settings ──LOGOUT──> Welcome
//! ```

use super::auth::{AnonymousSession, AuthAdapter, BootstrapResult, LoginResult};
use super::context::{normalize_user_id, AppContext};
use super::event::AppEvent;
use crate::builder::{goto, BuildErrors, MachineBuilder, ServiceBuilder, StateBuilder, TransitionBuilder};
use crate::chart::{Action, MachineDefinition};
use crate::config::EngineConfig;
use crate::core::{Fault, Guard, ServiceError, Trigger};
use crate::engine::{Interpreter, Machine, MachineError, MachineHandle};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use stillwater::effect::BoxedEffect;
use stillwater::prelude::*;
use thiserror::Error;

/// Dependencies injected into the app machine.
#[derive(Clone)]
pub struct AppEnv {
    pub auth: Arc<dyn AuthAdapter>,
}

impl AppEnv {
    pub fn new(auth: Arc<dyn AuthAdapter>) -> Self {
        Self { auth }
    }
}

impl fmt::Debug for AppEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppEnv").finish_non_exhaustive()
    }
}

pub type AppDefinition = MachineDefinition<AppContext, AppEvent, AppEnv>;
pub type AppMachine = Machine<AppContext, AppEvent, AppEnv>;
pub type AppHandle = MachineHandle<AppContext, AppEvent>;

type State = StateBuilder<AppContext, AppEvent, AppEnv>;
type To = TransitionBuilder<AppContext, AppEvent, AppEnv>;
type AppAction = Action<AppContext, AppEvent, AppEnv>;

/// Errors from wiring up the app machine.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Definition(#[from] BuildErrors),

    #[error("Failed to start app machine: {0}")]
    Machine(#[from] MachineError),
}

/// Passes when a user is signed in.
pub fn is_logged_in() -> Guard<AppContext> {
    Guard::new("isLoggedIn", AppContext::is_logged_in)
}

/// Build the app statechart.
pub fn definition() -> Result<AppDefinition, BuildErrors> {
    MachineBuilder::new("AppMachine", AppContext::default())
        .initial("Init")
        .states(vec![
            init(),
            review(),
            login(),
            home(),
            settings(),
            onboarding(),
            welcome(),
        ])
        .build()
}

/// An unstarted app machine.
pub fn machine(config: EngineConfig) -> Result<AppMachine, BuildErrors> {
    Ok(Machine::new(Arc::new(definition()?), config))
}

/// Start the app machine on its own task with `auth` as identity provider.
pub async fn spawn(auth: Arc<dyn AuthAdapter>, config: EngineConfig) -> Result<AppHandle, AppError> {
    let machine = machine(config)?;
    let handle = Interpreter::spawn(machine, AppEnv::new(auth)).await?;
    Ok(handle)
}

fn init() -> State {
    State::new("Init")
        .initial("Loading")
        .child(
            State::new("Loading").invoke(
                ServiceBuilder::new("bootstrapApp", bootstrap_app)
                    .on_done(To::to("Success").action(assign_bootstrap_user()))
                    .on_error(goto("Error")),
            ),
        )
        .child(State::final_state("Success"))
        .child(State::final_state("Error"))
        .on_done(To::to("Home").guard(is_logged_in()))
        .on_done(goto("Welcome"))
}

fn review() -> State {
    State::new("Review")
        .on("BACK", goto("Home"))
        .on_done(goto("Home"))
}

fn login() -> State {
    State::new("Login")
        .initial("Idle")
        .child(
            State::new("Idle")
                .on("SUBMIT_LOGIN", goto("Loading"))
                .on("BACK", goto("Done")),
        )
        .child(
            State::new("Loading").invoke(
                ServiceBuilder::new("loginUser", login_user)
                    .on_done(To::to("Done").action(assign_user_id()))
                    .on_error(goto("Error")),
            ),
        )
        // Dead end: nothing leaves a failed login.
        .child(State::new("Error"))
        .child(State::final_state("Done"))
        .on_done(To::to("Home").guard(is_logged_in()))
        .on_done(goto("Welcome"))
}

fn home() -> State {
    State::new("Home")
        .on("START_REVIEW", goto("Review"))
        .on("OPEN_SETTINGS", goto("Settings"))
}

fn settings() -> State {
    State::new("Settings")
        .initial("Idle")
        .child(State::new("Idle").on("BACK", goto("Done")))
        .child(State::final_state("Done"))
        .on_done(goto("Home"))
        .on(
            "LOGOUT",
            To::to("Welcome")
                .action(logout_user())
                .action(clear_user_id()),
        )
}

fn onboarding() -> State {
    State::new("Onboarding")
        .initial("Loading")
        .child(
            State::new("Loading").invoke(
                ServiceBuilder::new("registerUser", register_user)
                    .on_done(To::to("Success").action(assign_registered_user()))
                    .on_error(goto("Error")),
            ),
        )
        .child(State::new("Error"))
        .child(State::new("Success").always(goto("Idle")))
        .child(State::new("Idle").on("CONTINUE", goto("Complete")))
        .child(State::final_state("Complete"))
        .on_done(goto("Home"))
}

fn welcome() -> State {
    State::new("Welcome")
        .initial("Idle")
        .child(State::new("Idle").on("START", goto("Complete")))
        .child(State::final_state("Complete"))
        .on("OPEN_LOGIN", goto("Login"))
        .on_done(goto("Onboarding"))
}

fn assign_bootstrap_user() -> AppAction {
    Action::assign("assignBootstrapUser", |context: &AppContext, trigger: &Trigger<AppEvent>| {
        let result: BootstrapResult = trigger.data_as()?;
        Ok(context.with_user_id(result.user_id))
    })
}

fn assign_registered_user() -> AppAction {
    Action::assign("assignRegisteredUser", |context: &AppContext, trigger: &Trigger<AppEvent>| {
        let session: AnonymousSession = trigger.data_as()?;
        Ok(context.with_user_id(Some(session.user.uid)))
    })
}

fn assign_user_id() -> AppAction {
    Action::assign("assignUserId", |context: &AppContext, trigger: &Trigger<AppEvent>| {
        let result: LoginResult = trigger.data_as()?;
        Ok(context.with_user_id(Some(result.id)))
    })
}

fn clear_user_id() -> AppAction {
    Action::assign("clearUserId", |context: &AppContext, _: &Trigger<AppEvent>| {
        Ok(context.with_user_id(None))
    })
}

fn logout_user() -> AppAction {
    Action::effect("logoutUser", |_: &AppContext, _: &Trigger<AppEvent>| {
        from_async(|env: &AppEnv| sign_out(Arc::clone(&env.auth))).boxed()
    })
}

fn bootstrap_app(_: &AppContext, _: &Trigger<AppEvent>) -> BoxedEffect<Value, ServiceError, AppEnv> {
    from_async(|env: &AppEnv| observe_auth_state(Arc::clone(&env.auth))).boxed()
}

fn register_user(_: &AppContext, _: &Trigger<AppEvent>) -> BoxedEffect<Value, ServiceError, AppEnv> {
    from_async(|env: &AppEnv| sign_in_anonymously(Arc::clone(&env.auth))).boxed()
}

fn login_user(_: &AppContext, trigger: &Trigger<AppEvent>) -> BoxedEffect<Value, ServiceError, AppEnv> {
    let email = match trigger.event() {
        Some(AppEvent::SubmitLogin { email }) => email.clone(),
        _ => return fail(ServiceError::new("loginUser requires a SUBMIT_LOGIN event")).boxed(),
    };
    from_async(move |env: &AppEnv| sign_in_with_email(Arc::clone(&env.auth), email)).boxed()
}

async fn sign_out(auth: Arc<dyn AuthAdapter>) -> Result<(), Fault> {
    auth.sign_out().await?;
    Ok(())
}

async fn observe_auth_state(auth: Arc<dyn AuthAdapter>) -> Result<Value, ServiceError> {
    let user_id = auth.observe_auth_state().await?;
    let result = BootstrapResult {
        user_id: normalize_user_id(user_id),
    };
    Ok(serde_json::to_value(result)?)
}

async fn sign_in_anonymously(auth: Arc<dyn AuthAdapter>) -> Result<Value, ServiceError> {
    let session = auth.sign_in_anonymously().await?;
    Ok(serde_json::to_value(session)?)
}

async fn sign_in_with_email(auth: Arc<dyn AuthAdapter>, email: String) -> Result<Value, ServiceError> {
    let result = auth.sign_in_with_email(&email).await?;
    Ok(serde_json::to_value(result)?)
}
