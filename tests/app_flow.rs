//! End-to-end flows through the app machine running on its interpreter.

mod common;

use appflow::app::{self, AppContext, AppEvent, Screen};
use appflow::{EngineConfig, MachineError};
use common::{reach, MockAuth};
use std::sync::Arc;

async fn spawn(auth: &Arc<MockAuth>) -> app::AppHandle {
    app::spawn(auth.clone(), EngineConfig::default())
        .await
        .expect("app machine should start")
}

#[tokio::test]
async fn bootstrap_without_user_settles_at_welcome() {
    let auth = Arc::new(MockAuth::new());
    let handle = spawn(&auth).await;

    let config = reach(&handle, "Welcome").await;

    assert_eq!(config.value.to_string(), "Welcome.Idle");
    assert_eq!(config.context, AppContext::default());
    assert_eq!(Screen::for_configuration(&config), Some(Screen::Welcome));
}

#[tokio::test]
async fn bootstrap_with_user_goes_home() {
    let auth = Arc::new(MockAuth::new().with_user("u1"));
    let handle = spawn(&auth).await;

    let config = reach(&handle, "Home").await;

    assert_eq!(config.context.user_id.as_deref(), Some("u1"));
    assert!(!config.matches("Init"));
}

#[tokio::test]
async fn failed_bootstrap_continues_logged_out() {
    let auth = Arc::new(MockAuth::new().failing_observe());
    let handle = spawn(&auth).await;

    let config = reach(&handle, "Welcome.Idle").await;

    assert!(!config.context.is_logged_in());
}

#[tokio::test]
async fn start_registers_anonymously_then_continues_home() {
    let auth = Arc::new(MockAuth::new());
    let handle = spawn(&auth).await;
    reach(&handle, "Welcome.Idle").await;

    let config = handle.send(AppEvent::Start).await.unwrap();
    assert!(config.matches("Onboarding"));

    let config = reach(&handle, "Onboarding.Idle").await;
    assert_eq!(config.context.user_id.as_deref(), Some("abc"));

    let config = handle.send(AppEvent::Continue).await.unwrap();
    assert_eq!(config.value.to_string(), "Home");
    assert_eq!(config.context.user_id.as_deref(), Some("abc"));
}

#[tokio::test]
async fn logout_signs_out_and_returns_to_welcome() {
    let auth = Arc::new(MockAuth::new().with_user("u1"));
    let handle = spawn(&auth).await;
    reach(&handle, "Home").await;

    let config = handle.send(AppEvent::OpenSettings).await.unwrap();
    assert_eq!(config.value.to_string(), "Settings.Idle");

    let config = handle.send(AppEvent::Logout).await.unwrap();

    assert_eq!(config.value.to_string(), "Welcome.Idle");
    assert_eq!(config.context.user_id, None);
    assert_eq!(auth.sign_out_calls(), 1);
}

#[tokio::test]
async fn failed_sign_out_keeps_settings() {
    let auth = Arc::new(MockAuth::new().with_user("u1").failing_sign_out());
    let handle = spawn(&auth).await;
    reach(&handle, "Home").await;
    handle.send(AppEvent::OpenSettings).await.unwrap();

    let result = handle.send(AppEvent::Logout).await;

    assert!(matches!(
        result,
        Err(MachineError::ActionFailed { ref action, .. }) if action == "logoutUser"
    ));
    let config = handle.state();
    assert_eq!(config.value.to_string(), "Settings.Idle");
    assert_eq!(config.context.user_id.as_deref(), Some("u1"));
}

#[tokio::test]
async fn email_login_goes_home() {
    let auth = Arc::new(MockAuth::new());
    let handle = spawn(&auth).await;
    reach(&handle, "Welcome.Idle").await;

    let config = handle.send(AppEvent::OpenLogin).await.unwrap();
    assert_eq!(config.value.to_string(), "Login.Idle");

    let config = handle.send(AppEvent::submit_login("a@b.com")).await.unwrap();
    assert!(config.matches("Login") || config.matches("Home"));

    let config = reach(&handle, "Home").await;
    assert_eq!(config.context.user_id.as_deref(), Some("123"));
    assert_eq!(auth.emails(), vec!["a@b.com"]);
}

#[tokio::test]
async fn failed_login_is_a_dead_end() {
    let auth = Arc::new(MockAuth::new().failing_login());
    let handle = spawn(&auth).await;
    reach(&handle, "Welcome.Idle").await;
    handle.send(AppEvent::OpenLogin).await.unwrap();
    handle.send(AppEvent::submit_login("a@b.com")).await.unwrap();

    let config = reach(&handle, "Login.Error").await;
    assert!(config.next_events.is_empty());

    for event in AppEvent::samples() {
        let after = handle.send(event).await.unwrap();
        assert_eq!(after, config);
    }
}

#[tokio::test]
async fn failed_registration_is_a_dead_end() {
    let auth = Arc::new(MockAuth::new().failing_registration());
    let handle = spawn(&auth).await;
    reach(&handle, "Welcome.Idle").await;
    handle.send(AppEvent::Start).await.unwrap();

    let config = reach(&handle, "Onboarding.Error").await;

    assert!(!config.context.is_logged_in());
    let after = handle.send(AppEvent::Continue).await.unwrap();
    assert_eq!(after, config);
}

#[tokio::test]
async fn welcome_login_back_round_trip() {
    let auth = Arc::new(MockAuth::new());
    let handle = spawn(&auth).await;
    let before = reach(&handle, "Welcome.Idle").await;

    handle.send(AppEvent::OpenLogin).await.unwrap();
    let after = handle.send(AppEvent::Back).await.unwrap();

    assert_eq!(after.value, before.value);
    assert_eq!(after.context, before.context);
    assert!(auth.emails().is_empty());
}

#[tokio::test]
async fn review_and_settings_return_home() {
    let auth = Arc::new(MockAuth::new().with_user("u1"));
    let handle = spawn(&auth).await;
    reach(&handle, "Home").await;

    handle.send(AppEvent::StartReview).await.unwrap();
    let config = handle.send(AppEvent::Back).await.unwrap();
    assert_eq!(config.value.to_string(), "Home");

    handle.send(AppEvent::OpenSettings).await.unwrap();
    let config = handle.send(AppEvent::Back).await.unwrap();
    assert_eq!(config.value.to_string(), "Home");
}

#[tokio::test]
async fn unhandled_events_change_nothing() {
    let auth = Arc::new(MockAuth::new().with_user("u1"));
    let handle = spawn(&auth).await;
    let home = reach(&handle, "Home").await;

    for event in [AppEvent::Continue, AppEvent::Logout, AppEvent::Start, AppEvent::Back] {
        let after = handle.send(event).await.unwrap();
        assert_eq!(after, home);
    }
}

#[tokio::test]
async fn blank_anonymous_uid_is_not_a_login() {
    let auth = Arc::new(MockAuth::new().with_anonymous_uid(""));
    let handle = spawn(&auth).await;
    reach(&handle, "Welcome.Idle").await;
    handle.send(AppEvent::Start).await.unwrap();

    let config = reach(&handle, "Onboarding.Idle").await;

    assert_eq!(config.context.user_id, None);
    assert!(!app::is_logged_in().check(&config.context).unwrap());
}

#[tokio::test]
async fn subscribers_see_each_screen() {
    let auth = Arc::new(MockAuth::new().with_user("u1"));
    let handle = spawn(&auth).await;
    reach(&handle, "Home").await;
    let mut receiver = handle.subscribe();

    handle.send(AppEvent::StartReview).await.unwrap();
    receiver.changed().await.unwrap();

    let seen = receiver.borrow_and_update().clone();
    assert_eq!(Screen::for_configuration(&seen), Some(Screen::Review));
}
