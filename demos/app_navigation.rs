//! App Navigation
//!
//! This example drives the app machine through a whole session against an
//! in-memory identity provider.
//!
//! Key concepts:
//! - Bootstrap with no signed-in user settles on the welcome screen
//! - Anonymous registration during onboarding
//! - Logout from settings through the injected auth adapter
//! - Email login completing the login flow
//!
//! Run with: cargo run --example app_navigation

use appflow::app::{
    self, AnonymousSession, AppEvent, AppHandle, AuthAdapter, AuthError, AuthUser, LoginResult,
    Screen,
};
use appflow::config::EngineConfig;
use appflow::logging::init_logging;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Identity provider that keeps the current user in memory.
#[derive(Debug, Default)]
struct MemoryAuth {
    current_user: Mutex<Option<String>>,
}

impl MemoryAuth {
    fn set_user(&self, uid: Option<&str>) {
        if let Ok(mut current) = self.current_user.lock() {
            *current = uid.map(str::to_string);
        }
    }
}

#[async_trait]
impl AuthAdapter for MemoryAuth {
    async fn sign_out(&self) -> Result<(), AuthError> {
        println!("  [auth] sign out");
        self.set_user(None);
        Ok(())
    }

    async fn sign_in_anonymously(&self) -> Result<AnonymousSession, AuthError> {
        println!("  [auth] anonymous sign-in");
        self.set_user(Some("abc"));
        Ok(AnonymousSession {
            user: AuthUser {
                uid: "abc".to_string(),
            },
        })
    }

    async fn observe_auth_state(&self) -> Result<Option<String>, AuthError> {
        self.current_user
            .lock()
            .map(|current| current.clone())
            .map_err(|_| AuthError::Other("auth state poisoned".to_string()))
    }

    async fn sign_in_with_email(&self, email: &str) -> Result<LoginResult, AuthError> {
        println!("  [auth] email sign-in for {}", email);
        self.set_user(Some("123"));
        Ok(LoginResult {
            id: "123".to_string(),
        })
    }
}

async fn settle(handle: &AppHandle, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = handle.wait_for(|c| c.matches(path)).await?;
    let screen = Screen::for_configuration(&config)
        .map(|screen| screen.to_string())
        .unwrap_or_else(|| "?".to_string());
    println!(
        "  state: {:<16} screen: {:<11} user: {:?}",
        config.value.to_string(),
        screen,
        config.context.user_id
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    println!("=== App Navigation Example ===\n");

    let auth = Arc::new(MemoryAuth::default());
    let handle = app::spawn(auth, EngineConfig::default()).await?;

    println!("1. Bootstrap with nobody signed in");
    settle(&handle, "Welcome.Idle").await?;

    println!("\n2. Start onboarding, then continue");
    handle.send(AppEvent::Start).await?;
    settle(&handle, "Onboarding.Idle").await?;
    handle.send(AppEvent::Continue).await?;
    settle(&handle, "Home").await?;

    println!("\n3. Log out from settings");
    handle.send(AppEvent::OpenSettings).await?;
    settle(&handle, "Settings.Idle").await?;
    handle.send(AppEvent::Logout).await?;
    settle(&handle, "Welcome.Idle").await?;

    println!("\n4. Log in with email");
    handle.send(AppEvent::OpenLogin).await?;
    settle(&handle, "Login.Idle").await?;
    handle.send(AppEvent::submit_login("a@b.com")).await?;
    settle(&handle, "Home").await?;

    handle.stop().await?;
    println!("\n=== Example Complete ===");
    Ok(())
}
