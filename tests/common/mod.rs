//! Shared fixtures for integration tests.

#![allow(dead_code)]

use appflow::app::{
    AnonymousSession, AppEnv, AppMachine, AuthAdapter, AuthError, AuthUser, LoginResult,
};
use appflow::{MachineHandle, StateConfiguration};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// In-memory identity provider.
#[derive(Debug)]
pub struct MockAuth {
    current_user: Option<String>,
    anonymous_uid: String,
    login_id: String,
    observe_fails: bool,
    sign_out_fails: bool,
    anonymous_fails: bool,
    login_fails: bool,
    sign_outs: AtomicUsize,
    emails: Mutex<Vec<String>>,
}

impl MockAuth {
    pub fn new() -> Self {
        Self {
            current_user: None,
            anonymous_uid: "abc".to_string(),
            login_id: "123".to_string(),
            observe_fails: false,
            sign_out_fails: false,
            anonymous_fails: false,
            login_fails: false,
            sign_outs: AtomicUsize::new(0),
            emails: Mutex::new(Vec::new()),
        }
    }

    pub fn with_user(mut self, uid: &str) -> Self {
        self.current_user = Some(uid.to_string());
        self
    }

    pub fn with_anonymous_uid(mut self, uid: &str) -> Self {
        self.anonymous_uid = uid.to_string();
        self
    }

    pub fn failing_observe(mut self) -> Self {
        self.observe_fails = true;
        self
    }

    pub fn failing_sign_out(mut self) -> Self {
        self.sign_out_fails = true;
        self
    }

    pub fn failing_registration(mut self) -> Self {
        self.anonymous_fails = true;
        self
    }

    pub fn failing_login(mut self) -> Self {
        self.login_fails = true;
        self
    }

    pub fn sign_out_calls(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }

    pub fn emails(&self) -> Vec<String> {
        self.emails.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuthAdapter for MockAuth {
    async fn sign_out(&self) -> Result<(), AuthError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        if self.sign_out_fails {
            return Err(AuthError::Unavailable("sign-out offline".to_string()));
        }
        Ok(())
    }

    async fn sign_in_anonymously(&self) -> Result<AnonymousSession, AuthError> {
        if self.anonymous_fails {
            return Err(AuthError::Other("anonymous sign-in disabled".to_string()));
        }
        Ok(AnonymousSession {
            user: AuthUser {
                uid: self.anonymous_uid.clone(),
            },
        })
    }

    async fn observe_auth_state(&self) -> Result<Option<String>, AuthError> {
        if self.observe_fails {
            return Err(AuthError::Unavailable("no auth state".to_string()));
        }
        Ok(self.current_user.clone())
    }

    async fn sign_in_with_email(&self, email: &str) -> Result<LoginResult, AuthError> {
        self.emails.lock().unwrap().push(email.to_string());
        if self.login_fails {
            return Err(AuthError::Rejected(email.to_string()));
        }
        Ok(LoginResult {
            id: self.login_id.clone(),
        })
    }
}

/// Wait (bounded) until the handle reaches a configuration matching `path`.
pub async fn reach<C, E>(handle: &MachineHandle<C, E>, path: &str) -> StateConfiguration<C>
where
    C: Clone + Send + Sync + 'static,
    E: appflow::Event,
{
    let path = path.to_string();
    tokio::time::timeout(Duration::from_secs(5), handle.wait_for(|c| c.matches(&path)))
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {}", path))
        .expect("interpreter stopped")
}

/// Run every pending invocation of `machine` to completion, feeding results
/// back until none are left.
pub async fn drain(machine: &mut AppMachine, env: &AppEnv) {
    loop {
        let pending = machine.take_invocations();
        if pending.is_empty() {
            return;
        }
        for invocation in pending {
            let id = invocation.id();
            let outcome = invocation.run(env).await;
            machine
                .notify_service_result(id, outcome, env)
                .await
                .expect("service result should apply");
        }
    }
}
