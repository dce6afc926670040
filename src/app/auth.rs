//! Boundary to the identity provider.
//!
//! The app machine never talks to a provider directly. It calls an
//! [`AuthAdapter`] carried in its environment, so tests and other hosts can
//! substitute their own.

use crate::core::{Fault, ServiceError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by the identity provider.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum AuthError {
    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),

    #[error("Credentials rejected: {0}")]
    Rejected(String),

    #[error("Auth operation failed: {0}")]
    Other(String),
}

impl From<AuthError> for ServiceError {
    fn from(error: AuthError) -> Self {
        ServiceError::new(error.to_string())
    }
}

impl From<AuthError> for Fault {
    fn from(error: AuthError) -> Self {
        Fault::new(error.to_string())
    }
}

/// Signed-in user as reported by the provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub uid: String,
}

/// Result of an anonymous sign-in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonymousSession {
    pub user: AuthUser,
}

/// Result of an email sign-in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResult {
    pub id: String,
}

/// Value produced by the bootstrap service: the user already signed in, if
/// any.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapResult {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Operations the app machine needs from the identity provider.
#[async_trait]
pub trait AuthAdapter: Send + Sync {
    /// End the current session.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Create an anonymous account and sign into it.
    async fn sign_in_anonymously(&self) -> Result<AnonymousSession, AuthError>;

    /// First auth-state notification: the signed-in user id, if any.
    ///
    /// Implementations release any subscription they opened once the first
    /// notification has been delivered.
    async fn observe_auth_state(&self) -> Result<Option<String>, AuthError>;

    /// Sign in with an email address.
    async fn sign_in_with_email(&self, email: &str) -> Result<LoginResult, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payloads_match_service_shapes() {
        let session = AnonymousSession {
            user: AuthUser {
                uid: "abc".to_string(),
            },
        };
        assert_eq!(serde_json::to_value(&session).unwrap(), json!({ "user": { "uid": "abc" } }));

        let login = LoginResult {
            id: "123".to_string(),
        };
        assert_eq!(serde_json::to_value(&login).unwrap(), json!({ "id": "123" }));
    }

    #[test]
    fn bootstrap_result_tolerates_missing_user() {
        let result: BootstrapResult = serde_json::from_value(json!({})).unwrap();
        assert_eq!(result.user_id, None);

        let result: BootstrapResult = serde_json::from_value(json!({ "userId": "u1" })).unwrap();
        assert_eq!(result.user_id.as_deref(), Some("u1"));
    }

    #[test]
    fn errors_render_reason() {
        let error = AuthError::Unavailable("offline".to_string());
        assert_eq!(error.to_string(), "Identity provider unavailable: offline");
    }
}
