//! Context carried by the app machine.

use serde::{Deserialize, Serialize};

/// Shared record the app machine mutates.
///
/// `user_id` is `Some` exactly when a user is signed in.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppContext {
    pub user_id: Option<String>,
}

impl AppContext {
    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self {
            user_id: normalize_user_id(Some(user_id.into())),
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.user_id.is_some()
    }

    /// Copy of the context with `user_id` replaced. Blank ids count as no
    /// user.
    pub fn with_user_id(&self, user_id: Option<String>) -> Self {
        Self {
            user_id: normalize_user_id(user_id),
        }
    }
}

pub(crate) fn normalize_user_id(user_id: Option<String>) -> Option<String> {
    user_id.filter(|id| !id.trim().is_empty())
}
