//! Events the app machine reacts to.

use crate::event_enum;

event_enum! {
    /// Everything the view layer can send to the app machine.
    pub enum AppEvent {
        /// Welcome screen
        OpenLogin => "OPEN_LOGIN",

        /// Onboarding screen
        Continue => "CONTINUE",

        /// Home screen
        StartReview => "START_REVIEW",
        OpenSettings => "OPEN_SETTINGS",

        /// Login screen
        SubmitLogin { email: String } => "SUBMIT_LOGIN",

        /// Settings screen
        Logout => "LOGOUT",

        Start => "START",
        Back => "BACK",
    }
}

impl AppEvent {
    pub fn submit_login(email: impl Into<String>) -> Self {
        Self::SubmitLogin {
            email: email.into(),
        }
    }

    /// One value of every variant.
    pub fn samples() -> Vec<AppEvent> {
        vec![
            Self::OpenLogin,
            Self::Continue,
            Self::StartReview,
            Self::OpenSettings,
            Self::submit_login("a@b.com"),
            Self::Logout,
            Self::Start,
            Self::Back,
        ]
    }
}
