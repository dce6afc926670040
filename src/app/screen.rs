//! Mapping from machine configurations to rendered screens.

use crate::engine::StateConfiguration;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level screen the view layer renders.
///
/// Each top-level state of the app machine maps to exactly one screen, so a
/// view never has to render two at once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Screen {
    Init,
    Welcome,
    Onboarding,
    Login,
    Home,
    Review,
    Settings,
}

impl Screen {
    pub const ALL: [Screen; 7] = [
        Screen::Init,
        Screen::Welcome,
        Screen::Onboarding,
        Screen::Login,
        Screen::Home,
        Screen::Review,
        Screen::Settings,
    ];

    /// Key of the top-level state behind this screen.
    pub fn state_key(&self) -> &'static str {
        match self {
            Self::Init => "Init",
            Self::Welcome => "Welcome",
            Self::Onboarding => "Onboarding",
            Self::Login => "Login",
            Self::Home => "Home",
            Self::Review => "Review",
            Self::Settings => "Settings",
        }
    }

    /// Screen for the active configuration; `None` before the machine has
    /// started.
    pub fn for_configuration<C>(configuration: &StateConfiguration<C>) -> Option<Screen> {
        let top = configuration.value.top_level()?;
        Self::ALL.into_iter().find(|screen| screen.state_key() == top)
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.state_key())
    }
}
