//! Presentation-facing selectors and preference values.

use serde::{Deserialize, Serialize};

/// Main platform section currently on screen.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlatformView {
    #[default]
    Dashboard,
    Search,
    Chat,
    Collection,
    Maps,
    Drive,
    Tools,
    History,
    Settings,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Only an exact `"dark"` selects the dark theme; anything else is light.
    pub fn parse_lenient(s: &str) -> Self {
        if s == "dark" {
            Theme::Dark
        } else {
            Theme::Light
        }
    }
}

/// Snapshot of every persisted preference.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub theme: Theme,
    pub notifications_enabled: bool,
    pub audio_enabled: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            notifications_enabled: true,
            audio_enabled: true,
        }
    }
}

/// Partial preference change; absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesPatch {
    #[serde(default)]
    pub theme: Option<Theme>,
    #[serde(default)]
    pub notifications_enabled: Option<bool>,
    #[serde(default)]
    pub audio_enabled: Option<bool>,
}

/// Outcome of the most recent search.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
    InvalidSearch,
}
