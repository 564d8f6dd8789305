//! Persisted boolean/string preferences.

use std::sync::Arc;

use crate::errors::AppError;
use crate::models::{Preferences, Theme};
use crate::storage::{keys, read_soft, Storage};

/// A single named preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preference {
    Theme,
    Notifications,
    Audio,
}

impl Preference {
    pub fn key(&self) -> &'static str {
        match self {
            Preference::Theme => keys::THEME,
            Preference::Notifications => keys::NOTIFICATIONS,
            Preference::Audio => keys::AUDIO,
        }
    }
}

/// Flags are disabled only by an exact `"false"`.
fn parse_flag(raw: Option<&str>) -> bool {
    raw != Some("false")
}

pub struct PreferenceStore {
    storage: Arc<dyn Storage>,
    current: Preferences,
}

impl PreferenceStore {
    /// Read every preference once; missing or malformed values become defaults.
    pub async fn load(storage: Arc<dyn Storage>) -> Self {
        let theme = read_soft(storage.as_ref(), keys::THEME).await;
        let notifications = read_soft(storage.as_ref(), keys::NOTIFICATIONS).await;
        let audio = read_soft(storage.as_ref(), keys::AUDIO).await;

        let current = Preferences {
            theme: theme.as_deref().map(Theme::parse_lenient).unwrap_or_default(),
            notifications_enabled: parse_flag(notifications.as_deref()),
            audio_enabled: parse_flag(audio.as_deref()),
        };

        Self { storage, current }
    }

    pub fn snapshot(&self) -> Preferences {
        self.current
    }

    /// Stored encoding of a preference, or its default.
    pub fn get(&self, pref: Preference) -> String {
        match pref {
            Preference::Theme => self.current.theme.as_str().to_string(),
            Preference::Notifications => self.current.notifications_enabled.to_string(),
            Preference::Audio => self.current.audio_enabled.to_string(),
        }
    }

    /// Set a preference from its string encoding and write it through.
    pub async fn set(&mut self, pref: Preference, value: &str) -> Result<(), AppError> {
        match pref {
            Preference::Theme => self.current.theme = Theme::parse_lenient(value),
            Preference::Notifications => {
                self.current.notifications_enabled = parse_flag(Some(value))
            }
            Preference::Audio => self.current.audio_enabled = parse_flag(Some(value)),
        }
        let encoded = self.get(pref);
        self.storage.set(pref.key(), &encoded).await
    }

    pub fn notifications_enabled(&self) -> bool {
        self.current.notifications_enabled
    }

    pub fn audio_enabled(&self) -> bool {
        self.current.audio_enabled
    }

    pub async fn set_theme(&mut self, theme: Theme) -> Result<(), AppError> {
        self.set(Preference::Theme, theme.as_str()).await
    }

    pub async fn set_notifications(&mut self, enabled: bool) -> Result<(), AppError> {
        self.set(Preference::Notifications, &enabled.to_string()).await
    }

    pub async fn set_audio(&mut self, enabled: bool) -> Result<(), AppError> {
        self.set(Preference::Audio, &enabled.to_string()).await
    }
}
