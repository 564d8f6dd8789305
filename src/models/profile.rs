//! User profile held for the lifetime of a session.

use serde::{Deserialize, Serialize};

/// Role given to every freshly created profile.
pub const DEFAULT_ROLE: &str = "Investigador";

/// The authenticated researcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    /// Mutable status label ("Investigador", "online", "away", ...)
    pub role: String,
    pub level: u32,
    /// Either an emoji literal or an image URL
    pub avatar: String,
}

/// Credentials submitted on the access screen.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Username or institutional email
    pub identifier: String,
    /// Accepted but never checked nor stored
    #[serde(default)]
    pub password: String,
    /// True when the user is creating a new identity
    #[serde(default)]
    pub signup: bool,
    /// Display name chosen at signup
    #[serde(default)]
    pub name: Option<String>,
    /// Emoji chosen at signup
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Emoji avatars offered at signup.
pub const SIGNUP_AVATARS: [&str; 12] = [
    "🦠", "🧫", "🧬", "🩸", "🔬", "🧪", "🌿", "🍄", "🐸", "🐟", "🦟", "🕸️",
];

impl UserProfile {
    /// Build a profile from submitted credentials. There is no verification.
    pub fn from_login(request: &LoginRequest) -> Self {
        let identifier = request.identifier.trim();

        let (name, avatar) = if request.signup {
            let name = request
                .name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .unwrap_or(identifier)
                .to_string();
            let avatar = request
                .avatar
                .clone()
                .unwrap_or_else(|| SIGNUP_AVATARS[0].to_string());
            (name, avatar)
        } else {
            let name = match identifier.split_once('@') {
                Some((local, _)) => local.to_string(),
                None => identifier.to_string(),
            };
            (name, dicebear_avatar(identifier))
        };

        Self {
            name,
            role: DEFAULT_ROLE.to_string(),
            level: 1,
            avatar,
        }
    }
}

fn dicebear_avatar(seed: &str) -> String {
    format!(
        "https://api.dicebear.com/7.x/avataaars/svg?seed={}&backgroundColor=b6e3f4",
        seed
    )
}
