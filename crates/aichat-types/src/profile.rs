//! User profile held by the client session.

use serde::{Deserialize, Serialize};

/// The signed-in user's profile.
///
/// Serialized with camelCase keys so the persisted record matches what the
/// web client writes to local storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl UserProfile {
    /// Display name used for the default profile.
    pub const DEFAULT_NAME: &'static str = "Test User";
    /// Email of the demo account.
    pub const DEFAULT_EMAIL: &'static str = "test@example.com";

    /// Apply a partial update, leaving absent fields untouched.
    pub fn merge(&mut self, update: ProfileUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(avatar_url) = update.avatar_url {
            self.avatar_url = avatar_url;
        }
    }
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: Self::DEFAULT_NAME.to_string(),
            email: Self::DEFAULT_EMAIL.to_string(),
            avatar_url: None,
        }
    }
}

/// A partial profile edit.
///
/// `avatar_url` is doubly optional: `None` leaves the avatar alone,
/// `Some(None)` removes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<Option<String>>,
}
