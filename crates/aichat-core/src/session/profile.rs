//! Profile form rules: required fields, avatar type, initials.

use aichat_types::error::ProfileError;
use aichat_types::profile::ProfileUpdate;

/// Values submitted from the profile editor.
#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    pub name: String,
    pub email: String,
    /// Data URL of the new avatar, `None` to remove it.
    pub avatar_url: Option<String>,
}

impl ProfileForm {
    /// Validate and turn the form into a profile update.
    ///
    /// Name and email are trimmed and must not be blank.
    pub fn into_update(self) -> Result<ProfileUpdate, ProfileError> {
        let name = self.name.trim();
        let email = self.email.trim();
        if name.is_empty() || email.is_empty() {
            return Err(ProfileError::MissingField);
        }
        Ok(ProfileUpdate {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            avatar_url: Some(self.avatar_url),
        })
    }
}

/// Only `image/*` files may be used as an avatar.
pub fn ensure_avatar_type(content_type: &str) -> Result<(), ProfileError> {
    if content_type.starts_with("image/") {
        Ok(())
    } else {
        Err(ProfileError::AvatarNotImage)
    }
}

/// Placeholder text for a missing avatar: up to two initials.
pub fn initials(name: &str) -> String {
    let initials: String = name
        .split(' ')
        .filter_map(|part| part.trim().chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect();
    if initials.is_empty() {
        "AI".to_string()
    } else {
        initials
    }
}
