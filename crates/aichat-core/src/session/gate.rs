//! Session gate: demo login, logout and profile persistence.

use aichat_types::error::{AuthError, StorageError};
use aichat_types::profile::{ProfileUpdate, UserProfile};

use super::storage::SessionStorage;

/// Storage key holding `"true"` while a user is signed in.
pub const AUTH_KEY: &str = "ai-chat-auth";
/// Storage key holding the JSON-encoded profile.
pub const PROFILE_KEY: &str = "ai-chat-profile";

/// The only accepted login pair.
pub const DEMO_EMAIL: &str = "test@example.com";
pub const DEMO_PASSWORD: &str = "password123";

/// Holds at most one signed-in profile, mirrored to [`SessionStorage`].
///
/// State machine: anonymous -> `login` -> authenticated -> `logout` ->
/// anonymous. A failed login or a failed storage write leaves the
/// in-memory state as it was.
pub struct SessionGate<S> {
    storage: S,
    profile: Option<UserProfile>,
}

impl<S: SessionStorage> SessionGate<S> {
    /// Create an anonymous gate. Call [`restore`](Self::restore) to pick up
    /// a persisted session.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            profile: None,
        }
    }

    /// Reload the session from storage.
    ///
    /// Authenticated only when the flag key holds `"true"`. A missing or
    /// unreadable profile record falls back to the default profile.
    pub async fn restore(&mut self) -> Result<Option<&UserProfile>, AuthError> {
        let flag = self.storage.get(AUTH_KEY).await?;
        if flag.as_deref() != Some("true") {
            self.profile = None;
            return Ok(None);
        }

        let profile = self
            .stored_profile()
            .await?
            .unwrap_or_else(UserProfile::default);
        tracing::debug!(email = %profile.email, "restored session");
        self.profile = Some(profile);
        Ok(self.profile.as_ref())
    }

    /// Sign in with the demo credentials.
    ///
    /// Matching is exact; no trimming or case folding. On success the
    /// profile is the stored one, else the current one, else the default,
    /// with `email` replaced by the login email.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<&UserProfile, AuthError> {
        if email != DEMO_EMAIL || password != DEMO_PASSWORD {
            tracing::info!("login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let mut profile = match self.stored_profile().await? {
            Some(stored) => stored,
            None => self.profile.clone().unwrap_or_default(),
        };
        profile.email = email.to_string();

        self.persist(&profile).await?;
        tracing::info!(email = %profile.email, "signed in");
        Ok(&*self.profile.insert(profile))
    }

    /// Sign out. The profile record stays in storage so the next login
    /// picks it up again.
    pub async fn logout(&mut self) -> Result<(), AuthError> {
        self.profile = None;
        self.storage.remove(AUTH_KEY).await?;
        tracing::info!("signed out");
        Ok(())
    }

    /// Merge `update` into the signed-in profile and persist it.
    pub async fn update_profile(
        &mut self,
        update: ProfileUpdate,
    ) -> Result<&UserProfile, AuthError> {
        let mut profile = self.profile.clone().ok_or(AuthError::NotAuthenticated)?;
        profile.merge(update);

        self.persist(&profile).await?;
        Ok(&*self.profile.insert(profile))
    }

    /// The signed-in profile, if any.
    pub fn current(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.profile.is_some()
    }

    async fn stored_profile(&self) -> Result<Option<UserProfile>, AuthError> {
        let Some(raw) = self.storage.get(PROFILE_KEY).await? else {
            return Ok(None);
        };
        match serde_json::from_str::<UserProfile>(&raw) {
            Ok(profile) => Ok(Some(profile)),
            Err(e) => {
                tracing::warn!(error = %e, "stored profile is corrupt, ignoring it");
                Ok(None)
            }
        }
    }

    async fn persist(&self, profile: &UserProfile) -> Result<(), AuthError> {
        let json = serde_json::to_string(profile)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.storage.set(AUTH_KEY, "true").await?;
        self.storage.set(PROFILE_KEY, &json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::storage::MemorySessionStorage;

    #[tokio::test]
    async fn test_login_with_demo_credentials() {
        let storage = MemorySessionStorage::new();
        let mut gate = SessionGate::new(&storage);

        let profile = gate.login(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap();
        assert_eq!(profile.name, "Test User");
        assert_eq!(profile.email, DEMO_EMAIL);
        assert!(gate.is_authenticated());
        assert_eq!(storage.get(AUTH_KEY).await.unwrap().as_deref(), Some("true"));
        assert!(storage.get(PROFILE_KEY).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_login_rejects_anything_but_the_exact_pair() {
        let storage = MemorySessionStorage::new();
        let mut gate = SessionGate::new(&storage);

        for (email, password) in [
            ("test@example.com", "wrong"),
            ("other@example.com", DEMO_PASSWORD),
            (" test@example.com", DEMO_PASSWORD),
            ("TEST@example.com", DEMO_PASSWORD),
            ("test@example.com", "password123 "),
            ("", ""),
        ] {
            let err = gate.login(email, password).await.unwrap_err();
            assert!(matches!(err, AuthError::InvalidCredentials));
            assert_eq!(
                err.to_string(),
                "Invalid credentials. Try the demo email and password."
            );
            assert!(!gate.is_authenticated());
        }
        assert!(storage.get(AUTH_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_restore_yields_profile_from_login() {
        let storage = MemorySessionStorage::new();
        {
            let mut gate = SessionGate::new(&storage);
            gate.login(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap();
            gate.update_profile(ProfileUpdate {
                name: Some("Ada Lovelace".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        }

        let mut restored = SessionGate::new(&storage);
        let profile = restored.restore().await.unwrap().cloned().unwrap();
        assert_eq!(profile.name, "Ada Lovelace");
        assert_eq!(profile.email, DEMO_EMAIL);
    }

    #[tokio::test]
    async fn test_restore_without_flag_is_anonymous() {
        let storage = MemorySessionStorage::new();
        storage
            .set(PROFILE_KEY, r#"{"name":"A","email":"a@b.c"}"#)
            .await
            .unwrap();
        storage.set(AUTH_KEY, "false").await.unwrap();

        let mut gate = SessionGate::new(&storage);
        assert!(gate.restore().await.unwrap().is_none());
        assert!(!gate.is_authenticated());
    }

    #[tokio::test]
    async fn test_restore_with_corrupt_profile_uses_default() {
        let storage = MemorySessionStorage::new();
        storage.set(AUTH_KEY, "true").await.unwrap();
        storage.set(PROFILE_KEY, "{not json").await.unwrap();

        let mut gate = SessionGate::new(&storage);
        let profile = gate.restore().await.unwrap().cloned().unwrap();
        assert_eq!(profile, UserProfile::default());
    }

    #[tokio::test]
    async fn test_logout_keeps_profile_record() {
        let storage = MemorySessionStorage::new();
        let mut gate = SessionGate::new(&storage);
        gate.login(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap();

        gate.logout().await.unwrap();
        assert!(!gate.is_authenticated());
        assert!(gate.current().is_none());
        assert!(storage.get(AUTH_KEY).await.unwrap().is_none());
        assert!(storage.get(PROFILE_KEY).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_login_reuses_stored_profile_after_logout() {
        let storage = MemorySessionStorage::new();
        let mut gate = SessionGate::new(&storage);
        gate.login(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap();
        gate.update_profile(ProfileUpdate {
            name: Some("Grace".to_string()),
            email: Some("grace@example.com".to_string()),
            avatar_url: Some(Some("data:image/png;base64,AAAA".to_string())),
        })
        .await
        .unwrap();
        gate.logout().await.unwrap();

        let profile = gate.login(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap();
        assert_eq!(profile.name, "Grace");
        // Login email always wins over the stored one.
        assert_eq!(profile.email, DEMO_EMAIL);
        assert!(profile.avatar_url.is_some());
    }

    #[tokio::test]
    async fn test_update_profile_requires_sign_in() {
        let storage = MemorySessionStorage::new();
        let mut gate = SessionGate::new(&storage);
        let err = gate
            .update_profile(ProfileUpdate {
                name: Some("Nobody".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NotAuthenticated));
        assert!(storage.get(PROFILE_KEY).await.unwrap().is_none());
    }
}
