//! Where the relay gets its API key and provider from.

use secrecy::SecretString;

use aichat_types::llm::LlmError;

use super::provider::BoxLlmProvider;

/// Read-only source of the provider API key.
///
/// Read on every request so a key set after startup takes effect without
/// a restart.
pub trait CredentialSource: Send + Sync {
    /// Name of the credential, used in error messages.
    fn name(&self) -> &str;

    /// The key, or `None` if it is absent or blank.
    fn api_key(&self) -> Option<SecretString>;
}

/// Builds a provider bound to an API key.
pub trait ProviderFactory: Send + Sync {
    fn create(&self, api_key: SecretString) -> Result<BoxLlmProvider, LlmError>;
}
