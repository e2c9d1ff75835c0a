//! Environment variable credential source.
//!
//! Read-only. The variable is looked up on every call so that a key
//! exported after the server started is picked up by the next request.

use secrecy::SecretString;

use aichat_core::llm::CredentialSource;

/// Variable holding the Gemini API key.
pub const GOOGLE_API_KEY_VAR: &str = "GOOGLE_GENERATIVE_AI_API_KEY";

/// Reads an API key from one environment variable.
#[derive(Debug, Clone)]
pub struct EnvCredentialSource {
    var: String,
}

impl EnvCredentialSource {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    /// The Gemini key source.
    pub fn google() -> Self {
        Self::new(GOOGLE_API_KEY_VAR)
    }
}

impl Default for EnvCredentialSource {
    fn default() -> Self {
        Self::google()
    }
}

impl CredentialSource for EnvCredentialSource {
    fn name(&self) -> &str {
        &self.var
    }

    fn api_key(&self) -> Option<SecretString> {
        match std::env::var(&self.var) {
            Ok(val) if !val.trim().is_empty() => Some(SecretString::from(val.trim().to_string())),
            Ok(_) => None,
            Err(std::env::VarError::NotPresent) => None,
            // Present but not valid Unicode: treat as not found, keys must be strings.
            Err(std::env::VarError::NotUnicode(_)) => None,
        }
    }
}
