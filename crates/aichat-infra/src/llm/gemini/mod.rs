//! Google Gemini provider.

pub mod client;
pub mod streaming;
pub mod types;

use secrecy::SecretString;

use aichat_core::llm::{BoxLlmProvider, ProviderFactory};
use aichat_types::llm::LlmError;

pub use client::GeminiProvider;

/// Builds a [`GeminiProvider`] per request from the configured model.
#[derive(Debug, Clone)]
pub struct GeminiProviderFactory {
    model: String,
    base_url: Option<String>,
}

impl GeminiProviderFactory {
    pub fn new(model: impl Into<String>, base_url: Option<String>) -> Self {
        Self {
            model: model.into(),
            base_url,
        }
    }
}

impl ProviderFactory for GeminiProviderFactory {
    fn create(&self, api_key: SecretString) -> Result<BoxLlmProvider, LlmError> {
        let mut provider = GeminiProvider::new(api_key, self.model.clone())?;
        if let Some(base_url) = &self.base_url {
            provider = provider.with_base_url(base_url.clone());
        }
        Ok(Box::new(provider))
    }
}
