//! GeminiProvider -- concrete [`LlmProvider`] implementation for Google Gemini.
//!
//! Streams from `models/{model}:streamGenerateContent?alt=sse`. The API key
//! travels in the `x-goog-api-key` header, never in the URL, and is never
//! logged.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use secrecy::SecretString;

use aichat_core::attachment::DataUrl;
use aichat_core::llm::{LlmProvider, LlmStream};
use aichat_types::chat::Attachment;
use aichat_types::llm::{CompletionRequest, LlmError, Message, MessageRole};

use super::streaming::create_gemini_stream;
use super::types::{GeminiContent, GeminiPart, GeminiRequest, GenerationConfig, InlineData};

/// Public Gemini API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini LLM provider.
///
/// Does not derive Debug: the struct holds the API key.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(api_key: SecretString, model: String) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model,
        })
    }

    /// The default model for this provider.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Override the base URL (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Streaming endpoint for `model`.
    fn stream_url(&self, model: &str) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url.trim_end_matches('/'),
            model
        )
    }

    /// Convert a generic [`CompletionRequest`] into a [`GeminiRequest`].
    ///
    /// Gemini only takes system text through `systemInstruction`, so
    /// system-role messages are appended to the configured instruction.
    /// Consecutive turns with the same role are merged.
    pub fn to_gemini_request(&self, request: &CompletionRequest) -> GeminiRequest {
        let mut system_parts: Vec<&str> = request.system.iter().map(String::as_str).collect();
        let mut contents: Vec<GeminiContent> = Vec::new();

        for message in &request.messages {
            if message.role == MessageRole::System {
                if !message.content.trim().is_empty() {
                    system_parts.push(&message.content);
                }
                continue;
            }

            let role = match message.role {
                MessageRole::Assistant => "model",
                _ => "user",
            };
            let parts = message_parts(message);
            if parts.is_empty() {
                continue;
            }

            match contents.last_mut() {
                Some(last) if last.role.as_deref() == Some(role) => last.parts.extend(parts),
                _ => contents.push(GeminiContent {
                    role: Some(role.to_string()),
                    parts,
                }),
            }
        }

        let system_instruction = (!system_parts.is_empty()).then(|| GeminiContent {
            role: None,
            parts: vec![GeminiPart::Text {
                text: system_parts.join("\n\n"),
            }],
        });

        GeminiRequest {
            contents,
            system_instruction,
            generation_config: GenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
            },
        }
    }
}

/// Text first, then one part per readable attachment.
fn message_parts(message: &Message) -> Vec<GeminiPart> {
    let mut parts = Vec::new();
    if !message.content.is_empty() {
        parts.push(GeminiPart::Text {
            text: message.content.clone(),
        });
    }
    parts.extend(message.attachments.iter().filter_map(attachment_part));
    parts
}

/// Convert one attachment into a Gemini part.
///
/// Text and JSON files are decoded and sent as text prefixed with the file
/// name; everything else goes inline as base64. Unparseable attachments
/// are skipped.
pub fn attachment_part(attachment: &Attachment) -> Option<GeminiPart> {
    let name = attachment.name.as_deref().unwrap_or("attachment");
    let data_url = match DataUrl::parse(&attachment.url) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(attachment = %name, error = %e, "skipping attachment");
            return None;
        }
    };
    let mime_type = attachment
        .content_type
        .as_deref()
        .filter(|ct| !ct.is_empty())
        .unwrap_or(data_url.mime());

    if mime_type.starts_with("text/") || mime_type.contains("json") {
        return match data_url.decode() {
            Ok(bytes) => Some(GeminiPart::Text {
                text: format!("[Attachment: {name}]\n{}", String::from_utf8_lossy(&bytes)),
            }),
            Err(e) => {
                tracing::warn!(attachment = %name, error = %e, "skipping attachment");
                None
            }
        };
    }

    let data = if data_url.is_base64() {
        data_url.payload().trim().to_string()
    } else {
        match data_url.decode() {
            Ok(bytes) => STANDARD.encode(bytes),
            Err(e) => {
                tracing::warn!(attachment = %name, error = %e, "skipping attachment");
                return None;
            }
        }
    };
    Some(GeminiPart::InlineData {
        inline_data: InlineData {
            mime_type: mime_type.to_string(),
            data,
        },
    })
}

impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn stream(&self, request: CompletionRequest) -> LlmStream {
        let model = if request.model.is_empty() {
            self.model.as_str()
        } else {
            request.model.as_str()
        };
        let url = self.stream_url(model);
        let body = self.to_gemini_request(&request);
        tracing::debug!(model = %model, contents = body.contents.len(), "opening Gemini stream");

        create_gemini_stream(&self.client, &url, body, &self.api_key)
    }
}
