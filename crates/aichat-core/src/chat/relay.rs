//! Chat relay: validates a transcript, forwards it to the model provider
//! and relays the provider's incremental output.
//!
//! Request handling order matters and is observable by clients:
//! 1. credential check (no key -> nothing else happens)
//! 2. payload validation (invalid -> provider never reached)
//! 3. role filtering
//! 4. provider call; failures before the stream opens are returned as
//!    errors, failures after it opens become [`RelayChunk::Error`].

use std::pin::Pin;
use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use serde_json::Value;

use aichat_types::chat::{FinishInfo, IncomingMessage, RelayChunk};
use aichat_types::config::{DEFAULT_MODEL, ModelConfig};
use aichat_types::error::RelayError;
use aichat_types::llm::{CompletionRequest, Message, StopReason, StreamEvent};

use crate::llm::{CredentialSource, LlmStream, ProviderFactory};

/// Instruction sent with every conversation unless overridden in config.
pub const SYSTEM_PROMPT: &str = "You're an empathetic AI teammate embedded in a recruitment demo. \
Be concise, cite the user's attachments when relevant, and explain how you derived your answer. \
If you can't parse an attachment, say so.";

/// Stream of chunks handed to the HTTP layer.
pub type RelayStream = Pin<Box<dyn Stream<Item = RelayChunk> + Send + 'static>>;

/// Model parameters applied to every relayed request.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
    pub system_prompt: String,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 8192,
            temperature: None,
            system_prompt: SYSTEM_PROMPT.to_string(),
        }
    }
}

impl From<&ModelConfig> for RelaySettings {
    fn from(config: &ModelConfig) -> Self {
        Self {
            model: config.name.clone(),
            max_tokens: config.max_output_tokens,
            temperature: config.temperature,
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| SYSTEM_PROMPT.to_string()),
        }
    }
}

/// Parse a request body into the raw message list.
///
/// The body must be a JSON object whose `messages` field is an array.
/// Elements are not inspected here; see [`normalize_messages`].
pub fn parse_payload(body: &[u8]) -> Result<Vec<Value>, RelayError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| RelayError::InvalidPayload(format!("body is not JSON: {e}")))?;

    let messages = match value {
        Value::Object(mut map) => map.remove("messages"),
        _ => None,
    };
    match messages {
        Some(Value::Array(messages)) => Ok(messages),
        _ => Err(RelayError::InvalidPayload(
            "`messages` must be an array".to_string(),
        )),
    }
}

/// Keep the messages whose role the model accepts, in order.
///
/// Anything else is dropped: other roles, elements without a string
/// `role`, and non-object elements. Only survivors are deserialized.
pub fn normalize_messages(raw: Vec<Value>) -> Vec<Message> {
    let total = raw.len();
    let messages: Vec<Message> = raw
        .into_iter()
        .filter_map(|value| {
            let role = value
                .get("role")
                .and_then(Value::as_str)
                .and_then(IncomingMessage::accepted_role)?;
            match serde_json::from_value::<IncomingMessage>(value) {
                Ok(msg) => Some(Message {
                    role,
                    content: msg.content,
                    attachments: msg.attachments.unwrap_or_default(),
                }),
                Err(e) => {
                    tracing::warn!(%role, error = %e, "dropping unreadable message");
                    None
                }
            }
        })
        .collect();

    if messages.len() < total {
        tracing::debug!(
            dropped = total - messages.len(),
            kept = messages.len(),
            "dropped messages the model does not accept"
        );
    }
    messages
}

/// Forwards conversations to the model provider.
///
/// Holds no per-request state; share it behind an `Arc`.
pub struct ChatRelay {
    credentials: Arc<dyn CredentialSource>,
    factory: Arc<dyn ProviderFactory>,
    settings: RelaySettings,
}

impl ChatRelay {
    pub fn new(
        credentials: Arc<dyn CredentialSource>,
        factory: Arc<dyn ProviderFactory>,
        settings: RelaySettings,
    ) -> Self {
        Self {
            credentials,
            factory,
            settings,
        }
    }

    pub fn settings(&self) -> &RelaySettings {
        &self.settings
    }

    /// Build the provider request for an already-filtered transcript.
    pub fn build_request(&self, messages: Vec<Message>) -> CompletionRequest {
        CompletionRequest {
            model: self.settings.model.clone(),
            messages,
            system: Some(self.settings.system_prompt.clone()),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            stream: true,
        }
    }

    /// Handle one chat request body.
    ///
    /// Resolves once the provider has accepted the request, so any error
    /// returned here means no text was produced.
    pub async fn open(&self, body: &[u8]) -> Result<RelayStream, RelayError> {
        let api_key = self
            .credentials
            .api_key()
            .ok_or_else(|| RelayError::MissingConfiguration(self.credentials.name().to_string()))?;

        let messages = normalize_messages(parse_payload(body)?);
        let request = self.build_request(messages);
        tracing::info!(
            model = %request.model,
            messages = request.messages.len(),
            "relaying chat request"
        );

        let provider = self.factory.create(api_key).map_err(RelayError::Provider)?;
        let mut events = provider.stream(request);

        let mut first = None;
        match events.next().await {
            Some(Ok(StreamEvent::Connected)) => {}
            Some(Ok(event)) => first = Some(event),
            Some(Err(e)) => {
                tracing::warn!(provider = provider.name(), error = %e, "provider rejected request");
                return Err(RelayError::Provider(e));
            }
            None => {}
        }

        Ok(relay_events(first, events))
    }
}

/// Translate provider events into relay chunks.
///
/// Always ends with exactly one `Finish` or one `Error` chunk.
fn relay_events(first: Option<StreamEvent>, mut events: LlmStream) -> RelayStream {
    Box::pin(async_stream::stream! {
        let mut stop_reason = None;
        let mut usage = None;
        let mut pending = first.map(Ok);

        loop {
            let next = match pending.take() {
                Some(event) => Some(event),
                None => events.next().await,
            };
            match next {
                Some(Ok(StreamEvent::TextDelta { text })) => {
                    if !text.is_empty() {
                        yield RelayChunk::Text(text);
                    }
                }
                Some(Ok(StreamEvent::MessageDelta { stop_reason: reason })) => {
                    stop_reason = Some(reason);
                }
                Some(Ok(StreamEvent::Usage(u))) => usage = Some(u),
                Some(Ok(StreamEvent::Connected)) => {}
                Some(Ok(StreamEvent::Done)) | None => break,
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "provider stream failed");
                    yield RelayChunk::Error(e.reason());
                    return;
                }
            }
        }

        yield RelayChunk::Finish(FinishInfo {
            stop_reason: stop_reason.unwrap_or(StopReason::Stop),
            usage,
        });
    })
}
