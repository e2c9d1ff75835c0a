//! SSE stream creation and chunk processing for Gemini.
//!
//! With `alt=sse` every event's `data` is a complete `GenerateContentResponse`
//! JSON object. Each carries zero or more text parts; the last ones carry a
//! `finishReason` and cumulative `usageMetadata`. The stream has no explicit
//! terminator, so `Done` is emitted when the server closes the connection.

use futures_util::StreamExt;
use reqwest_eventsource::{Event, EventSource};

use aichat_core::llm::LlmStream;
use aichat_types::llm::{LlmError, StopReason, StreamEvent, Usage};

use super::types::{GeminiErrorBody, GeminiErrorEnvelope, GeminiRequest, GeminiStreamChunk};

/// Running state across chunks of one response.
#[derive(Debug, Default)]
pub struct StreamState {
    stop_reason: Option<StopReason>,
    usage: Option<Usage>,
}

impl StreamState {
    /// Events that close the stream, once the connection has ended.
    pub fn finish(self) -> Vec<StreamEvent> {
        let mut events = vec![StreamEvent::MessageDelta {
            stop_reason: self.stop_reason.unwrap_or(StopReason::Stop),
        }];
        if let Some(usage) = self.usage {
            events.push(StreamEvent::Usage(usage));
        }
        events.push(StreamEvent::Done);
        events
    }
}

/// Map a Gemini `finishReason` to a [`StopReason`].
pub fn map_finish_reason(reason: &str) -> StopReason {
    match reason {
        "STOP" => StopReason::Stop,
        "MAX_TOKENS" => StopReason::Length,
        "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII" | "IMAGE_SAFETY" => {
            StopReason::ContentFilter
        }
        _ => StopReason::Other,
    }
}

/// Process one SSE `data` payload into stream events.
///
/// Text deltas are returned immediately; the finish reason and usage are
/// folded into `state` and emitted by [`StreamState::finish`].
pub fn process_gemini_chunk(
    data: &str,
    state: &mut StreamState,
) -> Result<Vec<StreamEvent>, LlmError> {
    let chunk: GeminiStreamChunk = serde_json::from_str(data)
        .map_err(|e| LlmError::Deserialization(format!("gemini chunk: {e}")))?;

    if let Some(error) = chunk.error {
        tracing::warn!(code = ?error.code, status = ?error.status, "Gemini stream error event");
        return Err(error_from_body(&error));
    }

    if let Some(reason) = chunk.prompt_feedback.and_then(|f| f.block_reason) {
        tracing::warn!(reason = %reason, "Gemini blocked the prompt");
        state.stop_reason = Some(StopReason::ContentFilter);
    }

    let mut events = Vec::new();
    for candidate in chunk.candidates {
        if let Some(content) = candidate.content {
            for part in content.parts {
                if part.thought.unwrap_or(false) {
                    continue;
                }
                if let Some(text) = part.text.filter(|t| !t.is_empty()) {
                    events.push(StreamEvent::TextDelta { text });
                }
            }
        }
        if let Some(reason) = candidate.finish_reason {
            let mapped = map_finish_reason(&reason);
            if mapped != StopReason::Stop {
                tracing::debug!(finish_reason = %reason, "Gemini finished early");
            }
            state.stop_reason = Some(mapped);
        }
    }

    if let Some(usage) = chunk.usage_metadata {
        state.usage = Some(Usage {
            input_tokens: usage.prompt_token_count,
            output_tokens: usage.candidates_token_count,
        });
    }

    Ok(events)
}

fn error_from_body(error: &GeminiErrorBody) -> LlmError {
    let message = if error.message.trim().is_empty() {
        error
            .status
            .clone()
            .unwrap_or_else(|| "The model failed to respond.".to_string())
    } else {
        error.message.clone()
    };
    LlmError::Provider { message }
}

/// Map a non-success HTTP response to an [`LlmError`].
///
/// Gemini puts a readable message in `error.message`; it is preferred over
/// the raw body. Streaming endpoints sometimes wrap the envelope in an array.
pub fn map_status_error(status: u16, body: &str) -> LlmError {
    let parsed = parse_error_body(body);

    let message = match &parsed {
        Some(error) if !error.message.trim().is_empty() => error.message.clone(),
        _ if body.trim().is_empty() => format!("HTTP {status}"),
        _ => format!("HTTP {status}: {}", body.trim()),
    };

    match status {
        401 | 403 => {
            tracing::debug!(%message, "Gemini rejected the API key");
            LlmError::AuthenticationFailed
        }
        429 => LlmError::RateLimited {
            retry_after_ms: parsed.as_ref().and_then(retry_delay_ms),
        },
        503 => LlmError::Overloaded(message),
        _ => LlmError::Provider { message },
    }
}

fn parse_error_body(body: &str) -> Option<GeminiErrorBody> {
    let value = match serde_json::from_str::<serde_json::Value>(body).ok()? {
        serde_json::Value::Array(items) => items.into_iter().next()?,
        value @ serde_json::Value::Object(_) => value,
        _ => return None,
    };
    serde_json::from_value::<GeminiErrorEnvelope>(value)
        .ok()
        .map(|env| env.error)
}

/// Retry hint from a `google.rpc.RetryInfo` detail, in milliseconds.
fn retry_delay_ms(error: &GeminiErrorBody) -> Option<u64> {
    error
        .details
        .iter()
        .filter(|d| d.kind.as_deref().is_some_and(|k| k.ends_with("RetryInfo")))
        .find_map(|d| d.retry_delay.as_deref())
        .and_then(|delay| delay.strip_suffix('s'))
        .and_then(|secs| secs.parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(|secs| (secs * 1000.0).round() as u64)
}

/// Create a streaming SSE connection to Gemini.
///
/// The returned stream yields `Connected` once the server answers with a
/// success status; an error status is reported before `Connected`. Dropping
/// the stream closes the connection.
///
/// # Arguments
///
/// * `client` - Shared reqwest HTTP client
/// * `url` - Full `streamGenerateContent?alt=sse` URL
/// * `body` - Gemini request body
/// * `api_key` - API key, sent in the `x-goog-api-key` header
pub fn create_gemini_stream(
    client: &reqwest::Client,
    url: &str,
    body: GeminiRequest,
    api_key: &secrecy::SecretString,
) -> LlmStream {
    let request = client
        .post(url)
        .header("x-goog-api-key", secrecy::ExposeSecret::expose_secret(api_key))
        .json(&body);

    Box::pin(async_stream::try_stream! {
        let mut source = EventSource::new(request)
            .map_err(|e| LlmError::InvalidRequest(format!("cannot build SSE request: {e}")))?;
        source.set_retry_policy(Box::new(reqwest_eventsource::retry::Never));

        let mut state = StreamState::default();
        while let Some(event) = source.next().await {
            match event {
                Ok(Event::Open) => {
                    yield StreamEvent::Connected;
                }
                Ok(Event::Message(message)) => {
                    for ev in process_gemini_chunk(&message.data, &mut state)? {
                        yield ev;
                    }
                }
                Err(reqwest_eventsource::Error::StreamEnded) => break,
                Err(reqwest_eventsource::Error::InvalidStatusCode(status, response)) => {
                    let error_body = response.text().await.unwrap_or_default();
                    tracing::warn!(
                        status = %status,
                        body = %error_body,
                        "Gemini API error response"
                    );
                    Err::<(), _>(map_status_error(status.as_u16(), &error_body))?;
                }
                Err(e) => {
                    Err::<(), _>(LlmError::Stream(e.to_string()))?;
                }
            }
        }
        source.close();

        for ev in state.finish() {
            yield ev;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_parts_become_deltas() {
        let mut state = StreamState::default();
        let events = process_gemini_chunk(
            r#"{"candidates":[{"content":{"role":"model",
                "parts":[{"text":"Hel"},{"text":"lo"}]}}]}"#,
            &mut state,
        )
        .unwrap();
        assert_eq!(
            events,
            vec![
                StreamEvent::TextDelta { text: "Hel".to_string() },
                StreamEvent::TextDelta { text: "lo".to_string() },
            ]
        );
    }

    #[test]
    fn test_thought_parts_are_skipped() {
        let mut state = StreamState::default();
        let events = process_gemini_chunk(
            r#"{"candidates":[{"content":{"parts":[
                {"text":"thinking...","thought":true},{"text":"answer"}]}}]}"#,
            &mut state,
        )
        .unwrap();
        assert_eq!(events, vec![StreamEvent::TextDelta { text: "answer".to_string() }]);
    }

    #[test]
    fn test_finish_reason_and_usage_are_deferred() {
        let mut state = StreamState::default();
        let events = process_gemini_chunk(
            r#"{"candidates":[{"content":{"parts":[{"text":"."}]},"finishReason":"MAX_TOKENS"}],
                "usageMetadata":{"promptTokenCount":40,"candidatesTokenCount":8,
                    "totalTokenCount":48}}"#,
            &mut state,
        )
        .unwrap();
        assert_eq!(events.len(), 1);

        assert_eq!(
            state.finish(),
            vec![
                StreamEvent::MessageDelta { stop_reason: StopReason::Length },
                StreamEvent::Usage(Usage { input_tokens: 40, output_tokens: 8 }),
                StreamEvent::Done,
            ]
        );
    }

    #[test]
    fn test_empty_stream_finishes_with_stop() {
        assert_eq!(
            StreamState::default().finish(),
            vec![
                StreamEvent::MessageDelta { stop_reason: StopReason::Stop },
                StreamEvent::Done,
            ]
        );
    }

    #[test]
    fn test_blocked_prompt_is_content_filter() {
        let mut state = StreamState::default();
        let blocked = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let events = process_gemini_chunk(blocked, &mut state).unwrap();
        assert!(events.is_empty());
        assert_eq!(
            state.finish()[0],
            StreamEvent::MessageDelta { stop_reason: StopReason::ContentFilter }
        );
    }

    #[test]
    fn test_error_event_mid_stream() {
        let mut state = StreamState::default();
        let err = process_gemini_chunk(
            r#"{"error":{"code":500,"message":"Internal error encountered.","status":"INTERNAL"}}"#,
            &mut state,
        )
        .unwrap_err();
        assert_eq!(err.reason(), "Internal error encountered.");
    }

    #[test]
    fn test_malformed_chunk() {
        let mut state = StreamState::default();
        let err = process_gemini_chunk("{not json", &mut state).unwrap_err();
        assert!(matches!(err, LlmError::Deserialization(_)));
    }

    #[test]
    fn test_map_finish_reason() {
        assert_eq!(map_finish_reason("STOP"), StopReason::Stop);
        assert_eq!(map_finish_reason("SAFETY"), StopReason::ContentFilter);
        assert_eq!(map_finish_reason("MALFORMED_FUNCTION_CALL"), StopReason::Other);
    }

    #[test]
    fn test_map_status_error_prefers_api_message() {
        let body = r#"{"error":{"code":400,
            "message":"API key not valid. Please pass a valid API key.",
            "status":"INVALID_ARGUMENT"}}"#;
        let err = map_status_error(400, body);
        assert_eq!(err.reason(), "API key not valid. Please pass a valid API key.");

        let wrapped = format!("[{body}]");
        assert_eq!(map_status_error(400, &wrapped).reason(), err.reason());
    }

    #[test]
    fn test_map_status_error_unrelated_json_uses_raw_body() {
        assert_eq!(map_status_error(500, "[1,2]").reason(), "HTTP 500: [1,2]");
        assert_eq!(
            map_status_error(500, r#"{"oops":true}"#).reason(),
            r#"HTTP 500: {"oops":true}"#
        );
    }

    #[test]
    fn test_map_status_error_rejected_key() {
        let body = r#"[{"error":{"code":403,"message":"Permission denied.",
            "status":"PERMISSION_DENIED"}}]"#;
        assert!(matches!(map_status_error(403, body), LlmError::AuthenticationFailed));
        assert!(matches!(map_status_error(401, ""), LlmError::AuthenticationFailed));
    }

    #[test]
    fn test_map_status_error_reads_retry_delay() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded.",
            "status":"RESOURCE_EXHAUSTED",
            "details":[
                {"@type":"type.googleapis.com/google.rpc.QuotaFailure","violations":[]},
                {"@type":"type.googleapis.com/google.rpc.RetryInfo","retryDelay":"31s"}
            ]}}"#;
        let err = map_status_error(429, body);
        assert!(matches!(
            err,
            LlmError::RateLimited {
                retry_after_ms: Some(31_000)
            }
        ));
        assert_eq!(err.reason(), "rate limited, retry after 31000ms");
    }

    #[test]
    fn test_map_status_error_fallbacks() {
        assert!(matches!(
            map_status_error(429, ""),
            LlmError::RateLimited { retry_after_ms: None }
        ));
        assert!(matches!(map_status_error(503, "busy"), LlmError::Overloaded(_)));
        assert_eq!(map_status_error(502, "").reason(), "HTTP 502");
        assert_eq!(map_status_error(500, "oops").reason(), "HTTP 500: oops");
    }
}
