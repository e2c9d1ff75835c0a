//! Client side of `POST /api/chat`.
//!
//! Sends the transcript and decodes the `data` frame stream back into
//! [`RelayChunk`]s. Dropping the returned stream aborts the request.

use std::fmt::Display;
use std::pin::Pin;
use std::time::Duration;

use futures_util::{Stream, StreamExt};

use aichat_core::chat::{FrameDecoder, FrameError, StreamFormat};
use aichat_types::chat::{ChatMessage, RelayChunk};

#[derive(Debug, thiserror::Error)]
pub enum RelayClientError {
    #[error("could not reach relay: {0}")]
    Http(String),

    /// The relay rejected the request; `message` is its response body.
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Stream of decoded chunks for one request.
pub type RelayChunkStream =
    Pin<Box<dyn Stream<Item = Result<RelayChunk, RelayClientError>> + Send>>;

#[derive(serde::Serialize)]
struct ChatRequestBody<'a> {
    messages: &'a [ChatMessage],
}

pub struct RelayClient {
    client: reqwest::Client,
    base_url: String,
}

impl RelayClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, RelayClientError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| RelayClientError::Http(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }

    /// Send a transcript. Resolves once the relay has answered with a
    /// success status.
    pub async fn send(
        &self,
        transcript: &[ChatMessage],
    ) -> Result<RelayChunkStream, RelayClientError> {
        let response = self
            .client
            .post(self.chat_url())
            .query(&[("format", StreamFormat::Data)])
            .json(&ChatRequestBody {
                messages: transcript,
            })
            .send()
            .await
            .map_err(|e| RelayClientError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = %status, body = %body, "relay rejected request");
            let message = if body.trim().is_empty() {
                format!("relay returned HTTP {status}")
            } else {
                body.trim().to_string()
            };
            return Err(RelayClientError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(decode_body(response.bytes_stream()))
    }
}

/// Decode a `data`-format body arriving as arbitrary byte chunks.
pub fn decode_body<S, B, E>(body: S) -> RelayChunkStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Display + Send,
{
    Box::pin(async_stream::try_stream! {
        let mut decoder = FrameDecoder::new();
        futures_util::pin_mut!(body);
        while let Some(piece) = body.next().await {
            let piece =
                piece.map_err(|e| RelayClientError::Http(format!("response body read: {e}")))?;
            for chunk in decoder.push(piece.as_ref())? {
                yield chunk;
            }
        }
        if let Some(chunk) = decoder.finish()? {
            yield chunk;
        }
    })
}

#[cfg(test)]
mod tests {
    use aichat_types::chat::FinishInfo;
    use aichat_types::llm::StopReason;

    use super::*;

    fn body(pieces: Vec<Result<Vec<u8>, std::io::Error>>) -> RelayChunkStream {
        decode_body(futures_util::stream::iter(pieces))
    }

    #[test]
    fn test_chat_url() {
        let client = RelayClient::new("http://127.0.0.1:3000/").unwrap();
        assert_eq!(client.chat_url(), "http://127.0.0.1:3000/api/chat");
    }

    #[test]
    fn test_format_query_value() {
        let query = serde_json::to_value(StreamFormat::Data).unwrap();
        assert_eq!(query, "data");
    }

    #[tokio::test]
    async fn test_decode_body_across_pieces() {
        let chunks: Vec<_> = body(vec![
            Ok(b"0:\"Hel".to_vec()),
            Ok(b"lo\"\n0:\" world\"\nd:{\"finishReason\":\"stop\"}".to_vec()),
        ])
        .collect()
        .await;
        let chunks: Vec<RelayChunk> = chunks.into_iter().map(Result::unwrap).collect();
        assert_eq!(
            chunks,
            vec![
                RelayChunk::Text("Hello".to_string()),
                RelayChunk::Text(" world".to_string()),
                RelayChunk::Finish(FinishInfo {
                    stop_reason: StopReason::Stop,
                    usage: None
                }),
            ]
        );
    }

    #[tokio::test]
    async fn test_decode_body_read_error() {
        let chunks: Vec<_> = body(vec![
            Ok(b"0:\"partial\"\n".to_vec()),
            Err(std::io::Error::other("connection reset")),
        ])
        .collect()
        .await;
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].as_ref().unwrap(), &RelayChunk::Text("partial".to_string()));
        assert!(matches!(chunks[1], Err(RelayClientError::Http(_))));
    }

    #[tokio::test]
    async fn test_decode_body_bad_frame() {
        let chunks: Vec<_> = body(vec![Ok(b"0:nope\n".to_vec())]).collect().await;
        assert!(matches!(chunks[0], Err(RelayClientError::Frame(_))));
    }
}
