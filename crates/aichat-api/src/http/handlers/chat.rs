//! POST /api/chat: relay a transcript to the model and stream the reply.

use std::convert::Infallible;

use axum::body::{Body, Bytes};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use futures_util::StreamExt;
use serde::Deserialize;

use aichat_core::chat::StreamFormat;

use crate::http::error::AppError;
use crate::state::AppState;

/// Query parameters for the chat endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ChatQuery {
    /// `data` (default) or `text`.
    #[serde(default)]
    pub format: Option<StreamFormat>,
}

/// POST /api/chat
///
/// The body is read as raw bytes so that a malformed payload produces the
/// relay's own `Invalid payload.` response rather than an extractor
/// rejection. An unreadable query string falls back to the `data` format.
/// Errors before the first model event are plain HTTP errors; later
/// failures arrive in-band as an error frame.
pub async fn relay_chat(
    State(state): State<AppState>,
    query: Result<Query<ChatQuery>, QueryRejection>,
    body: Bytes,
) -> Result<Response, AppError> {
    let chunks = state.relay.open(&body).await?;
    let format = match query {
        Ok(Query(query)) => query.format.unwrap_or_default(),
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "unreadable query, using data format");
            StreamFormat::default()
        }
    };

    let body_stream = chunks.filter_map(move |chunk| {
        let encoded = format.encode(&chunk);
        async move { (!encoded.is_empty()).then(|| Ok::<_, Infallible>(Bytes::from(encoded))) }
    });

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(body_stream),
    )
        .into_response())
}
