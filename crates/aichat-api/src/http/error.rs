//! Application error type mapping to HTTP status codes.
//!
//! Bodies are plain text: web clients show the response body
//! verbatim when a request fails.

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

use aichat_types::error::RelayError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Chat relay errors.
    Relay(RelayError),
}

impl From<RelayError> for AppError {
    fn from(e: RelayError) -> Self {
        AppError::Relay(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Relay(RelayError::InvalidPayload(detail)) => {
                tracing::debug!(%detail, "rejected chat payload");
                StatusCode::BAD_REQUEST
            }
            AppError::Relay(RelayError::MissingConfiguration(name)) => {
                tracing::error!(variable = %name, "provider credential is not configured");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Relay(RelayError::Provider(e)) => {
                tracing::warn!(error = ?e, "provider failed before streaming");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let AppError::Relay(e) = self;
        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            e.to_string(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aichat_types::llm::LlmError;

    #[test]
    fn test_invalid_payload_is_bad_request() {
        let response =
            AppError::from(RelayError::InvalidPayload("not an object".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_missing_configuration_is_server_error() {
        let response =
            AppError::from(RelayError::MissingConfiguration(
                "GOOGLE_GENERATIVE_AI_API_KEY".to_string(),
            ))
                .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
    }

    #[test]
    fn test_provider_error_is_server_error() {
        let overloaded = LlmError::Overloaded("model overloaded".to_string());
        let response = AppError::from(RelayError::Provider(overloaded)).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
