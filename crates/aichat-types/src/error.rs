use thiserror::Error;

use crate::llm::LlmError;

/// Errors from the session key/value store.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(String),

    #[error("storage serialization error: {0}")]
    Serialization(String),
}

/// Errors from the client session gate.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Invalid credentials. Try the demo email and password.")]
    InvalidCredentials,

    #[error("not signed in")]
    NotAuthenticated,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors from profile form validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("Name and email are required.")]
    MissingField,

    #[error("Please select an image file.")]
    AvatarNotImage,
}

/// Errors from the chat relay.
///
/// Display strings are the response bodies sent to the client.
#[derive(Debug, Clone, Error)]
pub enum RelayError {
    /// A required environment variable is absent or blank.
    #[error("{0} is not set")]
    MissingConfiguration(String),

    #[error("Invalid payload.")]
    InvalidPayload(String),

    /// The provider failed before any text was streamed.
    #[error("{}", .0.reason())]
    Provider(LlmError),
}

/// Errors from the client-side conversation model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversationError {
    #[error("a response is still streaming")]
    Busy,

    #[error("message is empty")]
    EmptyMessage,
}

/// Reasons a file cannot be attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachmentError {
    #[error("\"{name}\" is larger than {limit_mb}MB.")]
    TooLarge { name: String, limit_mb: u64 },

    #[error("\"{name}\" has an unsupported type.")]
    UnsupportedType { name: String },

    #[error("could not read \"{name}\": {message}")]
    Read { name: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_error_bodies() {
        assert_eq!(
            RelayError::MissingConfiguration("GOOGLE_GENERATIVE_AI_API_KEY".to_string())
                .to_string(),
            "GOOGLE_GENERATIVE_AI_API_KEY is not set"
        );
        assert_eq!(
            RelayError::InvalidPayload("messages is not an array".to_string()).to_string(),
            "Invalid payload."
        );
        let provider = RelayError::Provider(LlmError::Provider {
            message: "API key not valid".to_string(),
        });
        assert_eq!(provider.to_string(), "API key not valid");
    }

    #[test]
    fn test_attachment_error_messages() {
        let err = AttachmentError::TooLarge {
            name: "big.pdf".to_string(),
            limit_mb: 8,
        };
        assert_eq!(err.to_string(), "\"big.pdf\" is larger than 8MB.");
    }

    #[test]
    fn test_auth_error_from_storage() {
        let err: AuthError = StorageError::Io("disk full".to_string()).into();
        assert!(matches!(err, AuthError::Storage(_)));
        assert_eq!(err.to_string(), "storage I/O error: disk full");
    }
}
