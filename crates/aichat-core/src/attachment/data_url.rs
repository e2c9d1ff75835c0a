//! `data:` URL encoding and parsing.
//!
//! Attachments travel inside chat messages as `data:<mime>;base64,<payload>`
//! strings. Encoding is a pure function of the content type and bytes.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Content type used when the source did not report one.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Number of characters kept in a text preview.
pub const PREVIEW_CHARS: usize = 280;

/// Errors from parsing or decoding a data URL.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataUrlError {
    #[error("not a data URL")]
    MissingScheme,

    #[error("data URL has no payload separator")]
    MissingSeparator,

    #[error("invalid base64 payload: {0}")]
    InvalidBase64(String),
}

/// Encode bytes as a base64 data URL.
pub fn encode_data_url(content_type: &str, bytes: &[u8]) -> String {
    let content_type = if content_type.trim().is_empty() {
        FALLBACK_CONTENT_TYPE
    } else {
        content_type
    };
    format!("data:{content_type};base64,{}", STANDARD.encode(bytes))
}

/// A parsed data URL borrowing from its source string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl<'a> {
    mime: &'a str,
    base64: bool,
    payload: &'a str,
}

impl<'a> DataUrl<'a> {
    pub fn parse(url: &'a str) -> Result<Self, DataUrlError> {
        let rest = url
            .strip_prefix("data:")
            .ok_or(DataUrlError::MissingScheme)?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or(DataUrlError::MissingSeparator)?;

        let mut params = header.split(';');
        let mime = params.next().unwrap_or_default().trim();
        let base64 = params.any(|p| p.trim().eq_ignore_ascii_case("base64"));

        Ok(Self {
            mime: if mime.is_empty() { "text/plain" } else { mime },
            base64,
            payload,
        })
    }

    /// Media type without parameters, e.g. `image/png`.
    pub fn mime(&self) -> &'a str {
        self.mime
    }

    pub fn is_base64(&self) -> bool {
        self.base64
    }

    /// The encoded payload exactly as it appears after the comma.
    pub fn payload(&self) -> &'a str {
        self.payload
    }

    /// Decode the payload into raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>, DataUrlError> {
        if self.base64 {
            STANDARD
                .decode(self.payload.trim())
                .map_err(|e| DataUrlError::InvalidBase64(e.to_string()))
        } else {
            Ok(percent_encoding::percent_decode_str(self.payload).collect())
        }
    }
}

/// Short plain-text preview of a text attachment.
///
/// Returns the first [`PREVIEW_CHARS`] characters of the decoded payload,
/// trimmed. Anything that cannot be decoded yields an empty preview.
pub fn text_preview(data_url: &str) -> String {
    let bytes = match DataUrl::parse(data_url).and_then(|url| url.decode()) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "could not generate text preview");
            return String::new();
        }
    };
    let text = String::from_utf8_lossy(&bytes);
    let head: String = text.chars().take(PREVIEW_CHARS).collect();
    head.trim().to_string()
}
