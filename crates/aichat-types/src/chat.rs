//! Chat transcript types exchanged between the client and the relay.
//!
//! The wire shape follows the web client: each message carries
//! `role`, `content` and an optional list of attachments whose `url` is a
//! data URL. Older clients send the list as `experimental_attachments`, so
//! both keys are accepted on input.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::llm::{MessageRole, StopReason, Usage};

/// A file attached to a message, inlined as a data URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// `data:<mime>;base64,<payload>`.
    pub url: String,
}

/// A message that belongs to a conversation.
///
/// Messages are never edited once sent; a conversation only grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        alias = "experimental_attachments"
    )]
    pub attachments: Vec<Attachment>,
}

/// A message as received by the relay, after role filtering.
///
/// Clients may send roles the model does not accept (`tool`, `data`), and
/// those often carry structured content; the relay drops them before this
/// type is ever built. The remaining fields are read leniently: a numeric
/// `id` is stringified, array content keeps its text parts, and malformed
/// attachment entries are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IncomingMessage {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    pub role: String,
    #[serde(default, deserialize_with = "lenient_content")]
    pub content: String,
    #[serde(
        default,
        alias = "experimental_attachments",
        deserialize_with = "lenient_attachments"
    )]
    pub attachments: Option<Vec<Attachment>>,
}

impl IncomingMessage {
    /// Map a raw role to one the model accepts. Matching is exact.
    pub fn accepted_role(raw: &str) -> Option<MessageRole> {
        match raw {
            "system" => Some(MessageRole::System),
            "user" => Some(MessageRole::User),
            "assistant" => Some(MessageRole::Assistant),
            _ => None,
        }
    }

    pub fn allowed_role(&self) -> Option<MessageRole> {
        Self::accepted_role(&self.role)
    }
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(id) => Some(id),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    })
}

fn lenient_content<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        // Content parts: `[{"type":"text","text":".."}, ..]`
        Value::Array(parts) => parts
            .iter()
            .filter(|part| part.get("type").and_then(Value::as_str) == Some("text"))
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    })
}

fn lenient_attachments<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<Attachment>>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
        ),
        _ => None,
    })
}

/// Summary sent after the last text chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishInfo {
    pub stop_reason: StopReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// One unit of the relayed response stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayChunk {
    /// Incremental model text, in arrival order.
    Text(String),
    /// The provider failed; carries the best available reason.
    Error(String),
    /// The model finished normally.
    Finish(FinishInfo),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incoming_message_allowed_roles() {
        for (raw, expected) in [
            ("system", Some(MessageRole::System)),
            ("user", Some(MessageRole::User)),
            ("assistant", Some(MessageRole::Assistant)),
            ("tool", None),
            ("data", None),
            ("User", None),
        ] {
            let msg = IncomingMessage {
                id: None,
                role: raw.to_string(),
                content: String::new(),
                attachments: None,
            };
            assert_eq!(msg.allowed_role(), expected, "role {raw}");
        }
    }

    #[test]
    fn test_incoming_message_accepts_experimental_attachments() {
        let json = r#"{
            "role": "user",
            "content": "see file",
            "experimental_attachments": [
                {"name": "a.txt", "contentType": "text/plain", "url": "data:text/plain;base64,aGk="}
            ]
        }"#;
        let msg: IncomingMessage = serde_json::from_str(json).unwrap();
        let attachments = msg.attachments.unwrap();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].content_type.as_deref(), Some("text/plain"));
    }

    #[test]
    fn test_incoming_message_content_defaults_to_empty() {
        let msg: IncomingMessage = serde_json::from_str(r#"{"role":"user"}"#).unwrap();
        assert!(msg.content.is_empty());
        assert!(msg.id.is_none());
    }

    #[test]
    fn test_incoming_message_reads_odd_fields_leniently() {
        let json = r#"{
            "id": 7,
            "role": "user",
            "content": [
                {"type": "text", "text": "first"},
                {"type": "image", "image": "..."},
                {"type": "text", "text": "second"}
            ],
            "attachments": [{"name": "no url"}, {"url": "data:text/plain,hi"}]
        }"#;
        let msg: IncomingMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.id.as_deref(), Some("7"));
        assert_eq!(msg.content, "first\nsecond");
        let attachments = msg.attachments.unwrap();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].url, "data:text/plain,hi");
    }

    #[test]
    fn test_incoming_message_null_fields() {
        let msg: IncomingMessage =
            serde_json::from_str(r#"{"id":null,"role":"assistant","content":null}"#).unwrap();
        assert!(msg.id.is_none());
        assert!(msg.content.is_empty());
    }

    #[test]
    fn test_chat_message_omits_empty_attachments() {
        let msg = ChatMessage {
            id: "m1".to_string(),
            role: MessageRole::User,
            content: "hello".to_string(),
            attachments: Vec::new(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "user");
        assert!(json.get("attachments").is_none());
    }

    #[test]
    fn test_attachment_wire_keys() {
        let attachment = Attachment {
            name: Some("cat.png".to_string()),
            content_type: Some("image/png".to_string()),
            url: "data:image/png;base64,AAAA".to_string(),
        };
        let json = serde_json::to_value(&attachment).unwrap();
        assert_eq!(json["contentType"], "image/png");
        assert_eq!(json["name"], "cat.png");
    }
}
