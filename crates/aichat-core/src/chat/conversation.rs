//! Client-side conversation: the transcript plus the one in-flight request.

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use aichat_types::chat::{Attachment, ChatMessage};
use aichat_types::error::ConversationError;
use aichat_types::llm::MessageRole;

/// Id of the greeting that opens every conversation.
pub const WELCOME_ID: &str = "welcome";

/// The assistant greeting shown before the user types anything.
pub fn welcome_message(user_name: Option<&str>) -> ChatMessage {
    let name = user_name.unwrap_or("there");
    ChatMessage {
        id: WELCOME_ID.to_string(),
        role: MessageRole::Assistant,
        content: format!(
            "Hey {name}! I'm your AI teammate. \
             Attach documents or images and I'll reason about them in real-time."
        ),
        attachments: Vec::new(),
    }
}

/// A request that has been appended to the transcript and is waiting for
/// its reply.
#[derive(Debug)]
pub struct Submission {
    message_id: String,
    transcript: Vec<ChatMessage>,
    cancel: CancellationToken,
}

impl Submission {
    /// Id of the user message that started this submission.
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// Everything to send to the relay, including the new user message.
    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Fires when the user cancels the request.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Append-only transcript with at most one request in flight.
#[derive(Debug)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    in_flight: Option<CancellationToken>,
}

impl Conversation {
    /// Start a conversation with the welcome greeting.
    pub fn new(user_name: Option<&str>) -> Self {
        Self {
            messages: vec![welcome_message(user_name)],
            in_flight: None,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_streaming(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Append a user message and mark a request as in flight.
    ///
    /// Rejects a second submission while one is streaming, and a blank
    /// message that carries no attachments.
    pub fn begin_submission(
        &mut self,
        content: &str,
        attachments: Vec<Attachment>,
    ) -> Result<Submission, ConversationError> {
        if self.in_flight.is_some() {
            return Err(ConversationError::Busy);
        }
        let content = content.trim();
        if content.is_empty() && attachments.is_empty() {
            return Err(ConversationError::EmptyMessage);
        }

        let message = ChatMessage {
            id: Uuid::now_v7().to_string(),
            role: MessageRole::User,
            content: content.to_string(),
            attachments,
        };
        let message_id = message.id.clone();
        self.messages.push(message);

        let cancel = CancellationToken::new();
        self.in_flight = Some(cancel.clone());
        Ok(Submission {
            message_id,
            transcript: self.messages.clone(),
            cancel,
        })
    }

    /// Cancel the in-flight request. Returns false if nothing was running.
    pub fn cancel(&self) -> bool {
        match &self.in_flight {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Close `submission`, appending whatever reply text arrived.
    ///
    /// Partial text from a cancelled or failed request is kept. Nothing is
    /// appended when no text arrived at all.
    pub fn complete(&mut self, submission: Submission, reply: &str) -> Option<&ChatMessage> {
        drop(submission);
        self.in_flight = None;
        if reply.is_empty() {
            return None;
        }
        self.messages.push(ChatMessage {
            id: Uuid::now_v7().to_string(),
            role: MessageRole::Assistant,
            content: reply.to_string(),
            attachments: Vec::new(),
        });
        self.messages.last()
    }

    /// Start over with only the greeting. Refused while streaming.
    pub fn reset(&mut self, user_name: Option<&str>) -> Result<(), ConversationError> {
        if self.in_flight.is_some() {
            return Err(ConversationError::Busy);
        }
        self.messages = vec![welcome_message(user_name)];
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome_message() {
        let conversation = Conversation::new(Some("Ada"));
        let welcome = &conversation.messages()[0];
        assert_eq!(welcome.id, WELCOME_ID);
        assert_eq!(welcome.role, MessageRole::Assistant);
        assert!(welcome.content.starts_with("Hey Ada! I'm your AI teammate."));

        let anonymous = welcome_message(None);
        assert!(anonymous.content.starts_with("Hey there!"));
    }

    #[test]
    fn test_submission_carries_full_transcript() {
        let mut conversation = Conversation::new(None);
        let submission = conversation.begin_submission("  hello  ", Vec::new()).unwrap();
        assert!(conversation.is_streaming());

        let transcript = submission.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1].content, "hello");
        assert_eq!(transcript[1].id, submission.message_id());
    }

    #[test]
    fn test_second_submission_is_busy() {
        let mut conversation = Conversation::new(None);
        let _first = conversation.begin_submission("one", Vec::new()).unwrap();
        let err = conversation.begin_submission("two", Vec::new()).unwrap_err();
        assert_eq!(err, ConversationError::Busy);
        assert_eq!(conversation.messages().len(), 2);
    }

    #[test]
    fn test_empty_message_rejected_unless_attachments() {
        let mut conversation = Conversation::new(None);
        assert_eq!(
            conversation.begin_submission("   ", Vec::new()).unwrap_err(),
            ConversationError::EmptyMessage
        );

        let attachment = Attachment {
            name: Some("a.txt".to_string()),
            content_type: Some("text/plain".to_string()),
            url: "data:text/plain;base64,YQ==".to_string(),
        };
        let submission = conversation.begin_submission("", vec![attachment]).unwrap();
        assert_eq!(submission.transcript()[1].attachments.len(), 1);
    }

    #[test]
    fn test_cancel_fires_token_and_keeps_partial_reply() {
        let mut conversation = Conversation::new(None);
        assert!(!conversation.cancel());

        let submission = conversation.begin_submission("tell me a story", Vec::new()).unwrap();
        let token = submission.cancellation();
        assert!(conversation.cancel());
        assert!(token.is_cancelled());

        let reply = conversation.complete(submission, "Once upon").unwrap();
        assert_eq!(reply.content, "Once upon");
        assert!(!conversation.is_streaming());
        assert_eq!(conversation.messages().len(), 3);

        // Ready for the next message.
        assert!(conversation.begin_submission("go on", Vec::new()).is_ok());
    }

    #[test]
    fn test_complete_without_text_appends_nothing() {
        let mut conversation = Conversation::new(None);
        let submission = conversation.begin_submission("hi", Vec::new()).unwrap();
        assert!(conversation.complete(submission, "").is_none());
        assert_eq!(conversation.messages().len(), 2);
    }

    #[test]
    fn test_reset_refused_while_streaming() {
        let mut conversation = Conversation::new(None);
        let submission = conversation.begin_submission("hi", Vec::new()).unwrap();
        assert_eq!(conversation.reset(None), Err(ConversationError::Busy));
        conversation.complete(submission, "hello");
        conversation.reset(Some("Ada")).unwrap();
        assert_eq!(conversation.messages().len(), 1);
    }
}
