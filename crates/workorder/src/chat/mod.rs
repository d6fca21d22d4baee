//! Conversation plumbing.
//!
//! The intake dialogue lives entirely in [`SYSTEM_PROMPT`]. Every turn the
//! browser sends back the whole transcript; the service prepends the prompt,
//! forwards it to the model, and inspects the reply for the generation marker.

mod client;
mod prompt;
mod reply;

use serde::{Deserialize, Serialize};

pub use client::{ChatModel, OpenAiChatModel};
pub use prompt::SYSTEM_PROMPT;
pub use reply::{inspect_reply, Reply, MARKER};

/// User message the UI sends after a logo file was picked.
pub const LOGO_ATTACHED: &str = "[LOGO_ANEXADO]";

/// Author of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions for the model.
    System,
    /// The person filling in the order.
    User,
    /// The model.
    Assistant,
}

/// One entry of the conversation transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who wrote the message.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Assemble the messages sent to the model for one turn.
///
/// The system prompt always comes first, followed by the client-held history
/// and, when present and non-empty, the new user message.
#[must_use]
pub fn build_transcript(history: &[ChatMessage], message: Option<&str>) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(SYSTEM_PROMPT));
    messages.extend_from_slice(history);
    if let Some(text) = message.filter(|m| !m.is_empty()) {
        messages.push(ChatMessage::user(text));
    }
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&ChatMessage::assistant("oi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"oi"}"#);

        let msg: ChatMessage = serde_json::from_str(r#"{"role":"user","content":"p"}"#).unwrap();
        assert_eq!(msg, ChatMessage::user("p"));
    }

    #[test]
    fn test_build_transcript_prepends_prompt() {
        let history = vec![
            ChatMessage::assistant("Qual o nome do cliente?"),
            ChatMessage::user("Maria"),
        ];

        let messages = build_transcript(&history, Some("1199999-0000"));
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].content, SYSTEM_PROMPT);
        assert_eq!(&messages[1..3], history.as_slice());
        assert_eq!(messages[3], ChatMessage::user("1199999-0000"));
    }

    #[test]
    fn test_build_transcript_skips_missing_message() {
        let messages = build_transcript(&[], None);
        assert_eq!(messages.len(), 1);

        let messages = build_transcript(&[], Some(""));
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn test_build_transcript_forwards_logo_placeholder() {
        let messages = build_transcript(&[], Some(LOGO_ATTACHED));
        assert_eq!(messages.last().unwrap().content, LOGO_ATTACHED);
    }
}
