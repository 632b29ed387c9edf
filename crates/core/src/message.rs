//! Chat messages, in wire form and in stored/display form.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// The role of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
pub enum Role {
    /// The user role
    #[serde(rename = "user")]
    #[default]
    User,
    /// The assistant role
    #[serde(rename = "assistant")]
    Assistant,
    /// The system role
    #[serde(rename = "system")]
    System,
}

/// A URL reference with an optional fidelity hint, used by image and file
/// parts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Attachment {
    /// Remote URL or data URL.
    pub url: String,
    /// Provider detail hint (`auto`, `low`, `high`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// One part of a message body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Plain text.
    Text { text: String },
    /// An image reference.
    ImageUrl { image_url: Attachment },
    /// A file reference.
    File { file: Attachment },
}

impl ContentPart {
    /// Create a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// The text of this part, if it is a text part.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// A message as sent to a provider.
///
/// Immutable once constructed; the stored form wraps it in [`Message`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChatMessage {
    /// The role of the message
    pub role: Role,
    /// The ordered content parts
    pub content: Vec<ContentPart>,
}

impl ChatMessage {
    /// Create a message with the given role and parts.
    pub fn new(role: Role, content: Vec<ContentPart>) -> Self {
        Self { role, content }
    }

    /// Create a new user message from plain text
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![ContentPart::text(text)])
    }

    /// Create a new system message from plain text
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, vec![ContentPart::text(text)])
    }

    /// Create a new assistant message from plain text
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, vec![ContentPart::text(text)])
    }

    /// The first text part, or an empty string.
    pub fn text(&self) -> &str {
        self.content
            .iter()
            .find_map(ContentPart::as_text)
            .unwrap_or_default()
    }

    /// Whether the message carries no text and no attachments.
    pub fn is_empty(&self) -> bool {
        self.content.iter().all(|part| match part {
            ContentPart::Text { text } => text.trim().is_empty(),
            _ => false,
        })
    }
}

/// A message in a stored session.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique message id.
    pub id: CompactString,
    /// Role and content parts.
    #[serde(flatten)]
    pub message: ChatMessage,
    /// Creation time, unix milliseconds.
    pub timestamp: i64,
    /// Mirrors `role == user` for the display layer.
    pub is_user: bool,
    /// Set when the message carries reasoning output.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_reasoning: bool,
    /// The model's reasoning trace, for providers that surface one.
    #[serde(
        rename = "reasoning_content",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub reasoning_content: Option<String>,
}

impl Message {
    /// Wrap a chat message with a fresh id and timestamp.
    pub fn new(message: ChatMessage) -> Self {
        let is_user = message.role == Role::User;
        Self {
            id: crate::new_id(),
            message,
            timestamp: crate::now_millis(),
            is_user,
            is_reasoning: false,
            reasoning_content: None,
        }
    }

    /// Create the stored form of user input.
    pub fn user(content: Vec<ContentPart>) -> Self {
        Self::new(ChatMessage::new(Role::User, content))
    }

    /// Create the stored form of a finalized model response.
    pub fn assistant(content: impl Into<String>, reasoning: Option<String>) -> Self {
        let reasoning = reasoning.filter(|r| !r.is_empty());
        Self {
            is_reasoning: reasoning.is_some(),
            reasoning_content: reasoning,
            ..Self::new(ChatMessage::assistant(content))
        }
    }

    /// The role of the message.
    pub fn role(&self) -> Role {
        self.message.role
    }

    /// The first text part, or an empty string.
    pub fn text(&self) -> &str {
        self.message.text()
    }
}

impl From<Message> for ChatMessage {
    fn from(message: Message) -> Self {
        message.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_parts_use_tagged_wire_shape() {
        let parts = vec![
            ContentPart::text("look"),
            ContentPart::ImageUrl {
                image_url: Attachment {
                    url: "https://example.com/a.png".into(),
                    detail: Some("high".into()),
                },
            },
        ];
        let json = serde_json::to_value(&parts).unwrap();
        assert_eq!(json[0]["type"], "text");
        assert_eq!(json[0]["text"], "look");
        assert_eq!(json[1]["type"], "image_url");
        assert_eq!(json[1]["image_url"]["detail"], "high");
    }

    #[test]
    fn stored_message_is_camel_case() {
        let msg = Message::assistant("hi", Some("thinking".into()));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["isUser"], false);
        assert_eq!(json["isReasoning"], true);
        assert_eq!(json["reasoning_content"], "thinking");
        let back: Message = serde_json::from_value(json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn empty_reasoning_is_dropped() {
        let msg = Message::assistant("hi", Some(String::new()));
        assert!(!msg.is_reasoning);
        assert!(msg.reasoning_content.is_none());
    }

    #[test]
    fn text_picks_first_text_part() {
        let msg = ChatMessage::new(
            Role::User,
            vec![
                ContentPart::File {
                    file: Attachment {
                        url: "data:application/pdf;base64,AA==".into(),
                        detail: None,
                    },
                },
                ContentPart::text("summarize this"),
            ],
        );
        assert_eq!(msg.text(), "summarize this");
        assert!(!msg.is_empty());
        assert!(ChatMessage::user("   ").is_empty());
    }
}
