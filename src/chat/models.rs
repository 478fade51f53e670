//! Chat data models
//!
//! Defines structures for threads and messages. The serialized form uses
//! camelCase field names and RFC 3339 timestamps, which is what the durable
//! `chat-threads` document contains.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a thread
pub type ThreadId = String;

/// Unique identifier for a message
pub type MessageId = String;

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message from the user
    User,
    /// Message from the assistant/AI
    Assistant,
}

impl MessageRole {
    /// Convert the role to its string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// A single message in a thread
///
/// Content and timestamp never change after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier for the message
    pub id: MessageId,
    /// Role of the message sender
    pub role: MessageRole,
    /// Content of the message
    pub content: String,
    /// When the message was created
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a new message with a generated id and the current time
    pub fn new(role: MessageRole, content: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content,
            timestamp: Utc::now(),
        }
    }
}

/// The caller-supplied part of a message; id and timestamp are assigned by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    /// Role of the message sender
    pub role: MessageRole,
    /// Content of the message
    pub content: String,
}

impl NewMessage {
    /// A message authored by the user
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// A message authored by the assistant
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// A conversation thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    /// Unique identifier for the thread
    pub id: ThreadId,
    /// Title of the thread (derived from the first user message or user-set)
    pub title: String,
    /// Messages in arrival order
    pub messages: Vec<Message>,
    /// When the thread was created
    pub created_at: DateTime<Utc>,
    /// Whether the thread is pinned to the top of the list
    pub pinned: bool,
}

impl Thread {
    /// Create an empty, unpinned thread
    pub fn new(title: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            messages: Vec::new(),
            created_at: Utc::now(),
            pinned: false,
        }
    }
}

/// Maximum number of characters kept when deriving a title
pub const TITLE_MAX_CHARS: usize = 30;

/// Derive a thread title from the first user message
///
/// Counts characters, not bytes, so multi-byte text is never split mid-character.
pub fn derive_title(content: &str) -> String {
    if content.chars().count() > TITLE_MAX_CHARS {
        let head: String = content.chars().take(TITLE_MAX_CHARS).collect();
        format!("{}...", head)
    } else {
        content.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_title_short_content_verbatim() {
        assert_eq!(derive_title("Hello there"), "Hello there");
        let exactly_thirty = "a".repeat(30);
        assert_eq!(derive_title(&exactly_thirty), exactly_thirty);
    }

    #[test]
    fn test_derive_title_truncates_long_content() {
        let content = "abcdefghijklmnopqrstuvwxyz0123456789";
        assert_eq!(derive_title(content), "abcdefghijklmnopqrstuvwxyz0123...");
    }

    #[test]
    fn test_derive_title_counts_characters() {
        let content = "こんにちは".repeat(7); // 35 chars, 105 bytes
        let title = derive_title(&content);
        assert_eq!(title.chars().count(), 33);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn test_thread_serializes_camel_case() {
        let thread = Thread::new("New chat 1".to_string());
        let json = serde_json::to_value(&thread).unwrap();

        assert!(json.get("createdAt").is_some());
        assert_eq!(json["pinned"], false);
        assert!(json["messages"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_message_role_serialization() {
        let message = Message::new(MessageRole::Assistant, "hi".to_string());
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(MessageRole::User.as_str(), "user");
    }

    #[test]
    fn test_message_parses_iso_timestamp() {
        let json = r#"{"id":"m1","role":"user","content":"hi","timestamp":"2024-05-01T12:30:00.000Z"}"#;
        let message: Message = serde_json::from_str(json).unwrap();
        assert_eq!(message.timestamp.to_rfc3339(), "2024-05-01T12:30:00+00:00");
    }
}
