//! Conversation store trait and record types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

use crate::types::{ChatMessage, MessageRole};

/// One persisted message of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    #[serde(rename = "conversationId")]
    pub conversation_id: String,
    pub role: MessageRole,
    pub content: String,
    /// Creation time in milliseconds since the Unix epoch
    #[serde(rename = "createdAt")]
    pub created_at_ms: u64,
}

impl StoredMessage {
    /// Create a record with an explicit timestamp
    pub fn new(
        conversation_id: impl Into<String>,
        role: MessageRole,
        content: impl Into<String>,
        created_at_ms: u64,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            role,
            content: content.into(),
            created_at_ms,
        }
    }

    /// Create a record stamped with the current time
    pub fn now(conversation_id: impl Into<String>, role: MessageRole, content: impl Into<String>) -> Self {
        let created_at_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self::new(conversation_id, role, content, created_at_ms)
    }

    /// The message as sent to a provider
    pub fn to_chat_message(&self) -> ChatMessage {
        ChatMessage::new(self.role, self.content.clone())
    }
}

/// Errors from a conversation store
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Conversation id is required")]
    MissingConversationId,

    #[error("Store not available: {0}")]
    NotAvailable(String),

    #[error("Store error: {0}")]
    Other(String),
}

pub type HistoryResult<T> = Result<T, HistoryError>;

/// Where conversations are persisted
///
/// The streaming core only reads an ordered history from here and never
/// writes; the embedding application appends user and assistant turns.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Store name for logs
    fn name(&self) -> &str;

    /// Messages of a conversation, oldest first
    ///
    /// Messages with equal timestamps keep their insertion order. An
    /// unknown conversation yields an empty list.
    async fn load(&self, conversation_id: &str) -> HistoryResult<Vec<StoredMessage>>;

    /// Persist one message
    async fn append(&self, message: StoredMessage) -> HistoryResult<()>;
}

/// Ordered chat messages from stored records
pub fn to_chat_messages(records: &[StoredMessage]) -> Vec<ChatMessage> {
    records.iter().map(StoredMessage::to_chat_message).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_chat_messages_keeps_order() {
        let records = vec![
            StoredMessage::new("c1", MessageRole::System, "Be brief.", 1),
            StoredMessage::new("c1", MessageRole::User, "Hi", 2),
            StoredMessage::new("c1", MessageRole::Assistant, "Hello!", 3),
        ];

        let messages = to_chat_messages(&records);
        assert_eq!(
            messages,
            vec![
                ChatMessage::system("Be brief."),
                ChatMessage::user("Hi"),
                ChatMessage::assistant("Hello!"),
            ]
        );
    }

    #[test]
    fn test_serialization_field_names() {
        let record = StoredMessage::new("c1", MessageRole::User, "Hi", 42);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["conversationId"], "c1");
        assert_eq!(json["role"], "user");
        assert_eq!(json["createdAt"], 42);
    }

    #[test]
    fn test_now_is_stamped() {
        assert!(StoredMessage::now("c1", MessageRole::User, "Hi").created_at_ms > 0);
    }
}
