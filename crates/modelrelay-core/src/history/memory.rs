//! In-memory conversation store

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use super::traits::{ConversationStore, HistoryError, HistoryResult, StoredMessage};

/// In-memory conversation store for testing and embedding
///
/// Conversations are lost when the store is dropped.
///
/// # Example
///
/// ```
/// use modelrelay_core::history::{ConversationStore, MemoryConversationStore, StoredMessage};
/// use modelrelay_core::types::MessageRole;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryConversationStore::new();
/// store.append(StoredMessage::now("c1", MessageRole::User, "Hi")).await?;
/// assert_eq!(store.load("c1").await?.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemoryConversationStore {
    conversations: RwLock<HashMap<String, Vec<StoredMessage>>>,
}

impl MemoryConversationStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of conversations with at least one message
    pub fn len(&self) -> usize {
        self.conversations.read().len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every conversation
    pub fn clear(&self) {
        self.conversations.write().clear();
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load(&self, conversation_id: &str) -> HistoryResult<Vec<StoredMessage>> {
        let mut messages = self
            .conversations
            .read()
            .get(conversation_id)
            .cloned()
            .unwrap_or_default();
        // sort_by_key is stable, so equal timestamps keep insertion order
        messages.sort_by_key(|m| m.created_at_ms);
        Ok(messages)
    }

    async fn append(&self, message: StoredMessage) -> HistoryResult<()> {
        if message.conversation_id.trim().is_empty() {
            return Err(HistoryError::MissingConversationId);
        }
        self.conversations
            .write()
            .entry(message.conversation_id.clone())
            .or_default()
            .push(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::to_chat_messages;
    use crate::types::{ChatMessage, MessageRole};

    #[tokio::test]
    async fn test_load_orders_by_timestamp() {
        let store = MemoryConversationStore::new();
        store
            .append(StoredMessage::new("c1", MessageRole::Assistant, "second", 20))
            .await
            .unwrap();
        store
            .append(StoredMessage::new("c1", MessageRole::User, "first", 10))
            .await
            .unwrap();
        store
            .append(StoredMessage::new("c1", MessageRole::User, "third", 20))
            .await
            .unwrap();
        store
            .append(StoredMessage::new("c2", MessageRole::User, "elsewhere", 5))
            .await
            .unwrap();

        let loaded = store.load("c1").await.unwrap();
        let contents: Vec<_> = loaded.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
        assert_eq!(store.len(), 2);

        assert_eq!(
            to_chat_messages(&loaded)[0],
            ChatMessage::user("first")
        );
    }

    #[tokio::test]
    async fn test_unknown_conversation_is_empty() {
        let store = MemoryConversationStore::new();
        assert!(store.load("missing").await.unwrap().is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_append_requires_conversation_id() {
        let store = MemoryConversationStore::new();
        let result = store
            .append(StoredMessage::new(" ", MessageRole::User, "Hi", 1))
            .await;
        assert!(matches!(result, Err(HistoryError::MissingConversationId)));

        store.append(StoredMessage::new("c1", MessageRole::User, "Hi", 1)).await.unwrap();
        store.clear();
        assert!(store.is_empty());
    }
}
