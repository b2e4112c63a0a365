//! Conversation history consumed by the streaming core
//!
//! The core takes an ordered list of messages and never persists anything.
//! `ConversationStore` is the seam to whatever the application stores
//! conversations in; `MemoryConversationStore` backs tests and embedding.

mod traits;
mod memory;

pub use traits::{to_chat_messages, ConversationStore, HistoryError, HistoryResult, StoredMessage};
pub use memory::MemoryConversationStore;
