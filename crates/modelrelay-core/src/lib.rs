//! ModelRelay Core
//!
//! Streaming chat completions across several AI providers, each reached
//! through a thin server-side proxy function. The core sends a chat history
//! to the proxy for the chosen model, decodes the Server-Sent-Events reply
//! into incremental chunks, and when the primary model fails, retries once
//! against that model's configured fallback.
//!
//! ## Streaming
//!
//! ```rust,ignore
//! use modelrelay_core::streaming::{FnObserver, StreamingService};
//! use modelrelay_core::types::{ChatMessage, StreamRequest};
//!
//! let service = StreamingService::from_config(config, logger)?;
//! let observer = FnObserver::new(
//!     |chunk| ui.append(&chunk.text),
//!     |result| ui.finish(&result.text, &result.model),
//!     |error| ui.show_error(&error.to_string()),
//! );
//!
//! let request = StreamRequest::new("gpt-4o", vec![ChatMessage::user("Hello")]);
//! service.stream_with_fallback(request, &observer).await?;
//! ```
//!
//! Starting a new generation supersedes the one in flight; the superseded
//! generation delivers no further callbacks.

pub mod types;
pub mod catalog;
pub mod sse;
pub mod proxy;
pub mod streaming;
pub mod history;
pub mod logging;
pub mod config;

// Re-export commonly used types
pub use types::{
    Attempt, CancellationToken, ChatMessage, GenerationOptions, MessageRole, StreamChunk,
    StreamRequest, StreamResult,
};

pub use catalog::{ModelCatalog, ModelInfo, ProviderKind};

pub use streaming::{
    FnObserver, StreamError, StreamHandle, StreamObserver, StreamOutcome, StreamState,
    StreamingService,
};

pub use proxy::{HttpTransport, MockTransport, ProxyTransport};

pub use history::{ConversationStore, MemoryConversationStore, StoredMessage};

pub use logging::{ConsoleLogger, Logger, NoOpLogger};

pub use config::{ConfigResolver, ServiceConfig};
