//! Core types for one chat-completion call
//!
//! Nothing here outlives a single request.

mod message;
mod request;
mod stream;
mod cancellation;

pub use message::{ChatMessage, MessageRole};
pub use request::{GenerationOptions, StreamRequest};
pub use stream::{Attempt, StreamChunk, StreamResult};
pub use cancellation::CancellationToken;
