//! Streaming generation service
//!
//! `StreamingService` sends a chat history to a provider proxy, decodes the
//! SSE reply into chunks, and falls back to the model's configured
//! alternative exactly once when the primary attempt fails.

mod error;
mod observer;
mod service;

pub use error::{StreamError, StreamOutcome};
pub use observer::{FnObserver, ObservedEvent, RecordingObserver, StreamObserver};
pub use service::{StreamHandle, StreamState, StreamingService};
