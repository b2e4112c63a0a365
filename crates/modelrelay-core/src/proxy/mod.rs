//! Provider proxy functions, as seen from the client
//!
//! Each proxy accepts `POST { messages, model, temperature?, max_tokens?, stream? }`.
//! Streaming responses are SSE; non-streaming responses carry the text under
//! `generatedText` or `text`; failures carry `{ error }` with a non-2xx status.

mod traits;
mod wire;
mod http;
mod mock;

pub use traits::{ByteStream, ProxyTransport};
pub use wire::{CompletionBody, ProxyEndpoint, ProxyErrorBody, ProxyRequestBody};
pub use http::HttpTransport;
pub use mock::{MockConfig, MockResponse, MockTransport, RecordedCall};
