//! Transport trait definition

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

use crate::streaming::StreamOutcome;
use crate::types::CancellationToken;

use super::wire::{ProxyEndpoint, ProxyRequestBody};

/// Raw body of a streaming proxy response, one item per network read
pub type ByteStream = Pin<Box<dyn Stream<Item = StreamOutcome<Bytes>> + Send>>;

/// How requests reach a proxy function
///
/// `HttpTransport` talks to real proxies; `MockTransport` replays scripts.
#[async_trait]
pub trait ProxyTransport: Send + Sync {
    /// Transport name for logs
    fn name(&self) -> &str;

    /// POST `body` and return the response body as a byte stream
    ///
    /// Non-2xx responses and network failures are returned as
    /// `StreamError::Transport` before any bytes are yielded.
    async fn open_stream(
        &self,
        endpoint: &ProxyEndpoint,
        body: &ProxyRequestBody,
        cancel: CancellationToken,
    ) -> StreamOutcome<ByteStream>;

    /// POST `body` and return the generated text of a non-streaming response
    async fn complete(
        &self,
        endpoint: &ProxyEndpoint,
        body: &ProxyRequestBody,
        cancel: CancellationToken,
    ) -> StreamOutcome<String>;
}
