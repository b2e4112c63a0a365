//! HttpTransport - reqwest client for the proxy functions

use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;

use crate::logging::Logger;
use crate::streaming::{StreamError, StreamOutcome};
use crate::types::CancellationToken;

use super::traits::{ByteStream, ProxyTransport};
use super::wire::{CompletionBody, ProxyEndpoint, ProxyErrorBody, ProxyRequestBody};

/// Transport that POSTs to proxy functions over HTTP
pub struct HttpTransport {
    client: reqwest::Client,
    auth_token: Option<String>,
    logger: Arc<dyn Logger>,
}

impl HttpTransport {
    /// Create a transport with a default client
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            client: reqwest::Client::new(),
            auth_token: None,
            logger,
        }
    }

    /// Create a transport with a connect timeout
    pub fn with_connect_timeout(timeout: Duration, logger: Arc<dyn Logger>) -> StreamOutcome<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| StreamError::network("http client", e.to_string()))?;
        Ok(Self {
            client,
            auth_token: None,
            logger,
        })
    }

    /// Send `Authorization: Bearer <token>` with every request
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    async fn send(
        &self,
        endpoint: &ProxyEndpoint,
        body: &ProxyRequestBody,
        cancel: &CancellationToken,
    ) -> StreamOutcome<reqwest::Response> {
        let url = endpoint.url();
        self.logger.debug(&format!(
            "[HttpTransport] POST {} model={} stream={:?}",
            url, body.model, body.stream
        ));

        let accept = if body.stream == Some(true) {
            "text/event-stream"
        } else {
            "application/json"
        };
        let mut request = self
            .client
            .post(&url)
            .header(reqwest::header::ACCEPT, accept)
            .json(body);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(StreamError::Cancelled),
            result = request.send() => result.map_err(|e| {
                self.logger.error(&format!("[HttpTransport] {} failed: {}", url, e));
                StreamError::network(endpoint.path.clone(), e.to_string())
            })?,
        };

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = ProxyErrorBody::message_from(&raw);
            self.logger.warn(&format!(
                "[HttpTransport] {} returned {}: {}",
                url, status, message
            ));
            return Err(StreamError::status(endpoint.path.clone(), status.as_u16(), message));
        }

        Ok(response)
    }
}

#[async_trait]
impl ProxyTransport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    async fn open_stream(
        &self,
        endpoint: &ProxyEndpoint,
        body: &ProxyRequestBody,
        cancel: CancellationToken,
    ) -> StreamOutcome<ByteStream> {
        let response = self.send(endpoint, body, &cancel).await?;
        let path = endpoint.path.clone();

        let stream = response.bytes_stream().map(move |chunk| {
            chunk.map_err(|e| StreamError::network(path.clone(), e.to_string()))
        });

        Ok(Box::pin(stream))
    }

    async fn complete(
        &self,
        endpoint: &ProxyEndpoint,
        body: &ProxyRequestBody,
        cancel: CancellationToken,
    ) -> StreamOutcome<String> {
        let response = self.send(endpoint, body, &cancel).await?;

        let raw = tokio::select! {
            _ = cancel.cancelled() => return Err(StreamError::Cancelled),
            result = response.text() => result
                .map_err(|e| StreamError::network(endpoint.path.clone(), e.to_string()))?,
        };

        let parsed: CompletionBody = serde_json::from_str(&raw).map_err(|e| {
            StreamError::upstream(body.model.clone(), format!("invalid completion body: {}", e))
        })?;
        parsed
            .into_text()
            .ok_or_else(|| StreamError::upstream(body.model.clone(), "completion body has no text"))
    }
}
