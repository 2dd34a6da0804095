//! Network transport at the bottom of the chain.
//!
//! # Responsibilities
//! - Perform the raw request/response exchange
//! - Report connect, timeout and decode faults as `TransportError`
//! - Abort the exchange when the request's cancellation signal fires
//!
//! # Design Decisions
//! - Pooling, TLS and HTTP/2 belong to `reqwest`, not the pipeline
//! - Non-success statuses are NOT errors here; classification happens above

use std::time::Duration;

use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::config::TransportConfig;
use crate::http::request::OutboundRequest;
use crate::http::response::InboundResponse;

/// Faults raised by a transport before a complete response exists.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection refused, DNS failure, reset.
    #[error("Connect error: {0}")]
    Connect(String),

    /// No response within the transport's own timeout.
    #[error("Transport timeout")]
    Timeout,

    /// The response could not be read or was not valid HTTP.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The cancellation signal fired mid-exchange.
    #[error("Exchange cancelled")]
    Cancelled,

    #[error("Transport error: {0}")]
    Other(String),
}

impl TransportError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if err.is_decode() || err.is_body() {
            TransportError::Malformed(err.to_string())
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

/// The leaf of the pipeline.
pub trait Transport: Send + Sync + 'static {
    fn send(&self, request: OutboundRequest) -> BoxFuture<'static, Result<InboundResponse, TransportError>>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport with the configured connect and request timeouts.
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| TransportError::Other(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: OutboundRequest) -> BoxFuture<'static, Result<InboundResponse, TransportError>> {
        let client = self.client.clone();
        Box::pin(async move {
            let cancel = request.cancel().clone();
            let builder = client
                .request(request.method().clone(), request.uri().clone())
                .headers(request.headers().clone())
                .body(request.body().clone());

            let exchange = async move {
                let response = builder.send().await.map_err(TransportError::from_reqwest)?;
                let status = response.status();
                let headers = response.headers().clone();
                let body = response.bytes().await.map_err(TransportError::from_reqwest)?;
                Ok(InboundResponse::from_parts(status, headers, body))
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(TransportError::Cancelled),
                result = exchange => result,
            }
        })
    }
}
