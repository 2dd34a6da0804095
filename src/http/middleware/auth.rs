//! Auth stage.
//!
//! # Responsibilities
//! - Attach the provider's current credential as a bearer header
//! - Report `AuthenticationRequired` to the provider exactly once per call
//!
//! # Design Decisions
//! - The failed call is surfaced, never replayed with fresh credentials
//! - An `Authorization` header set by the caller is left alone
//! - Expired credentials are not sent

use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::future::BoxFuture;
use http::header::AUTHORIZATION;
use tower::{Layer, Service};

use crate::auth::CredentialProvider;
use crate::error::{PipelineError, PipelineResult};
use crate::http::request::OutboundRequest;
use crate::http::response::InboundResponse;
use crate::observability::metrics;

#[derive(Clone)]
pub struct AuthLayer {
    provider: Arc<dyn CredentialProvider>,
    metrics_enabled: bool,
}

impl AuthLayer {
    pub fn new(provider: Arc<dyn CredentialProvider>) -> Self {
        Self {
            provider,
            metrics_enabled: true,
        }
    }

    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.metrics_enabled = enabled;
        self
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = Auth<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Auth {
            inner,
            provider: Arc::clone(&self.provider),
            metrics_enabled: self.metrics_enabled,
        }
    }
}

#[derive(Clone)]
pub struct Auth<S> {
    inner: S,
    provider: Arc<dyn CredentialProvider>,
    metrics_enabled: bool,
}

impl<S> Service<OutboundRequest> for Auth<S>
where
    S: Service<OutboundRequest, Response = InboundResponse, Error = PipelineError>
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
{
    type Response = InboundResponse;
    type Error = PipelineError;
    type Future = BoxFuture<'static, PipelineResult<InboundResponse>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: OutboundRequest) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let provider = Arc::clone(&self.provider);
        let metrics_enabled = self.metrics_enabled;

        Box::pin(async move {
            if !request.headers().contains_key(AUTHORIZATION) {
                match provider.access_token().await {
                    Some(credential) if credential.is_expired() => {
                        tracing::debug!(uri = %request.uri(), "Credential expired, sending without it");
                    }
                    Some(credential) => match credential.bearer_header() {
                        Ok(value) => {
                            request.headers_mut().insert(AUTHORIZATION, value);
                        }
                        Err(_) => {
                            tracing::warn!("Access token is not a valid header value, sending without it");
                        }
                    },
                    None => {}
                }
            }

            let uri = request.uri().clone();
            let result = inner.call(request).await;

            if let Err(PipelineError::AuthenticationRequired) = &result {
                tracing::warn!(uri = %uri, "Server rejected credentials, notifying provider");
                if metrics_enabled {
                    metrics::record_auth_failure();
                }
                provider.notify_auth_failure();
            }
            result
        })
    }
}
