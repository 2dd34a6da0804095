//! Retry stage.
//!
//! Re-issues the same request through the inner stages while the policy
//! classifies the failure as transient and attempts remain. Requests not
//! flagged retry-safe get exactly one attempt. Each attempt's outcome is
//! appended to the request's trace for the logging stage.

use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use futures_util::future::BoxFuture;
use tower::{Layer, Service, ServiceExt};

use crate::error::{PipelineError, PipelineResult};
use crate::http::request::OutboundRequest;
use crate::http::response::InboundResponse;
use crate::http::X_CORRELATION_ID;
use crate::observability::{metrics, Outcome};
use crate::resilience::RetryPolicy;

#[derive(Debug, Clone)]
pub struct RetryLayer {
    policy: Arc<RetryPolicy>,
    metrics_enabled: bool,
}

impl RetryLayer {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy: Arc::new(policy),
            metrics_enabled: true,
        }
    }

    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.metrics_enabled = enabled;
        self
    }
}

impl<S> Layer<S> for RetryLayer {
    type Service = Retry<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Retry {
            inner,
            policy: Arc::clone(&self.policy),
            metrics_enabled: self.metrics_enabled,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Retry<S> {
    inner: S,
    policy: Arc<RetryPolicy>,
    metrics_enabled: bool,
}

impl<S> Service<OutboundRequest> for Retry<S>
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

    fn call(&mut self, request: OutboundRequest) -> Self::Future {
        // Take the service that was driven to readiness, leave a clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let policy = Arc::clone(&self.policy);
        let metrics_enabled = self.metrics_enabled;

        Box::pin(async move {
            let max_attempts = if request.is_retry_safe() {
                policy.max_attempts()
            } else {
                1
            };
            let cancel = request.cancel().clone();
            let correlation_id = request
                .headers()
                .get(X_CORRELATION_ID)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown")
                .to_string();

            let mut attempt = 0u32;
            loop {
                attempt += 1;

                let started = Instant::now();
                let result = if attempt == 1 {
                    inner.call(request.clone()).await
                } else {
                    match inner.ready().await {
                        Ok(ready) => ready.call(request.clone()).await,
                        Err(e) => Err(e),
                    }
                };
                let outcome = Outcome::from_result(&result);
                request.trace().record(attempt, started.elapsed(), outcome);

                let err = match result {
                    Ok(response) => return Ok(response),
                    Err(err) => err,
                };

                if !policy.is_retryable(&err) {
                    return Err(err);
                }
                if attempt >= max_attempts {
                    if max_attempts > 1 {
                        tracing::warn!(
                            correlation_id = %correlation_id,
                            attempts = attempt,
                            error = %err,
                            "Retries exhausted"
                        );
                    }
                    return Err(err);
                }

                let delay = policy.backoff(attempt);
                tracing::info!(
                    correlation_id = %correlation_id,
                    attempt = attempt,
                    delay = ?delay,
                    outcome = %outcome,
                    "Retrying request"
                );
                if metrics_enabled {
                    metrics::record_retry(&outcome);
                }

                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        tracing::debug!(
                            correlation_id = %correlation_id,
                            attempt = attempt,
                            "Cancelled during backoff"
                        );
                        return Err(PipelineError::Cancelled);
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        })
    }
}
