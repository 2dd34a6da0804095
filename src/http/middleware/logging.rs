//! Logging stage, the outermost layer.
//!
//! Emits one [`RequestRecord`] per attempt once the logical call has
//! finished. Attempt details come from the request's trace, filled by the
//! retry stage; without a retry stage the whole call is a single attempt.
//! `elapsed_ms` is measured here, so it covers retries and backoff.

use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use futures_util::future::BoxFuture;
use tower::{Layer, Service};

use crate::error::{PipelineError, PipelineResult};
use crate::http::request::{AttemptRecord, OutboundRequest};
use crate::http::response::InboundResponse;
use crate::observability::{metrics, LogSink, Outcome, RequestRecord};

#[derive(Clone)]
pub struct LoggingLayer {
    sink: Arc<dyn LogSink>,
    metrics_enabled: bool,
}

impl LoggingLayer {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            metrics_enabled: true,
        }
    }

    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.metrics_enabled = enabled;
        self
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = Logging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Logging {
            inner,
            sink: Arc::clone(&self.sink),
            metrics_enabled: self.metrics_enabled,
        }
    }
}

#[derive(Clone)]
pub struct Logging<S> {
    inner: S,
    sink: Arc<dyn LogSink>,
    metrics_enabled: bool,
}

impl<S> Service<OutboundRequest> for Logging<S>
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
        let sink = Arc::clone(&self.sink);
        let metrics_enabled = self.metrics_enabled;

        let method = request.method().to_string();
        let uri = request.uri().to_string();
        let trace = request.begin_trace();
        let started = Instant::now();

        tracing::debug!(method = %method, uri = %uri, "Sending request");

        Box::pin(async move {
            let result = inner.call(request).await;
            let elapsed = started.elapsed();
            let outcome = Outcome::from_result(&result);

            let mut attempts = trace.take();
            if attempts.is_empty() {
                attempts.push(AttemptRecord {
                    attempt: 1,
                    duration: elapsed,
                    outcome,
                });
            }
            for attempt in &attempts {
                sink.record(&RequestRecord {
                    method: method.clone(),
                    uri: uri.clone(),
                    attempt: attempt.attempt,
                    duration_ms: as_millis(attempt.duration),
                    elapsed_ms: as_millis(elapsed),
                    outcome: attempt.outcome,
                });
            }

            if metrics_enabled {
                metrics::record_request(&method, &outcome, elapsed);
            }
            result
        })
    }
}

fn as_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
