//! Outbound request model.
//!
//! # Responsibilities
//! - Carry method, absolute URI, headers and an opaque body through the chain
//! - Carry the caller's cancellation signal and retry-safe flag
//! - Collect per-attempt outcomes for the logging stage
//!
//! # Design Decisions
//! - Stages may add headers; the body has no mutable accessor
//! - Cloning is cheap (`Bytes`, shared trace), so retries reuse the same request
//! - The logging stage starts a fresh trace per call, so clones of one
//!   template sent concurrently never see each other's attempts

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Method};
use serde::Serialize;
use url::Url;

use crate::lifecycle::CancellationSignal;
use crate::observability::logging::Outcome;

/// A request on its way to the transport.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    method: Method,
    uri: Url,
    headers: HeaderMap,
    body: Bytes,
    cancel: CancellationSignal,
    retry_safe: bool,
    trace: AttemptTrace,
}

impl OutboundRequest {
    /// Create a request. Retry safety defaults to the method's idempotency.
    pub fn new(method: Method, uri: Url) -> Self {
        let retry_safe = method.is_idempotent();
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            cancel: CancellationSignal::never(),
            retry_safe,
            trace: AttemptTrace::default(),
        }
    }

    pub fn get(uri: Url) -> Self {
        Self::new(Method::GET, uri)
    }

    pub fn post(uri: Url) -> Self {
        Self::new(Method::POST, uri)
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Serialize `value` as the JSON body and set the content type.
    pub fn with_json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, serde_json::Error> {
        self.body = Bytes::from(serde_json::to_vec(value)?);
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(self)
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationSignal) -> Self {
        self.cancel = cancel;
        self
    }

    /// Mark the request as safe (or unsafe) to re-issue after a transient
    /// failure, overriding the method default.
    pub fn with_retry_safe(mut self, retry_safe: bool) -> Self {
        self.retry_safe = retry_safe;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn cancel(&self) -> &CancellationSignal {
        &self.cancel
    }

    pub fn is_retry_safe(&self) -> bool {
        self.retry_safe
    }

    pub fn trace(&self) -> &AttemptTrace {
        &self.trace
    }

    /// Detach from any trace shared with earlier clones.
    pub(crate) fn begin_trace(&mut self) -> AttemptTrace {
        self.trace = AttemptTrace::default();
        self.trace.clone()
    }
}

/// Outcome of a single attempt, as seen by the retry stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    /// 1-based attempt index.
    pub attempt: u32,
    pub duration: Duration,
    pub outcome: Outcome,
}

/// Per-call list of attempts, shared by the clones the retry stage issues.
#[derive(Debug, Clone, Default)]
pub struct AttemptTrace {
    attempts: Arc<Mutex<Vec<AttemptRecord>>>,
}

impl AttemptTrace {
    pub fn record(&self, attempt: u32, duration: Duration, outcome: Outcome) {
        self.lock().push(AttemptRecord {
            attempt,
            duration,
            outcome,
        });
    }

    /// Number of attempts recorded so far.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drain the recorded attempts.
    pub fn take(&self) -> Vec<AttemptRecord> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<AttemptRecord>> {
        // A panic while holding the lock cannot leave the Vec inconsistent.
        self.attempts.lock().unwrap_or_else(|e| e.into_inner())
    }
}
