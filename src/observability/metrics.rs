//! Metrics collection.
//!
//! # Metrics
//! - `client_requests_total` (counter): logical calls by method, outcome
//! - `client_request_duration_seconds` (histogram): wall-clock latency incl. retries
//! - `client_retries_total` (counter): re-issued attempts
//! - `client_auth_failures_total` (counter): 401s reported to the credential provider
//!
//! # Design Decisions
//! - Facade only; the hosting application installs an exporter if it wants one
//! - Updates are no-ops when no recorder is installed

use std::time::Duration;

use crate::observability::logging::Outcome;

/// Record a finished logical call.
pub fn record_request(method: &str, outcome: &Outcome, elapsed: Duration) {
    metrics::counter!(
        "client_requests_total",
        "method" => method.to_string(),
        "outcome" => outcome.label()
    )
    .increment(1);
    metrics::histogram!(
        "client_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(elapsed.as_secs_f64());
}

/// Record a retry of a failed attempt.
pub fn record_retry(reason: &Outcome) {
    metrics::counter!("client_retries_total", "reason" => reason.label()).increment(1);
}

/// Record an authentication failure.
pub fn record_auth_failure() {
    metrics::counter!("client_auth_failures_total").increment(1);
}
