//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber for the binary
//! - Define the per-attempt request record and the sink that receives it
//! - Provide the default sink, which emits records as tracing events
//!
//! # Design Decisions
//! - `RUST_LOG` overrides the configured level
//! - Sinks are append-only and shared across concurrent calls

use http::StatusCode;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ObservabilityConfig;
use crate::error::PipelineError;
use crate::http::response::InboundResponse;

/// What an attempt ended with: a status code or an error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Status(u16),
    Error(&'static str),
}

impl Outcome {
    pub fn from_result(result: &Result<InboundResponse, PipelineError>) -> Self {
        match result {
            Ok(response) => Outcome::Status(response.status().as_u16()),
            // Keep the server's status visible for HTTP-level failures.
            Err(err) => match err.status() {
                Some(status) => Outcome::Status(status.as_u16()),
                None => Outcome::Error(err.kind()),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        match self {
            Outcome::Status(code) => StatusCode::from_u16(*code)
                .map(|s| s.is_success())
                .unwrap_or(false),
            Outcome::Error(_) => false,
        }
    }

    /// Label for metrics.
    pub fn label(&self) -> String {
        match self {
            Outcome::Status(code) => code.to_string(),
            Outcome::Error(kind) => (*kind).to_string(),
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Status(code) => write!(f, "status {}", code),
            Outcome::Error(kind) => write!(f, "error {}", kind),
        }
    }
}

/// One log entry, emitted per attempt of a logical call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestRecord {
    pub method: String,
    pub uri: String,
    /// 1-based attempt index.
    pub attempt: u32,
    /// Time spent in this attempt.
    pub duration_ms: u64,
    /// Wall-clock time since the call entered the pipeline, retries and
    /// backoff included.
    pub elapsed_ms: u64,
    pub outcome: Outcome,
}

/// Receiver of request records.
pub trait LogSink: Send + Sync {
    fn record(&self, record: &RequestRecord);
}

/// Default sink: one tracing event per record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn record(&self, record: &RequestRecord) {
        match record.outcome {
            Outcome::Error("unknown_transport_failure") => tracing::error!(
                method = %record.method,
                uri = %record.uri,
                attempt = record.attempt,
                duration_ms = record.duration_ms,
                elapsed_ms = record.elapsed_ms,
                outcome = %record.outcome,
                "Request failed"
            ),
            outcome if outcome.is_success() => tracing::info!(
                method = %record.method,
                uri = %record.uri,
                attempt = record.attempt,
                duration_ms = record.duration_ms,
                elapsed_ms = record.elapsed_ms,
                outcome = %record.outcome,
                "Request completed"
            ),
            _ => tracing::warn!(
                method = %record.method,
                uri = %record.uri,
                attempt = record.attempt,
                duration_ms = record.duration_ms,
                elapsed_ms = record.elapsed_ms,
                outcome = %record.outcome,
                "Request failed"
            ),
        }
    }
}

/// Install the global subscriber.
pub fn init_tracing(config: &ObservabilityConfig) {
    let default_filter = format!("client_pipeline={}", config.log_level);
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
