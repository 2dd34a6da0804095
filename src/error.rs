//! Error kinds surfaced by the request pipeline.
//!
//! The exception handling stage is the only place raw transport faults and
//! non-success statuses are turned into these values. Outer stages inspect
//! them and react, but never re-wrap them.

use http::StatusCode;
use thiserror::Error;

use crate::http::response::{FieldError, ServerErrorBody};

/// Errors a pipeline call can end with.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    /// Connection could not be established (refused, DNS, reset).
    #[error("Network unreachable: {0}")]
    NetworkUnreachable(String),

    /// The transport gave up waiting for the server.
    #[error("Request timed out")]
    Timeout,

    /// The caller's cancellation signal fired.
    #[error("Request cancelled")]
    Cancelled,

    /// The server rejected the credentials (401).
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Non-success status, with the server's error payload when it sent one.
    #[error("Server returned {status}")]
    ServerError {
        status: StatusCode,
        body: Option<ServerErrorBody>,
    },

    /// The server rejected the request payload field by field.
    #[error("Validation failed for {} field(s)", fields.len())]
    ValidationError { fields: Vec<FieldError> },

    /// The response could not be read or decoded.
    #[error("Failed to deserialize response: {0}")]
    Deserialization(String),

    /// Anything the pipeline could not classify, including panics.
    #[error("Unknown transport failure: {0}")]
    UnknownTransportFailure(String),
}

impl PipelineError {
    /// Short, stable label used in log records and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::NetworkUnreachable(_) => "network_unreachable",
            PipelineError::Timeout => "timeout",
            PipelineError::Cancelled => "cancelled",
            PipelineError::AuthenticationRequired => "authentication_required",
            PipelineError::ServerError { .. } => "server_error",
            PipelineError::ValidationError { .. } => "validation_error",
            PipelineError::Deserialization(_) => "deserialization",
            PipelineError::UnknownTransportFailure(_) => "unknown_transport_failure",
        }
    }

    /// HTTP status behind the error, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            PipelineError::AuthenticationRequired => Some(StatusCode::UNAUTHORIZED),
            PipelineError::ServerError { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Cancelled)
    }
}

/// Result type for pipeline calls.
pub type PipelineResult<T> = Result<T, PipelineError>;
