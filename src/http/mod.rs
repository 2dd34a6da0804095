//! Outbound HTTP request pipeline.
//!
//! # Data Flow
//! ```text
//! Caller builds OutboundRequest (request.rs)
//!     → pipeline.rs (Pipeline::send, panic boundary)
//!     → middleware/logging.rs
//!     → middleware/request_headers.rs
//!     → middleware/auth.rs
//!     → middleware/retry.rs        ┐ once per attempt
//!     → middleware/exception.rs    │
//!     → transport.rs (reqwest)     ┘
//!     ← InboundResponse (response.rs) or PipelineError, back up the same chain
//! ```

use http::header::HeaderName;

pub mod middleware;
pub mod pipeline;
pub mod request;
pub mod response;
pub mod transport;

pub use pipeline::{Pipeline, PipelineBuilder};
pub use request::{AttemptRecord, AttemptTrace, OutboundRequest};
pub use response::{FieldError, InboundResponse, ServerErrorBody};
pub use transport::{ReqwestTransport, Transport, TransportError};

/// Per-call correlation identifier.
pub const X_CORRELATION_ID: HeaderName = HeaderName::from_static("x-correlation-id");
/// Client application name.
pub const X_APP_NAME: HeaderName = HeaderName::from_static("x-app-name");
/// Client application version.
pub const X_APP_VERSION: HeaderName = HeaderName::from_static("x-app-version");
/// Host platform of the client.
pub const X_APP_PLATFORM: HeaderName = HeaderName::from_static("x-app-platform");
