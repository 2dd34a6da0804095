//! Request pipeline stages.
//!
//! Each stage is a tower `Layer` + `Service` pair over
//! `OutboundRequest → Result<InboundResponse, PipelineError>`, depending only
//! on the service directly below it.
//!
//! # Order (outermost first)
//! ```text
//! logging.rs          one record per attempt, wall-clock incl. retries
//! request_headers.rs  correlation id + client identification
//! auth.rs             bearer credential, auth-failure notification
//! retry.rs            re-invokes the stages below on transient failure
//! exception.rs        transport faults / statuses → PipelineError
//! ```

pub mod auth;
pub mod exception;
pub mod logging;
pub mod request_headers;
pub mod retry;

pub use auth::{Auth, AuthLayer};
pub use exception::{ExceptionHandling, ExceptionHandlingLayer};
pub use logging::{Logging, LoggingLayer};
pub use request_headers::{ClientIdentity, RequestHeaders, RequestHeadersLayer};
pub use retry::{Retry, RetryLayer};
