//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! LoggingStage (outermost):
//!     → logging.rs (one RequestRecord per attempt → LogSink)
//!     → metrics.rs (counters, latency histogram)
//!
//! RetryStage / AuthStage:
//!     → metrics.rs (retries, auth failures)
//!
//! Consumers:
//!     → tracing subscriber (stdout)
//!     → any metrics recorder the host installs
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{LogSink, Outcome, RequestRecord, TracingSink};
