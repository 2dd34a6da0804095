//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! RetryStage, after an attempt fails:
//!     → retries.rs (is the failure transient? attempts left?)
//!     → backoff.rs (how long to wait)
//!     → sleep, racing the cancellation signal
//! ```
//!
//! # Design Decisions
//! - Retries only for requests flagged retry-safe (idempotent by default)
//! - Jittered backoff prevents thundering herd
//! - Timeouts come from the caller's cancellation signal and the transport

pub mod backoff;
pub mod retries;

pub use retries::RetryPolicy;
