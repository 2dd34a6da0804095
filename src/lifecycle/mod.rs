//! Call lifecycle: cancellation and deadlines.
//!
//! # Data Flow
//! ```text
//! Caller:
//!     CancelHandle::new() → (handle, signal)
//!     signal attached to OutboundRequest
//!
//! Every stage down to the transport:
//!     checks signal.is_cancelled() / races signal.cancelled()
//!
//! Deadline (cancel.rs) or Ctrl+C (signals.rs):
//!     handle.cancel() → in-flight attempt or backoff wait aborts
//! ```
//!
//! # Design Decisions
//! - One watch channel per call; nothing is shared across calls
//! - Timeouts are expressed as cancellation, not a separate mechanism
//! - A dropped handle never fires

pub mod cancel;
pub mod signals;

pub use cancel::{CancelHandle, CancellationSignal};
