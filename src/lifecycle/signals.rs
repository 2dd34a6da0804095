//! OS signal handling.

use crate::lifecycle::cancel::CancelHandle;

/// Cancel the in-flight call when Ctrl+C arrives.
pub async fn cancel_on_ctrl_c(handle: CancelHandle) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Interrupt received, cancelling request");
            handle.cancel();
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
        }
    }
}
