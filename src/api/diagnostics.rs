//! Diagnostics controller.

use crate::api::{ApiClient, ApiError};
use crate::http::OutboundRequest;
use crate::lifecycle::CancellationSignal;

/// Path of the server's diagnostics action.
pub const PERFORM_DIAGNOSTICS: &str = "api/Diagnostics/PerformDiagnostics";

impl ApiClient {
    /// Ask the server to echo what it sees of this client: `X-` headers,
    /// client IP, trace id, authentication state and culture.
    ///
    /// The action is read-only, so the `POST` is marked retry-safe.
    pub async fn perform_diagnostics(&self, cancel: CancellationSignal) -> Result<String, ApiError> {
        let request = OutboundRequest::post(self.url(PERFORM_DIAGNOSTICS)?)
            .with_retry_safe(true)
            .with_cancellation(cancel);
        let response = self.send(request).await?;
        Ok(response.text()?)
    }
}
