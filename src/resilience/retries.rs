//! Retry policy.
//!
//! # Responsibilities
//! - Decide how many attempts a logical call gets
//! - Compute the delay between attempts
//! - Classify failures as transient or terminal
//!
//! # Design Decisions
//! - Network failures and timeouts are always transient under the default
//!   classifier; server statuses only when listed in `retry_on_status`
//! - Client errors, auth failures and cancellation are terminal
//! - Everything is injectable so hosts can supply their own curve/predicate

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::error::PipelineError;
use crate::resilience::backoff::calculate_backoff;

type BackoffFn = dyn Fn(u32) -> Duration + Send + Sync;
type ClassifierFn = dyn Fn(&PipelineError) -> bool + Send + Sync;

/// Attempt budget, backoff curve and retryable predicate for one pipeline.
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Arc<BackoffFn>,
    is_retryable: Arc<ClassifierFn>,
}

impl RetryPolicy {
    /// Policy with a custom backoff and predicate. `max_attempts` counts the
    /// first attempt, so 1 disables retries.
    pub fn new<B, C>(max_attempts: u32, backoff: B, is_retryable: C) -> Self
    where
        B: Fn(u32) -> Duration + Send + Sync + 'static,
        C: Fn(&PipelineError) -> bool + Send + Sync + 'static,
    {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Arc::new(backoff),
            is_retryable: Arc::new(is_retryable),
        }
    }

    /// Exponential-jitter policy from configuration.
    pub fn from_config(config: &RetryConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }
        let base_ms = config.base_delay_ms;
        let max_ms = config.max_delay_ms;
        let statuses: BTreeSet<u16> = config.retry_on_status.iter().copied().collect();
        Self::new(
            config.max_attempts,
            move |attempt| calculate_backoff(attempt, base_ms, max_ms),
            move |err| is_transient(err, &statuses),
        )
    }

    /// Single attempt, never retried.
    pub fn disabled() -> Self {
        Self::new(1, |_| Duration::ZERO, |_| false)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay after `attempt` (1-based) failed.
    pub fn backoff(&self, attempt: u32) -> Duration {
        (self.backoff)(attempt)
    }

    /// Whether the policy would re-issue after this failure.
    ///
    /// Cancellation and authentication failures are never retryable,
    /// whatever the predicate says.
    pub fn is_retryable(&self, err: &PipelineError) -> bool {
        match err {
            PipelineError::Cancelled | PipelineError::AuthenticationRequired => false,
            _ => (self.is_retryable)(err),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

/// Default classifier.
pub fn is_transient(err: &PipelineError, retry_on_status: &BTreeSet<u16>) -> bool {
    match err {
        PipelineError::NetworkUnreachable(_) | PipelineError::Timeout => true,
        PipelineError::ServerError { status, .. } => retry_on_status.contains(&status.as_u16()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    fn server_error(code: u16) -> PipelineError {
        PipelineError::ServerError {
            status: StatusCode::from_u16(code).unwrap(),
            body: None,
        }
    }

    #[test]
    fn default_classification() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert!(policy.is_retryable(&PipelineError::Timeout));
        assert!(policy.is_retryable(&PipelineError::NetworkUnreachable("refused".into())));
        assert!(policy.is_retryable(&server_error(503)));
        assert!(!policy.is_retryable(&server_error(501)));
        assert!(!policy.is_retryable(&server_error(400)));
        assert!(!policy.is_retryable(&PipelineError::ValidationError { fields: vec![] }));
        assert!(!policy.is_retryable(&PipelineError::Deserialization("eof".into())));
    }

    #[test]
    fn terminal_errors_ignore_predicate() {
        let policy = RetryPolicy::new(5, |_| Duration::ZERO, |_| true);
        assert!(!policy.is_retryable(&PipelineError::Cancelled));
        assert!(!policy.is_retryable(&PipelineError::AuthenticationRequired));
        assert!(policy.is_retryable(&server_error(400)));
    }

    #[test]
    fn disabled_config() {
        let config = RetryConfig {
            enabled: false,
            ..Default::default()
        };
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.max_attempts(), 1);
        assert!(!policy.is_retryable(&PipelineError::Timeout));
    }

    #[test]
    fn zero_attempts_clamped() {
        let policy = RetryPolicy::new(0, |_| Duration::ZERO, |_| true);
        assert_eq!(policy.max_attempts(), 1);
    }
}
