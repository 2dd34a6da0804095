//! Credential provider interface.

use std::fmt;
use std::time::{Duration, SystemTime};

use futures_util::future::BoxFuture;
use http::header::{HeaderValue, InvalidHeaderValue};

/// An access token plus optional expiry.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    access_token: String,
    expires_at: Option<SystemTime>,
}

impl Credential {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: None,
        }
    }

    pub fn with_expiry(mut self, expires_at: SystemTime) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn expires_in(self, ttl: Duration) -> Self {
        self.with_expiry(SystemTime::now() + ttl)
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn expires_at(&self) -> Option<SystemTime> {
        self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(at) => at <= SystemTime::now(),
            None => false,
        }
    }

    /// `Bearer <token>` header value, marked sensitive.
    pub fn bearer_header(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", self.access_token))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Source of the current credential and sink for auth failures.
///
/// The pipeline never caches what this returns; each attempt asks again.
pub trait CredentialProvider: Send + Sync {
    /// Current credential, if the user is signed in.
    fn access_token(&self) -> BoxFuture<'_, Option<Credential>>;

    /// The server rejected the credential; start the sign-out/refresh flow.
    fn notify_auth_failure(&self);
}

/// Provider for anonymous clients.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl CredentialProvider for Anonymous {
    fn access_token(&self) -> BoxFuture<'_, Option<Credential>> {
        Box::pin(async { None })
    }

    fn notify_auth_failure(&self) {
        tracing::debug!("Authentication failure on an anonymous client");
    }
}
