//! In-memory session store.
//!
//! # Responsibilities
//! - Hold the signed-in user's credential
//! - Serve it to the auth stage as a `CredentialProvider`
//! - Publish auth-state changes to subscribers
//!
//! # Design Decisions
//! - Lock-free reads via `ArcSwapOption`; writes are rare (sign in/out)
//! - Each subscriber owns a watch receiver; dropping it unsubscribes
//! - An auth failure clears the credential before notifying

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use futures_util::future::BoxFuture;
use tokio::sync::watch;

use crate::auth::provider::{Credential, CredentialProvider};

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutReason {
    /// The user signed out.
    UserRequested,
    /// The server rejected the credential.
    SessionExpired,
}

/// Authentication state observed by subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    SignedIn,
    SignedOut(SignOutReason),
}

/// Credential holder shared between the pipeline and the application.
#[derive(Debug)]
pub struct SessionStore {
    credential: ArcSwapOption<Credential>,
    state: watch::Sender<AuthState>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(AuthState::Anonymous);
        Self {
            credential: ArcSwapOption::empty(),
            state,
        }
    }

    /// Start a session with a freshly issued credential.
    pub fn sign_in(&self, credential: Credential) {
        self.credential.store(Some(Arc::new(credential)));
        self.state.send_replace(AuthState::SignedIn);
        tracing::info!("Session started");
    }

    pub fn sign_out(&self) {
        self.end_session(SignOutReason::UserRequested);
    }

    pub fn current(&self) -> Option<Arc<Credential>> {
        self.credential.load_full()
    }

    pub fn state(&self) -> AuthState {
        *self.state.borrow()
    }

    /// Receive every state change from now on.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.state.receiver_count()
    }

    fn end_session(&self, reason: SignOutReason) {
        let had_session = self.credential.swap(None).is_some();
        self.state.send_replace(AuthState::SignedOut(reason));
        tracing::info!(reason = ?reason, had_session, "Session ended");
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialProvider for SessionStore {
    fn access_token(&self) -> BoxFuture<'_, Option<Credential>> {
        Box::pin(async move { self.current().map(|c| (*c).clone()) })
    }

    fn notify_auth_failure(&self) {
        self.end_session(SignOutReason::SessionExpired);
    }
}
