//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Application:
//!     sign in → SessionStore::sign_in(credential)
//!
//! AuthStage (per attempt):
//!     → CredentialProvider::access_token() → Authorization: Bearer <token>
//!     ← AuthenticationRequired → CredentialProvider::notify_auth_failure()
//!
//! SessionStore:
//!     notify_auth_failure → clear credential → AuthState::SignedOut → subscribers
//! ```

pub mod provider;
pub mod session;

pub use provider::{Anonymous, Credential, CredentialProvider};
pub use session::{AuthState, SessionStore, SignOutReason};
