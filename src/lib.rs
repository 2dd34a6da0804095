//! Client-side request pipeline library.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use crate::api::{ApiClient, ApiError};
pub use crate::auth::{Credential, CredentialProvider, SessionStore};
pub use crate::config::PipelineConfig;
pub use crate::error::{PipelineError, PipelineResult};
pub use crate::http::{InboundResponse, OutboundRequest, Pipeline, PipelineBuilder};
pub use crate::lifecycle::{CancelHandle, CancellationSignal};
pub use crate::resilience::RetryPolicy;
