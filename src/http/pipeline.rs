//! Chain composition and the caller-facing entry point.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tower::{Service, ServiceBuilder, ServiceExt};

use crate::auth::CredentialProvider;
use crate::config::{ConfigError, PipelineConfig, ValidationError};
use crate::error::{PipelineError, PipelineResult};
use crate::http::middleware::{
    AuthLayer, ClientIdentity, ExceptionHandlingLayer, LoggingLayer, RequestHeadersLayer,
    RetryLayer,
};
use crate::http::request::OutboundRequest;
use crate::http::response::InboundResponse;
use crate::http::transport::Transport;
use crate::observability::{LogSink, TracingSink};
use crate::resilience::RetryPolicy;

type Dispatch =
    dyn Fn(OutboundRequest) -> BoxFuture<'static, PipelineResult<InboundResponse>> + Send + Sync;

/// A fully assembled chain. Cheap to clone; safe to share across tasks.
#[derive(Clone)]
pub struct Pipeline {
    dispatch: Arc<Dispatch>,
}

impl Pipeline {
    pub fn builder(provider: Arc<dyn CredentialProvider>) -> PipelineBuilder {
        PipelineBuilder::new(provider)
    }

    /// Wrap an arbitrary service stack.
    pub fn from_service<S>(service: S) -> Self
    where
        S: Service<OutboundRequest, Response = InboundResponse, Error = PipelineError>
            + Clone
            + Send
            + Sync
            + 'static,
        S::Future: Send + 'static,
    {
        let dispatch = move |request: OutboundRequest| -> BoxFuture<'static, PipelineResult<InboundResponse>> {
            Box::pin(service.clone().oneshot(request))
        };
        Self {
            dispatch: Arc::new(dispatch),
        }
    }

    /// Run one logical call through the chain.
    ///
    /// Transport panics are handled inside the chain. A panic in any other
    /// stage is caught here, logged, and returned as `UnknownTransportFailure`.
    pub async fn send(&self, request: OutboundRequest) -> PipelineResult<InboundResponse> {
        let method = request.method().clone();
        let uri = request.uri().clone();
        let call = (self.dispatch)(request);

        match AssertUnwindSafe(call).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(
                    method = %method,
                    uri = %uri,
                    panic = %message,
                    "Unexpected failure in request pipeline"
                );
                Err(PipelineError::UnknownTransportFailure(message))
            }
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline").finish_non_exhaustive()
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

/// Assembles the standard five-stage chain around a transport.
pub struct PipelineBuilder {
    provider: Arc<dyn CredentialProvider>,
    sink: Arc<dyn LogSink>,
    identity: ClientIdentity,
    policy: RetryPolicy,
    metrics_enabled: bool,
}

impl PipelineBuilder {
    pub fn new(provider: Arc<dyn CredentialProvider>) -> Self {
        Self {
            provider,
            sink: Arc::new(TracingSink),
            identity: ClientIdentity::default(),
            policy: RetryPolicy::default(),
            metrics_enabled: true,
        }
    }

    /// Builder with identity, retry policy and metrics taken from `config`.
    pub fn from_config(
        config: &PipelineConfig,
        provider: Arc<dyn CredentialProvider>,
    ) -> Result<Self, ConfigError> {
        let identity = ClientIdentity::from_config(&config.client).map_err(|e| {
            ConfigError::Validation(vec![ValidationError {
                field: "client",
                message: e.to_string(),
            }])
        })?;
        Ok(Self::new(provider)
            .client_identity(identity)
            .retry_policy(RetryPolicy::from_config(&config.retries))
            .metrics(config.observability.metrics_enabled))
    }

    pub fn log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn client_identity(mut self, identity: ClientIdentity) -> Self {
        self.identity = identity;
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn metrics(mut self, enabled: bool) -> Self {
        self.metrics_enabled = enabled;
        self
    }

    /// Compose logging → request headers → auth → retry → exception
    /// handling → `transport`.
    pub fn build<T: Transport>(self, transport: T) -> Pipeline {
        let service = ServiceBuilder::new()
            .layer(LoggingLayer::new(self.sink).with_metrics(self.metrics_enabled))
            .layer(RequestHeadersLayer::new(self.identity))
            .layer(AuthLayer::new(self.provider).with_metrics(self.metrics_enabled))
            .layer(RetryLayer::new(self.policy).with_metrics(self.metrics_enabled))
            .layer(ExceptionHandlingLayer)
            .service(transport);

        tracing::debug!("Request pipeline assembled");
        Pipeline::from_service(service)
    }
}
