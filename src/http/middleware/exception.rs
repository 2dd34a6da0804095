//! Exception handling stage: the only translator of transport faults.
//!
//! # Responsibilities
//! - Invoke the transport
//! - Map transport faults to `PipelineError` kinds
//! - Turn non-success statuses into typed errors, parsing the error body
//!
//! # Design Decisions
//! - Cancellation wins: once the signal has fired, any failure is `Cancelled`
//! - A panicking transport is a failed attempt like any other, so the
//!   retry and logging stages observe it as `UnknownTransportFailure`
//! - 401 becomes `AuthenticationRequired` so the auth stage can react

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use http::StatusCode;
use tower::{Layer, Service};

use crate::error::{PipelineError, PipelineResult};
use crate::http::pipeline::panic_message;
use crate::http::request::OutboundRequest;
use crate::http::response::{InboundResponse, ServerErrorBody};
use crate::http::transport::{Transport, TransportError};

/// Wraps a [`Transport`] into the innermost stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExceptionHandlingLayer;

impl<T> Layer<T> for ExceptionHandlingLayer {
    type Service = ExceptionHandling<T>;

    fn layer(&self, transport: T) -> Self::Service {
        ExceptionHandling {
            transport: Arc::new(transport),
        }
    }
}

pub struct ExceptionHandling<T> {
    transport: Arc<T>,
}

impl<T> Clone for ExceptionHandling<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: Transport> Service<OutboundRequest> for ExceptionHandling<T> {
    type Response = InboundResponse;
    type Error = PipelineError;
    type Future = BoxFuture<'static, PipelineResult<InboundResponse>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: OutboundRequest) -> Self::Future {
        let transport = Arc::clone(&self.transport);
        Box::pin(async move {
            let cancel = request.cancel().clone();
            if cancel.is_cancelled() {
                return Err(PipelineError::Cancelled);
            }

            let uri = request.uri().clone();
            let exchange = AssertUnwindSafe(async move { transport.send(request).await });

            match exchange.catch_unwind().await {
                Ok(Ok(response)) => translate_response(response),
                Ok(Err(_)) if cancel.is_cancelled() => Err(PipelineError::Cancelled),
                Ok(Err(err)) => Err(translate_transport_error(err)),
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    tracing::error!(uri = %uri, panic = %message, "Transport panicked");
                    Err(PipelineError::UnknownTransportFailure(message))
                }
            }
        })
    }
}

/// Map a transport fault to its error kind.
pub fn translate_transport_error(err: TransportError) -> PipelineError {
    tracing::debug!(error = %err, "Transport fault");
    match err {
        TransportError::Connect(msg) => PipelineError::NetworkUnreachable(msg),
        TransportError::Timeout => PipelineError::Timeout,
        TransportError::Malformed(msg) => PipelineError::Deserialization(msg),
        TransportError::Cancelled => PipelineError::Cancelled,
        TransportError::Other(msg) => PipelineError::UnknownTransportFailure(msg),
    }
}

/// Pass successes through; classify everything else by status.
pub fn translate_response(mut response: InboundResponse) -> PipelineResult<InboundResponse> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = ServerErrorBody::parse(response.body());
    response.set_error(body.clone());

    let field_errors = body.as_ref().map(|b| b.field_errors()).unwrap_or_default();
    match status {
        StatusCode::UNAUTHORIZED => Err(PipelineError::AuthenticationRequired),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY if !field_errors.is_empty() => {
            Err(PipelineError::ValidationError {
                fields: field_errors,
            })
        }
        _ => Err(PipelineError::ServerError { status, body }),
    }
}
