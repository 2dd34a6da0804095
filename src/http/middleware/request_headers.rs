//! Request headers stage: correlation id and client identification.

use std::task::{Context, Poll};

use futures_util::future::BoxFuture;
use http::header::{HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue, ACCEPT_LANGUAGE, USER_AGENT};
use tower::{Layer, Service};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::http::request::OutboundRequest;
use crate::http::response::InboundResponse;
use crate::http::{X_APP_NAME, X_APP_PLATFORM, X_APP_VERSION, X_CORRELATION_ID};

/// Static headers identifying this client, built once per pipeline.
#[derive(Debug, Clone, Default)]
pub struct ClientIdentity {
    headers: HeaderMap,
}

impl ClientIdentity {
    pub fn from_config(config: &ClientConfig) -> Result<Self, InvalidHeaderValue> {
        let mut headers = HeaderMap::new();
        headers.insert(X_APP_NAME, HeaderValue::from_str(&config.app_name)?);
        headers.insert(X_APP_VERSION, HeaderValue::from_str(&config.app_version)?);
        headers.insert(X_APP_PLATFORM, HeaderValue::from_str(&config.platform)?);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!(
                "{}/{} ({})",
                config.app_name, config.app_version, config.platform
            ))?,
        );
        if let Some(culture) = &config.culture {
            headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_str(culture)?);
        }
        Ok(Self { headers })
    }

    /// Add or replace one identification header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Stamp a request. A correlation id set by the caller is kept.
    pub fn apply(&self, headers: &mut HeaderMap) {
        if !headers.contains_key(X_CORRELATION_ID) {
            let id = Uuid::new_v4().to_string();
            // A hyphenated UUID is always a valid header value.
            if let Ok(value) = HeaderValue::from_str(&id) {
                headers.insert(X_CORRELATION_ID, value);
            }
        }
        for (name, value) in self.headers.iter() {
            headers.insert(name.clone(), value.clone());
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestHeadersLayer {
    identity: ClientIdentity,
}

impl RequestHeadersLayer {
    pub fn new(identity: ClientIdentity) -> Self {
        Self { identity }
    }
}

impl<S> Layer<S> for RequestHeadersLayer {
    type Service = RequestHeaders<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestHeaders {
            inner,
            identity: self.identity.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestHeaders<S> {
    inner: S,
    identity: ClientIdentity,
}

impl<S> Service<OutboundRequest> for RequestHeaders<S>
where
    S: Service<OutboundRequest, Response = InboundResponse, Error = PipelineError>
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
{
    type Response = InboundResponse;
    type Error = PipelineError;
    type Future = BoxFuture<'static, PipelineResult<InboundResponse>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: OutboundRequest) -> Self::Future {
        self.identity.apply(request.headers_mut());
        Box::pin(self.inner.call(request))
    }
}
