//! Typed API client over the request pipeline.
//!
//! # Responsibilities
//! - Resolve relative API paths against the configured server address
//! - Encode request bodies and decode responses as JSON
//! - Expose the server's controller actions as async methods
//!   (`diagnostics`, `statistics`)

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::error::PipelineError;
use crate::http::{InboundResponse, OutboundRequest, Pipeline};
use crate::lifecycle::CancellationSignal;

pub mod diagnostics;
pub mod statistics;

/// Errors raised by the typed client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The call failed inside the pipeline.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// The request could not be built.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Client bound to one API server.
#[derive(Debug, Clone)]
pub struct ApiClient {
    pipeline: Pipeline,
    base_url: Url,
}

impl ApiClient {
    /// `base_url` is treated as a directory: a trailing slash is added if
    /// missing so relative paths append instead of replacing the last segment.
    pub fn new(pipeline: Pipeline, mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { pipeline, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Absolute URL for an API path such as `api/Diagnostics/PerformDiagnostics`.
    pub fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidRequest(format!("bad path '{}': {}", path, e)))
    }

    /// Send a prepared request.
    pub async fn send(&self, request: OutboundRequest) -> Result<InboundResponse, ApiError> {
        Ok(self.pipeline.send(request).await?)
    }

    /// `GET path`, decoding the JSON response.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        cancel: CancellationSignal,
    ) -> Result<T, ApiError> {
        self.get_json_at(self.url(path)?, cancel).await
    }

    /// `GET` an absolute URL, which may live outside the API server.
    pub async fn get_json_at<T: DeserializeOwned>(
        &self,
        url: Url,
        cancel: CancellationSignal,
    ) -> Result<T, ApiError> {
        let request = OutboundRequest::get(url).with_cancellation(cancel);
        let response = self.send(request).await?;
        Ok(response.json()?)
    }

    /// `POST path` with a JSON body, decoding the JSON response.
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        body: &B,
        cancel: CancellationSignal,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = OutboundRequest::post(self.url(path)?)
            .with_json(body)
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?
            .with_cancellation(cancel);
        let response = self.send(request).await?;
        Ok(response.json()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Anonymous;
    use crate::http::ReqwestTransport;
    use std::sync::Arc;

    fn client(base: &str) -> ApiClient {
        let pipeline = Pipeline::builder(Arc::new(Anonymous))
            .build(ReqwestTransport::with_client(reqwest::Client::new()));
        ApiClient::new(pipeline, Url::parse(base).unwrap())
    }

    #[test]
    fn url_joins_under_base_path() {
        let api = client("http://localhost:5030/app");
        assert_eq!(api.base_url().as_str(), "http://localhost:5030/app/");
        assert_eq!(
            api.url("/api/Diagnostics/PerformDiagnostics").unwrap().as_str(),
            "http://localhost:5030/app/api/Diagnostics/PerformDiagnostics"
        );
    }
}
