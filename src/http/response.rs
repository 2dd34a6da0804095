//! Inbound response model.
//!
//! # Responsibilities
//! - Hold status, headers and body as returned by the transport
//! - Parse the server's structured error payload on non-success statuses
//! - Decode bodies into typed values

use std::collections::BTreeMap;

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// A response travelling back up the chain.
#[derive(Debug, Clone)]
pub struct InboundResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    error: Option<ServerErrorBody>,
}

impl InboundResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            error: None,
        }
    }

    pub fn from_parts(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
            error: None,
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Structured error payload, present once the exception handling stage
    /// has looked at a non-success response.
    pub fn error(&self) -> Option<&ServerErrorBody> {
        self.error.as_ref()
    }

    pub(crate) fn set_error(&mut self, error: Option<ServerErrorBody>) {
        self.error = error;
    }

    /// Body as UTF-8 text.
    pub fn text(&self) -> PipelineResult<String> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| PipelineError::Deserialization(e.to_string()))
    }

    /// Body decoded as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> PipelineResult<T> {
        serde_json::from_slice(&self.body).map_err(|e| PipelineError::Deserialization(e.to_string()))
    }
}

/// Error payload returned by the server alongside a non-success status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerErrorBody {
    /// Machine-readable error key (e.g. `ResourceNotFound`).
    pub key: Option<String>,
    /// Human-readable message, or the raw body when it was not JSON.
    pub message: Option<String>,
    /// Per-field validation messages.
    pub errors: BTreeMap<String, Vec<String>>,
}

impl ServerErrorBody {
    /// Parse a response body. Empty bodies yield `None`; bodies that are not
    /// a JSON error object are kept verbatim as the message.
    pub fn parse(body: &[u8]) -> Option<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return None;
        }
        match serde_json::from_slice::<ServerErrorBody>(body) {
            Ok(parsed) => Some(parsed),
            Err(_) => Some(Self {
                message: Some(String::from_utf8_lossy(body).into_owned()),
                ..Default::default()
            }),
        }
    }

    pub fn field_errors(&self) -> Vec<FieldError> {
        self.errors
            .iter()
            .map(|(field, messages)| FieldError {
                field: field.clone(),
                messages: messages.clone(),
            })
            .collect()
    }
}

/// Validation messages for one request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub messages: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_structured_error() {
        let body = br#"{"key":"ValidationFailed","message":"bad input","errors":{"email":["is required"]}}"#;
        let parsed = ServerErrorBody::parse(body).unwrap();
        assert_eq!(parsed.key.as_deref(), Some("ValidationFailed"));
        assert_eq!(
            parsed.field_errors(),
            vec![FieldError {
                field: "email".into(),
                messages: vec!["is required".into()],
            }]
        );
    }

    #[test]
    fn parse_keeps_raw_text() {
        let parsed = ServerErrorBody::parse(b"upstream exploded").unwrap();
        assert_eq!(parsed.message.as_deref(), Some("upstream exploded"));
        assert!(parsed.errors.is_empty());

        assert!(ServerErrorBody::parse(b"").is_none());
        assert!(ServerErrorBody::parse(b"  \n").is_none());
    }

    #[test]
    fn json_decode_failure_is_deserialization() {
        let resp = InboundResponse::new(StatusCode::OK).with_body("not json");
        let err = resp.json::<serde_json::Value>().unwrap_err();
        assert_eq!(err.kind(), "deserialization");
    }
}
