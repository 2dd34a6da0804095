//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, attempts >= 1, status codes)
//! - Check that client identification values are legal header values
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: PipelineConfig → Result<(), Vec<ValidationError>>

use std::fmt;

use http::header::HeaderValue;
use url::Url;

use crate::config::schema::PipelineConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a parsed configuration.
pub fn validate_config(config: &PipelineConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match Url::parse(&config.transport.base_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::new(
            "transport.base_url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new("transport.base_url", e.to_string())),
    }
    if config.transport.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("transport.connect_timeout_secs", "must be > 0"));
    }
    if config.transport.request_timeout_secs == 0 {
        errors.push(ValidationError::new("transport.request_timeout_secs", "must be > 0"));
    }

    let client = &config.client;
    let header_fields = [
        ("client.app_name", Some(&client.app_name)),
        ("client.app_version", Some(&client.app_version)),
        ("client.platform", Some(&client.platform)),
        ("client.culture", client.culture.as_ref()),
    ];
    for (field, value) in header_fields {
        if let Some(value) = value {
            if HeaderValue::from_str(value).is_err() {
                errors.push(ValidationError::new(field, "not a valid header value"));
            }
        }
    }

    let retries = &config.retries;
    if retries.max_attempts == 0 {
        errors.push(ValidationError::new("retries.max_attempts", "must be >= 1"));
    }
    if retries.base_delay_ms > retries.max_delay_ms {
        errors.push(ValidationError::new(
            "retries.base_delay_ms",
            "must not exceed retries.max_delay_ms",
        ));
    }
    for code in &retries.retry_on_status {
        if !(500..=599).contains(code) {
            errors.push(ValidationError::new(
                "retries.retry_on_status",
                format!("{} is not a server error status", code),
            ));
        }
    }

    if !LOG_LEVELS.contains(&config.observability.log_level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", config.observability.log_level),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&PipelineConfig::default()), Ok(()));
    }

    #[test]
    fn collects_every_error() {
        let mut config = PipelineConfig::default();
        config.transport.base_url = "ftp://files.example.com".into();
        config.transport.request_timeout_secs = 0;
        config.retries.max_attempts = 0;
        config.retries.retry_on_status = vec![401, 200, 503];
        config.client.culture = Some("en\nUS".into());

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "transport.base_url",
                "transport.request_timeout_secs",
                "client.culture",
                "retries.max_attempts",
                "retries.retry_on_status",
                "retries.retry_on_status",
            ]
        );
    }

    #[test]
    fn client_error_statuses_are_not_retryable() {
        let mut config = PipelineConfig::default();
        config.retries.retry_on_status = vec![400, 404, 429, 500, 599];

        let errors = validate_config(&config).unwrap_err();
        let messages: Vec<_> = errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "400 is not a server error status",
                "404 is not a server error status",
                "429 is not a server error status",
            ]
        );
    }
}
