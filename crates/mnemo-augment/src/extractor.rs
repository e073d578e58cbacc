// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Knowledge extraction backends.
//!
//! The extraction service receives the running conversation summary plus the
//! exchange's messages and answers with a JSON document of derived knowledge.

use std::time::Duration;

use async_trait::async_trait;
use mnemo_config::ExtractionConfig;
use mnemo_core::{Message, MnemoError};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use tracing::{debug, warn};

/// Body posted to the extraction service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionRequest {
    /// Current conversation summary, empty when none is stored yet.
    pub summary: String,
    pub messages: Vec<Message>,
}

#[async_trait]
pub trait ExtractionBackend: Send + Sync {
    /// Raw extraction response; see [`crate::Memories`] for its shape.
    async fn extract(&self, request: &ExtractionRequest) -> Result<serde_json::Value, MnemoError>;
}

/// Posts [`ExtractionRequest`]s as JSON to a configured HTTP endpoint.
///
/// Retries once after 429, 500, 502 and 503 responses.
#[derive(Debug, Clone)]
pub struct HttpExtractionBackend {
    client: reqwest::Client,
    endpoint: String,
    max_retries: u32,
    retry_delay: Duration,
}

fn extraction_error(message: String, source: impl std::error::Error + Send + Sync + 'static) -> MnemoError {
    MnemoError::Extraction {
        message,
        source: Some(Box::new(source)),
    }
}

impl HttpExtractionBackend {
    pub fn new(config: &ExtractionConfig) -> Result<Self, MnemoError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = config.api_key.as_deref().filter(|k| !k.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {key}")).map_err(|e| {
                MnemoError::Config(format!("invalid extraction.api_key header value: {e}"))
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()
            .map_err(|e| extraction_error(format!("failed to build HTTP client: {e}"), e))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            max_retries: 1,
            retry_delay: Duration::from_secs(1),
        })
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn is_transient(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
    )
}

#[async_trait]
impl ExtractionBackend for HttpExtractionBackend {
    async fn extract(&self, request: &ExtractionRequest) -> Result<serde_json::Value, MnemoError> {
        let mut attempt = 0;
        loop {
            let response = self
                .client
                .post(&self.endpoint)
                .json(request)
                .send()
                .await
                .map_err(|e| extraction_error(format!("HTTP request failed: {e}"), e))?;

            let status = response.status();
            debug!(status = %status, attempt, "extraction response received");

            if status.is_success() {
                return response.json().await.map_err(|e| {
                    extraction_error(format!("failed to parse extraction response: {e}"), e)
                });
            }

            let body = response.text().await.unwrap_or_default();
            if is_transient(status) && attempt < self.max_retries {
                warn!(status = %status, body = %body, "transient extraction error, will retry");
                attempt += 1;
                tokio::time::sleep(self.retry_delay).await;
                continue;
            }

            return Err(MnemoError::Extraction {
                message: format!("extraction endpoint returned {status}: {body}"),
                source: None,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_statuses() {
        assert!(is_transient(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_transient(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_transient(StatusCode::BAD_REQUEST));
        assert!(!is_transient(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn invalid_api_key_is_configuration_error() {
        let config = ExtractionConfig {
            api_key: Some("bad\nkey".into()),
            ..ExtractionConfig::default()
        };
        let err = HttpExtractionBackend::new(&config).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn request_serializes_messages() {
        let request = ExtractionRequest {
            summary: String::new(),
            messages: vec![Message::user("hi")],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["summary"], "");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hi");
    }
}
