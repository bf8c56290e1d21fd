//! OCR.space recognizer - Implementation of TextRecognizer for the
//! OCR.space HTTP API.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OcrSpaceConfig::new(api_key)
//!     .with_language("eng")
//!     .with_endpoint("https://api.ocr.space/parse/image");
//!
//! let recognizer = OcrSpaceRecognizer::new(config);
//! ```

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::ports::{RecognitionError, TextRecognizer};

/// Configuration for the OCR.space recognizer.
#[derive(Debug, Clone)]
pub struct OcrSpaceConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Endpoint URL.
    pub endpoint: String,
    /// Language hint sent with every request.
    pub language: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl OcrSpaceConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            endpoint: "https://api.ocr.space/parse/image".to_string(),
            language: "eng".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the endpoint URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the language hint.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Exposes the API key (for making requests).
    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// OCR.space API implementation of the recognition port.
pub struct OcrSpaceRecognizer {
    config: OcrSpaceConfig,
    client: Client,
}

impl OcrSpaceRecognizer {
    /// Creates a new recognizer with the given configuration.
    pub fn new(config: OcrSpaceConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    #[serde(rename = "ParsedResults", default)]
    parsed_results: Vec<ParsedResult>,
}

#[derive(Debug, Deserialize)]
struct ParsedResult {
    #[serde(rename = "ParsedText", default)]
    parsed_text: String,
}

#[async_trait]
impl TextRecognizer for OcrSpaceRecognizer {
    async fn recognize(&self, image_url: &str) -> Result<String, RecognitionError> {
        let form = [
            ("apikey", self.config.api_key()),
            ("url", image_url),
            ("language", self.config.language.as_str()),
            ("isOverlayRequired", "false"),
        ];

        let response = self
            .client
            .post(&self.config.endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| RecognitionError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "recognition endpoint returned error status");
            return Err(RecognitionError::Transport(format!(
                "endpoint returned {}",
                status
            )));
        }

        let body: OcrResponse = response
            .json()
            .await
            .map_err(|e| RecognitionError::Transport(e.to_string()))?;

        let text = body
            .parsed_results
            .into_iter()
            .next()
            .map(|r| r.parsed_text)
            .unwrap_or_default();

        if text.trim().is_empty() {
            warn!("recognition returned no text");
            return Err(RecognitionError::NoText);
        }

        debug!(chars = text.len(), "recognition extracted text");
        Ok(text)
    }
}
