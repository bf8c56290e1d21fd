//! Recognition service configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// OCR.space-style recognition service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    /// API key for the recognition service
    pub api_key: Option<String>,

    /// Endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Language hint sent with every request
    #[serde(default = "default_language")]
    pub language: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl OcrConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check if an API key is configured
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    /// Validate recognition configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.has_api_key() {
            return Err(ValidationError::MissingRequired("TALLYBOT__OCR__API_KEY"));
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_endpoint(),
            language: default_language(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_endpoint() -> String {
    "https://api.ocr.space/parse/image".to_string()
}

fn default_language() -> String {
    "eng".to_string()
}

fn default_timeout() -> u64 {
    30
}
