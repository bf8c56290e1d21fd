//! Tally store (spreadsheet webhook) configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Apps-Script-style webhook store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SheetConfig {
    /// Webhook URL serving both the submitted-districts query and submission
    pub webhook_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl SheetConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate store configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.webhook_url.is_empty() {
            return Err(ValidationError::MissingRequired("TALLYBOT__SHEET__WEBHOOK_URL"));
        }
        if !self.webhook_url.starts_with("http://") && !self.webhook_url.starts_with("https://") {
            return Err(ValidationError::InvalidWebhookUrl);
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

fn default_timeout() -> u64 {
    30
}
