//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Configuration is loaded with the
//! `TALLYBOT` prefix and nested values use `__` as the separator.
//!
//! # Example
//!
//! ```no_run
//! use tallybot::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod error;
mod ocr;
mod sheet;

pub use error::{ConfigError, ValidationError};
pub use ocr::OcrConfig;
pub use sheet::SheetConfig;

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Recognition service configuration
    #[serde(default)]
    pub ocr: OcrConfig,

    /// Tally store configuration
    pub sheet: SheetConfig,

    /// Tracing filter directive
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Environment Variable Format
    ///
    /// - `TALLYBOT__OCR__API_KEY=...` -> `ocr.api_key = ...`
    /// - `TALLYBOT__SHEET__WEBHOOK_URL=...` -> `sheet.webhook_url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("TALLYBOT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.ocr.validate()?;
        self.sheet.validate()?;
        Ok(())
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}
