//! Sheet webhook store - Implementation of TallyStore for an Apps-Script
//! style spreadsheet webhook.
//!
//! One URL serves both operations: GET with `action=get_submitted_districts`
//! lists districts already holding data; POST with a JSON submission record
//! appends/overwrites the district's row and acknowledges with
//! `{ success, message? }`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::ports::{StoreError, SubmissionRecord, SubmitAck, TallyStore};

/// Configuration for the webhook store.
#[derive(Debug, Clone)]
pub struct SheetWebhookConfig {
    /// Webhook URL.
    pub webhook_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl SheetWebhookConfig {
    /// Creates a new configuration for the given webhook URL.
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Webhook implementation of the tally store port.
pub struct SheetWebhookStore {
    config: SheetWebhookConfig,
    client: Client,
}

impl SheetWebhookStore {
    /// Creates a new store client with the given configuration.
    pub fn new(config: SheetWebhookConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }
}

#[derive(Debug, Deserialize)]
struct DistrictsResponse {
    #[serde(default)]
    districts: Vec<String>,
}

#[async_trait]
impl TallyStore for SheetWebhookStore {
    async fn submitted_districts(&self) -> Result<Vec<String>, StoreError> {
        let response = self
            .client
            .get(&self.config.webhook_url)
            .query(&[("action", "get_submitted_districts")])
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "store returned error status for districts query");
            return Err(StoreError::Transport(format!("store returned {}", status)));
        }

        let body: DistrictsResponse = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;

        debug!(count = body.districts.len(), "fetched submitted districts");
        Ok(body.districts)
    }

    async fn submit(&self, record: &SubmissionRecord) -> Result<SubmitAck, StoreError> {
        let response = self
            .client
            .post(&self.config.webhook_url)
            .json(record)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "store returned error status for submission");
            return Err(StoreError::Transport(format!("store returned {}", status)));
        }

        response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn districts_response_tolerates_missing_field() {
        let body: DistrictsResponse = serde_json::from_str("{}").unwrap();
        assert!(body.districts.is_empty());
    }

    #[test]
    fn ack_parses_success_and_message() {
        let ack: SubmitAck =
            serde_json::from_str(r#"{"success":false,"message":"row locked"}"#).unwrap();
        assert!(!ack.success);
        assert_eq!(ack.message.as_deref(), Some("row locked"));
    }

    #[test]
    fn submission_record_serializes_wire_fields() {
        let record = SubmissionRecord {
            region: "Northern".to_string(),
            district: "Mzimba".to_string(),
            timestamp: "2025-09-16 07:05:09".to_string(),
            sender: "Jane Doe".to_string(),
            votes: [("Banda".to_string(), 1200u64)].into_iter().collect(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["region"], "Northern");
        assert_eq!(json["votes"]["Banda"], 1200);
        assert_eq!(json["timestamp"], "2025-09-16 07:05:09");
    }
}
