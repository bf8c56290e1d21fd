//! Tally store port.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The finalized unit handed to the storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub region: String,
    pub district: String,
    /// Wall-clock time formatted `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
    /// Display identity of the submitting user.
    pub sender: String,
    pub votes: BTreeMap<String, u64>,
}

/// The store's acknowledgement of a submission.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitAck {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Errors from the storage collaborator.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The store was unreachable or answered with a transport-level error.
    #[error("Store unreachable: {0}")]
    Transport(String),

    /// The store answered with a payload this crate cannot interpret.
    #[error("Unexpected store response: {0}")]
    InvalidResponse(String),
}

/// The storage backend that persists submitted tallies.
///
/// # Contract
///
/// - `submitted_districts` returns the district names currently holding
///   data; callers compare case-insensitively.
/// - `submit` is at-most-once from this crate's side: the workflow never
///   retries a failed call.
#[async_trait]
pub trait TallyStore: Send + Sync {
    /// Districts that already hold submitted data.
    async fn submitted_districts(&self) -> Result<Vec<String>, StoreError>;

    /// Hands a finalized record to the store.
    async fn submit(&self, record: &SubmissionRecord) -> Result<SubmitAck, StoreError>;
}
