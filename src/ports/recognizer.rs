//! Text recognition port.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from the recognition collaborator.
#[derive(Debug, Clone, Error)]
pub enum RecognitionError {
    /// The service was unreachable or answered with a transport-level error.
    #[error("Recognition service unreachable: {0}")]
    Transport(String),

    /// The service answered but produced no usable text.
    #[error("Recognition produced no text")]
    NoText,
}

/// Recovers text from an image the transport has made reachable by URL.
///
/// # Contract
///
/// A single best-effort call with no retry. Implementations must:
/// - Return the recovered text when recognition succeeds
/// - Return `RecognitionError::NoText` when the service answers without a
///   usable result
/// - Return `RecognitionError::Transport` for network or HTTP failures
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Recognizes text in the image at `image_url`.
    async fn recognize(&self, image_url: &str) -> Result<String, RecognitionError>;
}
