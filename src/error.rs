//! Error types for signature-match operations.

use thiserror::Error;

/// Result type alias for signature-match operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while scoring signature images.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Failed to read or decode an image source.
    #[error("Image load failed: {source_label}: {reason}")]
    ImageLoad {
        /// Label of the source that failed (file path or in-memory name).
        source_label: String,
        /// Reason for the failure.
        reason: String,
    },

    /// Normalized buffers cannot be compared statistically.
    #[error("Comparison failed: {reason}")]
    Comparison {
        /// Reason for the failure.
        reason: String,
    },

    /// Failed to calculate a diagnostic metric.
    #[error("Metric calculation failed: {metric}: {reason}")]
    MetricCalculation {
        /// Name of the metric that failed.
        metric: String,
        /// Reason for the failure.
        reason: String,
    },

    /// Scorer configuration or threshold is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to encode an output image (e.g. an SSIM map).
    #[error("Image encode failed: {0}")]
    ImageEncode(String),

    /// I/O error wrapper.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    pub(crate) fn comparison(reason: impl Into<String>) -> Self {
        Self::Comparison {
            reason: reason.into(),
        }
    }

    /// Whether this error came from reading or decoding an input image.
    #[must_use]
    pub fn is_load_error(&self) -> bool {
        matches!(self, Self::ImageLoad { .. })
    }
}
