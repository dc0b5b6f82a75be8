//! # signature-match
//!
//! Signature image comparison using structural similarity (SSIM).
//!
//! Two images are decoded, converted to BT.601 grayscale, resized to a
//! canonical 300×300 and compared with a 7×7 uniform-window SSIM. The mean
//! SSIM is reported as a percentage rounded to two decimals. Whether a score
//! counts as a match is decided by the caller through [`MatchThreshold`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use signature_match::{score, MatchThreshold};
//!
//! let similarity = score("signature1.png", "signature2.png")?;
//! let verdict = MatchThreshold::default().classify(similarity);
//! println!("{}", verdict.message(similarity));
//! ```
//!
//! ## Modules
//!
//! - [`error`]: Error types for the library
//! - [`source`]: Image sources (paths, in-memory bytes) and decoding
//! - [`normalize`]: Grayscale conversion and canonical resize
//! - [`ssim`]: Windowed SSIM primitive
//! - [`metrics`]: Optional diagnostic metrics (DSSIM, PSNR)
//! - [`scorer`]: The similarity scorer and its configuration
//! - [`verdict`]: Threshold policy for match / no-match
//! - [`report`]: Serializable comparison and batch reports

pub mod error;
pub mod metrics;
pub mod normalize;
pub mod report;
pub mod scorer;
pub mod source;
pub mod ssim;
pub mod verdict;

// Re-export commonly used types
pub use error::{Error, Result};
pub use metrics::{MetricConfig, MetricResult};
pub use normalize::{CANONICAL_SIZE, NormalizedImage};
pub use report::{BatchEntry, BatchReport, ComparisonReport, write_ssim_map};
pub use scorer::{ScorerConfig, ScorerConfigBuilder, SimilarityScorer, score};
pub use source::ImageSource;
pub use ssim::SsimParams;
pub use verdict::{DEFAULT_THRESHOLD, MatchThreshold, Verdict};
