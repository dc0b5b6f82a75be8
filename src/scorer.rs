//! The similarity scorer: decode, normalize, SSIM, percentage.
//!
//! [`SimilarityScorer`] is the main entry point. It holds only immutable
//! configuration, so one instance can be shared across threads and reused
//! for any number of comparisons.
//!
//! # Example
//!
//! ```rust,ignore
//! use signature_match::{MatchThreshold, SimilarityScorer};
//!
//! let scorer = SimilarityScorer::default();
//! let score = scorer.score("sig1.png", "sig2.png")?;
//!
//! let verdict = MatchThreshold::default().classify(score);
//! println!("{}", verdict.message(score));
//! ```

use imgref::ImgVec;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::metrics::{MetricConfig, MetricResult};
use crate::normalize::{CANONICAL_SIZE, NormalizedImage};
use crate::report::ComparisonReport;
use crate::source::ImageSource;
use crate::ssim::{self, SsimParams};

/// Configuration for a [`SimilarityScorer`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScorerConfig {
    /// Width both images are resized to.
    pub canonical_width: usize,

    /// Height both images are resized to.
    pub canonical_height: usize,

    /// SSIM window and constants.
    pub ssim: SsimParams,

    /// Diagnostic metrics reported by [`SimilarityScorer::compare`].
    pub metrics: MetricConfig,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            canonical_width: CANONICAL_SIZE,
            canonical_height: CANONICAL_SIZE,
            ssim: SsimParams::default(),
            metrics: MetricConfig::none(),
        }
    }
}

impl ScorerConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> ScorerConfigBuilder {
        ScorerConfigBuilder::default()
    }

    /// Check that the configuration can produce a score.
    pub fn validate(&self) -> Result<()> {
        self.ssim.validate()?;
        let min = self.ssim.window;
        if self.canonical_width < min || self.canonical_height < min {
            return Err(Error::InvalidConfig(format!(
                "canonical size {}x{} is smaller than the SSIM window {}",
                self.canonical_width, self.canonical_height, min
            )));
        }
        Ok(())
    }
}

/// Builder for [`ScorerConfig`].
#[derive(Debug, Default)]
pub struct ScorerConfigBuilder {
    canonical_size: Option<(usize, usize)>,
    ssim: Option<SsimParams>,
    metrics: Option<MetricConfig>,
}

impl ScorerConfigBuilder {
    /// Set the canonical size both images are resized to.
    #[must_use]
    pub fn canonical_size(mut self, width: usize, height: usize) -> Self {
        self.canonical_size = Some((width, height));
        self
    }

    /// Set the SSIM parameters.
    #[must_use]
    pub fn ssim(mut self, params: SsimParams) -> Self {
        self.ssim = Some(params);
        self
    }

    /// Set which diagnostic metrics to calculate.
    #[must_use]
    pub fn metrics(mut self, metrics: MetricConfig) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<ScorerConfig> {
        let (canonical_width, canonical_height) = self
            .canonical_size
            .unwrap_or((CANONICAL_SIZE, CANONICAL_SIZE));
        let config = ScorerConfig {
            canonical_width,
            canonical_height,
            ssim: self.ssim.unwrap_or_default(),
            metrics: self.metrics.unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Scores the structural similarity of two images as a percentage.
#[derive(Debug, Clone, Default)]
pub struct SimilarityScorer {
    config: ScorerConfig,
}

impl SimilarityScorer {
    /// Create a scorer from a configuration.
    pub fn new(config: ScorerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The scorer's configuration.
    #[must_use]
    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    /// Decode and normalize a source for later comparisons.
    pub fn prepare(&self, source: impl Into<ImageSource>) -> Result<NormalizedImage> {
        NormalizedImage::from_source(
            &source.into(),
            self.config.canonical_width,
            self.config.canonical_height,
        )
    }

    /// Similarity of two sources in percent, rounded to two decimals.
    ///
    /// # Errors
    ///
    /// [`Error::ImageLoad`] if either source cannot be decoded (the first
    /// failing source is reported), [`Error::Comparison`] if the normalized
    /// buffers cannot be compared.
    pub fn score(&self, a: impl Into<ImageSource>, b: impl Into<ImageSource>) -> Result<f64> {
        let a = self.prepare(a)?;
        let b = self.prepare(b)?;
        self.score_prepared(&a, &b)
    }

    /// Similarity of two already-normalized images in percent.
    pub fn score_prepared(&self, a: &NormalizedImage, b: &NormalizedImage) -> Result<f64> {
        self.raw_ssim(a, b).map(ssim_to_percent)
    }

    /// Score two sources and collect a full report, including any enabled
    /// diagnostic metrics.
    pub fn compare(
        &self,
        a: impl Into<ImageSource>,
        b: impl Into<ImageSource>,
    ) -> Result<ComparisonReport> {
        let a = self.prepare(a)?;
        let b = self.prepare(b)?;
        self.compare_prepared(&a, &b)
    }

    /// Like [`compare`](Self::compare) for already-normalized images.
    pub fn compare_prepared(
        &self,
        a: &NormalizedImage,
        b: &NormalizedImage,
    ) -> Result<ComparisonReport> {
        let ssim = self.raw_ssim(a, b)?;
        let metrics = if self.config.metrics.any() {
            MetricResult::calculate(a.pixels(), b.pixels(), &self.config.metrics)?
        } else {
            MetricResult::default()
        };
        Ok(ComparisonReport::new(
            a,
            b,
            ssim,
            ssim_to_percent(ssim),
            metrics,
        ))
    }

    /// Per-window SSIM map of two sources, for visualization.
    pub fn ssim_map(
        &self,
        a: impl Into<ImageSource>,
        b: impl Into<ImageSource>,
    ) -> Result<ImgVec<f32>> {
        let a = self.prepare(a)?;
        let b = self.prepare(b)?;
        ssim::ssim_map(a.pixels(), b.pixels(), &self.config.ssim)
    }

    fn raw_ssim(&self, a: &NormalizedImage, b: &NormalizedImage) -> Result<f64> {
        if a.size() != b.size() {
            return Err(Error::comparison(format!(
                "normalized sizes differ: {:?} vs {:?}",
                a.size(),
                b.size()
            )));
        }
        let value = ssim::mean_ssim(a.pixels(), b.pixels(), &self.config.ssim)?;
        log::debug!("ssim({}, {}) = {}", a.label(), b.label(), value);
        Ok(value)
    }
}

/// Scale an SSIM value to percent and round to two decimals.
#[must_use]
pub fn ssim_to_percent(ssim: f64) -> f64 {
    (ssim * 100.0 * 100.0).round() / 100.0
}

/// Score two sources with the default configuration.
///
/// This is the plain `score(imageA, imageB) -> percentage` boundary: 300×300
/// BT.601 grayscale, 7×7 uniform-window SSIM, result rounded to two
/// decimals.
pub fn score(a: impl Into<ImageSource>, b: impl Into<ImageSource>) -> Result<f64> {
    SimilarityScorer::default().score(a, b)
}
