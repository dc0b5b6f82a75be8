//! Diagnostic metrics computed alongside the SSIM score.
//!
//! The similarity percentage is always SSIM-based. These extra metrics are
//! opt-in and only reported; they never influence the score or the verdict.
//!
//! - **DSSIM**: structural dissimilarity from `dssim-core` (lower is better,
//!   0 = identical)
//! - **PSNR**: Peak Signal-to-Noise Ratio in dB (higher is better)
//!
//! Both are computed on the normalized grayscale buffers.

pub mod dssim;

use imgref::ImgRef;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Configuration for which diagnostic metrics to calculate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricConfig {
    /// Calculate DSSIM (structural dissimilarity).
    pub dssim: bool,
    /// Calculate PSNR (peak signal-to-noise ratio).
    pub psnr: bool,
}

impl MetricConfig {
    /// No diagnostic metrics.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Calculate all available metrics.
    #[must_use]
    pub fn all() -> Self {
        Self {
            dssim: true,
            psnr: true,
        }
    }

    /// Whether any metric is enabled.
    #[must_use]
    pub fn any(&self) -> bool {
        self.dssim || self.psnr
    }
}

/// Results from diagnostic metric calculations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricResult {
    /// DSSIM value (lower is better, 0 = identical).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dssim: Option<f64>,
    /// PSNR value in dB (higher is better). `None` in JSON for identical
    /// images, where PSNR is infinite.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub psnr: Option<f64>,
}

impl MetricResult {
    /// Calculate the metrics enabled in `config`.
    pub fn calculate(a: ImgRef<'_, u8>, b: ImgRef<'_, u8>, config: &MetricConfig) -> Result<Self> {
        let mut result = Self::default();

        if config.psnr {
            let psnr = calculate_psnr(a, b)?;
            result.psnr = psnr.is_finite().then_some(psnr);
        }

        if config.dssim {
            result.dssim = Some(dssim::calculate_dssim(a, b)?);
        }

        Ok(result)
    }
}

/// Calculate PSNR between two grayscale images.
///
/// # Returns
///
/// PSNR value in decibels. Higher is better. Returns `f64::INFINITY` if
/// images are identical.
///
/// # Errors
///
/// Returns [`Error::Comparison`] if the images differ in size or are empty.
pub fn calculate_psnr(a: ImgRef<'_, u8>, b: ImgRef<'_, u8>) -> Result<f64> {
    if (a.width(), a.height()) != (b.width(), b.height()) {
        return Err(Error::comparison(format!(
            "dimension mismatch: {}x{} vs {}x{}",
            a.width(),
            a.height(),
            b.width(),
            b.height()
        )));
    }
    let pixel_count = a.width() * a.height();
    if pixel_count == 0 {
        return Err(Error::comparison("empty image"));
    }

    let mse_sum: u64 = a
        .pixels()
        .zip(b.pixels())
        .map(|(x, y)| {
            let diff = u64::from(x.abs_diff(y));
            diff * diff
        })
        .sum();

    let mse = mse_sum as f64 / pixel_count as f64;

    if mse == 0.0 {
        Ok(f64::INFINITY)
    } else {
        Ok(10.0 * (255.0_f64 * 255.0 / mse).log10())
    }
}
