//! Windowed structural similarity (SSIM) on single-channel images.
//!
//! This follows the formulation of Wang et al. (2004) with a uniform
//! (box) window, which is also the default behaviour of
//! `skimage.metrics.structural_similarity`:
//!
//! - local statistics over every `window`×`window` patch that lies fully
//!   inside the image (no padding, so the border of `(window − 1) / 2`
//!   pixels only contributes through the windows that contain it),
//! - variances and covariance scaled by `N / (N − 1)` when
//!   `sample_covariance` is set,
//! - stabilizing constants `C1 = (k1·L)²` and `C2 = (k2·L)²`.
//!
//! Window sums come from summed-area tables in exact integer arithmetic,
//! so the floating-point part only ever sees exact inputs. Swapping the two
//! images yields bit-identical results.

use imgref::{ImgRef, ImgVec};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Largest accepted window side. Keeps `N · Σx²` within `i64` for 8-bit input.
pub const MAX_WINDOW: usize = 1023;

/// Parameters for the SSIM computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SsimParams {
    /// Side length of the square window (odd, at least 3).
    pub window: usize,
    /// Luminance stabilizer coefficient.
    pub k1: f64,
    /// Contrast stabilizer coefficient.
    pub k2: f64,
    /// Dynamic range of pixel values (`L`).
    pub data_range: f64,
    /// Use the unbiased `N / (N − 1)` normalization for (co)variances.
    pub sample_covariance: bool,
}

impl Default for SsimParams {
    fn default() -> Self {
        Self {
            window: 7,
            k1: 0.01,
            k2: 0.03,
            data_range: 255.0,
            sample_covariance: true,
        }
    }
}

impl SsimParams {
    /// Check that the parameters describe a usable SSIM computation.
    pub fn validate(&self) -> Result<()> {
        if self.window < 3 || self.window % 2 == 0 {
            return Err(Error::InvalidConfig(format!(
                "SSIM window must be odd and >= 3, got {}",
                self.window
            )));
        }
        if self.window > MAX_WINDOW {
            return Err(Error::InvalidConfig(format!(
                "SSIM window must be at most {MAX_WINDOW}, got {}",
                self.window
            )));
        }
        for (name, value) in [
            ("k1", self.k1),
            ("k2", self.k2),
            ("data_range", self.data_range),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "SSIM {} must be positive and finite, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Luminance constant `C1 = (k1·L)²`.
    #[must_use]
    pub fn c1(&self) -> f64 {
        let c = self.k1 * self.data_range;
        c * c
    }

    /// Contrast constant `C2 = (k2·L)²`.
    #[must_use]
    pub fn c2(&self) -> f64 {
        let c = self.k2 * self.data_range;
        c * c
    }
}

/// Summed-area table with one extra leading row and column of zeros.
struct Integral {
    stride: usize,
    sums: Vec<u64>,
}

impl Integral {
    fn build(width: usize, height: usize, value: impl Fn(usize, usize) -> u64) -> Self {
        let stride = width + 1;
        let mut sums = vec![0u64; stride * (height + 1)];
        for y in 0..height {
            let mut row_sum = 0u64;
            for x in 0..width {
                row_sum += value(x, y);
                sums[(y + 1) * stride + x + 1] = sums[y * stride + x + 1] + row_sum;
            }
        }
        Self { stride, sums }
    }

    /// Sum over the `size`×`size` window with top-left corner `(x, y)`.
    #[inline]
    fn window(&self, x: usize, y: usize, size: usize) -> u64 {
        let s = self.stride;
        let (x1, y1) = (x + size, y + size);
        self.sums[y1 * s + x1]
            + self.sums[y * s + x]
            - self.sums[y * s + x1]
            - self.sums[y1 * s + x]
    }
}

#[inline]
fn px(img: ImgRef<'_, u8>, x: usize, y: usize) -> u64 {
    u64::from(img[(x, y)])
}

/// Per-window SSIM values in row-major order.
fn ssim_values(a: ImgRef<'_, u8>, b: ImgRef<'_, u8>, params: &SsimParams) -> Result<ImgVec<f64>> {
    params.validate()?;

    let (width, height) = (a.width(), a.height());
    if (width, height) != (b.width(), b.height()) {
        return Err(Error::comparison(format!(
            "dimension mismatch: {}x{} vs {}x{}",
            width,
            height,
            b.width(),
            b.height()
        )));
    }
    if width == 0 || height == 0 {
        return Err(Error::comparison("empty image"));
    }
    let win = params.window;
    if width < win || height < win {
        return Err(Error::comparison(format!(
            "image {}x{} is smaller than the {}x{} SSIM window",
            width, height, win, win
        )));
    }

    let sum_a = Integral::build(width, height, |x, y| px(a, x, y));
    let sum_b = Integral::build(width, height, |x, y| px(b, x, y));
    let sum_aa = Integral::build(width, height, |x, y| px(a, x, y) * px(a, x, y));
    let sum_bb = Integral::build(width, height, |x, y| px(b, x, y) * px(b, x, y));
    let sum_ab = Integral::build(width, height, |x, y| px(a, x, y) * px(b, x, y));

    let n = (win * win) as i64;
    let n_f = n as f64;
    let n_sq = n_f * n_f;
    let cov_norm = if params.sample_covariance {
        n_f / (n_f - 1.0)
    } else {
        1.0
    };
    let (c1, c2) = (params.c1(), params.c2());

    let out_w = width - win + 1;
    let out_h = height - win + 1;
    let mut values = Vec::with_capacity(out_w * out_h);

    for y in 0..out_h {
        for x in 0..out_w {
            let sa = sum_a.window(x, y, win) as i64;
            let sb = sum_b.window(x, y, win) as i64;
            let saa = sum_aa.window(x, y, win) as i64;
            let sbb = sum_bb.window(x, y, win) as i64;
            let sab = sum_ab.window(x, y, win) as i64;

            let ux = sa as f64 / n_f;
            let uy = sb as f64 / n_f;
            let vx = cov_norm * ((n * saa - sa * sa) as f64 / n_sq);
            let vy = cov_norm * ((n * sbb - sb * sb) as f64 / n_sq);
            let vxy = cov_norm * ((n * sab - sa * sb) as f64 / n_sq);

            let a1 = 2.0 * ux * uy + c1;
            let a2 = 2.0 * vxy + c2;
            let b1 = ux * ux + uy * uy + c1;
            let b2 = vx + vy + c2;

            values.push((a1 * a2) / (b1 * b2));
        }
    }

    Ok(ImgVec::new(values, out_w, out_h))
}

/// Mean SSIM between two equally sized grayscale images, in `[-1, 1]`.
///
/// # Errors
///
/// Returns [`Error::Comparison`] if the images differ in size, are empty,
/// or are smaller than the window, and [`Error::InvalidConfig`] for bad
/// parameters.
pub fn mean_ssim(a: ImgRef<'_, u8>, b: ImgRef<'_, u8>, params: &SsimParams) -> Result<f64> {
    let values = ssim_values(a, b, params)?;
    let count = values.buf().len() as f64;
    let total: f64 = values.buf().iter().sum();
    let mssim = total / count;

    if !mssim.is_finite() {
        return Err(Error::comparison(format!("SSIM is not finite: {}", mssim)));
    }
    Ok(mssim.clamp(-1.0, 1.0))
}

/// Local SSIM value for every window position.
///
/// The map is `(width − window + 1)`×`(height − window + 1)`; entry
/// `(x, y)` belongs to the window whose top-left corner is `(x, y)`.
pub fn ssim_map(a: ImgRef<'_, u8>, b: ImgRef<'_, u8>, params: &SsimParams) -> Result<ImgVec<f32>> {
    let values = ssim_values(a, b, params)?;
    let (w, h) = (values.width(), values.height());
    let map = values.into_buf().into_iter().map(|v| v as f32).collect();
    Ok(ImgVec::new(map, w, h))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: usize, height: usize) -> ImgVec<u8> {
        let pixels = (0..width * height)
            .map(|i| ((i % width) * 7 + (i / width) * 3) as u8)
            .collect();
        ImgVec::new(pixels, width, height)
    }

    fn noise(width: usize, height: usize, seed: u32) -> ImgVec<u8> {
        let mut state = seed;
        let pixels = (0..width * height)
            .map(|_| {
                state = state.wrapping_mul(1664525).wrapping_add(1013904223);
                (state >> 24) as u8
            })
            .collect();
        ImgVec::new(pixels, width, height)
    }

    #[test]
    fn test_identical_images_score_exactly_one() {
        let img = noise(40, 30, 7);
        let ssim = mean_ssim(img.as_ref(), img.as_ref(), &SsimParams::default()).unwrap();
        assert_eq!(ssim, 1.0);
    }

    #[test]
    fn test_symmetry_is_exact() {
        let a = noise(32, 32, 1);
        let b = gradient(32, 32);
        let params = SsimParams::default();
        let ab = mean_ssim(a.as_ref(), b.as_ref(), &params).unwrap();
        let ba = mean_ssim(b.as_ref(), a.as_ref(), &params).unwrap();
        assert_eq!(ab.to_bits(), ba.to_bits());
    }

    #[test]
    fn test_white_vs_black_near_zero() {
        let white = ImgVec::new(vec![255u8; 20 * 20], 20, 20);
        let black = ImgVec::new(vec![0u8; 20 * 20], 20, 20);
        let params = SsimParams::default();
        let ssim = mean_ssim(white.as_ref(), black.as_ref(), &params).unwrap();

        let expected = params.c1() / (255.0 * 255.0 + params.c1());
        assert!((ssim - expected).abs() < 1e-12);
        assert!(ssim < 0.001);
    }

    #[test]
    fn test_inverted_image_is_negative() {
        let a = noise(24, 24, 3);
        let inverted = ImgVec::new(a.pixels().map(|p| 255 - p).collect(), 24, 24);
        let ssim = mean_ssim(a.as_ref(), inverted.as_ref(), &SsimParams::default()).unwrap();
        assert!(ssim < 0.0);
        assert!(ssim >= -1.0);
    }

    #[test]
    fn test_matches_direct_window_computation() {
        let a = noise(9, 9, 11);
        let b = noise(9, 9, 12);
        let params = SsimParams::default();
        let map = ssim_map(a.as_ref(), b.as_ref(), &params).unwrap();
        assert_eq!((map.width(), map.height()), (3, 3));

        // Recompute the window at (1, 2) from plain means.
        let (x0, y0): (usize, usize) = (1, 2);
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for y in y0..y0 + 7 {
            for x in x0..x0 + 7 {
                xs.push(f64::from(a[(x, y)]));
                ys.push(f64::from(b[(x, y)]));
            }
        }
        let n = xs.len() as f64;
        let mx = xs.iter().sum::<f64>() / n;
        let my = ys.iter().sum::<f64>() / n;
        let vx = xs.iter().map(|v| (v - mx).powi(2)).sum::<f64>() / (n - 1.0);
        let vy = ys.iter().map(|v| (v - my).powi(2)).sum::<f64>() / (n - 1.0);
        let cxy = xs
            .iter()
            .zip(&ys)
            .map(|(x, y)| (x - mx) * (y - my))
            .sum::<f64>()
            / (n - 1.0);
        let expected = ((2.0 * mx * my + params.c1()) * (2.0 * cxy + params.c2()))
            / ((mx * mx + my * my + params.c1()) * (vx + vy + params.c2()));

        assert!((f64::from(map[(x0, y0)]) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_dimension_mismatch() {
        let a = gradient(10, 10);
        let b = gradient(12, 10);
        let result = mean_ssim(a.as_ref(), b.as_ref(), &SsimParams::default());
        assert!(matches!(result, Err(Error::Comparison { .. })));
    }

    #[test]
    fn test_smaller_than_window() {
        let a = gradient(5, 5);
        let result = mean_ssim(a.as_ref(), a.as_ref(), &SsimParams::default());
        assert!(matches!(result, Err(Error::Comparison { .. })));
    }

    #[test]
    fn test_invalid_params() {
        let even = SsimParams {
            window: 8,
            ..SsimParams::default()
        };
        assert!(matches!(even.validate(), Err(Error::InvalidConfig(_))));

        let huge = SsimParams {
            window: 6001,
            ..SsimParams::default()
        };
        assert!(matches!(huge.validate(), Err(Error::InvalidConfig(_))));

        let largest = SsimParams {
            window: MAX_WINDOW,
            ..SsimParams::default()
        };
        assert!(largest.validate().is_ok());

        let no_range = SsimParams {
            data_range: 0.0,
            ..SsimParams::default()
        };
        assert!(matches!(no_range.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_constants() {
        let params = SsimParams::default();
        assert!((params.c1() - 6.5025).abs() < 1e-9);
        assert!((params.c2() - 58.5225).abs() < 1e-9);
    }
}
