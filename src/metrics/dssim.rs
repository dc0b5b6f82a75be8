//! DSSIM (Structural Dissimilarity) metric calculation.
//!
//! Wraps the `dssim-core` crate. Grayscale values are promoted to linear
//! RGB with equal channels, since dssim-core works in its own color space.

use dssim_core::Dssim;
use imgref::{ImgRef, ImgVec};
use rgb::RGBA;

use crate::error::{Error, Result};

/// Calculate DSSIM between two grayscale images.
///
/// # Returns
///
/// DSSIM value where 0 = identical, higher = more different.
///
/// # Errors
///
/// Returns an error if the images have different dimensions or if DSSIM
/// calculation fails.
pub fn calculate_dssim(a: ImgRef<'_, u8>, b: ImgRef<'_, u8>) -> Result<f64> {
    if a.width() != b.width() || a.height() != b.height() {
        return Err(Error::comparison(format!(
            "dimension mismatch: {}x{} vs {}x{}",
            a.width(),
            a.height(),
            b.width(),
            b.height()
        )));
    }

    let dssim = Dssim::new();

    let a_rgba = gray_to_dssim_image(a);
    let a_image = dssim
        .create_image(&a_rgba)
        .ok_or_else(|| Error::MetricCalculation {
            metric: "DSSIM".to_string(),
            reason: "Failed to create first image".to_string(),
        })?;

    let b_rgba = gray_to_dssim_image(b);
    let b_image = dssim
        .create_image(&b_rgba)
        .ok_or_else(|| Error::MetricCalculation {
            metric: "DSSIM".to_string(),
            reason: "Failed to create second image".to_string(),
        })?;

    let (dssim_val, _ssim_maps) = dssim.compare(&a_image, b_image);

    Ok(f64::from(dssim_val))
}

/// Convert 8-bit gray to the linear RGBA f32 layout dssim-core expects.
#[must_use]
pub fn gray_to_dssim_image(img: ImgRef<'_, u8>) -> ImgVec<RGBA<f32>> {
    let pixels: Vec<RGBA<f32>> = img
        .pixels()
        .map(|g| {
            let v = srgb_to_linear(g);
            RGBA::new(v, v, v, 1.0)
        })
        .collect();

    ImgVec::new(pixels, img.width(), img.height())
}

/// Apply sRGB gamma decoding (sRGB u8 -> linear f32).
#[inline]
fn srgb_to_linear(srgb: u8) -> f32 {
    let s = f32::from(srgb) / 255.0;
    if s <= 0.04045 {
        s / 12.92
    } else {
        ((s + 0.055) / 1.055).powf(2.4)
    }
}
