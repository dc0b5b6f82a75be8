//! Normalization of decoded images to a comparable form.
//!
//! Both images are reduced to a single luma channel and resampled to the
//! same canonical size before SSIM is computed:
//!
//! 1. **Grayscale**: BT.601 luma in 14-bit fixed point,
//!    `Y = (4899·R + 9617·G + 1868·B + 8192) >> 14`.
//! 2. **Resize**: bilinear interpolation with half-pixel centre alignment
//!    (`src = (dst + 0.5) · scale − 0.5`, clamped to the edge pixels) and
//!    11-bit fixed-point weights. The kernel does not widen when
//!    downscaling, so only the two nearest source pixels per axis
//!    contribute.
//!
//! Everything is integer arithmetic after the weight computation, which
//! keeps the output identical across platforms.

use imgref::{ImgRef, ImgVec};
use rgb::RGB8;

use crate::error::{Error, Result};
use crate::source::ImageSource;

/// Default canonical edge length in pixels.
pub const CANONICAL_SIZE: usize = 300;

const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;
const LUMA_SHIFT: u32 = 14;

const RESIZE_COEF_BITS: u32 = 11;
const RESIZE_COEF_SCALE: u32 = 1 << RESIZE_COEF_BITS;

/// Convert an RGB8 image to single-channel BT.601 luma.
#[must_use]
pub fn to_grayscale(img: ImgRef<'_, RGB8>) -> ImgVec<u8> {
    let pixels: Vec<u8> = img
        .pixels()
        .map(|p| {
            let y = LUMA_R * u32::from(p.r)
                + LUMA_G * u32::from(p.g)
                + LUMA_B * u32::from(p.b)
                + (1 << (LUMA_SHIFT - 1));
            (y >> LUMA_SHIFT) as u8
        })
        .collect();
    ImgVec::new(pixels, img.width(), img.height())
}

/// Source indices and fixed-point weights for one output coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Tap {
    i0: usize,
    i1: usize,
    w0: u32,
    w1: u32,
}

fn linear_taps(src_len: usize, dst_len: usize) -> Vec<Tap> {
    let scale = src_len as f64 / dst_len as f64;
    let last = src_len - 1;

    (0..dst_len)
        .map(|d| {
            let pos = (d as f64 + 0.5) * scale - 0.5;
            let mut start = pos.floor();
            let mut frac = pos - start;
            if start < 0.0 {
                start = 0.0;
                frac = 0.0;
            }
            let start = start as usize;

            if start >= last {
                Tap {
                    i0: last,
                    i1: last,
                    w0: RESIZE_COEF_SCALE,
                    w1: 0,
                }
            } else {
                let w0 = ((1.0 - frac) * f64::from(RESIZE_COEF_SCALE)).round() as u32;
                Tap {
                    i0: start,
                    i1: start + 1,
                    w0,
                    w1: RESIZE_COEF_SCALE - w0,
                }
            }
        })
        .collect()
}

/// Resize a grayscale image with bilinear interpolation.
///
/// # Errors
///
/// Returns [`Error::Comparison`] if the source image is empty or the
/// target size has a zero dimension.
pub fn resize_bilinear(img: ImgRef<'_, u8>, width: usize, height: usize) -> Result<ImgVec<u8>> {
    if img.width() == 0 || img.height() == 0 {
        return Err(Error::comparison("cannot resize an empty image"));
    }
    if width == 0 || height == 0 {
        return Err(Error::comparison(format!(
            "invalid resize target {}x{}",
            width, height
        )));
    }

    if img.width() == width && img.height() == height {
        return Ok(ImgVec::new(img.pixels().collect(), width, height));
    }

    let x_taps = linear_taps(img.width(), width);
    let y_taps = linear_taps(img.height(), height);

    // Horizontal pass over every source row, kept at COEF_SCALE precision.
    let horizontal: Vec<Vec<u32>> = img
        .rows()
        .map(|row| {
            x_taps
                .iter()
                .map(|t| u32::from(row[t.i0]) * t.w0 + u32::from(row[t.i1]) * t.w1)
                .collect()
        })
        .collect();

    let rounding = 1u32 << (2 * RESIZE_COEF_BITS - 1);
    let mut out = Vec::with_capacity(width * height);
    for ty in &y_taps {
        let top = &horizontal[ty.i0];
        let bottom = &horizontal[ty.i1];
        for (a, b) in top.iter().zip(bottom) {
            let v = (a * ty.w0 + b * ty.w1 + rounding) >> (2 * RESIZE_COEF_BITS);
            out.push(v.min(255) as u8);
        }
    }

    Ok(ImgVec::new(out, width, height))
}

/// Convert to grayscale and resize to `width`×`height`.
///
/// # Errors
///
/// See [`resize_bilinear`].
pub fn normalize(img: ImgRef<'_, RGB8>, width: usize, height: usize) -> Result<ImgVec<u8>> {
    let gray = to_grayscale(img);
    resize_bilinear(gray.as_ref(), width, height)
}

/// A decoded image reduced to canonical single-channel form.
///
/// Preparing an image once and reusing it avoids decoding the same
/// reference repeatedly when comparing it against many candidates.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    label: String,
    original_width: usize,
    original_height: usize,
    pixels: ImgVec<u8>,
}

impl NormalizedImage {
    /// Decode `source` and normalize it to `width`×`height`.
    ///
    /// The decoded color buffer is dropped once the grayscale copy exists.
    pub fn from_source(source: &ImageSource, width: usize, height: usize) -> Result<Self> {
        let decoded = source.decode()?;
        let (original_width, original_height) = (decoded.width(), decoded.height());
        let pixels = normalize(decoded.as_ref(), width, height)?;
        drop(decoded);

        log::debug!(
            "normalized {} from {}x{} to {}x{}",
            source,
            original_width,
            original_height,
            width,
            height
        );

        Ok(Self {
            label: source.label(),
            original_width,
            original_height,
            pixels,
        })
    }

    /// Normalize an already-decoded RGB image.
    pub fn from_rgb(
        label: impl Into<String>,
        img: ImgRef<'_, RGB8>,
        width: usize,
        height: usize,
    ) -> Result<Self> {
        Ok(Self {
            label: label.into(),
            original_width: img.width(),
            original_height: img.height(),
            pixels: normalize(img, width, height)?,
        })
    }

    /// Label of the source this image came from.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Dimensions before normalization.
    #[must_use]
    pub fn original_size(&self) -> (usize, usize) {
        (self.original_width, self.original_height)
    }

    /// Dimensions after normalization.
    #[must_use]
    pub fn size(&self) -> (usize, usize) {
        (self.pixels.width(), self.pixels.height())
    }

    /// Normalized grayscale pixels.
    #[must_use]
    pub fn pixels(&self) -> ImgRef<'_, u8> {
        self.pixels.as_ref()
    }
}
