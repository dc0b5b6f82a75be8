//! Addressable image sources and decoding.
//!
//! An [`ImageSource`] is anything the scorer can decode into pixels: a file
//! path (the common case, from a file picker or a captured frame on disk) or
//! an in-memory encoded buffer. Decoding always yields an 8-bit RGB image;
//! alpha is discarded and 16-bit or grayscale inputs are converted.

use std::fmt;
use std::path::{Path, PathBuf};

use imgref::ImgVec;
use rgb::RGB8;

use crate::error::{Error, Result};

/// An image that can be decoded by the scorer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Encoded image file on disk.
    Path(PathBuf),

    /// Encoded image bytes held in memory.
    Bytes {
        /// Name used in error messages and reports.
        label: String,
        /// Encoded data (PNG, JPEG, ...).
        data: Vec<u8>,
    },
}

impl ImageSource {
    /// Create a source from encoded bytes.
    #[must_use]
    pub fn from_bytes(label: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self::Bytes {
            label: label.into(),
            data: data.into(),
        }
    }

    /// Human-readable label identifying this source.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Bytes { label, .. } => label.clone(),
        }
    }

    /// Decode the source into an RGB8 image.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ImageLoad`] if the file cannot be read, the format is
    /// not recognized, or the data is corrupt, and [`Error::Comparison`] if
    /// the decoded image has no pixels.
    pub fn decode(&self) -> Result<ImgVec<RGB8>> {
        let decoded = match self {
            Self::Path(path) => image::ImageReader::open(path)
                .map_err(|e| self.load_error(e))?
                .with_guessed_format()
                .map_err(|e| self.load_error(e))?
                .decode(),
            Self::Bytes { data, .. } => image::load_from_memory(data),
        }
        .map_err(|e| self.load_error(e))?;

        let rgb = decoded.to_rgb8();
        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::comparison(format!(
                "{}: decoded image has no pixels",
                self.label()
            )));
        }

        log::debug!("decoded {} ({}x{})", self, width, height);

        let pixels: Vec<RGB8> = rgb
            .pixels()
            .map(|p| RGB8::new(p.0[0], p.0[1], p.0[2]))
            .collect();

        Ok(ImgVec::new(pixels, width as usize, height as usize))
    }

    fn load_error(&self, reason: impl ToString) -> Error {
        Error::ImageLoad {
            source_label: self.label(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Bytes { label, data } => write!(f, "{} ({} bytes)", label, data.len()),
        }
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<&PathBuf> for ImageSource {
    fn from(path: &PathBuf) -> Self {
        Self::Path(path.clone())
    }
}

impl From<&str> for ImageSource {
    fn from(path: &str) -> Self {
        Self::Path(PathBuf::from(path))
    }
}

impl From<String> for ImageSource {
    fn from(path: String) -> Self {
        Self::Path(PathBuf::from(path))
    }
}
