//! Report types for comparison results.
//!
//! This module defines the data structures for comparison reports that can
//! be serialized to JSON or CSV.

use std::path::Path;

use imgref::ImgRef;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::metrics::MetricResult;
use crate::normalize::NormalizedImage;
use crate::verdict::{MatchThreshold, Verdict};

/// Result of comparing one pair of images.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// Label of the first image.
    pub source_a: String,

    /// Label of the second image.
    pub source_b: String,

    /// Dimensions of the first image as decoded.
    pub original_size_a: (usize, usize),

    /// Dimensions of the second image as decoded.
    pub original_size_b: (usize, usize),

    /// Size both images were normalized to.
    pub canonical_size: (usize, usize),

    /// Mean SSIM, unrounded, in `[-1, 1]`.
    pub ssim: f64,

    /// Similarity percentage rounded to two decimals.
    pub score: f64,

    /// Threshold used for the verdict, if one was applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<MatchThreshold>,

    /// Match verdict, if a threshold was applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,

    /// Optional diagnostic metrics.
    #[serde(default)]
    pub metrics: MetricResult,

    /// When this report was generated.
    #[serde(with = "chrono_serde")]
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ComparisonReport {
    /// Create a report for two normalized images.
    #[must_use]
    pub fn new(
        a: &NormalizedImage,
        b: &NormalizedImage,
        ssim: f64,
        score: f64,
        metrics: MetricResult,
    ) -> Self {
        Self {
            source_a: a.label().to_string(),
            source_b: b.label().to_string(),
            original_size_a: a.original_size(),
            original_size_b: b.original_size(),
            canonical_size: a.size(),
            ssim,
            score,
            threshold: None,
            verdict: None,
            metrics,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Classify the score against `threshold` and record the outcome.
    #[must_use]
    pub fn with_verdict(mut self, threshold: MatchThreshold) -> Self {
        self.verdict = Some(threshold.classify(self.score));
        self.threshold = Some(threshold);
        self
    }

    /// Whether a verdict was recorded and it is a match.
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.verdict.is_some_and(Verdict::is_match)
    }
}

/// Outcome for one candidate in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchEntry {
    /// The candidate was scored.
    Scored(ComparisonReport),

    /// The candidate could not be scored.
    Failed {
        /// Candidate label.
        source: String,
        /// Error message.
        error: String,
    },
}

impl BatchEntry {
    /// Candidate label.
    #[must_use]
    pub fn candidate(&self) -> &str {
        match self {
            Self::Scored(report) => &report.source_b,
            Self::Failed { source, .. } => source,
        }
    }

    /// Score, if the candidate was scored.
    #[must_use]
    pub fn score(&self) -> Option<f64> {
        match self {
            Self::Scored(report) => Some(report.score),
            Self::Failed { .. } => None,
        }
    }
}

/// Report for one reference compared against many candidates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// Reference image label.
    pub reference: String,

    /// Threshold applied to every candidate.
    pub threshold: MatchThreshold,

    /// One entry per candidate, in input order.
    pub entries: Vec<BatchEntry>,

    /// When this report was generated.
    #[serde(with = "chrono_serde")]
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl BatchReport {
    /// Create an empty batch report.
    #[must_use]
    pub fn new(reference: String, threshold: MatchThreshold) -> Self {
        Self {
            reference,
            threshold,
            entries: Vec::new(),
            timestamp: chrono::Utc::now(),
        }
    }

    /// Scored entries that match.
    pub fn matches(&self) -> impl Iterator<Item = &ComparisonReport> {
        self.entries.iter().filter_map(|e| match e {
            BatchEntry::Scored(report) if report.is_match() => Some(report),
            _ => None,
        })
    }

    /// Number of entries that failed to score.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, BatchEntry::Failed { .. }))
            .count()
    }

    /// Highest-scoring candidate.
    #[must_use]
    pub fn best(&self) -> Option<&ComparisonReport> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                BatchEntry::Scored(report) => Some(report),
                BatchEntry::Failed { .. } => None,
            })
            .max_by(|a, b| a.score.total_cmp(&b.score))
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Write a flat CSV summary, one row per candidate.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path)?;

        wtr.write_record([
            "reference",
            "candidate",
            "score",
            "threshold",
            "ssim",
            "verdict",
            "dssim",
            "psnr",
            "error",
        ])?;

        let threshold = format!("{:.2}", self.threshold.value());
        for entry in &self.entries {
            let row: [String; 9] = match entry {
                BatchEntry::Scored(report) => [
                    self.reference.clone(),
                    report.source_b.clone(),
                    format!("{:.2}", report.score),
                    threshold.clone(),
                    format!("{:.6}", report.ssim),
                    report.verdict.map_or(String::new(), |v| v.to_string()),
                    optional_column(report.metrics.dssim, 6),
                    optional_column(report.metrics.psnr, 2),
                    String::new(),
                ],
                BatchEntry::Failed { source, error } => [
                    self.reference.clone(),
                    source.clone(),
                    String::new(),
                    threshold.clone(),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                    error.clone(),
                ],
            };
            wtr.write_record(&row)?;
        }

        wtr.flush()?;
        Ok(())
    }
}

fn optional_column(value: Option<f64>, decimals: usize) -> String {
    value.map_or(String::new(), |v| format!("{v:.decimals$}"))
}

/// Save an SSIM map as an 8-bit grayscale image.
///
/// Values are clamped to `[0, 1]` and scaled to `0..=255`, so dissimilar
/// regions show up dark.
pub fn write_ssim_map(map: ImgRef<'_, f32>, path: &Path) -> Result<()> {
    let pixels: Vec<u8> = map
        .pixels()
        .map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect();
    let img = image::GrayImage::from_raw(map.width() as u32, map.height() as u32, pixels)
        .ok_or_else(|| Error::ImageEncode("SSIM map buffer size mismatch".to_string()))?;
    img.save(path)
        .map_err(|e| Error::ImageEncode(format!("{}: {}", path.display(), e)))
}

mod chrono_serde {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        dt.to_rfc3339().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
