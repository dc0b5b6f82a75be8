//! Match/no-match classification of similarity scores.
//!
//! The threshold belongs to the caller: the scorer only produces a
//! percentage, and this module turns it into a [`Verdict`]. A score equal to
//! the threshold does **not** match.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default match threshold, in percent.
pub const DEFAULT_THRESHOLD: f64 = 80.0;

/// Outcome of comparing a score against a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Score is strictly above the threshold.
    Match,
    /// Score is at or below the threshold.
    NoMatch,
}

impl Verdict {
    /// Whether the signatures were judged to match.
    #[must_use]
    pub fn is_match(self) -> bool {
        self == Self::Match
    }

    /// Short title suitable for a dialog or log line.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Match => "Success",
            Self::NoMatch => "Failure",
        }
    }

    /// User-facing message for a given score.
    #[must_use]
    pub fn message(self, score: f64) -> String {
        let outcome = match self {
            Self::Match => "Signatures match successfully!",
            Self::NoMatch => "Signatures do not match.",
        };
        format!("Signatures are {:.2}% similar!!\n{}", score, outcome)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Match => write!(f, "match"),
            Self::NoMatch => write!(f, "no match"),
        }
    }
}

/// Threshold above which a similarity score counts as a match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct MatchThreshold(f64);

impl MatchThreshold {
    /// Create a threshold, rejecting NaN and infinities.
    pub fn new(percent: f64) -> Result<Self> {
        if percent.is_finite() {
            Ok(Self(percent))
        } else {
            Err(Error::InvalidConfig(format!(
                "threshold must be a finite percentage, got {}",
                percent
            )))
        }
    }

    /// Threshold value in percent.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Classify a score: `score <= threshold` is [`Verdict::NoMatch`].
    #[must_use]
    pub fn classify(self, score: f64) -> Verdict {
        if score > self.0 {
            Verdict::Match
        } else {
            Verdict::NoMatch
        }
    }
}

impl Default for MatchThreshold {
    fn default() -> Self {
        Self(DEFAULT_THRESHOLD)
    }
}

impl TryFrom<f64> for MatchThreshold {
    type Error = Error;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<MatchThreshold> for f64 {
    fn from(threshold: MatchThreshold) -> Self {
        threshold.0
    }
}

impl fmt::Display for MatchThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_is_no_match() {
        let threshold = MatchThreshold::default();
        assert_eq!(threshold.classify(79.99), Verdict::NoMatch);
        assert_eq!(threshold.classify(80.0), Verdict::NoMatch);
        assert_eq!(threshold.classify(80.01), Verdict::Match);
    }

    #[test]
    fn test_negative_scores_are_no_match() {
        let threshold = MatchThreshold::default();
        assert_eq!(threshold.classify(-42.5), Verdict::NoMatch);
    }

    #[test]
    fn test_custom_threshold() {
        let threshold = MatchThreshold::new(95.0).unwrap();
        assert!(!threshold.classify(90.0).is_match());
        assert!(threshold.classify(95.5).is_match());
    }

    #[test]
    fn test_rejects_nan() {
        assert!(matches!(
            MatchThreshold::new(f64::NAN),
            Err(Error::InvalidConfig(_))
        ));
        assert!(MatchThreshold::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_messages() {
        let msg = Verdict::NoMatch.message(42.5);
        assert_eq!(
            msg,
            "Signatures are 42.50% similar!!\nSignatures do not match."
        );
        assert_eq!(Verdict::Match.title(), "Success");
        let msg = Verdict::Match.message(99.0);
        assert!(msg.ends_with("Signatures match successfully!"));
    }

    #[test]
    fn test_serde_format() {
        let json = serde_json::to_string(&MatchThreshold::default()).unwrap();
        assert_eq!(json, "80.0");
        assert_eq!(
            serde_json::to_string(&Verdict::NoMatch).unwrap(),
            "\"no_match\""
        );
    }
}
