//! Validated rating score

use crate::{RatingError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest accepted score, inclusive.
pub const MIN_SCORE: u8 = 1;
/// Highest accepted score, inclusive.
pub const MAX_SCORE: u8 = 5;

/// An integer rating in [1, 5].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Score(u8);

impl Score {
    /// Validate `score` into the accepted range.
    pub fn new(score: i64) -> Result<Self> {
        if (i64::from(MIN_SCORE)..=i64::from(MAX_SCORE)).contains(&score) {
            Ok(Self(score as u8))
        } else {
            Err(RatingError::InvalidScore { score })
        }
    }

    /// Lenient reading of a persisted sample: truncate toward zero, then
    /// range-check. Non-finite and out-of-range values yield `None`.
    pub fn from_sample(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        Self::new(value.trunc() as i64).ok()
    }

    /// Parse a raw stored string the way the legacy compound keys were
    /// written (integer text, tolerating a fractional tail).
    pub fn parse_sample(raw: &str) -> Option<Self> {
        raw.trim().parse::<f64>().ok().and_then(Self::from_sample)
    }

    /// Read a sample out of a persisted JSON value, accepting numbers and
    /// numeric strings; everything else is dropped.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_f64().and_then(Self::from_sample),
            serde_json::Value::String(s) => Self::parse_sample(s),
            _ => None,
        }
    }

    /// The score as a plain integer.
    pub fn value(self) -> u8 {
        self.0
    }

    /// The score as a sample contribution.
    pub fn as_f64(self) -> f64 {
        f64::from(self.0)
    }
}

impl TryFrom<i64> for Score {
    type Error = RatingError;

    fn try_from(score: i64) -> Result<Self> {
        Self::new(score)
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> u8 {
        score.value()
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_full_range() {
        for s in 1..=5 {
            assert_eq!(Score::new(s).unwrap().value(), s as u8);
        }
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(Score::new(0).is_err());
        assert!(Score::new(6).is_err());
        assert!(Score::new(-3).is_err());
    }

    #[test]
    fn test_from_sample_truncates() {
        assert_eq!(Score::from_sample(4.7).unwrap().value(), 4);
        assert_eq!(Score::from_sample(1.0).unwrap().value(), 1);
        assert!(Score::from_sample(0.9).is_none());
        assert!(Score::from_sample(5.5).is_some()); // trunc -> 5
        assert!(Score::from_sample(6.0).is_none());
        assert!(Score::from_sample(f64::NAN).is_none());
        assert!(Score::from_sample(f64::INFINITY).is_none());
    }

    #[test]
    fn test_parse_sample() {
        assert_eq!(Score::parse_sample("2").unwrap().value(), 2);
        assert_eq!(Score::parse_sample(" 4 ").unwrap().value(), 4);
        assert_eq!(Score::parse_sample("4.7").unwrap().value(), 4);
        assert!(Score::parse_sample("abc").is_none());
        assert!(Score::parse_sample("9").is_none());
    }

    #[test]
    fn test_from_json() {
        assert_eq!(Score::from_json(&serde_json::json!(3)).unwrap().value(), 3);
        assert_eq!(
            Score::from_json(&serde_json::json!("5")).unwrap().value(),
            5
        );
        assert!(Score::from_json(&serde_json::json!(null)).is_none());
        assert!(Score::from_json(&serde_json::json!([1, 2])).is_none());
    }
}
