//! Aggregate and cached-aggregate types

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Freshness window for cached aggregates (5 minutes).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_millis(300_000);

/// Derived average/count summary for one recipe.
///
/// Always reconstructible from the raw rating sources; never itself a
/// source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RatingAggregate {
    /// Mean of all contributing samples, rounded to one decimal.
    pub average: f64,
    /// Number of samples actually included.
    pub count: usize,
}

impl RatingAggregate {
    /// The aggregate of an empty sample set.
    pub const EMPTY: Self = Self {
        average: 0.0,
        count: 0,
    };

    /// Reduce a sample set to its aggregate. The mean is rounded half-up
    /// to one decimal; an empty set yields [`RatingAggregate::EMPTY`].
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::EMPTY;
        }
        let sum: f64 = samples.iter().sum();
        Self {
            average: round_one_decimal(sum / samples.len() as f64),
            count: samples.len(),
        }
    }

    /// Whether any sample contributed.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Round to one decimal, halves away from zero.
fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// A cached aggregate stamped with its computation time.
///
/// Persisted per recipe inside the cache document as
/// `{average, count, timestamp}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CachedAggregate {
    /// Mean of all contributing samples at computation time.
    pub average: f64,
    /// Number of samples included at computation time.
    pub count: usize,
    /// Unix milliseconds at computation time.
    #[serde(rename = "timestamp")]
    pub computed_at: u64,
}

impl CachedAggregate {
    /// Stamp `aggregate` with its computation instant.
    pub fn new(aggregate: RatingAggregate, computed_at: u64) -> Self {
        Self {
            average: aggregate.average,
            count: aggregate.count,
            computed_at,
        }
    }

    /// The aggregate without its timestamp.
    pub fn aggregate(&self) -> RatingAggregate {
        RatingAggregate {
            average: self.average,
            count: self.count,
        }
    }

    /// Whether the entry is still inside its freshness window at `now`.
    pub fn is_fresh(&self, now_millis: u64, ttl_millis: u64) -> bool {
        now_millis.saturating_sub(self.computed_at) < ttl_millis
    }
}

/// Result of a cache probe
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CacheLookup {
    /// Fresh entry inside its TTL window
    Hit(CachedAggregate),
    /// Absent, expired, or unreadable
    Miss,
}

impl CacheLookup {
    /// Check if this is a fresh hit
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheLookup::Hit(_))
    }

    /// Check if this is a miss
    pub fn is_miss(&self) -> bool {
        matches!(self, CacheLookup::Miss)
    }

    /// Extract the entry, consuming the lookup
    pub fn entry(self) -> Option<CachedAggregate> {
        match self {
            CacheLookup::Hit(entry) => Some(entry),
            CacheLookup::Miss => None,
        }
    }
}
