//! Change notification payload

use serde::{Deserialize, Serialize};

/// Payload delivered to subscribers after a rating mutation.
///
/// Carries the freshly recomputed aggregate so listeners can update
/// without re-reading the repository; the recipe id is empty for
/// store-wide broadcasts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingChange {
    /// Recipe whose ratings changed
    pub recipe_id: String,
    /// Fresh average after the mutation
    pub average: f64,
    /// Fresh sample count after the mutation
    pub count: usize,
    /// Unix milliseconds at emission time
    pub timestamp: u64,
}
