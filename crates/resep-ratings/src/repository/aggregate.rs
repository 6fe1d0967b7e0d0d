//! Aggregation engine
//!
//! Builds one additive sample set per recipe from every contributing
//! source and reduces it to an average/count pair. The engine is a pure
//! function of the raw rating sources; the only state it touches is the
//! derived legacy projection.

use serde_json::Value;
use std::time::Instant;
use tracing::warn;

use resep_ratings_core::{
    Clock, RatingAggregate, RatingMetrics, RatingOperation, RatingStore, Score,
};

use super::{LegacyRatingsDoc, RatingRepository, UserRatingsDoc};
use crate::keys::{self, LEGACY_RATINGS_KEY, USER_RATINGS_KEY};

impl<S, C, M> RatingRepository<S, C, M>
where
    S: RatingStore,
    C: Clock,
    M: RatingMetrics,
{
    /// Compute the aggregate for `recipe_id` directly from the raw
    /// sources, bypassing the cache.
    pub fn compute_aggregate(&self, recipe_id: &str) -> RatingAggregate {
        self.compute_aggregate_with_default(recipe_id, 0.0)
    }

    /// Like [`Self::compute_aggregate`], with an externally supplied
    /// default sample included when it is a finite number in (0, 5].
    ///
    /// Sources, in inclusion order (all additive, none takes precedence):
    /// per-user scores, the explicitly set legacy rating, the default, and
    /// pre-migration compound-key entries. Invalid candidates drop
    /// silently. When any sample contributed, the average is also written
    /// through to the legacy slot as a projection for older readers.
    pub fn compute_aggregate_with_default(
        &self,
        recipe_id: &str,
        default_score: f64,
    ) -> RatingAggregate {
        let start = Instant::now();

        let samples = self.collect_samples(recipe_id, default_score);
        let aggregate = RatingAggregate::from_samples(&samples);

        if aggregate.average > 0.0 {
            self.write_projection(recipe_id, aggregate.average);
        }

        self.metrics
            .record_latency(RatingOperation::Compute, start.elapsed());
        aggregate
    }

    fn collect_samples(&self, recipe_id: &str, default_score: f64) -> Vec<f64> {
        let mut samples = Vec::new();

        // 1. Per-user scores for this recipe.
        let users: UserRatingsDoc = self.load_doc(USER_RATINGS_KEY);
        if let Some(per_recipe) = users.get(recipe_id) {
            samples.extend(
                per_recipe
                    .values()
                    .filter_map(Score::from_json)
                    .map(Score::as_f64),
            );
        }

        // 2. The explicitly set legacy rating. Floats in this slot are
        //    write-through projections, not ratings, and never re-enter
        //    the sample set.
        let legacy: LegacyRatingsDoc = self.load_doc(LEGACY_RATINGS_KEY);
        if let Some(value) = legacy.get(recipe_id) {
            if value.as_i64().is_some() || value.as_u64().is_some() {
                if let Some(score) = Score::from_json(value) {
                    samples.push(score.as_f64());
                }
            }
        }

        // 3. The externally supplied default, included as-is.
        if default_score.is_finite() && default_score > 0.0 && default_score <= 5.0 {
            samples.push(default_score);
        }

        // 4. Pre-migration compound keys for this recipe.
        let prefix = keys::legacy_prefix_for(recipe_id);
        match self.store.keys() {
            Ok(all_keys) => {
                for key in all_keys.iter().filter(|key| key.starts_with(&prefix)) {
                    if let Ok(Some(raw)) = self.store.get(key) {
                        if let Some(score) = Score::parse_sample(&raw) {
                            samples.push(score.as_f64());
                        }
                    }
                }
            }
            Err(err) => {
                warn!(
                    target: "resep_ratings",
                    recipe_id,
                    %err,
                    "key scan failed, skipping compound-key samples"
                );
            }
        }

        samples
    }

    /// Mirror the fresh average into the legacy slot for older readers.
    ///
    /// Stored as a JSON float so `collect_samples` can tell it apart from
    /// an explicitly set integer rating, which is raw data and is never
    /// overwritten here.
    fn write_projection(&self, recipe_id: &str, average: f64) {
        let mut legacy: LegacyRatingsDoc = self.load_doc(LEGACY_RATINGS_KEY);
        if legacy
            .get(recipe_id)
            .is_some_and(|value| value.as_i64().is_some() || value.as_u64().is_some())
        {
            return;
        }

        legacy.insert(recipe_id.to_string(), Value::from(average));
        if let Err(err) = self.save_doc(LEGACY_RATINGS_KEY, &legacy) {
            warn!(
                target: "resep_ratings",
                recipe_id,
                %err,
                "failed to write legacy projection"
            );
        }
    }
}
