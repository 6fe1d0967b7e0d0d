//! One-time legacy schema migration
//!
//! Pre-migration origins store one compound key per vote,
//! `recipe-<id>-rating-<userId>`. The sweep folds each into the per-user
//! collection by replaying it as a normal rating write. Compound keys are
//! left in place: the aggregation engine still reads them, and re-running
//! the sweep just re-sets identical values.

use std::time::Instant;
use tracing::{debug, warn};

use resep_ratings_core::{Clock, RatingMetrics, RatingOperation, RatingStore, Result, Score};

use super::RatingRepository;
use crate::keys::{self, MIGRATION_FLAG_KEY};

impl<S, C, M> RatingRepository<S, C, M>
where
    S: RatingStore,
    C: Clock,
    M: RatingMetrics,
{
    /// Run the migration sweep at most once per store, guarded by the
    /// persisted flag. Returns whether the sweep ran.
    pub fn initialize(&self) -> Result<bool> {
        if self.store.contains(MIGRATION_FLAG_KEY).unwrap_or(false) {
            return Ok(false);
        }

        self.migrate_legacy_ratings()?;
        self.store.set(MIGRATION_FLAG_KEY, "true")?;
        Ok(true)
    }

    /// Replay every compound-key rating into the per-user collection.
    /// Returns the number of entries replayed.
    pub fn migrate_legacy_ratings(&self) -> Result<usize> {
        let start = Instant::now();

        let all_keys = match self.store.keys() {
            Ok(all_keys) => all_keys,
            Err(err) => {
                warn!(
                    target: "resep_ratings",
                    %err,
                    "key scan failed, nothing to migrate"
                );
                Vec::new()
            }
        };

        let mut migrated = 0usize;
        for key in &all_keys {
            let Some((recipe_id, user_id)) = keys::parse_legacy_key(key) else {
                continue;
            };
            let Ok(Some(raw)) = self.store.get(key) else {
                continue;
            };
            let Some(score) = Score::parse_sample(&raw) else {
                continue;
            };

            match self.set_user_rating(recipe_id, user_id, score.value()) {
                Ok(_) => migrated += 1,
                Err(err) => {
                    warn!(
                        target: "resep_ratings",
                        key,
                        %err,
                        "failed to replay legacy rating"
                    );
                }
            }
        }

        self.metrics
            .record_latency(RatingOperation::Migrate, start.elapsed());
        debug!(
            target: "resep_ratings",
            migrated,
            "legacy rating migration completed"
        );
        Ok(migrated)
    }
}
