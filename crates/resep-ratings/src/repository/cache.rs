//! Cache manager
//!
//! Aggregates are cached per recipe inside the cache document, stamped
//! with their computation time. Freshness is checked lazily on read; there
//! is no background sweeper. The cache is a pure performance layer: with
//! it emptied, every read equals a fresh engine computation.

use resep_ratings_core::{
    CacheLookup, CachedAggregate, Clock, EvictionReason, RatingAggregate, RatingMetrics,
    RatingStore, Result,
};
use tracing::warn;

use super::{CacheDoc, RatingRepository};
use crate::keys::RATING_CACHE_KEY;

impl<S, C, M> RatingRepository<S, C, M>
where
    S: RatingStore,
    C: Clock,
    M: RatingMetrics,
{
    /// Probe the cache for `recipe_id`.
    ///
    /// A fresh entry hits; an absent, expired, or unreadable entry is
    /// evicted from the persisted document and reported as a miss.
    pub fn cached_aggregate(&self, recipe_id: &str) -> CacheLookup {
        let mut cache: CacheDoc = self.load_doc(RATING_CACHE_KEY);
        let Some(value) = cache.get(recipe_id) else {
            self.metrics.record_miss(recipe_id);
            return CacheLookup::Miss;
        };

        match serde_json::from_value::<CachedAggregate>(value.clone()) {
            Ok(entry) if entry.is_fresh(self.clock.now_millis(), self.cache_ttl_millis()) => {
                self.metrics.record_hit(recipe_id);
                CacheLookup::Hit(entry)
            }
            Ok(_) => {
                self.evict(&mut cache, recipe_id, EvictionReason::Expired);
                CacheLookup::Miss
            }
            Err(err) => {
                warn!(
                    target: "resep_ratings",
                    recipe_id,
                    %err,
                    "corrupt cache entry, treating as miss"
                );
                self.evict(&mut cache, recipe_id, EvictionReason::Corrupt);
                CacheLookup::Miss
            }
        }
    }

    /// The recipe's aggregate, served from cache when fresh.
    pub fn aggregate(&self, recipe_id: &str) -> RatingAggregate {
        self.aggregate_with_default(recipe_id, 0.0)
    }

    /// Cache hit short-circuits; a miss runs the engine and stores a
    /// freshly stamped entry.
    pub fn aggregate_with_default(&self, recipe_id: &str, default_score: f64) -> RatingAggregate {
        if let CacheLookup::Hit(entry) = self.cached_aggregate(recipe_id) {
            return entry.aggregate();
        }

        let aggregate = self.compute_aggregate_with_default(recipe_id, default_score);
        self.store_entry(recipe_id, CachedAggregate::new(aggregate, self.now_millis()));
        aggregate
    }

    /// Unconditional eviction, invoked by every mutation path.
    pub fn invalidate(&self, recipe_id: &str) -> Result<()> {
        let mut cache: CacheDoc = self.load_doc(RATING_CACHE_KEY);
        if cache.remove(recipe_id).is_some() {
            self.save_doc(RATING_CACHE_KEY, &cache)?;
            self.metrics.record_eviction(EvictionReason::Invalidated);
        }
        Ok(())
    }

    fn now_millis(&self) -> u64 {
        self.clock.now_millis()
    }

    fn cache_ttl_millis(&self) -> u64 {
        self.config.cache_ttl.as_millis() as u64
    }

    /// Drop one entry and persist the shrunken document. A persist failure
    /// only costs a recomputation later.
    fn evict(&self, cache: &mut CacheDoc, recipe_id: &str, reason: EvictionReason) {
        cache.remove(recipe_id);
        if let Err(err) = self.save_doc(RATING_CACHE_KEY, cache) {
            warn!(
                target: "resep_ratings",
                recipe_id,
                %err,
                "failed to persist cache eviction"
            );
        }
        self.metrics.record_eviction(reason);
        self.metrics.record_miss(recipe_id);
    }

    fn store_entry(&self, recipe_id: &str, entry: CachedAggregate) {
        let mut cache: CacheDoc = self.load_doc(RATING_CACHE_KEY);
        match serde_json::to_value(entry) {
            Ok(value) => {
                cache.insert(recipe_id.to_string(), value);
                if let Err(err) = self.save_doc(RATING_CACHE_KEY, &cache) {
                    warn!(
                        target: "resep_ratings",
                        recipe_id,
                        %err,
                        "failed to store cache entry"
                    );
                }
            }
            Err(err) => {
                warn!(
                    target: "resep_ratings",
                    recipe_id,
                    %err,
                    "failed to encode cache entry"
                );
            }
        }
    }
}
