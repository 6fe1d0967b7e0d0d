//! Rating repository: the sole mutation gateway to the persisted rating
//! collections
//!
//! Three logical collections live behind this type — per-user ratings, the
//! legacy global ratings, and the cached aggregates — each serialized as
//! one JSON document in the store. Every mutation runs the same sequence:
//! persist the document, evict the recipe's cached aggregate, then fan out
//! a change notification carrying the freshly recomputed aggregate. No
//! other component touches the raw store.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use resep_ratings_core::{
    CachedAggregate, Clock, DEFAULT_CACHE_TTL, NoopMetrics, RatingAggregate, RatingChange,
    RatingError, RatingMetrics, RatingOperation, RatingStore, RatingSubmission,
    RemoteRatingSource, Result, Score, SystemClock,
};

use crate::keys::{LEGACY_RATINGS_KEY, MIGRATION_FLAG_KEY, RATING_CACHE_KEY, USER_RATINGS_KEY};
use crate::notify::{ChangeNotifier, Subscription};

mod aggregate;
mod cache;
mod migrate;

/// Persisted shape of `userRatings`: recipeId -> (userId -> score).
pub(crate) type UserRatingsDoc = BTreeMap<String, BTreeMap<String, Value>>;
/// Persisted shape of `recipeRatings`: recipeId -> score or projection.
pub(crate) type LegacyRatingsDoc = BTreeMap<String, Value>;
/// Persisted shape of `ratingCache`: recipeId -> {average, count, timestamp}.
pub(crate) type CacheDoc = BTreeMap<String, Value>;

/// Configuration for [`RatingRepository`]
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    /// Freshness window for cached aggregates
    pub cache_ttl: Duration,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }
}

impl RepositoryConfig {
    /// Create config with a specific cache TTL
    pub fn with_ttl(cache_ttl: Duration) -> Self {
        Self { cache_ttl }
    }
}

/// Rating repository over a persistent store
///
/// Generic over:
/// - `S`: the store backend
/// - `C`: the time source for cache freshness
/// - `M`: the metrics collector
pub struct RatingRepository<S, C = SystemClock, M = NoopMetrics>
where
    S: RatingStore,
    C: Clock,
    M: RatingMetrics,
{
    store: S,
    clock: C,
    metrics: M,
    notifier: ChangeNotifier,
    config: RepositoryConfig,
}

// Constructors for default clock/metrics
impl<S: RatingStore> RatingRepository<S> {
    /// Create a repository with wall-clock time and no metrics
    pub fn new(store: S) -> Self {
        Self::with_config(store, RepositoryConfig::default())
    }

    /// Create with custom config
    pub fn with_config(store: S, config: RepositoryConfig) -> Self {
        Self {
            store,
            clock: SystemClock,
            metrics: NoopMetrics,
            notifier: ChangeNotifier::new(),
            config,
        }
    }
}

// Full generic implementation
impl<S, C, M> RatingRepository<S, C, M>
where
    S: RatingStore,
    C: Clock,
    M: RatingMetrics,
{
    /// Create a repository with a custom clock and metrics collector
    pub fn with_clock_and_metrics(store: S, clock: C, metrics: M, config: RepositoryConfig) -> Self {
        Self {
            store,
            clock,
            metrics,
            notifier: ChangeNotifier::new(),
            config,
        }
    }

    // ---- per-user ratings -------------------------------------------------

    /// Store `score` for the (recipe, user) pair, overwriting any prior
    /// score; last write wins.
    ///
    /// Fails with [`RatingError::MissingIdentifier`] on an empty id and
    /// [`RatingError::InvalidScore`] outside [1, 5], leaving prior state
    /// unchanged. On success the recipe's cache entry is evicted and
    /// subscribers are notified with the fresh aggregate, which is also
    /// returned.
    pub fn set_user_rating(
        &self,
        recipe_id: &str,
        user_id: &str,
        score: u8,
    ) -> Result<RatingAggregate> {
        require_id(recipe_id, "recipe id")?;
        require_id(user_id, "user id")?;
        let score = Score::new(i64::from(score))?;

        let mut ratings: UserRatingsDoc = self.load_doc(USER_RATINGS_KEY);
        ratings
            .entry(recipe_id.to_string())
            .or_default()
            .insert(user_id.to_string(), Value::from(score.value()));
        self.save_doc(USER_RATINGS_KEY, &ratings)?;

        self.invalidate(recipe_id)?;
        Ok(self.notify(recipe_id))
    }

    /// The score `user_id` gave `recipe_id`, if any.
    pub fn user_rating(&self, recipe_id: &str, user_id: &str) -> Option<Score> {
        let ratings: UserRatingsDoc = self.load_doc(USER_RATINGS_KEY);
        ratings.get(recipe_id)?.get(user_id).and_then(Score::from_json)
    }

    /// Remove one user's score. Returns whether an entry existed; the
    /// recipe's sub-map is dropped when it empties.
    pub fn remove_user_rating(&self, recipe_id: &str, user_id: &str) -> Result<bool> {
        let mut ratings: UserRatingsDoc = self.load_doc(USER_RATINGS_KEY);
        let Some(per_recipe) = ratings.get_mut(recipe_id) else {
            return Ok(false);
        };
        if per_recipe.remove(user_id).is_none() {
            return Ok(false);
        }
        if per_recipe.is_empty() {
            ratings.remove(recipe_id);
        }
        self.save_doc(USER_RATINGS_KEY, &ratings)?;

        self.invalidate(recipe_id)?;
        self.notify(recipe_id);
        Ok(true)
    }

    /// Every per-user score recorded for `recipe_id`.
    pub fn user_ratings_for(&self, recipe_id: &str) -> BTreeMap<String, Score> {
        let ratings: UserRatingsDoc = self.load_doc(USER_RATINGS_KEY);
        ratings
            .get(recipe_id)
            .map(|per_recipe| {
                per_recipe
                    .iter()
                    .filter_map(|(user, value)| {
                        Score::from_json(value).map(|score| (user.clone(), score))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    // ---- legacy global ratings --------------------------------------------

    /// Store the unattributed global rating for a recipe, as a JSON
    /// integer. Validated like [`Self::set_user_rating`].
    pub fn set_legacy_rating(&self, recipe_id: &str, score: u8) -> Result<()> {
        require_id(recipe_id, "recipe id")?;
        let score = Score::new(i64::from(score))?;

        let mut legacy: LegacyRatingsDoc = self.load_doc(LEGACY_RATINGS_KEY);
        legacy.insert(recipe_id.to_string(), Value::from(score.value()));
        self.save_doc(LEGACY_RATINGS_KEY, &legacy)?;

        self.invalidate(recipe_id)?;
        self.notify(recipe_id);
        Ok(())
    }

    /// Raw value in the legacy slot: an explicitly set rating (integer) or
    /// a projected average (float). Use [`Self::aggregate`] for the
    /// reconciled value.
    pub fn legacy_rating(&self, recipe_id: &str) -> Option<f64> {
        let legacy: LegacyRatingsDoc = self.load_doc(LEGACY_RATINGS_KEY);
        legacy.get(recipe_id).and_then(Value::as_f64)
    }

    // ---- cascade and bulk reads -------------------------------------------

    /// Cascade hook for recipe deletion: purge the per-user entries, the
    /// legacy entry, and the cached aggregate for `recipe_id`. Idempotent
    /// when nothing existed.
    pub fn remove_all_ratings(&self, recipe_id: &str) -> Result<()> {
        let mut users: UserRatingsDoc = self.load_doc(USER_RATINGS_KEY);
        if users.remove(recipe_id).is_some() {
            self.save_doc(USER_RATINGS_KEY, &users)?;
        }

        let mut legacy: LegacyRatingsDoc = self.load_doc(LEGACY_RATINGS_KEY);
        if legacy.remove(recipe_id).is_some() {
            self.save_doc(LEGACY_RATINGS_KEY, &legacy)?;
        }

        self.invalidate(recipe_id)?;
        self.notify(recipe_id);
        Ok(())
    }

    /// One display value per known recipe: the legacy slot overlaid with
    /// cached averages where one exists. Freshness is not consulted; this
    /// feeds list views that tolerate slightly stale numbers.
    pub fn all_ratings(&self) -> BTreeMap<String, f64> {
        let legacy: LegacyRatingsDoc = self.load_doc(LEGACY_RATINGS_KEY);
        let mut out: BTreeMap<String, f64> = legacy
            .iter()
            .filter_map(|(id, value)| value.as_f64().map(|avg| (id.clone(), avg)))
            .collect();

        let cache: CacheDoc = self.load_doc(RATING_CACHE_KEY);
        for (id, value) in cache {
            if let Ok(entry) = serde_json::from_value::<CachedAggregate>(value) {
                out.insert(id, entry.average);
            }
        }
        out
    }

    /// Remove every rating document and the migration flag, then fire the
    /// global broadcast so list views re-derive.
    pub fn reset(&self) -> Result<()> {
        for key in [
            USER_RATINGS_KEY,
            LEGACY_RATINGS_KEY,
            RATING_CACHE_KEY,
            MIGRATION_FLAG_KEY,
        ] {
            self.store.remove(key)?;
        }

        let change = RatingChange {
            recipe_id: String::new(),
            average: 0.0,
            count: 0,
            timestamp: self.clock.now_millis(),
        };
        let delivered = self.notifier.emit_global(&change);
        self.metrics.record_notified(delivered);
        Ok(())
    }

    // ---- convenience reads ------------------------------------------------

    /// Just the average, through the cache.
    pub fn average(&self, recipe_id: &str, default_score: f64) -> f64 {
        self.aggregate_with_default(recipe_id, default_score).average
    }

    /// Just the sample count, through the cache.
    pub fn rating_count(&self, recipe_id: &str) -> usize {
        self.aggregate(recipe_id).count
    }

    // ---- remote collaborator ----------------------------------------------

    /// Best display value: the remote summary when the service answers,
    /// otherwise the locally reconciled aggregate. Remote data is never
    /// merged into the local sample set.
    pub fn display_aggregate(
        &self,
        recipe_id: &str,
        remote: &dyn RemoteRatingSource,
    ) -> RatingAggregate {
        match remote.fetch_ratings(recipe_id) {
            Ok(summary) => summary.into(),
            Err(err) => {
                debug!(
                    target: "resep_ratings",
                    recipe_id,
                    %err,
                    "remote ratings unavailable, using local aggregate"
                );
                self.aggregate(recipe_id)
            }
        }
    }

    /// Persist a user's rating locally and forward it to the remote
    /// service on a best-effort basis; a remote failure never affects the
    /// local write.
    pub fn submit_rating(
        &self,
        remote: &dyn RemoteRatingSource,
        recipe_id: &str,
        user_id: &str,
        score: u8,
        comment: Option<String>,
    ) -> Result<RatingAggregate> {
        let aggregate = self.set_user_rating(recipe_id, user_id, score)?;

        let submission = RatingSubmission {
            recipe_id: recipe_id.to_string(),
            score,
            comment,
        };
        if let Err(err) = remote.upsert_rating(&submission) {
            debug!(
                target: "resep_ratings",
                recipe_id,
                %err,
                "remote upsert failed, local rating kept"
            );
        }
        Ok(aggregate)
    }

    // ---- subscriptions ----------------------------------------------------

    /// Register a listener for one recipe's changes.
    pub fn subscribe(
        &self,
        recipe_id: impl Into<String>,
        listener: impl Fn(&RatingChange) + Send + Sync + 'static,
    ) -> Subscription {
        self.notifier.subscribe(recipe_id, listener)
    }

    /// Register a listener for every change.
    pub fn subscribe_global(
        &self,
        listener: impl Fn(&RatingChange) + Send + Sync + 'static,
    ) -> Subscription {
        self.notifier.subscribe_global(listener)
    }

    /// Remove a previously registered listener.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        self.notifier.unsubscribe(subscription)
    }

    // ---- internals --------------------------------------------------------

    /// Recompute after a mutation and fan out change signals.
    ///
    /// Fires strictly after the triggering store write, so a listener
    /// re-reading the repository observes the new state. Runs through the
    /// engine directly rather than the cache: the next cache entry is
    /// created lazily by the first read after the invalidation.
    fn notify(&self, recipe_id: &str) -> RatingAggregate {
        let start = Instant::now();
        let aggregate = self.compute_aggregate(recipe_id);

        let change = RatingChange {
            recipe_id: recipe_id.to_string(),
            average: aggregate.average,
            count: aggregate.count,
            timestamp: self.clock.now_millis(),
        };
        let delivered = self.notifier.emit(&change);

        self.metrics.record_notified(delivered);
        self.metrics
            .record_latency(RatingOperation::Notify, start.elapsed());
        aggregate
    }

    /// Read a whole document, degrading to its empty form when the store
    /// fails or the content is not valid JSON.
    fn load_doc<T>(&self, key: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return T::default(),
            Err(err) => {
                warn!(
                    target: "resep_ratings",
                    key,
                    %err,
                    "store read failed, treating document as empty"
                );
                return T::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(doc) => doc,
            Err(err) => {
                warn!(
                    target: "resep_ratings",
                    key,
                    %err,
                    "corrupt document, treating as empty"
                );
                T::default()
            }
        }
    }

    /// Serialize and persist a whole document.
    fn save_doc<T: Serialize>(&self, key: &str, doc: &T) -> Result<()> {
        let raw =
            serde_json::to_string(doc).map_err(|e| RatingError::Serialization(e.to_string()))?;
        self.store.set(key, &raw)
    }
}

fn require_id(value: &str, field: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RatingError::MissingIdentifier(field));
    }
    Ok(())
}
