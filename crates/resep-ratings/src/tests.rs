//! Integration tests for RatingRepository

#[cfg(test)]
mod tests {
    use crate::ANONYMOUS_USER;
    use crate::prelude::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    const TTL_MS: u64 = 300_000;

    fn repo() -> RatingRepository<MemoryStore> {
        RatingRepository::new(MemoryStore::new())
    }

    fn repo_at(
        store: MemoryStore,
        clock: ManualClock,
    ) -> RatingRepository<MemoryStore, ManualClock> {
        RatingRepository::with_clock_and_metrics(
            store,
            clock,
            NoopMetrics,
            RepositoryConfig::default(),
        )
    }

    /// Store whose every operation fails, for degradation tests.
    struct FailingStore;

    impl RatingStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(RatingError::Storage("store offline".to_string()))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(RatingError::Storage("store offline".to_string()))
        }

        fn remove(&self, _key: &str) -> Result<()> {
            Err(RatingError::Storage("store offline".to_string()))
        }

        fn keys(&self) -> Result<Vec<String>> {
            Err(RatingError::Storage("store offline".to_string()))
        }
    }

    /// Remote service that answers with a fixed summary and records
    /// submissions.
    struct StubRemote {
        summary: RemoteRatingSummary,
        upserts: Mutex<Vec<RatingSubmission>>,
    }

    impl StubRemote {
        fn with_summary(average: f64, count: usize) -> Self {
            Self {
                summary: RemoteRatingSummary {
                    average,
                    count,
                    ratings: Vec::new(),
                },
                upserts: Mutex::new(Vec::new()),
            }
        }
    }

    impl RemoteRatingSource for StubRemote {
        fn fetch_ratings(&self, _recipe_id: &str) -> Result<RemoteRatingSummary> {
            Ok(self.summary.clone())
        }

        fn upsert_rating(&self, submission: &RatingSubmission) -> Result<()> {
            self.upserts.lock().unwrap().push(submission.clone());
            Ok(())
        }
    }

    /// Remote service that is unreachable.
    struct OfflineRemote;

    impl RemoteRatingSource for OfflineRemote {
        fn fetch_ratings(&self, _recipe_id: &str) -> Result<RemoteRatingSummary> {
            Err(RatingError::Remote("service unreachable".to_string()))
        }

        fn upsert_rating(&self, _submission: &RatingSubmission) -> Result<()> {
            Err(RatingError::Remote("service unreachable".to_string()))
        }
    }

    // ---- repository operations -------------------------------------------

    #[test]
    fn test_set_then_get_roundtrip() {
        let repo = repo();

        for score in 1..=5u8 {
            repo.set_user_rating("42", "alice", score).unwrap();
            assert_eq!(repo.user_rating("42", "alice").unwrap().value(), score);
        }
    }

    #[test]
    fn test_last_write_wins_per_pair() {
        let repo = repo();

        repo.set_user_rating("42", "alice", 2).unwrap();
        repo.set_user_rating("42", "alice", 5).unwrap();

        assert_eq!(repo.user_rating("42", "alice").unwrap().value(), 5);
        assert_eq!(repo.aggregate("42").count, 1);
    }

    #[test]
    fn test_rejects_out_of_range_scores() {
        let repo = repo();
        repo.set_user_rating("42", "alice", 3).unwrap();
        let before = repo.compute_aggregate("42");

        for bad in [0u8, 6] {
            match repo.set_user_rating("42", "alice", bad) {
                Err(RatingError::InvalidScore { score }) => assert_eq!(score, i64::from(bad)),
                other => panic!("expected InvalidScore, got {other:?}"),
            }
        }

        // Prior state unchanged
        assert_eq!(repo.user_rating("42", "alice").unwrap().value(), 3);
        assert_eq!(repo.compute_aggregate("42"), before);
    }

    #[test]
    fn test_rejects_empty_identifiers() {
        let repo = repo();

        assert!(matches!(
            repo.set_user_rating("", "alice", 4),
            Err(RatingError::MissingIdentifier("recipe id"))
        ));
        assert!(matches!(
            repo.set_user_rating("42", "  ", 4),
            Err(RatingError::MissingIdentifier("user id"))
        ));
        assert!(matches!(
            repo.set_legacy_rating("", 4),
            Err(RatingError::MissingIdentifier("recipe id"))
        ));
    }

    #[test]
    fn test_remove_user_rating_flags() {
        let repo = repo();
        repo.set_user_rating("42", "alice", 4).unwrap();

        assert!(repo.remove_user_rating("42", "alice").unwrap());
        assert!(!repo.remove_user_rating("42", "alice").unwrap());
        assert!(repo.user_rating("42", "alice").is_none());
        assert!(repo.user_ratings_for("42").is_empty());
    }

    #[test]
    fn test_user_ratings_for_lists_all_scores() {
        let repo = repo();
        repo.set_user_rating("42", "alice", 5).unwrap();
        repo.set_user_rating("42", "budi", 3).unwrap();
        repo.set_user_rating("7", "citra", 1).unwrap();

        let ratings = repo.user_ratings_for("42");
        assert_eq!(ratings.len(), 2);
        assert_eq!(ratings["alice"].value(), 5);
        assert_eq!(ratings["budi"].value(), 3);
    }

    // ---- aggregation engine ----------------------------------------------

    #[test]
    fn test_scenario_mixed_sources() {
        let repo = repo();
        repo.set_user_rating("42", "u1", 5).unwrap();
        repo.set_user_rating("42", "u2", 3).unwrap();
        repo.set_legacy_rating("42", 4).unwrap();

        let aggregate = repo.compute_aggregate("42");
        assert_eq!(aggregate.average, 4.0);
        assert_eq!(aggregate.count, 3);
    }

    #[test]
    fn test_scenario_no_ratings_anywhere() {
        let repo = repo();

        let aggregate = repo.compute_aggregate_with_default("7", 0.0);
        assert_eq!(aggregate, RatingAggregate::EMPTY);
        assert_eq!(repo.aggregate("7"), RatingAggregate::EMPTY);
    }

    #[test]
    fn test_compute_aggregate_is_idempotent() {
        let repo = repo();
        repo.set_user_rating("42", "u1", 5).unwrap();
        repo.set_user_rating("42", "u2", 3).unwrap();

        // No legacy rating: the first compute writes a projection, which
        // must not feed back into the second.
        let first = repo.compute_aggregate("42");
        let second = repo.compute_aggregate("42");
        assert_eq!(first, second);

        repo.set_legacy_rating("42", 4).unwrap();
        let third = repo.compute_aggregate("42");
        assert_eq!(third, repo.compute_aggregate("42"));
        assert_eq!(third.count, 3);
    }

    #[test]
    fn test_default_score_inclusion_rules() {
        let repo = repo();

        let with_default = repo.compute_aggregate_with_default("7", 4.5);
        assert_eq!(with_default.average, 4.5);
        assert_eq!(with_default.count, 1);

        assert_eq!(
            repo.compute_aggregate_with_default("7b", 0.0),
            RatingAggregate::EMPTY
        );
        assert_eq!(
            repo.compute_aggregate_with_default("7c", 5.5),
            RatingAggregate::EMPTY
        );
        assert_eq!(
            repo.compute_aggregate_with_default("7d", f64::NAN),
            RatingAggregate::EMPTY
        );
    }

    #[test]
    fn test_invalid_persisted_samples_drop_silently() {
        let store = MemoryStore::with_entries([
            (
                "userRatings",
                r#"{"42": {"u1": 5, "u2": 9, "u3": "oops", "u4": null}}"#,
            ),
            ("recipe-42-rating-old", "not-a-number"),
        ]);
        let repo = RatingRepository::new(store);

        let aggregate = repo.compute_aggregate("42");
        assert_eq!(aggregate.average, 5.0);
        assert_eq!(aggregate.count, 1);
    }

    #[test]
    fn test_projection_written_for_older_readers() {
        let repo = repo();
        repo.set_user_rating("42", "u1", 5).unwrap();
        repo.set_user_rating("42", "u2", 4).unwrap();

        // The mutation path already recomputed; the legacy slot now
        // carries the projected average without becoming a sample.
        assert_eq!(repo.legacy_rating("42"), Some(4.5));
        assert_eq!(repo.compute_aggregate("42").count, 2);
    }

    #[test]
    fn test_projection_never_overwrites_explicit_legacy_rating() {
        let repo = repo();
        repo.set_legacy_rating("42", 4).unwrap();
        repo.set_user_rating("42", "u1", 5).unwrap();
        repo.set_user_rating("42", "u2", 3).unwrap();

        let aggregate = repo.compute_aggregate("42");
        assert_eq!(aggregate.count, 3);
        assert_eq!(repo.legacy_rating("42"), Some(4.0));
    }

    // ---- cache manager ----------------------------------------------------

    #[test]
    fn test_cache_matches_engine_within_ttl() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(1_000);
        let repo = repo_at(store, clock.clone());

        repo.set_user_rating("42", "u1", 5).unwrap();
        repo.set_user_rating("42", "u2", 3).unwrap();

        let cached = repo.aggregate("42");
        assert_eq!(cached, repo.compute_aggregate("42"));

        clock.advance(TTL_MS - 1);
        match repo.cached_aggregate("42") {
            CacheLookup::Hit(entry) => {
                assert_eq!(entry.computed_at, 1_000);
                assert_eq!(entry.aggregate(), cached);
            }
            CacheLookup::Miss => panic!("expected fresh cache hit"),
        }
    }

    #[test]
    fn test_cache_recomputes_after_ttl() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(1_000);
        let repo = repo_at(store, clock.clone());

        repo.set_user_rating("42", "u1", 4).unwrap();
        repo.aggregate("42");

        clock.advance(TTL_MS);
        assert!(repo.cached_aggregate("42").is_miss());

        let aggregate = repo.aggregate("42");
        assert_eq!(aggregate.average, 4.0);
        let entry = repo.cached_aggregate("42").entry().unwrap();
        assert_eq!(entry.computed_at, 1_000 + TTL_MS);
    }

    #[test]
    fn test_every_mutation_invalidates_cache() {
        let repo = repo();
        repo.set_user_rating("42", "u1", 4).unwrap();
        repo.set_legacy_rating("42", 3).unwrap();

        repo.aggregate("42");
        repo.set_user_rating("42", "u2", 5).unwrap();
        assert!(repo.cached_aggregate("42").is_miss());

        repo.aggregate("42");
        repo.remove_user_rating("42", "u2").unwrap();
        assert!(repo.cached_aggregate("42").is_miss());

        repo.aggregate("42");
        repo.set_legacy_rating("42", 2).unwrap();
        assert!(repo.cached_aggregate("42").is_miss());

        repo.aggregate("42");
        repo.remove_all_ratings("42").unwrap();
        assert!(repo.cached_aggregate("42").is_miss());
    }

    #[test]
    fn test_corrupt_cache_entry_is_a_miss() {
        let store = MemoryStore::with_entries([
            ("userRatings", r#"{"42": {"u1": 4}}"#),
            ("ratingCache", r#"{"42": {"bogus": true}}"#),
        ]);
        let repo = RatingRepository::new(store);

        assert!(repo.cached_aggregate("42").is_miss());
        // The unreadable entry was evicted; a read repopulates cleanly.
        assert_eq!(repo.aggregate("42").average, 4.0);
        assert!(repo.cached_aggregate("42").is_hit());
    }

    #[test]
    fn test_corrupt_cache_document_is_a_miss() {
        let store = MemoryStore::with_entries([("ratingCache", "not json at all")]);
        let repo = RatingRepository::new(store);

        assert!(repo.cached_aggregate("42").is_miss());
    }

    // ---- cascade ----------------------------------------------------------

    #[test]
    fn test_cascade_removal_purges_everything() {
        let repo = repo();
        repo.set_user_rating("42", "u1", 5).unwrap();
        repo.set_user_rating("42", "u2", 3).unwrap();
        repo.set_legacy_rating("42", 4).unwrap();
        repo.aggregate("42");

        repo.remove_all_ratings("42").unwrap();

        assert_eq!(repo.compute_aggregate("42"), RatingAggregate::EMPTY);
        assert!(repo.cached_aggregate("42").is_miss());
        assert!(repo.legacy_rating("42").is_none());
        assert!(repo.user_ratings_for("42").is_empty());

        // Idempotent when nothing exists
        repo.remove_all_ratings("42").unwrap();
    }

    // ---- migration --------------------------------------------------------

    #[test]
    fn test_migration_replays_compound_keys() {
        let store = MemoryStore::with_entries([
            ("recipe-9-rating-anon", "2"),
            ("recipe-8-rating", "4"),
        ]);
        let repo = RatingRepository::new(store.clone());

        assert!(repo.initialize().unwrap());
        assert_eq!(repo.user_rating("9", ANONYMOUS_USER).unwrap().value(), 2);
        assert_eq!(repo.user_rating("8", ANONYMOUS_USER).unwrap().value(), 4);

        // Guarded: a second initialize does not sweep again
        assert!(!repo.initialize().unwrap());

        // And an explicit re-sweep re-sets identical values
        repo.migrate_legacy_ratings().unwrap();
        assert_eq!(repo.user_rating("9", ANONYMOUS_USER).unwrap().value(), 2);

        // Compound keys are never purged
        assert_eq!(store.get("recipe-9-rating-anon").unwrap().unwrap(), "2");
    }

    #[test]
    fn test_migration_skips_unrelated_and_invalid_keys() {
        let store = MemoryStore::with_entries([
            ("recipe-9-rating-budi", "9"),
            ("recipe-9-favorite", "true"),
            ("token", "abc"),
        ]);
        let repo = RatingRepository::new(store);

        assert_eq!(repo.migrate_legacy_ratings().unwrap(), 0);
        assert!(repo.user_rating("9", "budi").is_none());
    }

    #[test]
    fn test_migrated_votes_stay_additive_with_compound_keys() {
        let store = MemoryStore::with_entries([("recipe-9-rating-budi", "4")]);
        let repo = RatingRepository::new(store);
        repo.initialize().unwrap();

        // The same vote now exists as a per-user entry and as the
        // never-purged compound key, and both sources contribute.
        let aggregate = repo.compute_aggregate("9");
        assert_eq!(aggregate.average, 4.0);
        assert_eq!(aggregate.count, 2);
    }

    // ---- error handling ---------------------------------------------------

    #[test]
    fn test_reads_degrade_when_store_fails() {
        let repo = RatingRepository::new(FailingStore);

        assert!(repo.user_rating("42", "alice").is_none());
        assert_eq!(repo.compute_aggregate("42"), RatingAggregate::EMPTY);
        assert!(repo.cached_aggregate("42").is_miss());
        assert!(repo.all_ratings().is_empty());
    }

    #[test]
    fn test_writes_surface_storage_failures() {
        let repo = RatingRepository::new(FailingStore);

        assert!(matches!(
            repo.set_user_rating("42", "alice", 4),
            Err(RatingError::Storage(_))
        ));
    }

    #[test]
    fn test_corrupt_documents_treated_as_empty() {
        let store = MemoryStore::with_entries([("userRatings", "{{{ not json")]);
        let repo = RatingRepository::new(store);

        assert!(repo.user_rating("42", "alice").is_none());

        // A write replaces the corrupt document
        repo.set_user_rating("42", "alice", 4).unwrap();
        assert_eq!(repo.user_rating("42", "alice").unwrap().value(), 4);
    }

    // ---- change notification ----------------------------------------------

    #[test]
    fn test_subscriber_receives_fresh_aggregate() {
        let repo = repo();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_clone = Arc::clone(&seen);
        repo.subscribe("42", move |change: &RatingChange| {
            seen_clone.lock().unwrap().push(change.clone());
        });

        repo.set_user_rating("42", "u1", 5).unwrap();
        repo.set_user_rating("42", "u2", 3).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].recipe_id, "42");
        assert_eq!(seen[1].average, 4.0);
        assert_eq!(seen[1].count, 2);
    }

    #[test]
    fn test_notification_fires_after_store_write() {
        let store = MemoryStore::new();
        let repo = RatingRepository::new(store.clone());
        let observed = Arc::new(Mutex::new(None));

        // A listener re-reading the store must observe the new state.
        let observed_clone = Arc::clone(&observed);
        repo.subscribe("42", move |_| {
            *observed_clone.lock().unwrap() = store.get("userRatings").unwrap();
        });

        repo.set_user_rating("42", "alice", 5).unwrap();

        let raw = observed.lock().unwrap().clone().expect("listener ran");
        assert!(raw.contains("alice"));
    }

    #[test]
    fn test_global_subscriber_sees_every_recipe() {
        let repo = repo();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_clone = Arc::clone(&seen);
        repo.subscribe_global(move |change: &RatingChange| {
            seen_clone.lock().unwrap().push(change.recipe_id.clone());
        });

        repo.set_user_rating("42", "u1", 5).unwrap();
        repo.set_user_rating("7", "u1", 2).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["42".to_string(), "7".to_string()]);
    }

    #[test]
    fn test_late_subscriber_observes_nothing() {
        let repo = repo();
        repo.set_user_rating("42", "u1", 5).unwrap();

        let seen = Arc::new(Mutex::new(0usize));
        let seen_clone = Arc::clone(&seen);
        repo.subscribe("42", move |_| *seen_clone.lock().unwrap() += 1);

        assert_eq!(*seen.lock().unwrap(), 0);
    }

    #[test]
    fn test_unsubscribe_through_repository() {
        let repo = repo();
        let seen = Arc::new(Mutex::new(0usize));

        let seen_clone = Arc::clone(&seen);
        let subscription = repo.subscribe("42", move |_| *seen_clone.lock().unwrap() += 1);

        repo.set_user_rating("42", "u1", 5).unwrap();
        assert!(repo.unsubscribe(subscription));
        repo.set_user_rating("42", "u2", 3).unwrap();

        assert_eq!(*seen.lock().unwrap(), 1);
    }

    // ---- bulk reads, reset, conveniences ----------------------------------

    #[test]
    fn test_all_ratings_overlays_cached_averages() {
        let repo = repo();
        repo.set_legacy_rating("1", 4).unwrap();
        repo.set_user_rating("2", "u1", 5).unwrap();
        repo.aggregate("2");

        let all = repo.all_ratings();
        assert_eq!(all["1"], 4.0);
        assert_eq!(all["2"], 5.0);
    }

    #[test]
    fn test_reset_clears_state_and_broadcasts() {
        let repo = repo();
        repo.set_user_rating("42", "u1", 5).unwrap();
        repo.initialize().unwrap();

        let seen = Arc::new(Mutex::new(0usize));
        let seen_clone = Arc::clone(&seen);
        repo.subscribe_global(move |_| *seen_clone.lock().unwrap() += 1);

        repo.reset().unwrap();

        assert_eq!(*seen.lock().unwrap(), 1);
        assert!(repo.user_rating("42", "u1").is_none());
        assert_eq!(repo.compute_aggregate("42"), RatingAggregate::EMPTY);
        // The migration guard was cleared too
        assert!(repo.initialize().unwrap());
    }

    #[test]
    fn test_convenience_reads() {
        let repo = repo();
        repo.set_user_rating("42", "u1", 5).unwrap();
        repo.set_user_rating("42", "u2", 4).unwrap();

        assert_eq!(repo.average("42", 0.0), 4.5);
        assert_eq!(repo.rating_count("42"), 2);
        assert_eq!(repo.average("missing", 0.0), 0.0);
    }

    // ---- remote collaborator ----------------------------------------------

    #[test]
    fn test_display_prefers_remote_summary() {
        let repo = repo();
        repo.set_user_rating("42", "u1", 2).unwrap();

        let remote = StubRemote::with_summary(4.8, 120);
        let shown = repo.display_aggregate("42", &remote);
        assert_eq!(shown.average, 4.8);
        assert_eq!(shown.count, 120);

        // Remote values never leak into the local aggregate
        assert_eq!(repo.compute_aggregate("42").count, 1);
    }

    #[test]
    fn test_display_falls_back_when_remote_offline() {
        let repo = repo();
        repo.set_user_rating("42", "u1", 2).unwrap();

        let shown = repo.display_aggregate("42", &OfflineRemote);
        assert_eq!(shown.average, 2.0);
        assert_eq!(shown.count, 1);
    }

    #[test]
    fn test_submit_rating_forwards_upsert() {
        let repo = repo();
        let remote = StubRemote::with_summary(0.0, 0);

        repo.submit_rating(&remote, "42", "alice", 5, Some("enak!".to_string()))
            .unwrap();

        assert_eq!(repo.user_rating("42", "alice").unwrap().value(), 5);
        let upserts = remote.upserts.lock().unwrap();
        assert_eq!(upserts.len(), 1);
        assert_eq!(upserts[0].recipe_id, "42");
        assert_eq!(upserts[0].score, 5);
    }

    #[test]
    fn test_submit_rating_survives_remote_failure() {
        let repo = repo();

        let aggregate = repo
            .submit_rating(&OfflineRemote, "42", "alice", 4, None)
            .unwrap();

        assert_eq!(aggregate.count, 1);
        assert_eq!(repo.user_rating("42", "alice").unwrap().value(), 4);
    }

    // ---- configuration ----------------------------------------------------

    #[test]
    fn test_custom_ttl_is_honored() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(0);
        let repo = RatingRepository::with_clock_and_metrics(
            store,
            clock.clone(),
            NoopMetrics,
            RepositoryConfig::with_ttl(Duration::from_millis(1_000)),
        );

        repo.set_user_rating("42", "u1", 3).unwrap();
        repo.aggregate("42");
        assert!(repo.cached_aggregate("42").is_hit());

        clock.advance(1_000);
        assert!(repo.cached_aggregate("42").is_miss());
    }
}
