//! resep-ratings: rating aggregation and caching for recipe apps
//!
//! Reconciles overlapping rating sources — per-user scores, a legacy
//! global rating, pre-migration compound-key artifacts, and an optional
//! externally supplied default — into one consistent average/count pair
//! per recipe, backed by a time-bounded cache and synchronous change
//! notifications for decoupled observers.
//!
//! # Features
//!
//! - **Single mutation gateway** over a narrow key-value store adapter
//! - **Additive source reconciliation** with lenient sample validation
//! - **Lazy TTL cache** evicted on every mutation
//! - **Explicit observer registry** (per-recipe and global)
//! - **One-time legacy schema migration**
//!
//! # Quick Start
//!
//! ```rust
//! use resep_ratings::prelude::*;
//!
//! fn main() -> resep_ratings::Result<()> {
//!     let repo = RatingRepository::new(MemoryStore::new());
//!     repo.initialize()?;
//!
//!     repo.set_user_rating("42", "alice", 5)?;
//!     repo.set_user_rating("42", "bob", 3)?;
//!
//!     let aggregate = repo.aggregate("42");
//!     assert_eq!(aggregate.average, 4.0);
//!     assert_eq!(aggregate.count, 2);
//!     Ok(())
//! }
//! ```

mod keys;
mod notify;
mod repository;

// Re-export core
pub use resep_ratings_core::*;

// Re-export storage
pub use resep_ratings_storage::MemoryStore;

// Export the repository and notifier
pub use keys::ANONYMOUS_USER;
pub use notify::{ChangeNotifier, RatingListener, Subscription};
pub use repository::{RatingRepository, RepositoryConfig};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        CacheLookup, CachedAggregate, ManualClock, MemoryStore, NoopMetrics, RatingAggregate,
        RatingChange, RatingError, RatingRepository, RatingStore, RatingSubmission,
        RemoteRatingSource, RemoteRatingSummary, RepositoryConfig, Result, Score, Subscription,
        SystemClock,
    };
}

#[cfg(test)]
mod tests;
