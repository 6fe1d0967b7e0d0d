//! Core types for rating operations

mod aggregate;
mod event;
mod remote;
mod score;

pub use aggregate::{CacheLookup, CachedAggregate, DEFAULT_CACHE_TTL, RatingAggregate};
pub use event::RatingChange;
pub use remote::{RatingSubmission, RemoteRatingEntry, RemoteRatingSummary, RemoteUser};
pub use score::{MAX_SCORE, MIN_SCORE, Score};
