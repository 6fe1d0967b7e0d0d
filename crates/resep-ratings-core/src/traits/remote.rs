//! Remote rating service collaborator

use crate::{RatingSubmission, RemoteRatingSummary, Result};

/// Server-side rating source, consumed as an alternate display value.
///
/// The core never merges remote aggregates into its own computation; a
/// failing or absent remote degrades to the locally computed aggregate, so
/// remote unavailability never affects the core's self-consistency.
pub trait RemoteRatingSource: Send + Sync + 'static {
    /// Fetch the server-reported summary for one recipe.
    fn fetch_ratings(&self, recipe_id: &str) -> Result<RemoteRatingSummary>;

    /// Submit or update the calling user's rating on the server.
    fn upsert_rating(&self, submission: &RatingSubmission) -> Result<()>;
}
