//! Persisted document keys and legacy compound-key helpers

/// Per-user ratings document: `recipeId -> (userId -> score)`.
pub(crate) const USER_RATINGS_KEY: &str = "userRatings";
/// Legacy global ratings document: `recipeId -> score or projection`.
pub(crate) const LEGACY_RATINGS_KEY: &str = "recipeRatings";
/// Cached aggregates document: `recipeId -> {average, count, timestamp}`.
pub(crate) const RATING_CACHE_KEY: &str = "ratingCache";
/// Migration guard flag.
pub(crate) const MIGRATION_FLAG_KEY: &str = "ratingSystemInitialized";

/// User id substituted when a compound key carries no user segment.
pub const ANONYMOUS_USER: &str = "anonymous";

const LEGACY_PREFIX: &str = "recipe-";
const LEGACY_MARKER: &str = "-rating-";

/// `recipe-<id>-rating-` prefix matching one recipe's compound keys.
pub(crate) fn legacy_prefix_for(recipe_id: &str) -> String {
    format!("{LEGACY_PREFIX}{recipe_id}{LEGACY_MARKER}")
}

/// Parse a `recipe-<id>-rating-<userId>` key into its parts.
///
/// A missing or empty user segment, or the legacy `anon` marker, falls
/// back to [`ANONYMOUS_USER`]; keys not shaped like a compound rating
/// yield `None`.
pub(crate) fn parse_legacy_key(key: &str) -> Option<(&str, &str)> {
    let rest = key.strip_prefix(LEGACY_PREFIX)?;
    if let Some((recipe_id, user_id)) = rest.split_once(LEGACY_MARKER) {
        if recipe_id.is_empty() {
            return None;
        }
        let user_id = if user_id.is_empty() || user_id == "anon" {
            ANONYMOUS_USER
        } else {
            user_id
        };
        return Some((recipe_id, user_id));
    }
    // Truncated form without a user segment: recipe-<id>-rating
    let recipe_id = rest.strip_suffix("-rating")?;
    if recipe_id.is_empty() {
        return None;
    }
    Some((recipe_id, ANONYMOUS_USER))
}
