//! Wire shapes for the remote rating collaborator
//!
//! Server payloads arrive with field names that vary by origin; the serde
//! aliases below normalize every known variant into one canonical shape
//! before anything downstream sees it.

use crate::RatingAggregate;
use serde::{Deserialize, Serialize};

/// Aggregate as reported by the remote service.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct RemoteRatingSummary {
    #[serde(default, alias = "avg", alias = "rating", alias = "averageRating")]
    pub average: f64,
    #[serde(default, alias = "total", alias = "votes", alias = "ratingCount")]
    pub count: usize,
    #[serde(default, alias = "items")]
    pub ratings: Vec<RemoteRatingEntry>,
}

/// One server-side rating record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteRatingEntry {
    pub user: RemoteUser,
    #[serde(alias = "value", alias = "rating")]
    pub score: f64,
}

/// The user attached to a server-side rating record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteUser {
    #[serde(alias = "userId", alias = "_id")]
    pub id: String,
}

impl From<RemoteRatingSummary> for RatingAggregate {
    fn from(summary: RemoteRatingSummary) -> Self {
        RatingAggregate {
            average: summary.average,
            count: summary.count,
        }
    }
}

/// Outgoing rating submission for the remote service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSubmission {
    pub recipe_id: String,
    pub score: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}
