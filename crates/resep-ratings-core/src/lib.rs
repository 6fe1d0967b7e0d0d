//! resep-ratings-core: Core traits and types for the resep-ratings workspace
//!
//! This crate provides the foundational types and trait seams used by the
//! rating repository: the persistent store adapter, the clock and metrics
//! seams, the remote collaborator interface, and the domain types for
//! scores, aggregates, cache entries, and change notifications.

mod error;
mod traits;
mod types;

pub use error::{RatingError, Result};
pub use traits::*;
pub use types::*;
