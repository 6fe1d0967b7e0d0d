//! Core traits for the rating subsystem

mod clock;
mod metrics;
mod remote;
mod store;
mod tracing;

pub use clock::{Clock, ManualClock, SystemClock};
pub use remote::RemoteRatingSource;
pub use self::metrics::{EvictionReason, NoopMetrics, RatingMetrics, RatingOperation};
pub use self::tracing::TracingMetrics;
pub use store::RatingStore;

#[cfg(feature = "metrics")]
pub use self::metrics::MetricsCrateAdapter;
