//! Metrics trait for rating observability

use std::time::Duration;

/// Operation label for latency tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RatingOperation {
    /// Full aggregation over the raw sources
    Compute,
    /// Change notification fan-out
    Notify,
    /// Legacy compound-key migration sweep
    Migrate,
}

impl RatingOperation {
    /// Get operation as string label
    pub fn as_str(&self) -> &'static str {
        match self {
            RatingOperation::Compute => "compute",
            RatingOperation::Notify => "notify",
            RatingOperation::Migrate => "migrate",
        }
    }
}

/// Reason a cached aggregate was evicted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvictionReason {
    /// Entry aged past its freshness window
    Expired,
    /// A mutation to the recipe's ratings evicted it
    Invalidated,
    /// The persisted entry could not be decoded
    Corrupt,
}

impl EvictionReason {
    /// Get reason as string label
    pub fn as_str(&self) -> &'static str {
        match self {
            EvictionReason::Expired => "expired",
            EvictionReason::Invalidated => "invalidated",
            EvictionReason::Corrupt => "corrupt",
        }
    }
}

/// Trait for rating cache metrics/observability
///
/// Implement this to integrate with your metrics system.
pub trait RatingMetrics: Send + Sync + 'static {
    /// Record a fresh cache hit
    fn record_hit(&self, recipe_id: &str);

    /// Record a cache miss
    fn record_miss(&self, recipe_id: &str);

    /// Record an eviction
    fn record_eviction(&self, reason: EvictionReason);

    /// Record operation latency
    fn record_latency(&self, operation: RatingOperation, duration: Duration);

    /// Record how many listeners a change notification reached
    fn record_notified(&self, listeners: usize);
}

/// No-op metrics implementation (default)
///
/// Zero overhead when metrics are not needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl RatingMetrics for NoopMetrics {
    #[inline]
    fn record_hit(&self, _recipe_id: &str) {}

    #[inline]
    fn record_miss(&self, _recipe_id: &str) {}

    #[inline]
    fn record_eviction(&self, _reason: EvictionReason) {}

    #[inline]
    fn record_latency(&self, _operation: RatingOperation, _duration: Duration) {}

    #[inline]
    fn record_notified(&self, _listeners: usize) {}
}

/// Metrics adapter using the `metrics` crate
///
/// Integrates with Prometheus, StatsD, and other exporters via the
/// `metrics` ecosystem.
#[cfg(feature = "metrics")]
#[derive(Debug, Clone)]
pub struct MetricsCrateAdapter {
    prefix: String,
}

#[cfg(feature = "metrics")]
impl MetricsCrateAdapter {
    /// Create a new adapter with the given metric name prefix
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn metric_name(&self, name: &str) -> String {
        format!("{}_{}", self.prefix, name)
    }
}

#[cfg(feature = "metrics")]
impl RatingMetrics for MetricsCrateAdapter {
    fn record_hit(&self, _recipe_id: &str) {
        metrics::counter!(self.metric_name("cache_hits_total")).increment(1);
    }

    fn record_miss(&self, _recipe_id: &str) {
        metrics::counter!(self.metric_name("cache_misses_total")).increment(1);
    }

    fn record_eviction(&self, reason: EvictionReason) {
        metrics::counter!(
            self.metric_name("cache_evictions_total"),
            "reason" => reason.as_str()
        )
        .increment(1);
    }

    fn record_latency(&self, operation: RatingOperation, duration: Duration) {
        metrics::histogram!(
            self.metric_name("operation_duration_seconds"),
            "operation" => operation.as_str()
        )
        .record(duration.as_secs_f64());
    }

    fn record_notified(&self, listeners: usize) {
        metrics::histogram!(self.metric_name("notified_listeners")).record(listeners as f64);
    }
}
