use crate::{EvictionReason, RatingMetrics, RatingOperation};
use std::time::Duration;
use tracing::debug;

/// Metrics adapter that logs events via `tracing`
#[derive(Debug, Clone, Default)]
pub struct TracingMetrics {
    /// Service name/prefix (optional)
    service_name: Option<String>,
}

impl TracingMetrics {
    /// Create new tracing metrics adapter
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with service name prefix
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }
}

impl RatingMetrics for TracingMetrics {
    fn record_hit(&self, recipe_id: &str) {
        debug!(
            target: "resep_ratings",
            event = "hit",
            recipe_id = %recipe_id,
            service = ?self.service_name,
            "Rating Cache Hit"
        );
    }

    fn record_miss(&self, recipe_id: &str) {
        debug!(
            target: "resep_ratings",
            event = "miss",
            recipe_id = %recipe_id,
            service = ?self.service_name,
            "Rating Cache Miss"
        );
    }

    fn record_eviction(&self, reason: EvictionReason) {
        debug!(
            target: "resep_ratings",
            event = "eviction",
            reason = ?reason,
            service = ?self.service_name,
            "Rating Cache Eviction"
        );
    }

    fn record_latency(&self, operation: RatingOperation, duration: Duration) {
        tracing::trace!(
            target: "resep_ratings",
            event = "latency",
            operation = ?operation,
            duration_ms = duration.as_millis(),
            service = ?self.service_name,
            "Rating Operation Latency"
        );
    }

    fn record_notified(&self, listeners: usize) {
        tracing::trace!(
            target: "resep_ratings",
            event = "notified",
            listeners = listeners,
            service = ?self.service_name,
            "Rating Change Delivered"
        );
    }
}
