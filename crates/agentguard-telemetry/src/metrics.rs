//! Decision metrics

use agentguard_core::{DecisionSource, ModerationDecision};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics collector for moderation decisions.
///
/// Keeps in-process counters for `snapshot()` and mirrors every update to the
/// `metrics` facade so an installed exporter (Prometheus) sees them too.
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<MetricsInner>,
}

#[derive(Default)]
struct MetricsInner {
    total_decisions: AtomicU64,
    blocked: AtomicU64,
    blocked_by_pattern: AtomicU64,
    blocked_by_classifier: AtomicU64,
    blocked_by_policy: AtomicU64,
    errors: AtomicU64,
    classifier_calls: AtomicU64,
    classifier_latency_us: AtomicU64,
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner::default()),
        }
    }

    /// Record a decision
    pub fn record_decision(&self, decision: &ModerationDecision) {
        let inner = &self.inner;
        inner.total_decisions.fetch_add(1, Ordering::Relaxed);

        if decision.blocked() {
            inner.blocked.fetch_add(1, Ordering::Relaxed);
            let counter = match decision.source() {
                DecisionSource::Pattern => &inner.blocked_by_pattern,
                DecisionSource::Classifier => &inner.blocked_by_classifier,
                DecisionSource::Policy => &inner.blocked_by_policy,
                DecisionSource::Error => &inner.errors,
            };
            counter.fetch_add(1, Ordering::Relaxed);
        }

        metrics::counter!(
            "agentguard_decisions_total",
            "source" => decision.source().as_str(),
            "blocked" => if decision.blocked() { "true" } else { "false" }
        )
        .increment(1);
    }

    /// Record one completed classifier call
    pub fn record_classifier_latency(&self, latency_us: u64) {
        self.inner.classifier_calls.fetch_add(1, Ordering::Relaxed);
        self.inner
            .classifier_latency_us
            .fetch_add(latency_us, Ordering::Relaxed);

        metrics::histogram!("agentguard_classifier_latency_us").record(latency_us as f64);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        let inner = &self.inner;
        MetricsSnapshot {
            total_decisions: inner.total_decisions.load(Ordering::Relaxed),
            blocked: inner.blocked.load(Ordering::Relaxed),
            blocked_by_pattern: inner.blocked_by_pattern.load(Ordering::Relaxed),
            blocked_by_classifier: inner.blocked_by_classifier.load(Ordering::Relaxed),
            blocked_by_policy: inner.blocked_by_policy.load(Ordering::Relaxed),
            errors: inner.errors.load(Ordering::Relaxed),
            classifier_calls: inner.classifier_calls.load(Ordering::Relaxed),
            classifier_latency_us: inner.classifier_latency_us.load(Ordering::Relaxed),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub total_decisions: u64,
    pub blocked: u64,
    pub blocked_by_pattern: u64,
    pub blocked_by_classifier: u64,
    pub blocked_by_policy: u64,
    pub errors: u64,
    pub classifier_calls: u64,
    pub classifier_latency_us: u64,
}

impl MetricsSnapshot {
    /// Average classifier latency in microseconds
    pub fn avg_classifier_latency_us(&self) -> f64 {
        if self.classifier_calls == 0 {
            0.0
        } else {
            self.classifier_latency_us as f64 / self.classifier_calls as f64
        }
    }

    /// Fraction of decisions that blocked
    pub fn block_rate(&self) -> f64 {
        if self.total_decisions == 0 {
            0.0
        } else {
            self.blocked as f64 / self.total_decisions as f64
        }
    }
}
