//! Two-stage text moderation

use crate::config::DEFAULT_CONFIDENCE_THRESHOLD;
use agentguard_classifiers::{IntentClassifier, PatternMatcher};
use agentguard_core::{DecisionSource, ModerationDecision};
use agentguard_telemetry::{AuditLog, MetricsCollector};
use std::sync::Arc;
use tracing::{debug, warn};

/// Text moderation engine.
///
/// Runs the pattern stage and then the intent stage. The first blocking
/// stage ends evaluation, so the classifier is never consulted for text a
/// pattern rule already rejected. A failed classifier call blocks.
pub struct TextModerationEngine {
    patterns: Arc<PatternMatcher>,
    classifier: IntentClassifier,
    threshold: f32,
    audit: Arc<AuditLog>,
    metrics: MetricsCollector,
}

impl TextModerationEngine {
    /// Create an engine with the default confidence threshold
    pub fn new(
        patterns: Arc<PatternMatcher>,
        classifier: IntentClassifier,
        audit: Arc<AuditLog>,
    ) -> Self {
        Self {
            patterns,
            classifier,
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            audit,
            metrics: MetricsCollector::new(),
        }
    }

    /// Set the confidence threshold
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Share a metrics collector
    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = metrics;
        self
    }

    /// Moderate `text` and record the decision.
    pub async fn moderate(&self, text: &str) -> ModerationDecision {
        let decision = self.moderate_unmetered(text).await;
        self.metrics.record_decision(&decision);
        decision
    }

    /// Moderate `text` as one step of a larger decision: audited, but left
    /// out of the decision counters so the caller's outcome is counted once.
    pub(crate) async fn moderate_unmetered(&self, text: &str) -> ModerationDecision {
        let decision = self.evaluate(text).await;
        self.audit.record(text, &decision);
        decision
    }

    async fn evaluate(&self, text: &str) -> ModerationDecision {
        if let Some(hit) = self.patterns.matches(text) {
            debug!(rule = %hit.rule_id, category = %hit.category.label(), "Pattern rule matched");
            return ModerationDecision::block(DecisionSource::Pattern, hit.description);
        }

        let result = match self.classifier.classify(text).await {
            Ok(result) => result,
            Err(e) => {
                warn!(classifier = %self.classifier.backend_name(), "Classification failed: {}", e);
                return ModerationDecision::block(DecisionSource::Error, e.to_string());
            }
        };

        self.metrics.record_classifier_latency(result.latency_us);

        if self.classifier.labels().is_harmful(&result.label)
            && result.exceeds_threshold(self.threshold)
        {
            return ModerationDecision::block(
                DecisionSource::Classifier,
                format!("{} ({:.2})", result.label, result.score),
            );
        }

        ModerationDecision::allow(DecisionSource::Classifier, "safe")
    }

    /// Confidence threshold in use
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Version of the pattern rule table
    pub fn rules_version(&self) -> &str {
        self.patterns.version()
    }
}
