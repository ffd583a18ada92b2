//! Image moderation

use agentguard_classifiers::{read_image, DecodingVerifier, ImageClassifier, ImageVerifier};
use agentguard_core::{DecisionSource, Error, ModerationDecision};
use agentguard_telemetry::{AuditLog, MetricsCollector};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Checks an image for integrity and NSFW content.
///
/// The file is read once; the classifier sees exactly the bytes that passed
/// verification. Unreadable or corrupt files block with
/// [`DecisionSource::Error`] before the classifier is called.
pub struct ImageContentModerator {
    verifier: Arc<dyn ImageVerifier>,
    classifier: Arc<dyn ImageClassifier>,
    nsfw_labels: Vec<String>,
    deadline: Duration,
    audit: Arc<AuditLog>,
    metrics: MetricsCollector,
}

impl ImageContentModerator {
    /// Create a moderator with the decoding verifier and the `nsfw` label
    pub fn new(classifier: Arc<dyn ImageClassifier>, audit: Arc<AuditLog>) -> Self {
        Self {
            verifier: Arc::new(DecodingVerifier::new()),
            classifier,
            nsfw_labels: vec!["nsfw".to_string()],
            deadline: agentguard_classifiers::intent::DEFAULT_DEADLINE,
            audit,
            metrics: MetricsCollector::new(),
        }
    }

    /// Replace the integrity verifier
    pub fn with_verifier(mut self, verifier: Arc<dyn ImageVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    /// Labels treated as NSFW (compared case-insensitively)
    pub fn with_nsfw_labels(mut self, labels: Vec<String>) -> Self {
        self.nsfw_labels = labels;
        self
    }

    /// Set the classifier deadline
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Share a metrics collector
    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = metrics;
        self
    }

    /// Check the image at `path` and record the decision
    pub async fn check(&self, path: &Path) -> ModerationDecision {
        let decision = self.evaluate(path).await;
        self.metrics.record_decision(&decision);
        self.audit.record(&path.display().to_string(), &decision);
        decision
    }

    async fn evaluate(&self, path: &Path) -> ModerationDecision {
        let image: Arc<[u8]> = match read_image(path, self.verifier.max_bytes()).await {
            Ok(bytes) => bytes.into(),
            Err(e) => {
                return ModerationDecision::block(DecisionSource::Error, format!("invalid image: {}", e));
            }
        };

        let verifier = Arc::clone(&self.verifier);
        let buffer = Arc::clone(&image);
        match tokio::task::spawn_blocking(move || verifier.verify(&buffer)).await {
            Ok(Ok(info)) => {
                debug!(width = info.width, height = info.height, format = ?info.format, "Image verified");
            }
            Ok(Err(e)) => {
                return ModerationDecision::block(DecisionSource::Error, format!("invalid image: {}", e));
            }
            Err(e) => {
                return ModerationDecision::block(
                    DecisionSource::Error,
                    format!("image verification failed: {}", e),
                );
            }
        }

        let start = Instant::now();
        let result = match tokio::time::timeout(self.deadline, self.classifier.classify_image(&image)).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                warn!(classifier = %self.classifier.name(), "Image classification failed: {}", e);
                return ModerationDecision::block(DecisionSource::Error, e.to_string());
            }
            Err(_) => {
                warn!(classifier = %self.classifier.name(), "Image classification timed out");
                return ModerationDecision::block(DecisionSource::Error, Error::Timeout.to_string());
            }
        };
        self.metrics
            .record_classifier_latency(start.elapsed().as_micros() as u64);

        if self.is_nsfw(&result.label) {
            return ModerationDecision::block(
                DecisionSource::Classifier,
                format!("NSFW content detected ({}, {:.2})", result.label, result.score),
            );
        }

        ModerationDecision::allow(
            DecisionSource::Classifier,
            format!("image classified as {}", result.label),
        )
    }

    fn is_nsfw(&self, label: &str) -> bool {
        self.nsfw_labels
            .iter()
            .any(|nsfw| nsfw.eq_ignore_ascii_case(label))
    }
}
