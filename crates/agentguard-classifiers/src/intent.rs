//! Intent stage: zero-shot classification over the candidate label set

use crate::classifier::{ClassificationResult, ZeroShotClassifier};
use crate::labels::CandidateLabels;
use agentguard_core::{Error, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default deadline for one classification call
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(10);

/// Adapter over an external zero-shot classifier.
///
/// Supplies the fixed candidate label set, enforces a deadline, and rejects
/// answers that are not usable. It never substitutes the safe label for a
/// failed call.
#[derive(Clone)]
pub struct IntentClassifier {
    backend: Arc<dyn ZeroShotClassifier>,
    labels: CandidateLabels,
    candidates: Vec<String>,
    deadline: Duration,
}

impl IntentClassifier {
    /// Create an intent classifier with the default label set and deadline
    pub fn new(backend: Arc<dyn ZeroShotClassifier>) -> Self {
        Self::with_labels(backend, CandidateLabels::default())
    }

    /// Create with a custom label set
    pub fn with_labels(backend: Arc<dyn ZeroShotClassifier>, labels: CandidateLabels) -> Self {
        let candidates = labels.candidates();
        Self {
            backend,
            labels,
            candidates,
            deadline: DEFAULT_DEADLINE,
        }
    }

    /// Set the per-call deadline
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Classify `text` and return the top label and its score.
    ///
    /// Fails with `Error::Timeout` when the deadline passes and with
    /// `Error::Classifier` when the backend answers with a label outside the
    /// candidate set or an invalid score.
    pub async fn classify(&self, text: &str) -> Result<ClassificationResult> {
        let start = Instant::now();

        let mut result = tokio::time::timeout(
            self.deadline,
            self.backend.classify(text, &self.candidates),
        )
        .await
        .map_err(|_| Error::Timeout)??;

        if !self.labels.contains(&result.label) {
            return Err(Error::classifier(format!(
                "{} returned unknown label '{}'",
                self.backend.name(),
                result.label
            )));
        }

        if !result.has_valid_score() {
            return Err(Error::classifier(format!(
                "{} returned invalid score {} for '{}'",
                self.backend.name(),
                result.score,
                result.label
            )));
        }

        result.latency_us = start.elapsed().as_micros() as u64;

        tracing::debug!(
            classifier = %self.backend.name(),
            label = %result.label,
            score = result.score,
            latency_us = result.latency_us,
            "Intent classified"
        );

        Ok(result)
    }

    /// The candidate label set
    pub fn labels(&self) -> &CandidateLabels {
        &self.labels
    }

    /// The configured deadline
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Name of the backend
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }
}
