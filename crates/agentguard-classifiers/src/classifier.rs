//! Classifier traits and common types

use agentguard_core::Result;
use async_trait::async_trait;

/// External zero-shot text classification capability
#[async_trait]
pub trait ZeroShotClassifier: Send + Sync {
    /// Score `text` against `candidate_labels` with single-label semantics
    /// and return the top-ranked label.
    async fn classify(&self, text: &str, candidate_labels: &[String]) -> Result<ClassificationResult>;

    /// Get the classifier name
    fn name(&self) -> &str;
}

/// External image classification capability (NSFW detection)
#[async_trait]
pub trait ImageClassifier: Send + Sync {
    /// Classify an encoded image and return the best-scoring label
    async fn classify_image(&self, image: &[u8]) -> Result<ClassificationResult>;

    /// Get the classifier name
    fn name(&self) -> &str;
}

/// Result of classification
#[derive(Debug, Clone)]
pub struct ClassificationResult {
    /// Classification label
    pub label: String,

    /// Confidence score (0.0-1.0)
    pub score: f32,

    /// Additional metadata
    pub metadata: ClassificationMetadata,

    /// Latency in microseconds
    pub latency_us: u64,
}

impl ClassificationResult {
    /// Create a new classification result
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
            metadata: ClassificationMetadata::default(),
            latency_us: 0,
        }
    }

    /// Check if score is strictly above threshold
    pub fn exceeds_threshold(&self, threshold: f32) -> bool {
        self.score > threshold
    }

    /// Whether the score is a usable probability
    pub fn has_valid_score(&self) -> bool {
        self.score.is_finite() && (0.0..=1.0).contains(&self.score)
    }
}

/// Metadata about classification
#[derive(Debug, Clone, Default)]
pub struct ClassificationMetadata {
    /// Model name or version
    pub model: Option<String>,

    /// All label scores returned by the service
    pub all_scores: Option<Vec<(String, f32)>>,
}
