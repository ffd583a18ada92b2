//! Candidate label set for intent classification

use agentguard_core::{Error, Result};

/// Labels that mark text as harmful
pub const HARMFUL_LABELS: &[&str] = &[
    "system file deletion attempt",
    "credential theft",
    "financial data request",
    "malicious command attempt",
    "hate speech",
    "toxic language",
    "self-harm instruction",
];

/// The single label for benign text
pub const SAFE_LABEL: &str = "safe user query";

/// Harmful labels plus one safe label, offered together to the classifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLabels {
    harmful: Vec<String>,
    safe: String,
}

impl CandidateLabels {
    /// Build a custom label set.
    ///
    /// The harmful set must be non-empty and must not contain the safe label.
    pub fn new(harmful: Vec<String>, safe: impl Into<String>) -> Result<Self> {
        let safe = safe.into();
        if harmful.is_empty() {
            return Err(Error::config("harmful label set is empty"));
        }
        if harmful.iter().any(|label| *label == safe) {
            return Err(Error::config(format!(
                "safe label '{}' is also listed as harmful",
                safe
            )));
        }
        Ok(Self { harmful, safe })
    }

    /// All candidate labels, harmful first
    pub fn candidates(&self) -> Vec<String> {
        let mut labels = self.harmful.clone();
        labels.push(self.safe.clone());
        labels
    }

    /// Whether `label` belongs to the harmful set
    pub fn is_harmful(&self, label: &str) -> bool {
        self.harmful.iter().any(|h| h == label)
    }

    /// Whether `label` is one of the candidates
    pub fn contains(&self, label: &str) -> bool {
        self.safe == label || self.is_harmful(label)
    }

    /// The safe label
    pub fn safe(&self) -> &str {
        &self.safe
    }

    /// The harmful labels
    pub fn harmful(&self) -> &[String] {
        &self.harmful
    }
}

impl Default for CandidateLabels {
    fn default() -> Self {
        Self {
            harmful: HARMFUL_LABELS.iter().map(|l| l.to_string()).collect(),
            safe: SAFE_LABEL.to_string(),
        }
    }
}
