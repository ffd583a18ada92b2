//! Moderation settings

use agentguard_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Classifier confidence above which a harmful label blocks
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.7;

/// Moderation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationConfig {
    /// A harmful label blocks only when its score is strictly above this
    #[serde(default = "default_threshold")]
    pub confidence_threshold: f32,

    /// Image classifier labels that count as NSFW
    #[serde(default = "default_nsfw_labels")]
    pub nsfw_labels: Vec<String>,
}

impl ModerationConfig {
    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(Error::config(format!(
                "confidence_threshold must be within [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if self.nsfw_labels.is_empty() {
            return Err(Error::config("nsfw_labels must not be empty"));
        }
        Ok(())
    }
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_threshold(),
            nsfw_labels: default_nsfw_labels(),
        }
    }
}

fn default_threshold() -> f32 {
    DEFAULT_CONFIDENCE_THRESHOLD
}

fn default_nsfw_labels() -> Vec<String> {
    vec!["nsfw".to_string()]
}
