//! Configuration for external classifier services

use serde::{Deserialize, Serialize};

/// Configuration for all classifier adapters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Zero-shot text classification endpoint
    #[serde(default)]
    pub zero_shot: Option<EndpointConfig>,

    /// Image classification endpoint
    #[serde(default)]
    pub image: Option<EndpointConfig>,

    /// Deadline for one classification call (milliseconds)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Largest image accepted for verification (bytes)
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            zero_shot: None,
            image: None,
            timeout_ms: default_timeout_ms(),
            max_image_bytes: default_max_image_bytes(),
        }
    }
}

/// One HTTP inference endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Full URL to POST to
    pub url: String,

    /// Bearer token (prefer `api_token_env`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    /// Environment variable holding the bearer token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token_env: Option<String>,

    /// Model name, reported in classification metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl EndpointConfig {
    /// Create an endpoint with only a URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_token: None,
            api_token_env: None,
            model: None,
        }
    }

    /// Resolve the bearer token, preferring the inline value
    pub fn resolve_token(&self) -> Option<String> {
        self.api_token.clone().or_else(|| {
            self.api_token_env
                .as_deref()
                .and_then(|var| std::env::var(var).ok())
                .filter(|token| !token.is_empty())
        })
    }
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_max_image_bytes() -> u64 {
    crate::image::DEFAULT_MAX_IMAGE_BYTES
}
