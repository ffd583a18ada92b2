//! Service configuration

use crate::security::EndpointPolicy;
use agentguard_classifiers::{ClassifierConfig, EndpointConfig};
use agentguard_policy::{ActionPolicyConfig, ModerationConfig};
use agentguard_telemetry::AuditConfig;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file read when none is given
pub const DEFAULT_CONFIG_PATH: &str = "agentguard.yaml";

/// Full service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Listener and API auth
    #[serde(default)]
    pub server: ServerSettings,

    /// Threshold and NSFW labels
    #[serde(default)]
    pub moderation: ModerationConfig,

    /// External classifier endpoints and deadline
    #[serde(default)]
    pub classifiers: ClassifierConfig,

    /// Action allow-list and file policy
    #[serde(default)]
    pub actions: ActionPolicyConfig,

    /// Audit log
    #[serde(default)]
    pub audit: AuditConfig,

    /// YAML rule table replacing the built-in pattern rules
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<PathBuf>,

    /// Which classifier endpoint URLs are acceptable
    #[serde(default)]
    pub security: EndpointPolicy,
}

/// Listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token required on `/v1/*` routes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    /// Environment variable holding the bearer token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token_env: Option<String>,

    /// Directory image paths are resolved against; paths escaping it are
    /// refused. Strongly recommended whenever image moderation is exposed:
    /// without it any readable path is accepted, and block reasons tell a
    /// missing file apart from a corrupt one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_root: Option<PathBuf>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            auth_token: None,
            auth_token_env: None,
            image_root: None,
        }
    }
}

impl ServerSettings {
    /// Resolve the API token, preferring the inline value
    pub fn resolve_auth_token(&self) -> Option<String> {
        self.auth_token
            .clone()
            .or_else(|| {
                self.auth_token_env
                    .as_deref()
                    .and_then(|var| std::env::var(var).ok())
            })
            .filter(|token| !token.is_empty())
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Values given on the command line, applied over the file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub zero_shot_url: Option<String>,
    pub image_url: Option<String>,
    pub audit_log: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub auth_token: Option<String>,
}

impl AppConfig {
    /// Load configuration from file and CLI overrides.
    ///
    /// A missing file means defaults.
    pub fn load(path: &Path, overrides: &ConfigOverrides) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            Self::from_yaml(&content).with_context(|| format!("parsing {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from YAML
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(url) = &overrides.zero_shot_url {
            set_url(&mut self.classifiers.zero_shot, url);
        }
        if let Some(url) = &overrides.image_url {
            set_url(&mut self.classifiers.image, url);
        }
        if let Some(path) = &overrides.audit_log {
            self.audit.path = Some(path.clone());
        }
        if let Some(host) = &overrides.host {
            self.server.host = host.clone();
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(token) = &overrides.auth_token {
            self.server.auth_token = Some(token.clone());
        }
    }

    /// Check value ranges
    pub fn validate(&self) -> anyhow::Result<()> {
        self.moderation.validate()?;
        if self.classifiers.timeout_ms == 0 {
            bail!("classifiers.timeout_ms must be greater than zero");
        }
        if self.audit.preview_chars == 0 {
            bail!("audit.preview_chars must be greater than zero");
        }
        Ok(())
    }
}

fn set_url(endpoint: &mut Option<EndpointConfig>, url: &str) {
    match endpoint {
        Some(endpoint) => endpoint.url = url.to_string(),
        None => *endpoint = Some(EndpointConfig::new(url)),
    }
}
