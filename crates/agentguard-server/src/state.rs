//! Shared application state

use crate::config::AppConfig;
use crate::security::validate_endpoint_url;
use agentguard_classifiers::{DecodingVerifier, HttpImageClassifier, HttpZeroShotClassifier, RuleTable};
use agentguard_policy::Guardrails;
use agentguard_telemetry::AuditLog;
use anyhow::Context;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    /// Moderation pipeline
    pub guardrails: Arc<Guardrails>,

    /// Prometheus metrics handle for rendering
    pub metrics_handle: PrometheusHandle,

    /// Bearer token required on `/v1/*` routes
    pub auth_token: Option<Arc<str>>,

    /// Root directory for image paths
    pub image_root: Option<PathBuf>,
}

impl AppState {
    /// Create state around an existing pipeline, without auth
    pub fn new(guardrails: Arc<Guardrails>, metrics_handle: PrometheusHandle) -> Self {
        Self {
            guardrails,
            metrics_handle,
            auth_token: None,
            image_root: None,
        }
    }

    /// Require a bearer token
    pub fn with_auth_token(mut self, token: impl Into<Arc<str>>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Confine image paths to `root`
    pub fn with_image_root(mut self, root: PathBuf) -> Self {
        self.image_root = Some(root);
        self
    }

    /// Build state from configuration
    pub fn from_config(config: &AppConfig, metrics_handle: PrometheusHandle) -> anyhow::Result<Self> {
        let guardrails = Arc::new(build_guardrails(config)?);
        let mut state = Self::new(guardrails, metrics_handle);

        if let Some(token) = config.server.resolve_auth_token() {
            info!("API bearer authentication enabled");
            state = state.with_auth_token(token);
        }
        match &config.server.image_root {
            Some(root) => state = state.with_image_root(root.clone()),
            None if state.guardrails.has_image_moderation() => {
                warn!("server.image_root is unset: /v1/moderate/image will read any path this process can open");
            }
            None => {}
        }

        Ok(state)
    }
}

/// Build the moderation pipeline described by `config`.
///
/// Fails when no zero-shot endpoint is configured, when an endpoint URL is
/// refused, or when the rule table or audit log cannot be loaded.
pub fn build_guardrails(config: &AppConfig) -> anyhow::Result<Guardrails> {
    let timeout = Duration::from_millis(config.classifiers.timeout_ms);

    let endpoint = config
        .classifiers
        .zero_shot
        .as_ref()
        .context("classifiers.zero_shot is not configured (set it in the config file or pass --zero-shot-url)")?;
    validate_endpoint_url(&endpoint.url, &config.security)
        .context("classifiers.zero_shot.url")?;
    let zero_shot = Arc::new(HttpZeroShotClassifier::new(endpoint, timeout)?);

    let rules = match &config.rules {
        Some(path) => {
            info!("Loading pattern rules from {}", path.display());
            RuleTable::from_file(path)?
        }
        None => RuleTable::builtin(),
    };

    let audit = Arc::new(AuditLog::new(config.audit.clone()).context("opening audit log")?);

    let mut builder = Guardrails::builder()
        .rules(rules)
        .zero_shot(zero_shot)
        .verifier(Arc::new(
            DecodingVerifier::new().with_max_bytes(config.classifiers.max_image_bytes),
        ))
        .action_policy(config.actions.clone())
        .moderation(config.moderation.clone())
        .deadline(timeout)
        .audit(audit);

    if let Some(endpoint) = &config.classifiers.image {
        validate_endpoint_url(&endpoint.url, &config.security).context("classifiers.image.url")?;
        builder = builder.image_classifier(Arc::new(HttpImageClassifier::new(endpoint, timeout)?));
    }

    Ok(builder.build()?)
}
