//! Action firewall

use crate::action::{ActionPolicy, OPEN_FILE, SEARCH};
use crate::engine::TextModerationEngine;
use agentguard_core::{ActionRequest, DecisionSource, ModerationDecision};
use agentguard_telemetry::{AuditLog, MetricsCollector};
use std::sync::Arc;
use tracing::debug;

/// Validates structured actions before an agent executes them.
///
/// The action kind must be on the allow-list. `open_file` filenames are
/// checked for path tokens first and against the whitelist second.
/// `search` queries go through the full text moderation pipeline.
pub struct ActionValidator {
    policy: Arc<ActionPolicy>,
    engine: Arc<TextModerationEngine>,
    audit: Arc<AuditLog>,
    metrics: MetricsCollector,
}

impl ActionValidator {
    /// Create a validator
    pub fn new(
        policy: Arc<ActionPolicy>,
        engine: Arc<TextModerationEngine>,
        audit: Arc<AuditLog>,
    ) -> Self {
        Self {
            policy,
            engine,
            audit,
            metrics: MetricsCollector::new(),
        }
    }

    /// Share a metrics collector
    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = metrics;
        self
    }

    /// Validate `action` and record the decision
    pub async fn validate(&self, action: &ActionRequest) -> ModerationDecision {
        let decision = self.evaluate(action).await;
        self.metrics.record_decision(&decision);
        self.audit.record(&describe(action), &decision);
        decision
    }

    async fn evaluate(&self, action: &ActionRequest) -> ModerationDecision {
        if !self.policy.is_allowed_kind(&action.kind) {
            return ModerationDecision::block(
                DecisionSource::Policy,
                format!("action '{}' is not in the list of allowed actions", action.kind),
            );
        }

        match action.kind.as_str() {
            OPEN_FILE => self.check_open_file(action),
            SEARCH => self.check_search(action).await,
            _ => ModerationDecision::allow(DecisionSource::Policy, "action is safe"),
        }
    }

    fn check_open_file(&self, action: &ActionRequest) -> ModerationDecision {
        let Some(filename) = action.param("filename") else {
            return ModerationDecision::block(
                DecisionSource::Policy,
                "missing filename for open_file action",
            );
        };

        if self.policy.has_path_token(filename) {
            debug!(filename, "Path token in filename");
            return ModerationDecision::block(
                DecisionSource::Policy,
                format!("path traversal attempt blocked: '{}'", filename),
            );
        }

        if !self.policy.is_allowed_filename(filename) {
            return ModerationDecision::block(
                DecisionSource::Policy,
                format!("access to file '{}' is not permitted", filename),
            );
        }

        ModerationDecision::allow(DecisionSource::Policy, "action is safe")
    }

    async fn check_search(&self, action: &ActionRequest) -> ModerationDecision {
        let Some(query) = action.param("query") else {
            return ModerationDecision::block(
                DecisionSource::Policy,
                "missing query for search action",
            );
        };

        let inner = self.engine.moderate_unmetered(query).await;
        if inner.blocked() {
            return ModerationDecision::block(
                inner.source(),
                format!("malicious content detected in search query: {}", inner.reason()),
            );
        }

        ModerationDecision::allow(DecisionSource::Policy, "action is safe")
    }

    /// Policy in use
    pub fn policy(&self) -> &ActionPolicy {
        &self.policy
    }
}

/// Audit subject for an action, e.g. `open_file filename=notes.txt`
pub(crate) fn describe(action: &ActionRequest) -> String {
    let mut subject = action.kind.clone();
    for (key, value) in &action.params {
        subject.push(' ');
        subject.push_str(key);
        subject.push('=');
        subject.push_str(value);
    }
    subject
}
