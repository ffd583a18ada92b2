//! The guardrails facade

use crate::action::{ActionPolicy, ActionPolicyConfig, UNKNOWN};
use crate::config::ModerationConfig;
use crate::engine::TextModerationEngine;
use crate::executor::ActionExecutor;
use crate::extract::ActionExtractor;
use crate::image::ImageContentModerator;
use crate::validator::ActionValidator;
use agentguard_classifiers::{
    CandidateLabels, DecodingVerifier, ImageClassifier, ImageVerifier, IntentClassifier,
    PatternMatcher, RuleTable, ZeroShotClassifier,
};
use agentguard_core::{ActionRequest, DecisionSource, Error, ModerationDecision, Result};
use agentguard_telemetry::{AuditLog, MetricsCollector};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// What happened to an agent response passed to [`Guardrails::process_response`]
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResponseOutcome {
    /// The response expressed no recognizable action
    NoAction,
    /// The action passed validation
    Executed {
        /// Extracted action
        action: ActionRequest,
        /// Simulated result
        message: String,
    },
    /// The action was rejected
    Blocked {
        /// Extracted action
        action: ActionRequest,
        /// Blocking decision
        decision: ModerationDecision,
    },
}

/// Single handle over text moderation, action validation, and image
/// moderation, sharing one audit log and one metrics collector.
pub struct Guardrails {
    engine: Arc<TextModerationEngine>,
    validator: ActionValidator,
    images: Option<ImageContentModerator>,
    extractor: ActionExtractor,
    executor: ActionExecutor,
    audit: Arc<AuditLog>,
    metrics: MetricsCollector,
}

impl Guardrails {
    /// Start building a guardrails instance
    pub fn builder() -> GuardrailsBuilder {
        GuardrailsBuilder::default()
    }

    /// Moderate user-supplied text
    pub async fn moderate_text(&self, text: &str) -> ModerationDecision {
        self.engine.moderate(text).await
    }

    /// Validate an action proposed by an agent
    pub async fn validate_action(&self, action: &ActionRequest) -> ModerationDecision {
        self.validator.validate(action).await
    }

    /// Moderate the image at `path`.
    ///
    /// Blocks with [`DecisionSource::Error`] when no image classifier is
    /// configured.
    pub async fn moderate_image(&self, path: &Path) -> ModerationDecision {
        match &self.images {
            Some(images) => images.check(path).await,
            None => {
                let decision = ModerationDecision::block(
                    DecisionSource::Error,
                    "image moderation is not configured",
                );
                self.metrics.record_decision(&decision);
                self.audit.record(&path.display().to_string(), &decision);
                decision
            }
        }
    }

    /// Extract the action in an agent response, validate it, and describe
    /// its simulated execution
    pub async fn process_response(&self, response: &str) -> ResponseOutcome {
        let action = self.extract_action(response);
        if action.kind == UNKNOWN {
            return ResponseOutcome::NoAction;
        }

        let decision = self.validate_action(&action).await;
        if decision.blocked() {
            return ResponseOutcome::Blocked { action, decision };
        }

        match self.executor.describe(&action) {
            Some(message) => ResponseOutcome::Executed { action, message },
            None => ResponseOutcome::NoAction,
        }
    }

    /// Extract the action in an agent response without validating it
    pub fn extract_action(&self, response: &str) -> ActionRequest {
        self.extractor.extract(response)
    }

    /// Shared audit log
    pub fn audit(&self) -> &Arc<AuditLog> {
        &self.audit
    }

    /// Shared metrics collector
    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Text moderation engine
    pub fn engine(&self) -> &TextModerationEngine {
        &self.engine
    }

    /// Whether image moderation is available
    pub fn has_image_moderation(&self) -> bool {
        self.images.is_some()
    }
}

/// Builder for [`Guardrails`]
pub struct GuardrailsBuilder {
    rules: RuleTable,
    labels: CandidateLabels,
    zero_shot: Option<Arc<dyn ZeroShotClassifier>>,
    image_classifier: Option<Arc<dyn ImageClassifier>>,
    verifier: Arc<dyn ImageVerifier>,
    action_policy: ActionPolicyConfig,
    moderation: ModerationConfig,
    deadline: Duration,
    audit: Option<Arc<AuditLog>>,
    metrics: MetricsCollector,
}

impl Default for GuardrailsBuilder {
    fn default() -> Self {
        Self {
            rules: RuleTable::builtin(),
            labels: CandidateLabels::default(),
            zero_shot: None,
            image_classifier: None,
            verifier: Arc::new(DecodingVerifier::new()),
            action_policy: ActionPolicyConfig::default(),
            moderation: ModerationConfig::default(),
            deadline: agentguard_classifiers::intent::DEFAULT_DEADLINE,
            audit: None,
            metrics: MetricsCollector::new(),
        }
    }
}

impl GuardrailsBuilder {
    /// Pattern rule table (defaults to the built-in table)
    pub fn rules(mut self, rules: RuleTable) -> Self {
        self.rules = rules;
        self
    }

    /// Candidate label set for the intent stage
    pub fn labels(mut self, labels: CandidateLabels) -> Self {
        self.labels = labels;
        self
    }

    /// Zero-shot classifier backend (required)
    pub fn zero_shot(mut self, classifier: Arc<dyn ZeroShotClassifier>) -> Self {
        self.zero_shot = Some(classifier);
        self
    }

    /// Image classifier backend
    pub fn image_classifier(mut self, classifier: Arc<dyn ImageClassifier>) -> Self {
        self.image_classifier = Some(classifier);
        self
    }

    /// Image integrity verifier
    pub fn verifier(mut self, verifier: Arc<dyn ImageVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    /// Action allow-list and file policy
    pub fn action_policy(mut self, policy: ActionPolicyConfig) -> Self {
        self.action_policy = policy;
        self
    }

    /// Threshold and NSFW labels
    pub fn moderation(mut self, config: ModerationConfig) -> Self {
        self.moderation = config;
        self
    }

    /// Deadline for each classifier call
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Audit log (defaults to an in-memory log)
    pub fn audit(mut self, audit: Arc<AuditLog>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Metrics collector
    pub fn metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = metrics;
        self
    }

    /// Compile rules and policy and wire the components together
    pub fn build(self) -> Result<Guardrails> {
        self.moderation.validate()?;

        let zero_shot = self
            .zero_shot
            .ok_or_else(|| Error::config("a zero-shot classifier is required"))?;

        let patterns = Arc::new(PatternMatcher::new(self.rules)?);
        let policy = Arc::new(ActionPolicy::new(self.action_policy)?);
        let audit = self.audit.unwrap_or_else(|| Arc::new(AuditLog::in_memory()));
        let metrics = self.metrics;

        let classifier =
            IntentClassifier::with_labels(zero_shot, self.labels).with_deadline(self.deadline);

        let engine = Arc::new(
            TextModerationEngine::new(Arc::clone(&patterns), classifier, Arc::clone(&audit))
                .with_threshold(self.moderation.confidence_threshold)
                .with_metrics(metrics.clone()),
        );

        let validator = ActionValidator::new(policy, Arc::clone(&engine), Arc::clone(&audit))
            .with_metrics(metrics.clone());

        let images = self.image_classifier.map(|classifier| {
            ImageContentModerator::new(classifier, Arc::clone(&audit))
                .with_verifier(self.verifier)
                .with_nsfw_labels(self.moderation.nsfw_labels)
                .with_deadline(self.deadline)
                .with_metrics(metrics.clone())
        });

        info!(
            rules_version = %patterns.version(),
            rules = patterns.rules().len(),
            threshold = self.moderation.confidence_threshold,
            images = images.is_some(),
            "Guardrails ready"
        );

        Ok(Guardrails {
            engine,
            validator,
            images,
            extractor: ActionExtractor::new()?,
            executor: ActionExecutor::new(),
            audit,
            metrics,
        })
    }
}
