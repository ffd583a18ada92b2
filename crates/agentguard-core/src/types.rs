//! Core types for agentguard

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Which stage of the pipeline produced a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionSource {
    /// Deterministic pattern rule
    Pattern,
    /// Probabilistic intent or image classifier
    Classifier,
    /// Moderation infrastructure failure (always blocks)
    Error,
    /// Action allow-list and parameter policy
    Policy,
}

impl DecisionSource {
    /// Get the lowercase label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pattern => "pattern",
            Self::Classifier => "classifier",
            Self::Error => "error",
            Self::Policy => "policy",
        }
    }
}

impl fmt::Display for DecisionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a moderation or validation call.
///
/// Immutable once built. The only constructors are [`ModerationDecision::block`]
/// and [`ModerationDecision::allow`], and `allow` refuses to produce an
/// unblocked decision for [`DecisionSource::Error`], so an infrastructure
/// failure can never let content through.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModerationDecision {
    blocked: bool,
    reason: String,
    source: DecisionSource,
}

impl ModerationDecision {
    /// Create a blocking decision
    pub fn block(source: DecisionSource, reason: impl Into<String>) -> Self {
        Self {
            blocked: true,
            reason: reason.into(),
            source,
        }
    }

    /// Create a passing decision.
    ///
    /// `DecisionSource::Error` always blocks.
    pub fn allow(source: DecisionSource, reason: impl Into<String>) -> Self {
        Self {
            blocked: source == DecisionSource::Error,
            reason: reason.into(),
            source,
        }
    }

    /// Whether the subject must be rejected
    pub fn blocked(&self) -> bool {
        self.blocked
    }

    /// Whether the subject may proceed
    pub fn is_allowed(&self) -> bool {
        !self.blocked
    }

    /// Human-readable explanation
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Stage that produced this decision
    pub fn source(&self) -> DecisionSource {
        self.source
    }
}

impl fmt::Display for ModerationDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.blocked { "blocked" } else { "allowed" };
        write!(f, "{} by {}: {}", verdict, self.source, self.reason)
    }
}

/// A structured action proposed by an agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Action kind, checked against the allow-list
    #[serde(alias = "action")]
    pub kind: String,

    /// Action parameters
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl ActionRequest {
    /// Create an action request without parameters
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: BTreeMap::new(),
        }
    }

    /// Add a parameter
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Look up a parameter, treating empty values as absent
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}
