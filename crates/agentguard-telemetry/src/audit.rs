//! Hash-chained audit records

use agentguard_core::{preview, DecisionSource, ModerationDecision};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Chain state for audit records.
///
/// Each record stores the hash of its predecessor, so removing, reordering or
/// editing a record breaks verification.
#[derive(Debug, Default)]
pub struct AuditTrail {
    head: Option<String>,
    count: u64,
}

impl AuditTrail {
    /// Create a new, empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue an existing chain whose last record hashed to `head`
    pub fn resume(head: Option<String>, count: u64) -> Self {
        Self { head, count }
    }

    /// Link `record` to the chain and return it with hashes filled in
    pub fn chain(&mut self, mut record: AuditRecord) -> AuditRecord {
        record.previous_hash = self.head.clone();
        let hash = compute_hash(&record);
        record.hash = Some(hash.clone());

        self.head = Some(hash);
        self.count += 1;
        record
    }

    /// Hash of the latest record
    pub fn head(&self) -> Option<&str> {
        self.head.as_deref()
    }

    /// Number of records chained so far
    pub fn len(&self) -> u64 {
        self.count
    }

    /// Whether no record has been chained
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Verify the integrity of a sequence of records, starting from the first
/// record ever written.
///
/// Returns the index of the first record whose link or hash does not check
/// out, or `None` when the whole sequence is intact.
pub fn verify_chain(records: &[AuditRecord]) -> Option<usize> {
    let mut prev_hash: Option<&str> = None;

    for (index, record) in records.iter().enumerate() {
        if record.previous_hash.as_deref() != prev_hash {
            return Some(index);
        }

        if record.hash.as_deref() != Some(compute_hash(record).as_str()) {
            return Some(index);
        }

        prev_hash = record.hash.as_deref();
    }

    None
}

fn compute_hash(record: &AuditRecord) -> String {
    let mut hasher = Sha256::new();

    let timestamp = record.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true);
    let blocked = if record.blocked { "1" } else { "0" };
    let fields: [&str; 9] = [
        &record.id,
        &timestamp,
        record.severity.as_str(),
        &record.message,
        &record.subject,
        blocked,
        record.source.as_str(),
        &record.reason,
        record.previous_hash.as_deref().unwrap_or(""),
    ];

    // Field separator keeps adjacent fields from running together
    for field in fields {
        hasher.update(field.as_bytes());
        hasher.update(b"\x1f");
    }

    format!("{:x}", hasher.finalize())
}

/// A single persisted decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Unique record ID
    pub id: String,

    /// When the decision was recorded (ISO-8601, UTC)
    pub timestamp: DateTime<Utc>,

    /// Severity level
    pub severity: AuditSeverity,

    /// Decision source plus truncated subject
    pub message: String,

    /// Truncated subject that was moderated
    pub subject: String,

    /// Whether the subject was blocked
    pub blocked: bool,

    /// Stage that decided
    pub source: DecisionSource,

    /// Decision reason
    pub reason: String,

    /// Hash of this record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,

    /// Hash of previous record (for chaining)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_hash: Option<String>,
}

impl AuditRecord {
    /// Build an unchained record for `decision` about `subject`
    pub fn from_decision(subject: &str, decision: &ModerationDecision, preview_chars: usize) -> Self {
        let subject = preview(subject, preview_chars);
        let severity = AuditSeverity::for_decision(decision);
        let verdict = if decision.blocked() { "blocked" } else { "passed" };
        let message = format!(
            "{} {} (reason: {}): {}",
            decision.source(),
            verdict,
            decision.reason(),
            subject
        );

        Self {
            id: generate_record_id(),
            timestamp: Utc::now(),
            severity,
            message,
            subject,
            blocked: decision.blocked(),
            source: decision.source(),
            reason: decision.reason().to_string(),
            hash: None,
            previous_hash: None,
        }
    }
}

/// Generate a unique record ID using UUID v4
fn generate_record_id() -> String {
    format!("evt_{}", uuid::Uuid::new_v4())
}

/// Severity of an audit record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditSeverity {
    Info,
    Warning,
    Error,
}

impl AuditSeverity {
    /// Severity for a decision: passes are info, blocks are warnings, and
    /// infrastructure failures are errors
    pub fn for_decision(decision: &ModerationDecision) -> Self {
        if decision.source() == DecisionSource::Error {
            Self::Error
        } else if decision.blocked() {
            Self::Warning
        } else {
            Self::Info
        }
    }

    /// Get the lowercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for AuditSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(subject: &str, decision: ModerationDecision) -> AuditRecord {
        AuditRecord::from_decision(subject, &decision, 100)
    }

    #[test]
    fn test_audit_trail() {
        let mut trail = AuditTrail::new();

        let first = trail.chain(record(
            "delete system files",
            ModerationDecision::block(DecisionSource::Pattern, "destructive operation"),
        ));
        let second = trail.chain(record(
            "hello",
            ModerationDecision::allow(DecisionSource::Classifier, "safe"),
        ));

        assert_eq!(first.previous_hash, None);
        assert_eq!(second.previous_hash, first.hash);
        assert_eq!(trail.len(), 2);
        assert_eq!(verify_chain(&[first, second]), None);
    }

    #[test]
    fn test_tamper_detection() {
        let mut trail = AuditTrail::new();

        let mut records = vec![
            trail.chain(record("a", ModerationDecision::block(DecisionSource::Policy, "x"))),
            trail.chain(record("b", ModerationDecision::allow(DecisionSource::Policy, "y"))),
        ];

        // Flip a blocked decision to passed
        records[0].blocked = false;

        assert_eq!(verify_chain(&records), Some(0));
    }

    #[test]
    fn test_removed_record_detected() {
        let mut trail = AuditTrail::new();
        let records: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|s| trail.chain(record(s, ModerationDecision::allow(DecisionSource::Policy, "ok"))))
            .collect();

        let gapped = vec![records[0].clone(), records[2].clone()];
        assert_eq!(verify_chain(&gapped), Some(1));
    }

    #[test]
    fn test_severity_mapping() {
        let error = ModerationDecision::block(DecisionSource::Error, "timeout");
        let blocked = ModerationDecision::block(DecisionSource::Classifier, "hate speech");
        let passed = ModerationDecision::allow(DecisionSource::Classifier, "safe");

        assert_eq!(AuditSeverity::for_decision(&error), AuditSeverity::Error);
        assert_eq!(AuditSeverity::for_decision(&blocked), AuditSeverity::Warning);
        assert_eq!(AuditSeverity::for_decision(&passed), AuditSeverity::Info);
    }

    #[test]
    fn test_record_truncates_subject() {
        let long = "x".repeat(500);
        let rec = AuditRecord::from_decision(
            &long,
            &ModerationDecision::allow(DecisionSource::Classifier, "safe"),
            10,
        );
        assert_eq!(rec.subject, format!("{}...", "x".repeat(10)));
        assert!(rec.message.starts_with("classifier passed"));
    }

    #[test]
    fn test_timestamp_serializes_as_iso8601() {
        let rec = record("a", ModerationDecision::allow(DecisionSource::Policy, "ok"));
        let json = serde_json::to_value(&rec).unwrap();
        let ts = json["timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(ts).is_ok());
    }
}
