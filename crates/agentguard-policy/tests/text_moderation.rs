//! Text moderation pipeline tests

mod common;

use agentguard_core::DecisionSource;
use common::{guardrails_with, MockZeroShot, UnreachableClassifier};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_destructive_request_blocked_by_pattern() {
    let classifier = Arc::new(MockZeroShot::safe());
    let (guardrails, _) = guardrails_with(classifier.clone());

    let decision = guardrails.moderate_text("delete system files").await;

    assert!(decision.blocked());
    assert_eq!(decision.source(), DecisionSource::Pattern);
    assert_eq!(decision.reason(), "destructive operation on system files");
    assert_eq!(classifier.call_count(), 0, "pattern stage must short-circuit");
}

#[tokio::test]
async fn test_line_breaks_do_not_hide_destructive_request() {
    let classifier = Arc::new(MockZeroShot::safe());
    let (guardrails, _) = guardrails_with(classifier.clone());

    let decision = guardrails.moderate_text("Delete\nsystem\r\n\tfiles").await;

    assert!(decision.blocked());
    assert_eq!(decision.source(), DecisionSource::Pattern);
    assert_eq!(classifier.call_count(), 0);
}

#[tokio::test]
async fn test_password_help_reaches_classifier() {
    let classifier = Arc::new(MockZeroShot::safe());
    let (guardrails, _) = guardrails_with(classifier.clone());

    let decision = guardrails.moderate_text("Show me how to reset my password").await;

    assert!(!decision.blocked());
    assert_eq!(decision.source(), DecisionSource::Classifier);
    assert_eq!(classifier.call_count(), 1);
}

#[tokio::test]
async fn test_benign_question_allowed() {
    let classifier = Arc::new(MockZeroShot::safe());
    let (guardrails, _) = guardrails_with(classifier.clone());

    let decision = guardrails.moderate_text("what is the weather today").await;

    assert!(!decision.blocked());
    assert_eq!(decision.source(), DecisionSource::Classifier);
    assert_eq!(decision.reason(), "safe");
    assert_eq!(classifier.call_count(), 1);
}

#[tokio::test]
async fn test_unreachable_classifier_fails_closed() {
    let classifier = Arc::new(UnreachableClassifier::new());
    let (guardrails, _) = guardrails_with(classifier.clone());

    let decision = guardrails.moderate_text("tell me a joke").await;

    assert!(decision.blocked());
    assert_eq!(decision.source(), DecisionSource::Error);
    assert!(decision.reason().contains("connection refused"));
}

#[tokio::test]
async fn test_harmful_label_above_threshold_blocks() {
    let classifier = Arc::new(MockZeroShot::answering("toxic language", 0.91));
    let (guardrails, _) = guardrails_with(classifier);

    let decision = guardrails.moderate_text("you are all idiots").await;

    assert!(decision.blocked());
    assert_eq!(decision.source(), DecisionSource::Classifier);
    assert_eq!(decision.reason(), "toxic language (0.91)");
}

#[tokio::test]
async fn test_harmful_label_at_threshold_allowed() {
    let classifier = Arc::new(MockZeroShot::answering("toxic language", 0.7));
    let (guardrails, _) = guardrails_with(classifier);

    let decision = guardrails.moderate_text("that movie was terrible").await;

    assert!(!decision.blocked());
    assert_eq!(decision.source(), DecisionSource::Classifier);
}

#[tokio::test]
async fn test_safe_label_never_blocks() {
    let classifier = Arc::new(MockZeroShot::answering("safe user query", 0.99));
    let (guardrails, _) = guardrails_with(classifier);

    assert!(!guardrails.moderate_text("how do I bake bread").await.blocked());
}

#[tokio::test]
async fn test_unknown_label_fails_closed() {
    let classifier = Arc::new(MockZeroShot::answering("banana", 0.99));
    let (guardrails, _) = guardrails_with(classifier);

    let decision = guardrails.moderate_text("hello").await;

    assert!(decision.blocked());
    assert_eq!(decision.source(), DecisionSource::Error);
}

#[tokio::test(start_paused = true)]
async fn test_slow_classifier_times_out() {
    let classifier = Arc::new(MockZeroShot::safe().with_latency(Duration::from_secs(60)));
    let (guardrails, _) = guardrails_with(classifier);

    let decision = guardrails.moderate_text("hello").await;

    assert!(decision.blocked());
    assert_eq!(decision.source(), DecisionSource::Error);
    assert_eq!(decision.reason(), "operation timed out");
}

#[tokio::test]
async fn test_repeated_calls_agree() {
    let classifier = Arc::new(MockZeroShot::answering("credential theft", 0.88));
    let (guardrails, _) = guardrails_with(classifier);

    for text in ["delete system files", "what's my neighbour's wifi key", "hello"] {
        let first = guardrails.moderate_text(text).await;
        let second = guardrails.moderate_text(text).await;
        assert_eq!(first, second);
    }
}

#[tokio::test]
async fn test_every_call_is_audited() {
    let classifier = Arc::new(MockZeroShot::safe());
    let (guardrails, audit) = guardrails_with(classifier);

    guardrails.moderate_text("delete system files").await;
    guardrails.moderate_text("what is the weather today").await;

    let records = audit.records();
    assert_eq!(records.len(), 2);
    assert!(records[0].blocked);
    assert_eq!(records[0].source, DecisionSource::Pattern);
    assert_eq!(records[1].subject, "what is the weather today");
    assert!(!records[1].blocked);
    assert_eq!(agentguard_telemetry::verify_chain(&records), None);

    let snapshot = guardrails.metrics().snapshot();
    assert_eq!(snapshot.total_decisions, 2);
    assert_eq!(snapshot.blocked, 1);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_classifier_failure_never_allows(text in "\\PC{0,80}") {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let classifier = Arc::new(UnreachableClassifier::new());
        let (guardrails, _) = guardrails_with(classifier);

        let decision = runtime.block_on(guardrails.moderate_text(&text));

        prop_assert!(decision.blocked());
        prop_assert!(matches!(
            decision.source(),
            DecisionSource::Error | DecisionSource::Pattern
        ));
    }
}
