//! Action validation tests

mod common;

use agentguard_core::{ActionRequest, DecisionSource};
use agentguard_policy::{ActionPolicyConfig, Guardrails};
use common::{guardrails_with, MockZeroShot, UnreachableClassifier};
use proptest::prelude::*;
use std::sync::Arc;

fn open_file(filename: &str) -> ActionRequest {
    ActionRequest::new("open_file").with_param("filename", filename)
}

fn search(query: &str) -> ActionRequest {
    ActionRequest::new("search").with_param("query", query)
}

#[tokio::test]
async fn test_path_traversal_blocked() {
    let (guardrails, _) = guardrails_with(Arc::new(MockZeroShot::safe()));

    let decision = guardrails.validate_action(&open_file("../../etc/passwd")).await;

    assert!(decision.blocked());
    assert_eq!(decision.source(), DecisionSource::Policy);
    assert!(decision.reason().contains("path traversal"));
}

#[tokio::test]
async fn test_whitelisted_file_allowed() {
    let (guardrails, _) = guardrails_with(Arc::new(MockZeroShot::safe()));

    let decision = guardrails.validate_action(&open_file("example.txt")).await;

    assert!(!decision.blocked());
    assert_eq!(decision.source(), DecisionSource::Policy);
    assert_eq!(decision.reason(), "action is safe");
}

#[tokio::test]
async fn test_file_outside_whitelist_blocked() {
    let (guardrails, _) = guardrails_with(Arc::new(MockZeroShot::safe()));

    let decision = guardrails.validate_action(&open_file("secrets.txt")).await;

    assert!(decision.blocked());
    assert_eq!(decision.source(), DecisionSource::Policy);
    assert!(decision.reason().contains("secrets.txt"));
}

#[tokio::test]
async fn test_missing_filename_blocked() {
    let (guardrails, _) = guardrails_with(Arc::new(MockZeroShot::safe()));

    let decision = guardrails.validate_action(&ActionRequest::new("open_file")).await;
    assert!(decision.blocked());
    assert_eq!(decision.source(), DecisionSource::Policy);

    let decision = guardrails.validate_action(&open_file("")).await;
    assert!(decision.blocked());
}

#[tokio::test]
async fn test_search_for_card_numbers_blocked_by_pattern() {
    let classifier = Arc::new(MockZeroShot::safe());
    let (guardrails, _) = guardrails_with(classifier.clone());

    let decision = guardrails.validate_action(&search("credit card numbers")).await;

    assert!(decision.blocked());
    assert_eq!(decision.source(), DecisionSource::Pattern);
    assert_eq!(
        decision.reason(),
        "malicious content detected in search query: credit card data solicitation"
    );
    assert_eq!(classifier.call_count(), 0);
}

#[tokio::test]
async fn test_search_counts_as_one_decision() {
    let classifier = Arc::new(MockZeroShot::safe());
    let (guardrails, audit) = guardrails_with(classifier.clone());

    guardrails.validate_action(&search("credit card numbers")).await;
    let snapshot = guardrails.metrics().snapshot();
    assert_eq!(snapshot.total_decisions, 1);
    assert_eq!(snapshot.blocked, 1);
    assert_eq!(snapshot.blocked_by_pattern, 1);

    guardrails.validate_action(&search("rust tutorials")).await;
    let snapshot = guardrails.metrics().snapshot();
    assert_eq!(snapshot.total_decisions, 2);
    assert_eq!(snapshot.blocked, 1);
    assert_eq!(snapshot.classifier_calls, 1);

    // both stages of each search stay in the audit trail
    assert_eq!(audit.records().len(), 4);
}

#[tokio::test]
async fn test_search_blocked_by_classifier_keeps_source() {
    let (guardrails, _) = guardrails_with(Arc::new(MockZeroShot::answering("hate speech", 0.95)));

    let decision = guardrails.validate_action(&search("jokes about my neighbours")).await;

    assert!(decision.blocked());
    assert_eq!(decision.source(), DecisionSource::Classifier);
    assert!(decision.reason().starts_with("malicious content detected in search query:"));
}

#[tokio::test]
async fn test_search_with_unreachable_classifier_blocked() {
    let (guardrails, _) = guardrails_with(Arc::new(UnreachableClassifier::new()));

    let decision = guardrails.validate_action(&search("rust tutorials")).await;

    assert!(decision.blocked());
    assert_eq!(decision.source(), DecisionSource::Error);
}

#[tokio::test]
async fn test_safe_search_allowed() {
    let (guardrails, audit) = guardrails_with(Arc::new(MockZeroShot::safe()));

    let decision = guardrails.validate_action(&search("rust tutorials")).await;

    assert!(!decision.blocked());
    assert_eq!(decision.source(), DecisionSource::Policy);

    // query moderation and action decision are both recorded
    let records = audit.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].subject, "rust tutorials");
    assert_eq!(records[1].subject, "search query=rust tutorials");
}

#[tokio::test]
async fn test_missing_query_blocked() {
    let (guardrails, _) = guardrails_with(Arc::new(MockZeroShot::safe()));

    let decision = guardrails.validate_action(&ActionRequest::new("search")).await;

    assert!(decision.blocked());
    assert_eq!(decision.source(), DecisionSource::Policy);
}

#[tokio::test]
async fn test_shutdown_and_unknown_allowed() {
    let (guardrails, _) = guardrails_with(Arc::new(MockZeroShot::safe()));

    for kind in ["shutdown", "unknown"] {
        let decision = guardrails.validate_action(&ActionRequest::new(kind)).await;
        assert!(!decision.blocked(), "{} should be allowed", kind);
    }
}

#[tokio::test]
async fn test_unlisted_kind_blocked() {
    let (guardrails, _) = guardrails_with(Arc::new(MockZeroShot::safe()));

    let decision = guardrails
        .validate_action(&ActionRequest::new("delete_all_files"))
        .await;

    assert!(decision.blocked());
    assert_eq!(decision.source(), DecisionSource::Policy);
    assert!(decision.reason().contains("delete_all_files"));
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_unlisted_kinds_always_blocked(kind in "[a-zA-Z_]{1,16}") {
        prop_assume!(!["search", "open_file", "shutdown", "unknown"].contains(&kind.as_str()));
        let (guardrails, _) = guardrails_with(Arc::new(MockZeroShot::safe()));

        let decision = runtime().block_on(guardrails.validate_action(&ActionRequest::new(kind)));

        prop_assert!(decision.blocked());
        prop_assert_eq!(decision.source(), DecisionSource::Policy);
    }

    #[test]
    fn prop_path_tokens_blocked_even_when_whitelisted(
        prefix in "[a-z]{0,8}",
        token in prop::sample::select(vec!["..", "/", "\\"]),
        suffix in "[a-z.]{0,8}",
    ) {
        let filename = format!("{}{}{}", prefix, token, suffix);
        let mut policy = ActionPolicyConfig::default();
        policy.files.allowed_filenames.insert(filename.clone());
        let guardrails = Guardrails::builder()
            .zero_shot(Arc::new(MockZeroShot::safe()))
            .action_policy(policy)
            .build()
            .unwrap();

        let decision = runtime().block_on(guardrails.validate_action(&open_file(&filename)));

        prop_assert!(decision.blocked());
        prop_assert_eq!(decision.source(), DecisionSource::Policy);
        prop_assert!(decision.reason().contains("path traversal"));
    }
}
