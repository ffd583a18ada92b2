//! Image moderation tests

mod common;

use agentguard_classifiers::{DecodingVerifier, ImageInfo, ImageVerifier};
use agentguard_core::{DecisionSource, Result};
use agentguard_policy::Guardrails;
use common::{MockImageClassifier, MockZeroShot};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn write_png(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("photo.png");
    image::RgbImage::from_pixel(4, 4, image::Rgb([200, 120, 40]))
        .save(&path)
        .unwrap();
    path
}

fn guardrails_with_images(classifier: Arc<MockImageClassifier>) -> Guardrails {
    Guardrails::builder()
        .zero_shot(Arc::new(MockZeroShot::safe()))
        .image_classifier(classifier)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_safe_image_allowed() {
    let dir = TempDir::new().unwrap();
    let path = write_png(&dir);
    let classifier = Arc::new(MockImageClassifier::answering("normal"));
    let guardrails = guardrails_with_images(classifier.clone());

    let decision = guardrails.moderate_image(&path).await;

    assert!(!decision.blocked());
    assert_eq!(decision.source(), DecisionSource::Classifier);
    assert_eq!(classifier.call_count(), 1);
}

#[tokio::test]
async fn test_classifier_sees_the_bytes_on_disk() {
    let dir = TempDir::new().unwrap();
    let path = write_png(&dir);
    let classifier = Arc::new(MockImageClassifier::answering("normal"));
    let guardrails = guardrails_with_images(classifier.clone());

    guardrails.moderate_image(&path).await;

    assert_eq!(classifier.last_image(), Some(std::fs::read(&path).unwrap()));
}

/// Verifies normally, then overwrites the file on disk
struct ReplacingVerifier {
    path: PathBuf,
}

impl ImageVerifier for ReplacingVerifier {
    fn verify(&self, image: &[u8]) -> Result<ImageInfo> {
        let info = DecodingVerifier::new().verify(image)?;
        std::fs::write(&self.path, b"not an image at all").unwrap();
        Ok(info)
    }
}

#[tokio::test]
async fn test_file_replaced_after_verification_is_not_reread() {
    let dir = TempDir::new().unwrap();
    let path = write_png(&dir);
    let original = std::fs::read(&path).unwrap();
    let classifier = Arc::new(MockImageClassifier::answering("normal"));
    let guardrails = Guardrails::builder()
        .zero_shot(Arc::new(MockZeroShot::safe()))
        .image_classifier(classifier.clone())
        .verifier(Arc::new(ReplacingVerifier { path: path.clone() }))
        .build()
        .unwrap();

    let decision = guardrails.moderate_image(&path).await;

    assert!(!decision.blocked());
    assert_eq!(std::fs::read(&path).unwrap(), b"not an image at all");
    assert_eq!(classifier.last_image(), Some(original));
}

#[tokio::test]
async fn test_oversized_image_blocked_before_classification() {
    let dir = TempDir::new().unwrap();
    let path = write_png(&dir);
    let classifier = Arc::new(MockImageClassifier::answering("normal"));
    let guardrails = Guardrails::builder()
        .zero_shot(Arc::new(MockZeroShot::safe()))
        .image_classifier(classifier.clone())
        .verifier(Arc::new(DecodingVerifier::new().with_max_bytes(8)))
        .build()
        .unwrap();

    let decision = guardrails.moderate_image(&path).await;

    assert!(decision.blocked());
    assert_eq!(decision.source(), DecisionSource::Error);
    assert!(decision.reason().contains("too large"));
    assert_eq!(classifier.call_count(), 0);
}

#[tokio::test]
async fn test_nsfw_image_blocked() {
    let dir = TempDir::new().unwrap();
    let path = write_png(&dir);
    let guardrails = guardrails_with_images(Arc::new(MockImageClassifier::answering("NSFW")));

    let decision = guardrails.moderate_image(&path).await;

    assert!(decision.blocked());
    assert_eq!(decision.source(), DecisionSource::Classifier);
    assert!(decision.reason().contains("NSFW"));
}

#[tokio::test]
async fn test_corrupt_image_blocked_before_classification() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.png");
    std::fs::write(&path, b"\x89PNG\r\n\x1a\nnot really a png").unwrap();
    let classifier = Arc::new(MockImageClassifier::answering("normal"));
    let guardrails = guardrails_with_images(classifier.clone());

    let decision = guardrails.moderate_image(&path).await;

    assert!(decision.blocked());
    assert_eq!(decision.source(), DecisionSource::Error);
    assert_eq!(classifier.call_count(), 0);
}

#[tokio::test]
async fn test_missing_image_blocked() {
    let dir = TempDir::new().unwrap();
    let guardrails = guardrails_with_images(Arc::new(MockImageClassifier::answering("normal")));

    let decision = guardrails.moderate_image(&dir.path().join("nope.jpg")).await;

    assert!(decision.blocked());
    assert_eq!(decision.source(), DecisionSource::Error);
}

#[tokio::test(start_paused = true)]
async fn test_slow_image_classifier_times_out() {
    let dir = TempDir::new().unwrap();
    let path = write_png(&dir);
    let classifier =
        Arc::new(MockImageClassifier::answering("normal").with_latency(Duration::from_secs(60)));
    let guardrails = guardrails_with_images(classifier);

    let decision = guardrails.moderate_image(&path).await;

    assert!(decision.blocked());
    assert_eq!(decision.source(), DecisionSource::Error);
}

#[tokio::test]
async fn test_unconfigured_image_moderation_blocks() {
    let dir = TempDir::new().unwrap();
    let path = write_png(&dir);
    let (guardrails, audit) = common::guardrails_with(Arc::new(MockZeroShot::safe()));
    assert!(!guardrails.has_image_moderation());

    let decision = guardrails.moderate_image(&path).await;

    assert!(decision.blocked());
    assert_eq!(decision.source(), DecisionSource::Error);
    assert_eq!(audit.len(), 1);
}
