//! Shared mocks for the policy integration tests

#![allow(dead_code)]

use agentguard_classifiers::{ClassificationResult, ImageClassifier, ZeroShotClassifier, SAFE_LABEL};
use agentguard_core::{Error, Result};
use agentguard_policy::Guardrails;
use agentguard_telemetry::AuditLog;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Zero-shot classifier with a fixed answer
pub struct MockZeroShot {
    label: String,
    score: f32,
    latency: Option<Duration>,
    calls: AtomicU32,
}

impl MockZeroShot {
    pub fn safe() -> Self {
        Self::answering(SAFE_LABEL, 0.95)
    }

    pub fn answering(label: &str, score: f32) -> Self {
        Self {
            label: label.to_string(),
            score,
            latency: None,
            calls: AtomicU32::new(0),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ZeroShotClassifier for MockZeroShot {
    async fn classify(&self, _text: &str, _candidate_labels: &[String]) -> Result<ClassificationResult> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        Ok(ClassificationResult::new(self.label.clone(), self.score))
    }

    fn name(&self) -> &str {
        "mock-zero-shot"
    }
}

/// Zero-shot classifier that is always unreachable
pub struct UnreachableClassifier {
    calls: AtomicU32,
}

impl UnreachableClassifier {
    pub fn new() -> Self {
        Self {
            calls: AtomicU32::new(0),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ZeroShotClassifier for UnreachableClassifier {
    async fn classify(&self, _text: &str, _candidate_labels: &[String]) -> Result<ClassificationResult> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Err(Error::service("connection refused"))
    }

    fn name(&self) -> &str {
        "unreachable"
    }
}

/// Image classifier with a fixed answer that remembers the last image
pub struct MockImageClassifier {
    label: String,
    latency: Option<Duration>,
    calls: AtomicU32,
    last_image: Mutex<Option<Vec<u8>>>,
}

impl MockImageClassifier {
    pub fn answering(label: &str) -> Self {
        Self {
            label: label.to_string(),
            latency: None,
            calls: AtomicU32::new(0),
            last_image: Mutex::new(None),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn last_image(&self) -> Option<Vec<u8>> {
        self.last_image.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageClassifier for MockImageClassifier {
    async fn classify_image(&self, image: &[u8]) -> Result<ClassificationResult> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        *self.last_image.lock().unwrap() = Some(image.to_vec());
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        Ok(ClassificationResult::new(self.label.clone(), 0.93))
    }

    fn name(&self) -> &str {
        "mock-image"
    }
}

/// Guardrails over `classifier` with an in-memory audit log that keeps records
pub fn guardrails_with(classifier: Arc<dyn ZeroShotClassifier>) -> (Guardrails, Arc<AuditLog>) {
    let audit = Arc::new(AuditLog::in_memory());
    let guardrails = Guardrails::builder()
        .zero_shot(classifier)
        .audit(Arc::clone(&audit))
        .build()
        .unwrap();
    (guardrails, audit)
}
