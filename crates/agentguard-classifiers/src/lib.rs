//! agentguard Classifiers
//!
//! The two text stages of the moderation pipeline and the image adapters:
//! - Pattern stage: a versioned table of regex rules over normalized text,
//!   pure and deterministic
//! - Intent stage: zero-shot classification over a fixed candidate label set,
//!   delegated to an external service
//! - Image adapters: decode/verify integrity locally, classify remotely
//!
//! External services sit behind the [`ZeroShotClassifier`] and
//! [`ImageClassifier`] traits so they can be swapped for mocks in tests.

pub mod classifier;
pub mod config;
pub mod http;
pub mod image;
pub mod intent;
pub mod labels;
pub mod patterns;

pub use classifier::{ClassificationMetadata, ClassificationResult, ImageClassifier, ZeroShotClassifier};
pub use config::{ClassifierConfig, EndpointConfig};
pub use http::{HttpImageClassifier, HttpZeroShotClassifier};
pub use image::{read_image, DecodingVerifier, ImageInfo, ImageVerifier};
pub use intent::IntentClassifier;
pub use labels::{CandidateLabels, HARMFUL_LABELS, SAFE_LABEL};
pub use patterns::{PatternMatch, PatternMatcher, PatternRule, RiskCategory, RuleTable};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classifier::{ClassificationResult, ImageClassifier, ZeroShotClassifier};
    pub use crate::image::{DecodingVerifier, ImageVerifier};
    pub use crate::intent::IntentClassifier;
    pub use crate::labels::CandidateLabels;
    pub use crate::patterns::{PatternMatcher, RuleTable};
}
