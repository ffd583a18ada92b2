//! agentguard Policy
//!
//! The moderation and action-validation pipeline.
//!
//! - [`TextModerationEngine`]: pattern rules first, zero-shot intent
//!   classification second, short-circuiting on the first block
//! - [`ActionValidator`]: closed allow-list of action kinds plus per-kind
//!   parameter policy; free-text parameters go back through the text engine
//! - [`ImageContentModerator`]: integrity check, then NSFW classification
//! - [`Guardrails`]: the three boundary operations behind one handle
//!
//! Every call returns a [`ModerationDecision`](agentguard_core::ModerationDecision)
//! and is written to the shared audit log. Infrastructure failures block.

pub mod action;
pub mod config;
pub mod engine;
pub mod executor;
pub mod extract;
pub mod guardrails;
pub mod image;
pub mod validator;

pub use action::{ActionPolicy, ActionPolicyConfig, FileParamPolicy};
pub use config::{ModerationConfig, DEFAULT_CONFIDENCE_THRESHOLD};
pub use engine::TextModerationEngine;
pub use executor::ActionExecutor;
pub use extract::ActionExtractor;
pub use guardrails::{Guardrails, GuardrailsBuilder, ResponseOutcome};
pub use image::ImageContentModerator;
pub use validator::ActionValidator;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::action::{ActionPolicy, ActionPolicyConfig};
    pub use crate::engine::TextModerationEngine;
    pub use crate::guardrails::{Guardrails, ResponseOutcome};
    pub use crate::image::ImageContentModerator;
    pub use crate::validator::ActionValidator;
    pub use agentguard_core::{ActionRequest, DecisionSource, ModerationDecision};
}
