//! agentguard Core
//!
//! Core types and utilities shared across the agentguard moderation crates.
//!
//! This crate provides:
//! - The `ModerationDecision` returned by every moderation and validation call
//! - The `ActionRequest` shape proposed by agents and checked by the action firewall
//! - Error types and result handling
//! - Text helpers for normalization and log-safe previews

pub mod error;
pub mod text;
pub mod types;

pub use error::{Error, Result};
pub use text::{normalize, preview};
pub use types::{ActionRequest, DecisionSource, ModerationDecision};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{ActionRequest, DecisionSource, ModerationDecision};
}
