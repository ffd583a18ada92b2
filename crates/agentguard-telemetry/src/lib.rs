//! agentguard Telemetry
//!
//! Decision trail and metrics for the moderation pipeline.
//!
//! Provides:
//! - A process-wide, append-only audit log of every moderation decision
//! - SHA-256 hash chaining so edits to the trail are detectable
//! - JSON-lines persistence, one line per decision
//! - Decision counters and classifier latency totals

pub mod audit;
pub mod log;
pub mod metrics;
pub mod persistence;

pub use audit::{verify_chain, AuditRecord, AuditSeverity, AuditTrail};
pub use log::{AuditConfig, AuditLog};
pub use metrics::{MetricsCollector, MetricsSnapshot};
pub use persistence::{read_log, AuditWriter};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::audit::{AuditRecord, AuditSeverity};
    pub use crate::log::{AuditConfig, AuditLog};
    pub use crate::metrics::MetricsCollector;
}
