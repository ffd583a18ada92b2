//! Process-wide audit log
//!
//! One [`AuditLog`] is built at startup and shared (behind an `Arc`) by every
//! moderation component for the lifetime of the process. Appends are
//! serialized by a single mutex so concurrent callers never interleave
//! partial lines, and `record` never returns an error: a failing disk is
//! reported through `tracing` and the moderation path carries on.

use crate::audit::{AuditRecord, AuditSeverity, AuditTrail};
use crate::persistence::{read_log, AuditWriter};
use agentguard_core::ModerationDecision;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Configuration for the audit log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// JSON-lines file to append to; `None` keeps the log off disk
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Characters of the subject kept in each record
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,

    /// Flush to disk after this many records
    #[serde(default = "default_flush_interval")]
    pub flush_interval: usize,

    /// Keep every record in memory as well
    #[serde(default)]
    pub retain_in_memory: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            path: None,
            preview_chars: default_preview_chars(),
            flush_interval: default_flush_interval(),
            retain_in_memory: false,
        }
    }
}

fn default_preview_chars() -> usize {
    100
}

fn default_flush_interval() -> usize {
    1
}

struct AuditInner {
    trail: AuditTrail,
    writer: Option<AuditWriter>,
    retained: Option<Vec<AuditRecord>>,
}

/// Append-only decision trail
pub struct AuditLog {
    preview_chars: usize,
    inner: Mutex<AuditInner>,
}

impl AuditLog {
    /// Open the audit log described by `config`.
    ///
    /// When the file already holds records the hash chain continues from the
    /// last one.
    pub fn new(config: AuditConfig) -> std::io::Result<Self> {
        let (trail, writer) = match config.path {
            Some(ref path) => {
                let trail = resume_trail(path);
                let writer = AuditWriter::open(path, config.flush_interval)?;
                info!("Audit log opened at {:?}", path);
                (trail, Some(writer))
            }
            None => (AuditTrail::new(), None),
        };

        Ok(Self {
            preview_chars: config.preview_chars,
            inner: Mutex::new(AuditInner {
                trail,
                writer,
                retained: config.retain_in_memory.then(Vec::new),
            }),
        })
    }

    /// An audit log that keeps records in memory only
    pub fn in_memory() -> Self {
        Self {
            preview_chars: default_preview_chars(),
            inner: Mutex::new(AuditInner {
                trail: AuditTrail::new(),
                writer: None,
                retained: Some(Vec::new()),
            }),
        }
    }

    /// Record `decision` about `subject`. Never fails.
    pub fn record(&self, subject: &str, decision: &ModerationDecision) {
        let record = AuditRecord::from_decision(subject, decision, self.preview_chars);

        match record.severity {
            AuditSeverity::Error => error!(source = %record.source, "{}", record.message),
            AuditSeverity::Warning => warn!(source = %record.source, "{}", record.message),
            AuditSeverity::Info => info!(source = %record.source, "{}", record.message),
        }

        let mut inner = self.inner.lock();
        let record = inner.trail.chain(record);

        if let Some(writer) = inner.writer.as_mut() {
            if let Err(e) = writer.write_record(&record) {
                warn!("Failed to write audit record {}: {}", record.id, e);
            }
        }

        if let Some(retained) = inner.retained.as_mut() {
            retained.push(record);
        }
    }

    /// Records kept in memory (empty unless retention is on)
    pub fn records(&self) -> Vec<AuditRecord> {
        self.inner.lock().retained.clone().unwrap_or_default()
    }

    /// Number of records in the trail, including those already on disk
    /// when the log was opened
    pub fn len(&self) -> u64 {
        self.inner.lock().trail.len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flush buffered records to disk
    pub fn flush(&self) {
        if let Some(writer) = self.inner.lock().writer.as_mut() {
            if let Err(e) = writer.flush() {
                warn!("Failed to flush audit log: {}", e);
            }
        }
    }
}

/// Pick up the chain head from an existing log file
fn resume_trail(path: &Path) -> AuditTrail {
    if !path.exists() {
        return AuditTrail::new();
    }

    match read_log(path) {
        Ok(records) => {
            let head = records.last().and_then(|r| r.hash.clone());
            AuditTrail::resume(head, records.len() as u64)
        }
        Err(e) => {
            warn!("Existing audit log {:?} is unreadable, starting a new chain: {}", path, e);
            AuditTrail::new()
        }
    }
}
