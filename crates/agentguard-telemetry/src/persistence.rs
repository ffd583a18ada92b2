//! Audit log persistence
//!
//! JSON-lines file, opened in append mode, one record per line. The writer
//! never truncates or rewrites existing lines; rotation and retention are
//! left to external tooling.

use crate::audit::AuditRecord;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Append-only audit file writer
pub struct AuditWriter {
    path: PathBuf,
    file: BufWriter<File>,
    flush_interval: usize,
    records_since_flush: usize,
}

impl AuditWriter {
    /// Open `path` for appending, creating it and its parent directory if needed
    pub fn open(path: impl Into<PathBuf>, flush_interval: usize) -> std::io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            file: BufWriter::new(file),
            flush_interval: flush_interval.max(1),
            records_since_flush: 0,
        })
    }

    /// Append one record as a JSON line
    pub fn write_record(&mut self, record: &AuditRecord) -> std::io::Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        self.file.write_all(line.as_bytes())?;
        self.records_since_flush += 1;

        if self.records_since_flush >= self.flush_interval {
            self.flush()?;
        }

        Ok(())
    }

    /// Force flush to disk
    pub fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush()?;
        self.records_since_flush = 0;
        Ok(())
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for AuditWriter {
    fn drop(&mut self) {
        if let Err(e) = self.file.flush() {
            warn!("Failed to flush audit log {:?}: {}", self.path, e);
        }
    }
}

/// Read every record from an audit log file.
///
/// Blank lines are skipped; a malformed line is an `InvalidData` error that
/// names its line number.
pub fn read_log(path: impl AsRef<Path>) -> std::io::Result<Vec<AuditRecord>> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);
    let mut records = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let record = serde_json::from_str(&line).map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("line {}: {}", index + 1, e),
            )
        })?;
        records.push(record);
    }

    Ok(records)
}
