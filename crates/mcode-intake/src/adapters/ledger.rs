//! # Ledger Adapters
//!
//! Implementations of the `CodeLedger` port.
//!
//! - [`FileLedger`]: durable append-only file, one JSON array per line
//! - [`InMemoryLedger`]: volatile ledger for tests and dry runs, with
//!   failure injection for retry paths
//!
//! ## File Locking
//!
//! The file ledger takes a shared `fs2` lock for scans and an exclusive one
//! for appends, so a second process pointed at the same file cannot
//! interleave half-written rows with ours.

use async_trait::async_trait;
use fs2::FileExt;
use parking_lot::RwLock;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::SubmissionRecord;
use crate::ports::outbound::{CodeLedger, LedgerError};

// =============================================================================
// FILE LEDGER
// =============================================================================

/// Append-only ledger file.
#[derive(Debug, Clone)]
pub struct FileLedger {
    path: PathBuf,
}

impl FileLedger {
    /// Open (creating if needed) the ledger file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(path: &Path) -> Result<Vec<SubmissionRecord>, LedgerError> {
        let file = File::open(path)?;
        FileExt::lock_shared(&file)?;

        let mut records = Vec::new();
        for (index, line) in BufReader::new(&file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record =
                serde_json::from_str(&line).map_err(|e| LedgerError::Corrupt {
                    line: index + 1,
                    reason: e.to_string(),
                })?;
            records.push(record);
        }

        FileExt::unlock(&file)?;
        Ok(records)
    }

    fn append_line(path: &Path, record: &SubmissionRecord) -> Result<(), LedgerError> {
        let row = serde_json::to_string(record).map_err(|e| LedgerError::Io {
            reason: e.to_string(),
        })?;

        let mut file = OpenOptions::new().read(true).append(true).open(path)?;
        FileExt::lock_exclusive(&file)?;

        let original_len = file.metadata()?.len();
        let mut line = String::with_capacity(row.len() + 2);
        if Self::missing_trailing_newline(&mut file)? {
            line.push('\n');
        }
        line.push_str(&row);
        line.push('\n');

        let written = file
            .write_all(line.as_bytes())
            .and_then(|()| file.sync_data());
        if let Err(e) = written {
            // Truncate whatever part of the row reached the file.
            if let Err(rollback) = file.set_len(original_len).and_then(|()| file.sync_data()) {
                warn!(
                    "[intake] Could not roll back failed append to {}: {}",
                    path.display(),
                    rollback
                );
            }
            return Err(e.into());
        }

        FileExt::unlock(&file)?;
        Ok(())
    }

    /// True when the last byte of a non-empty file is not `\n`, e.g. after a
    /// hand edit.
    fn missing_trailing_newline(file: &mut File) -> Result<bool, LedgerError> {
        if file.metadata()?.len() == 0 {
            return Ok(false);
        }
        file.seek(SeekFrom::End(-1))?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last)?;
        Ok(last[0] != b'\n')
    }
}

#[async_trait]
impl CodeLedger for FileLedger {
    async fn all_records(&self) -> Result<Vec<SubmissionRecord>, LedgerError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || Self::read_all(&path))
            .await
            .map_err(|e| LedgerError::Io {
                reason: e.to_string(),
            })?
    }

    async fn append(&self, record: SubmissionRecord) -> Result<(), LedgerError> {
        let path = self.path.clone();
        let code = record.code.clone();
        tokio::task::spawn_blocking(move || Self::append_line(&path, &record))
            .await
            .map_err(|e| LedgerError::Io {
                reason: e.to_string(),
            })??;
        debug!("[intake] Appended {} to {}", code, self.path.display());
        Ok(())
    }
}

// =============================================================================
// IN-MEMORY LEDGER
// =============================================================================

/// Volatile ledger.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    records: RwLock<Vec<SubmissionRecord>>,
    /// Number of upcoming appends that fail with an I/O error.
    failing_appends: AtomicU32,
    /// Number of upcoming appends that store the record and still report
    /// an I/O error, as when a write lands but the sync fails.
    landing_failures: AtomicU32,
    /// Artificial latency on scans; widens race windows in tests.
    scan_delay: Option<Duration>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger pre-populated with history.
    pub fn with_records(records: Vec<SubmissionRecord>) -> Self {
        Self {
            records: RwLock::new(records),
            ..Self::default()
        }
    }

    pub fn with_scan_delay(mut self, delay: Duration) -> Self {
        self.scan_delay = Some(delay);
        self
    }

    /// Make the next `count` appends fail with a transient I/O error.
    pub fn fail_next_appends(&self, count: u32) {
        self.failing_appends.store(count, Ordering::SeqCst);
    }

    /// Make the next `count` appends store their record and then fail with
    /// a transient I/O error.
    pub fn fail_next_appends_after_storing(&self, count: u32) {
        self.landing_failures.store(count, Ordering::SeqCst);
    }

    /// Snapshot of every record.
    pub fn records(&self) -> Vec<SubmissionRecord> {
        self.records.read().clone()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl CodeLedger for InMemoryLedger {
    async fn all_records(&self) -> Result<Vec<SubmissionRecord>, LedgerError> {
        if let Some(delay) = self.scan_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.records.read().clone())
    }

    async fn append(&self, record: SubmissionRecord) -> Result<(), LedgerError> {
        let injected = self
            .failing_appends
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(LedgerError::Io {
                reason: "injected append failure".to_string(),
            });
        }
        self.records.write().push(record);

        let landed_then_failed = self
            .landing_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if landed_then_failed {
            return Err(LedgerError::Io {
                reason: "injected sync failure after write".to_string(),
            });
        }
        Ok(())
    }
}
