//! # Code Allocator
//!
//! Derives the next M-code for an identity from the full ledger history and
//! appends the finalized record.
//!
//! ## Algorithm
//!
//! Every allocation rescans the whole ledger, groups rows by the identity
//! key in their label, and takes the highest numeric suffix per identity.
//! The next code is `highest + 1` (or `1` with no history). No counter is
//! kept between calls, so rows edited or removed outside this process are
//! always respected.
//!
//! ## Malformed Rows
//!
//! A row whose code lacks `_M`, has a non-numeric suffix, or whose prefix
//! differs from the row's own identity key is malformed:
//!
//! - for the identity being allocated, allocation fails with
//!   `MalformedLedgerRecord` and nothing is appended
//! - for every other identity the row is logged and ignored
//!
//! ## Concurrency
//!
//! Scan-then-append runs under an async mutex scoped to the identity key,
//! so two confirmations for the same key never read the same history.
//! Different keys proceed in parallel.

use chrono::FixedOffset;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, info, warn};

use crate::config::IntakeConfig;
use crate::domain::{label_names, Artifact, Code, Identity, IdentityKey, SubmissionRecord};
use crate::error::{IntakeError, IntakeResult};
use crate::ports::outbound::{CodeLedger, LedgerError};

/// A ledger row that cannot contribute a sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedRow {
    /// 1-based position in the ledger.
    pub row: usize,
    pub label: String,
    pub code: String,
    /// Key the code names, when it parses at all.
    pub claimed: Option<IdentityKey>,
    pub reason: String,
}

impl MalformedRow {
    /// Whether the row could hold one of `key`'s sequence numbers, judged
    /// by its label or by the key its code names.
    pub fn concerns(&self, key: &IdentityKey) -> bool {
        self.claimed.as_ref() == Some(key) || label_names(&self.label, key)
    }
}

/// Highest issued sequence per identity, built from one ledger scan.
///
/// A row counts for the key its code names, and only when the label names
/// that same key. The owner is never split out of the label, since keys
/// may contain `_`.
#[derive(Debug, Default)]
pub struct SequenceIndex {
    highest: HashMap<IdentityKey, u32>,
    malformed: Vec<MalformedRow>,
}

impl SequenceIndex {
    pub fn scan(records: &[SubmissionRecord]) -> Self {
        let mut index = Self::default();

        for (position, record) in records.iter().enumerate() {
            let row = position + 1;
            if record.code.trim().is_empty() {
                continue;
            }
            if record.is_unlabelled() {
                debug!("[intake] Ledger row {} has a code but no identity label", row);
                continue;
            }

            let malformed = |claimed: Option<IdentityKey>, reason: String| MalformedRow {
                row,
                label: record.label.clone(),
                code: record.code.clone(),
                claimed,
                reason,
            };

            match Code::parse(&record.code) {
                Ok(code) if record.belongs_to(code.key()) => {
                    let highest = index.highest.entry(code.key().clone()).or_insert(0);
                    *highest = (*highest).max(code.sequence());
                }
                Ok(code) => index.malformed.push(malformed(
                    Some(code.key().clone()),
                    format!(
                        "code prefix {} does not match label '{}'",
                        code.key(),
                        record.label
                    ),
                )),
                Err(e) => index.malformed.push(malformed(None, e.to_string())),
            }
        }

        index
    }

    /// Highest sequence issued to `key`, 0 when none.
    pub fn highest(&self, key: &IdentityKey) -> u32 {
        self.highest.get(key).copied().unwrap_or(0)
    }

    /// Malformed rows that may belong to `key`.
    pub fn malformed_for<'a>(
        &'a self,
        key: &'a IdentityKey,
    ) -> impl Iterator<Item = &'a MalformedRow> + 'a {
        self.malformed.iter().filter(move |bad| bad.concerns(key))
    }

    /// Next code for `key`.
    pub fn next_for(&self, key: &IdentityKey) -> IntakeResult<Code> {
        if let Some(bad) = self.malformed_for(key).next() {
            return Err(IntakeError::MalformedLedgerRecord {
                key: key.clone(),
                row: bad.row,
                code: bad.code.clone(),
                reason: bad.reason.clone(),
            });
        }

        for bad in &self.malformed {
            warn!(
                "[intake] Skipping malformed ledger row {} ('{}', '{}'): {}",
                bad.row, bad.label, bad.code, bad.reason
            );
        }

        let next = self
            .highest(key)
            .checked_add(1)
            .ok_or_else(|| IntakeError::SequenceExhausted { key: key.clone() })?;
        Ok(Code::new(key.clone(), next))
    }
}

/// Issues codes and persists the records that carry them.
pub struct CodeAllocator<L: CodeLedger> {
    ledger: Arc<L>,
    record_offset: FixedOffset,
    max_append_attempts: u32,
    append_retry_backoff: Duration,
    key_locks: Mutex<HashMap<IdentityKey, Arc<AsyncMutex<()>>>>,
}

impl<L: CodeLedger> CodeAllocator<L> {
    pub fn new(ledger: Arc<L>, config: &IntakeConfig) -> Self {
        Self {
            ledger,
            record_offset: config.record_offset,
            max_append_attempts: config.max_append_attempts.max(1),
            append_retry_backoff: config.append_retry_backoff,
            key_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    /// Code the next allocation for `key` would issue. Appends nothing and
    /// takes no key lock, so the answer may be stale by the time it is used.
    pub async fn peek_next(&self, key: &IdentityKey) -> IntakeResult<Code> {
        let records = self.read_history().await?;
        SequenceIndex::scan(&records).next_for(key)
    }

    /// Allocate the next code for `identity` and append its record.
    ///
    /// Returns the record only once the ledger has confirmed the append.
    pub async fn allocate(
        &self,
        identity: &Identity,
        artifact: &Artifact,
    ) -> IntakeResult<SubmissionRecord> {
        let lock = self.key_lock(&identity.key);
        let _guard = lock.lock().await;

        let code = self.peek_next(&identity.key).await.map_err(|e| {
            error!("[intake] Allocation for {} refused: {}", identity.key, e);
            e
        })?;

        let record = SubmissionRecord::new(identity, artifact, self.record_offset, &code);
        let ledger = &self.ledger;
        let row = &record;
        self.with_retries("append", move |attempt| async move {
            // A failed append may still have landed. Under the key lock no one
            // else writes this code, so finding it means our row is there.
            if attempt > 1 && Self::already_recorded(ledger, row).await? {
                warn!(
                    "[intake] {} was recorded despite a failed append, not writing it again",
                    row.code
                );
                return Ok(());
            }
            ledger.append(row.clone()).await
        })
        .await
        .map_err(|(attempts, e)| {
            error!(
                "[intake] Append of {} failed after {} attempt(s): {}",
                code, attempts, e
            );
            IntakeError::LedgerWriteFailure {
                attempts,
                reason: e.to_string(),
            }
        })?;

        info!("[intake] Issued {} to {}", code, identity.label());
        Ok(record)
    }

    async fn already_recorded(ledger: &L, record: &SubmissionRecord) -> Result<bool, LedgerError> {
        Ok(ledger
            .all_records()
            .await?
            .iter()
            .any(|existing| existing.code == record.code))
    }

    async fn read_history(&self) -> IntakeResult<Vec<SubmissionRecord>> {
        let ledger = &self.ledger;
        self.with_retries("scan", move |_| ledger.all_records())
            .await
            .map_err(|(_, e)| match e {
                LedgerError::Corrupt { line, reason } => {
                    IntakeError::LedgerCorrupt { line, reason }
                }
                other => IntakeError::LedgerUnavailable {
                    reason: other.to_string(),
                },
            })
    }

    fn key_lock(&self, key: &IdentityKey) -> Arc<AsyncMutex<()>> {
        Arc::clone(self.key_locks.lock().entry(key.clone()).or_default())
    }

    /// Run `op` (given the 1-based attempt number), retrying transient ledger
    /// errors up to the configured attempt count. On failure returns the
    /// attempts made and last error.
    async fn with_retries<T, F, Fut>(
        &self,
        operation: &'static str,
        mut op: F,
    ) -> Result<T, (u32, LedgerError)>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, LedgerError>>,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_append_attempts => {
                    warn!(
                        "[intake] Ledger {} attempt {}/{} failed: {}",
                        operation, attempt, self.max_append_attempts, e
                    );
                    tokio::time::sleep(self.append_retry_backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err((attempt, e)),
            }
        }
    }
}
