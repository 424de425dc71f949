//! # Driven Ports (SPI - Outbound Dependencies)
//!
//! The roster and the ledger are external collaborators. Adapters in
//! `crate::adapters` provide in-memory and file-backed implementations.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Identity, IdentityKey, SubmissionRecord};

/// Read-only roster lookup.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Resolve a normalized key.
    ///
    /// ## Returns
    ///
    /// - `Ok(Some(identity))`: key is on the roster
    /// - `Ok(None)`: roster was consulted and has no such key
    /// - `Err(DirectoryError)`: roster could not be consulted
    async fn lookup(&self, key: &IdentityKey) -> Result<Option<Identity>, DirectoryError>;
}

/// Append-only submission history.
///
/// The ledger is the source of truth for code allocation; nothing in this
/// crate caches sequence numbers across calls.
#[async_trait]
pub trait CodeLedger: Send + Sync {
    /// Every record, in append order.
    async fn all_records(&self) -> Result<Vec<SubmissionRecord>, LedgerError>;

    /// Records belonging to one identity, in append order.
    async fn records_for(&self, key: &IdentityKey) -> Result<Vec<SubmissionRecord>, LedgerError> {
        let records = self.all_records().await?;
        Ok(records
            .into_iter()
            .filter(|record| record.owned_by(key))
            .collect())
    }

    /// Append a finalized record. `Ok` means the record is durable.
    async fn append(&self, record: SubmissionRecord) -> Result<(), LedgerError>;
}

/// Roster errors.
#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    /// Backing store could not be reached.
    #[error("directory unavailable: {reason}")]
    Unavailable { reason: String },

    /// Roster source exists but is not a valid roster.
    #[error("invalid roster: {reason}")]
    InvalidRoster { reason: String },
}

/// Ledger errors.
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    /// Read or write failed at the I/O layer.
    #[error("ledger I/O error: {reason}")]
    Io { reason: String },

    /// A stored row is not a seven-column record.
    #[error("ledger row {line} is corrupt: {reason}")]
    Corrupt { line: usize, reason: String },
}

impl LedgerError {
    /// Whether a bounded retry may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            reason: err.to_string(),
        }
    }
}
