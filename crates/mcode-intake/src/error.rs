//! Error types for the intake workflow

use thiserror::Error;

use crate::domain::IdentityKey;
use crate::events::ConversantId;

/// Intake workflow errors
#[derive(Debug, Error)]
pub enum IntakeError {
    /// Key is not on the roster. Recoverable: the conversant retries.
    #[error("Identity not found: {key}")]
    IdentityNotFound { key: IdentityKey },

    /// Roster could not be consulted. Never reported as "not found".
    #[error("Identity directory unavailable: {reason}")]
    DirectoryUnavailable { reason: String },

    /// A ledger row for this identity carries a code that cannot be trusted.
    /// Allocation stops rather than risk issuing a duplicate.
    #[error("Malformed ledger record for {key} at row {row}: code '{code}' ({reason})")]
    MalformedLedgerRecord {
        key: IdentityKey,
        row: usize,
        code: String,
        reason: String,
    },

    /// A ledger row is unreadable, so no row's owner can be trusted.
    /// Retrying does not help; an operator has to repair the ledger.
    #[error("Ledger row {line} is unreadable: {reason}")]
    LedgerCorrupt { line: usize, reason: String },

    /// Ledger history could not be read.
    #[error("Ledger unavailable: {reason}")]
    LedgerUnavailable { reason: String },

    /// Append did not become durable after every permitted attempt.
    #[error("Ledger write failed after {attempts} attempt(s): {reason}")]
    LedgerWriteFailure { attempts: u32, reason: String },

    /// Sequence space for this identity is used up.
    #[error("Sequence exhausted for {key}")]
    SequenceExhausted { key: IdentityKey },

    /// No active session for the conversant.
    #[error("No session for conversant {conversant_id}")]
    SessionNotFound { conversant_id: ConversantId },
}

/// Result type for intake operations
pub type IntakeResult<T> = Result<T, IntakeError>;
