//! # M-Codes
//!
//! Tracking codes have the shape `{identity_key}_M{sequence}` where the
//! sequence is zero-padded to four digits (`G017_M0001`). Sequences past
//! 9999 keep every digit rather than wrapping.

use super::identity::IdentityKey;
use std::fmt;
use thiserror::Error;

/// Separator between the identity key and the sequence number.
pub const CODE_INFIX: &str = "_M";

/// Minimum rendered width of the sequence number.
pub const SEQUENCE_WIDTH: usize = 4;

/// A parsed or freshly allocated tracking code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Code {
    key: IdentityKey,
    sequence: u32,
}

/// Why a ledger code string could not be read back as a [`Code`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeParseError {
    #[error("missing '_M' separator")]
    MissingInfix,

    #[error("empty identity prefix")]
    EmptyPrefix,

    #[error("sequence '{digits}' is not a number")]
    InvalidSequence { digits: String },
}

impl Code {
    pub fn new(key: IdentityKey, sequence: u32) -> Self {
        Self { key, sequence }
    }

    pub fn key(&self) -> &IdentityKey {
        &self.key
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Parse a code string as stored in the ledger.
    ///
    /// The split happens at the last `_M`, so keys that themselves contain
    /// `_M` still parse. The sequence must be plain ASCII digits.
    pub fn parse(raw: &str) -> Result<Self, CodeParseError> {
        let raw = raw.trim();
        let (prefix, digits) = raw
            .rsplit_once(CODE_INFIX)
            .ok_or(CodeParseError::MissingInfix)?;

        if prefix.trim().is_empty() {
            return Err(CodeParseError::EmptyPrefix);
        }

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CodeParseError::InvalidSequence {
                digits: digits.to_string(),
            });
        }

        let sequence = digits
            .parse::<u32>()
            .map_err(|_| CodeParseError::InvalidSequence {
                digits: digits.to_string(),
            })?;

        Ok(Self {
            key: IdentityKey::normalize(prefix),
            sequence,
        })
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{:0width$}",
            self.key,
            CODE_INFIX,
            self.sequence,
            width = SEQUENCE_WIDTH
        )
    }
}
