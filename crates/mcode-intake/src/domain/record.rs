//! # Submission Records
//!
//! The persisted unit of the ledger. Column order is significant and must
//! stay compatible with existing ledgers:
//!
//! ```text
//! [date, weekday, time, organization, "{key}_{name}", reserved, code]
//!  2024-05-01  Wednesday  09:15:00  GGG  G017_KELVIN  ""  G017_M0001
//! ```
//!
//! Rows serialize as a plain JSON array of seven strings.

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::artifact::Artifact;
use super::code::Code;
use super::identity::{Identity, IdentityKey};

/// Number of columns in a ledger row.
pub const RECORD_COLUMNS: usize = 7;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const WEEKDAY_FORMAT: &str = "%A";
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// One finalized submission. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "[String; 7]", try_from = "Vec<String>")]
pub struct SubmissionRecord {
    pub date: String,
    pub weekday: String,
    pub time: String,
    pub organization: String,
    /// `{identity_key}_{display_name}`
    pub label: String,
    /// Always written empty; kept for column compatibility.
    pub reserved: String,
    /// Raw code text. Kept as a string so rows written by other tools
    /// survive a read even when the code does not parse.
    pub code: String,
}

/// A ledger row that does not have the seven-column shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected 7 columns, found {found}")]
pub struct RecordShapeError {
    pub found: usize,
}

impl SubmissionRecord {
    /// Build the record for a confirmed submission.
    ///
    /// Date, weekday and time come from the artifact's capture instant
    /// converted to `local_offset`.
    pub fn new(
        identity: &Identity,
        artifact: &Artifact,
        local_offset: FixedOffset,
        code: &Code,
    ) -> Self {
        let local = artifact.captured_at.with_timezone(&local_offset);
        Self {
            date: local.format(DATE_FORMAT).to_string(),
            weekday: local.format(WEEKDAY_FORMAT).to_string(),
            time: local.format(TIME_FORMAT).to_string(),
            organization: identity.organization.clone(),
            label: identity.label(),
            reserved: String::new(),
            code: code.to_string(),
        }
    }

    /// Whether the label names `key`, i.e. reads `{key}_...` (key compared
    /// case-insensitively).
    ///
    /// Keys may themselves contain `_`, so the owner is never re-derived by
    /// splitting the label; callers test the keys they care about.
    pub fn belongs_to(&self, key: &IdentityKey) -> bool {
        label_names(&self.label, key)
    }

    /// Whether this row is one of `key`'s submissions: the label names `key`
    /// and the code, when it parses, carries `key` as well. The second check
    /// separates `AB` from `AB_C` when one key prefixes another.
    pub fn owned_by(&self, key: &IdentityKey) -> bool {
        self.belongs_to(key)
            && Code::parse(&self.code).map_or(true, |code| code.key() == key)
    }

    /// True when the label column is blank.
    pub fn is_unlabelled(&self) -> bool {
        self.label.trim().is_empty()
    }

    /// Columns in ledger order.
    pub fn to_columns(&self) -> [String; RECORD_COLUMNS] {
        self.clone().into()
    }
}

/// Whether `label` reads `{key}_...`, comparing the key case-insensitively.
pub fn label_names(label: &str, key: &IdentityKey) -> bool {
    let key = key.as_str();
    let label = label.trim_start();
    !key.is_empty()
        && label.len() > key.len()
        && label.is_char_boundary(key.len())
        && label[..key.len()].eq_ignore_ascii_case(key)
        && label[key.len()..].starts_with('_')
}

impl From<SubmissionRecord> for [String; RECORD_COLUMNS] {
    fn from(record: SubmissionRecord) -> Self {
        [
            record.date,
            record.weekday,
            record.time,
            record.organization,
            record.label,
            record.reserved,
            record.code,
        ]
    }
}

impl TryFrom<Vec<String>> for SubmissionRecord {
    type Error = RecordShapeError;

    fn try_from(columns: Vec<String>) -> Result<Self, Self::Error> {
        let found = columns.len();
        let [date, weekday, time, organization, label, reserved, code]: [String; RECORD_COLUMNS] =
            columns
                .try_into()
                .map_err(|_| RecordShapeError { found })?;

        Ok(Self {
            date,
            weekday,
            time,
            organization,
            label,
            reserved,
            code,
        })
    }
}
