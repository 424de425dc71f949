//! Uploaded video artifacts held by a session until confirmation.

use chrono::{DateTime, FixedOffset};

/// Wall-clock instant carrying the sender's UTC offset.
pub type CaptureInstant = DateTime<FixedOffset>;

/// Reference to an uploaded video plus the instant it was captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Transport-side handle for the upload. `None` when the conversant
    /// advanced past the upload step with plain text.
    pub reference: Option<String>,
    pub captured_at: CaptureInstant,
}

impl Artifact {
    pub fn uploaded(reference: impl Into<String>, captured_at: CaptureInstant) -> Self {
        Self {
            reference: Some(reference.into()),
            captured_at,
        }
    }

    pub fn implicit(captured_at: CaptureInstant) -> Self {
        Self {
            reference: None,
            captured_at,
        }
    }
}
