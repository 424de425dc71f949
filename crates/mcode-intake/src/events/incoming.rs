//! Inbound events from the chat transport.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::CaptureInstant;

/// Transport-side identifier of a conversant (chat user).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversantId(String);

impl ConversantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Answer to a binary-choice prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Choice {
    Affirm,
    Deny,
}

impl Choice {
    /// Read a typed reply as a decision. Case-insensitive.
    pub fn from_text(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "yes" | "y" => Some(Self::Affirm),
            "no" | "n" => Some(Self::Deny),
            _ => None,
        }
    }
}

/// Payload of an inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// Entry command; opens (or restarts) the conversant's session.
    Start,
    /// A video upload.
    ArtifactUpload {
        artifact_ref: String,
        capture_instant: CaptureInstant,
    },
    /// Free text typed by the conversant.
    Text { text: String },
    /// A press on one of the binary-choice buttons.
    Decision { choice: Choice },
    /// Explicit exit from whatever step the session is in.
    Cancel,
}

impl InboundEvent {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::ArtifactUpload { .. } => "artifact_upload",
            Self::Text { .. } => "text",
            Self::Decision { .. } => "decision",
            Self::Cancel => "cancel",
        }
    }
}

/// An inbound event together with who sent it and when it arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEnvelope {
    pub conversant_id: ConversantId,
    pub received_at: CaptureInstant,
    pub event: InboundEvent,
}

impl InboundEnvelope {
    pub fn new(
        conversant_id: ConversantId,
        received_at: CaptureInstant,
        event: InboundEvent,
    ) -> Self {
        Self {
            conversant_id,
            received_at,
            event,
        }
    }
}
