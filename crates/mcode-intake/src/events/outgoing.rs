//! # Outbound Effects
//!
//! What the session asks the transport to show. Prompt wording lives here
//! so every state handler speaks with the same voice.

use serde::{Deserialize, Serialize};

use crate::domain::Identity;

/// Something the transport must deliver to the conversant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboundEffect {
    /// Plain text message.
    Text(String),
    /// Message with two labeled options (affirm first, deny second).
    Choice {
        prompt: String,
        affirm_label: String,
        deny_label: String,
    },
}

impl OutboundEffect {
    pub fn text(message: impl Into<String>) -> Self {
        Self::Text(message.into())
    }

    /// Message body regardless of variant.
    pub fn message(&self) -> &str {
        match self {
            Self::Text(message) => message,
            Self::Choice { prompt, .. } => prompt,
        }
    }
}

/// Prompt texts.
pub mod prompts {
    use super::*;

    pub const WELCOME: &str = "Hi! Please upload your first video.";
    pub const ASK_IDENTITY: &str = "Thank you. Please enter your Staff ID (e.g. G017).";
    pub const IDENTITY_NOT_FOUND: &str = "Staff ID not found. Please enter a valid Staff ID.";
    pub const DIRECTORY_UNAVAILABLE: &str =
        "The staff directory is unavailable right now. Please try again later.";
    pub const REENTER_IDENTITY: &str = "Please re-enter your correct Staff ID.";
    pub const UPLOAD_ANOTHER: &str = "Do you want to upload another video?\n✅ Yes\n❌ No";
    pub const SUBMISSION_FAILED: &str =
        "Sorry, your submission could not be recorded. Please confirm again in a moment.";
    pub const SUBMISSION_BLOCKED: &str =
        "Sorry, your submission could not be recorded. The operator has been notified.";
    pub const PLEASE_START: &str = "Please send /start to begin a submission.";
    pub const CANCELLED: &str = "Submission cancelled. Send /start whenever you are ready.";
    pub const AFFIRM_LABEL: &str = "Yes";
    pub const DENY_LABEL: &str = "No";

    pub fn confirm_identity(identity: &Identity) -> OutboundEffect {
        OutboundEffect::Choice {
            prompt: format!(
                "Is this correct?\n\nStaff ID: {}\nName: {}",
                identity.key, identity.display_name
            ),
            affirm_label: AFFIRM_LABEL.to_string(),
            deny_label: DENY_LABEL.to_string(),
        }
    }

    pub fn code_issued(code: &str) -> OutboundEffect {
        OutboundEffect::text(format!(
            "✅ New M Code: {}\nYour video has been received and recorded.",
            code
        ))
    }
}
