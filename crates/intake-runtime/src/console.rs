//! # Console Transport
//!
//! Drives conversations from line-oriented text so the workflow can run
//! without a chat service. Each input line is
//!
//! ```text
//! <conversant> <command>
//! ```
//!
//! | Command | Event |
//! |---------|-------|
//! | `/start` | `Start` |
//! | `/cancel` | `Cancel` |
//! | `/video [ref]` | `ArtifactUpload` captured now |
//! | `/yes`, `/no` | `Decision` |
//! | anything else | `Text` |
//!
//! Replies are printed one per line as `[<conversant>] <message>`.

use mcode_intake::{
    CaptureInstant, Choice, ConversantId, InboundEnvelope, InboundEvent, OutboundEffect,
};
use thiserror::Error;

/// Artifact reference used when `/video` carries none.
pub const DEFAULT_ARTIFACT_REF: &str = "console-upload";

/// Console line errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    #[error("expected '<conversant> <command>', got {line:?}")]
    MissingCommand { line: String },
}

/// Parse one input line into an envelope. Blank lines yield `None`.
pub fn parse_line(
    line: &str,
    received_at: CaptureInstant,
) -> Result<Option<InboundEnvelope>, ConsoleError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let Some((conversant, command)) = line.split_once(char::is_whitespace) else {
        return Err(ConsoleError::MissingCommand {
            line: line.to_string(),
        });
    };
    let command = command.trim();

    let event = match command.split_once(char::is_whitespace) {
        Some(("/video", reference)) => InboundEvent::ArtifactUpload {
            artifact_ref: reference.trim().to_string(),
            capture_instant: received_at,
        },
        _ => match command {
            "/start" => InboundEvent::Start,
            "/cancel" => InboundEvent::Cancel,
            "/video" => InboundEvent::ArtifactUpload {
                artifact_ref: DEFAULT_ARTIFACT_REF.to_string(),
                capture_instant: received_at,
            },
            "/yes" => InboundEvent::Decision {
                choice: Choice::Affirm,
            },
            "/no" => InboundEvent::Decision {
                choice: Choice::Deny,
            },
            text => InboundEvent::Text {
                text: text.to_string(),
            },
        },
    };

    Ok(Some(InboundEnvelope::new(
        ConversantId::new(conversant),
        received_at,
        event,
    )))
}

/// Render one effect for the console.
pub fn render(conversant_id: &ConversantId, effect: &OutboundEffect) -> String {
    match effect {
        OutboundEffect::Text(message) => format!("[{}] {}", conversant_id, message),
        OutboundEffect::Choice {
            prompt,
            affirm_label,
            deny_label,
        } => format!(
            "[{}] {} ({} /yes, {} /no)",
            conversant_id, prompt, affirm_label, deny_label
        ),
    }
}
