//! # Driving Ports (API - Inbound)
//!
//! What a transport adapter calls into.

use async_trait::async_trait;

use crate::events::{InboundEnvelope, OutboundEffect};

/// Primary API of the intake workflow.
#[async_trait]
pub trait IntakeApi: Send + Sync {
    /// Route one inbound event to the conversant's session.
    ///
    /// Every failure is already folded into human-readable effects; the
    /// transport only has to deliver what comes back, in order.
    async fn route(&self, envelope: InboundEnvelope) -> Vec<OutboundEffect>;
}
