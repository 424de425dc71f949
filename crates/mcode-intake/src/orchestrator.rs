//! # Session Orchestrator
//!
//! Owns one [`SubmissionSession`] per conversant and routes inbound events
//! to it.
//!
//! ## Lifecycle
//!
//! - `Start` creates a session (replacing any existing one) and welcomes
//! - `Cancel` disposes the session from any state
//! - other events require a session; without one the conversant is asked
//!   to start first
//! - [`SessionOrchestrator::dispose_idle`] drops sessions idle past the
//!   configured timeout
//!
//! ## Ordering
//!
//! Each session sits behind its own FIFO async mutex, so events for one
//! conversant are applied one at a time in arrival order while different
//! conversants proceed in parallel. The session map lock is never held
//! across an await.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::allocator::CodeAllocator;
use crate::config::IntakeConfig;
use crate::error::IntakeError;
use crate::events::{prompts, ConversantId, InboundEnvelope, InboundEvent, OutboundEffect};
use crate::ports::inbound::IntakeApi;
use crate::ports::outbound::{CodeLedger, IdentityDirectory};
use crate::session::{SessionState, SubmissionSession};

type SessionSlot = Arc<AsyncMutex<SubmissionSession>>;

/// Routes events to per-conversant sessions.
pub struct SessionOrchestrator<D, L>
where
    D: IdentityDirectory,
    L: CodeLedger,
{
    config: IntakeConfig,
    directory: Arc<D>,
    allocator: Arc<CodeAllocator<L>>,
    sessions: RwLock<HashMap<ConversantId, SessionSlot>>,
}

impl<D, L> SessionOrchestrator<D, L>
where
    D: IdentityDirectory,
    L: CodeLedger,
{
    pub fn new(config: IntakeConfig, directory: Arc<D>, ledger: Arc<L>) -> Self {
        let allocator = Arc::new(CodeAllocator::new(ledger, &config));
        Self {
            config,
            directory,
            allocator,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &IntakeConfig {
        &self.config
    }

    pub fn allocator(&self) -> &Arc<CodeAllocator<L>> {
        &self.allocator
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.read().len()
    }

    /// Current state of a conversant's session, waiting for any event in
    /// flight to finish first.
    pub async fn state_of(&self, conversant_id: &ConversantId) -> Option<SessionState> {
        let slot = self.slot(conversant_id)?;
        let session = slot.lock().await;
        Some(session.state())
    }

    /// Drop sessions idle for at least the configured timeout.
    ///
    /// Sessions busy with an event are skipped. Returns how many were
    /// disposed.
    pub fn dispose_idle(&self, now: Instant) -> usize {
        let timeout = self.config.session_idle_timeout;
        let mut sessions = self.sessions.write();
        let before = sessions.len();

        sessions.retain(|conversant_id, slot| match slot.try_lock() {
            Ok(session) if session.idle_for(now) >= timeout => {
                info!(
                    "[intake] Disposing idle session {} (state {:?})",
                    conversant_id,
                    session.state()
                );
                false
            }
            _ => true,
        });

        before - sessions.len()
    }

    fn slot(&self, conversant_id: &ConversantId) -> Option<SessionSlot> {
        self.sessions.read().get(conversant_id).cloned()
    }

    /// Apply one event to the session in `slot`, unless the slot stopped
    /// being the conversant's live session before its lock was acquired.
    ///
    /// Idle disposal only removes sessions it can lock, so once the check
    /// passes under the lock the session stays live for the whole event.
    async fn apply(
        &self,
        slot: &SessionSlot,
        envelope: &InboundEnvelope,
    ) -> Option<Vec<OutboundEffect>> {
        let mut session = slot.lock().await;
        let live = self
            .sessions
            .read()
            .get(&envelope.conversant_id)
            .is_some_and(|current| Arc::ptr_eq(current, slot));
        if !live {
            debug!(
                "[intake] Session for {} ended before its {} event ran",
                envelope.conversant_id,
                envelope.event.kind()
            );
            return None;
        }

        session.touch(Instant::now());
        Some(
            session
                .handle(envelope, self.directory.as_ref(), self.allocator.as_ref())
                .await,
        )
    }

    fn open(&self, conversant_id: ConversantId) -> Vec<OutboundEffect> {
        let session = SubmissionSession::new(conversant_id.clone(), Instant::now());
        let replaced = self
            .sessions
            .write()
            .insert(conversant_id.clone(), Arc::new(AsyncMutex::new(session)))
            .is_some();

        if replaced {
            info!("[intake] Restarted session for {}", conversant_id);
        } else {
            info!("[intake] Opened session for {}", conversant_id);
        }
        vec![OutboundEffect::text(prompts::WELCOME)]
    }

    async fn close(&self, conversant_id: &ConversantId) -> Vec<OutboundEffect> {
        let removed = self.sessions.write().remove(conversant_id);
        let Some(slot) = removed else {
            return vec![OutboundEffect::text(prompts::PLEASE_START)];
        };

        let left = slot.lock().await.cancel();
        info!(
            "[intake] Cancelled session for {} in state {:?}",
            conversant_id, left
        );
        vec![OutboundEffect::text(prompts::CANCELLED)]
    }
}

#[async_trait]
impl<D, L> IntakeApi for SessionOrchestrator<D, L>
where
    D: IdentityDirectory + 'static,
    L: CodeLedger + 'static,
{
    async fn route(&self, envelope: InboundEnvelope) -> Vec<OutboundEffect> {
        match envelope.event {
            InboundEvent::Start => self.open(envelope.conversant_id),
            InboundEvent::Cancel => self.close(&envelope.conversant_id).await,
            _ => loop {
                let Some(slot) = self.slot(&envelope.conversant_id) else {
                    debug!(
                        "[intake] Ignoring {} event: {}",
                        envelope.event.kind(),
                        IntakeError::SessionNotFound {
                            conversant_id: envelope.conversant_id.clone()
                        }
                    );
                    return vec![OutboundEffect::text(prompts::PLEASE_START)];
                };

                // `None`: the session ended while we waited for it; look again.
                if let Some(effects) = self.apply(&slot, &envelope).await {
                    return effects;
                }
            },
        }
    }
}
