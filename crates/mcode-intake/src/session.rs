//! # Submission Session
//!
//! One conversant's walk through the intake flow, as an explicit state
//! machine:
//!
//! ```text
//! [AwaitingArtifact] ── upload / any input ──→ [AwaitingIdentity] ⟲ unknown key
//!        ↑                                         │         ↑
//!        │                                known key│         │deny
//!        │                                         ↓         │
//!        └──── affirm, code issued ──── [AwaitingConfirmation] ⟲ append failed
//! ```
//!
//! The session is single-writer: the orchestrator hands out `&mut` access
//! under a per-session lock. Nothing reaches the ledger before the affirm
//! step, so dropping a session at any point needs no cleanup.

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::allocator::CodeAllocator;
use crate::domain::{Artifact, Identity, IdentityKey};
use crate::error::IntakeError;
use crate::events::{prompts, Choice, ConversantId, InboundEnvelope, InboundEvent, OutboundEffect};
use crate::ports::outbound::{CodeLedger, IdentityDirectory};

/// Where a session is in the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    AwaitingArtifact,
    AwaitingIdentity,
    AwaitingConfirmation,
}

/// Identity claim being worked on in the current cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingClaim {
    /// Last key the conversant typed, normalized.
    pub entered_key: IdentityKey,
    /// Roster match for `entered_key`, once found.
    pub identity: Option<Identity>,
}

/// Per-cycle data. Reset after every issued code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionData {
    pub artifact: Option<Artifact>,
    pub claim: Option<PendingClaim>,
}

/// State machine for one conversant.
#[derive(Debug)]
pub struct SubmissionSession {
    conversant_id: ConversantId,
    state: SessionState,
    data: SessionData,
    last_activity: Instant,
    issued: u32,
}

impl SubmissionSession {
    pub fn new(conversant_id: ConversantId, now: Instant) -> Self {
        Self {
            conversant_id,
            state: SessionState::AwaitingArtifact,
            data: SessionData::default(),
            last_activity: now,
            issued: 0,
        }
    }

    pub fn conversant_id(&self) -> &ConversantId {
        &self.conversant_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        self.data.artifact.as_ref()
    }

    pub fn pending_claim(&self) -> Option<&PendingClaim> {
        self.data.claim.as_ref()
    }

    /// Codes issued over the session's lifetime.
    pub fn issued(&self) -> u32 {
        self.issued
    }

    pub fn touch(&mut self, now: Instant) {
        self.last_activity = now;
    }

    pub fn idle_for(&self, now: Instant) -> std::time::Duration {
        now.saturating_duration_since(self.last_activity)
    }

    /// Drop everything collected so far. Returns the state left behind.
    pub fn cancel(&mut self) -> SessionState {
        let left = self.state;
        self.data = SessionData::default();
        self.state = SessionState::AwaitingArtifact;
        left
    }

    /// Advance the state machine with one event.
    ///
    /// `Start` and `Cancel` belong to the orchestrator and are ignored here.
    pub async fn handle<D, L>(
        &mut self,
        envelope: &InboundEnvelope,
        directory: &D,
        allocator: &CodeAllocator<L>,
    ) -> Vec<OutboundEffect>
    where
        D: IdentityDirectory + ?Sized,
        L: CodeLedger,
    {
        if matches!(envelope.event, InboundEvent::Start | InboundEvent::Cancel) {
            debug!(
                "[intake] {} event for {} is handled by the orchestrator",
                envelope.event.kind(),
                self.conversant_id
            );
            return Vec::new();
        }

        let from = self.state;
        let effects = match self.state {
            SessionState::AwaitingArtifact => self.on_artifact(envelope),
            SessionState::AwaitingIdentity => self.on_identity(&envelope.event, directory).await,
            SessionState::AwaitingConfirmation => {
                self.on_confirmation(&envelope.event, allocator).await
            }
        };

        if from != self.state {
            debug!(
                "[intake] {}: {:?} --{}--> {:?}",
                self.conversant_id,
                from,
                envelope.event.kind(),
                self.state
            );
        }
        effects
    }

    fn on_artifact(&mut self, envelope: &InboundEnvelope) -> Vec<OutboundEffect> {
        let artifact = match &envelope.event {
            InboundEvent::ArtifactUpload {
                artifact_ref,
                capture_instant,
            } => Artifact::uploaded(artifact_ref.clone(), *capture_instant),
            // Anything else still moves the flow along.
            _ => Artifact::implicit(envelope.received_at),
        };

        self.data.artifact = Some(artifact);
        self.data.claim = None;
        self.state = SessionState::AwaitingIdentity;
        vec![OutboundEffect::text(prompts::ASK_IDENTITY)]
    }

    async fn on_identity<D>(&mut self, event: &InboundEvent, directory: &D) -> Vec<OutboundEffect>
    where
        D: IdentityDirectory + ?Sized,
    {
        let InboundEvent::Text { text } = event else {
            return vec![OutboundEffect::text(prompts::ASK_IDENTITY)];
        };

        let key = IdentityKey::normalize(text);
        self.data.claim = Some(PendingClaim {
            entered_key: key.clone(),
            identity: None,
        });

        if key.is_empty() {
            return vec![OutboundEffect::text(prompts::IDENTITY_NOT_FOUND)];
        }

        match directory.lookup(&key).await {
            Ok(Some(identity)) => {
                let prompt = prompts::confirm_identity(&identity);
                self.data.claim = Some(PendingClaim {
                    entered_key: key,
                    identity: Some(identity),
                });
                self.state = SessionState::AwaitingConfirmation;
                vec![prompt]
            }
            Ok(None) => {
                debug!(
                    "[intake] {}: {}",
                    self.conversant_id,
                    IntakeError::IdentityNotFound { key }
                );
                vec![OutboundEffect::text(prompts::IDENTITY_NOT_FOUND)]
            }
            Err(e) => {
                warn!(
                    "[intake] {}: {}",
                    self.conversant_id,
                    IntakeError::DirectoryUnavailable {
                        reason: e.to_string()
                    }
                );
                vec![OutboundEffect::text(prompts::DIRECTORY_UNAVAILABLE)]
            }
        }
    }

    async fn on_confirmation<L: CodeLedger>(
        &mut self,
        event: &InboundEvent,
        allocator: &CodeAllocator<L>,
    ) -> Vec<OutboundEffect> {
        let choice = match event {
            InboundEvent::Decision { choice } => Some(*choice),
            InboundEvent::Text { text } => Choice::from_text(text),
            _ => None,
        };

        match choice {
            Some(Choice::Affirm) => self.confirm(allocator).await,
            Some(Choice::Deny) => {
                self.data.claim = None;
                self.state = SessionState::AwaitingIdentity;
                vec![OutboundEffect::text(prompts::REENTER_IDENTITY)]
            }
            None => match self.resolved_identity() {
                Some(identity) => vec![prompts::confirm_identity(identity)],
                None => self.lost_claim(),
            },
        }
    }

    async fn confirm<L: CodeLedger>(&mut self, allocator: &CodeAllocator<L>) -> Vec<OutboundEffect> {
        let (Some(identity), Some(artifact)) = (self.resolved_identity(), self.data.artifact.as_ref())
        else {
            return self.lost_claim();
        };

        let outcome = allocator.allocate(identity, artifact).await;
        match outcome {
            Ok(record) => {
                self.issued += 1;
                info!(
                    "[intake] {} submitted {} ({} this session)",
                    self.conversant_id, record.code, self.issued
                );
                self.data = SessionData::default();
                self.state = SessionState::AwaitingArtifact;
                vec![
                    prompts::code_issued(&record.code),
                    OutboundEffect::text(prompts::UPLOAD_ANOTHER),
                ]
            }
            Err(
                e @ (IntakeError::MalformedLedgerRecord { .. } | IntakeError::LedgerCorrupt { .. }),
            ) => {
                warn!("[intake] {}: {}", self.conversant_id, e);
                vec![OutboundEffect::text(prompts::SUBMISSION_BLOCKED)]
            }
            Err(e) => {
                warn!("[intake] {}: {}", self.conversant_id, e);
                vec![OutboundEffect::text(prompts::SUBMISSION_FAILED)]
            }
        }
    }

    fn resolved_identity(&self) -> Option<&Identity> {
        self.data.claim.as_ref()?.identity.as_ref()
    }

    /// Confirmation reached without a resolved claim or artifact. Start the
    /// cycle over rather than guess.
    fn lost_claim(&mut self) -> Vec<OutboundEffect> {
        warn!(
            "[intake] {}: confirmation without a resolved claim, restarting cycle",
            self.conversant_id
        );
        self.data = SessionData::default();
        self.state = SessionState::AwaitingArtifact;
        vec![OutboundEffect::text(prompts::WELCOME)]
    }
}
