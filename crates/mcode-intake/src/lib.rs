//! # MCode Intake
//!
//! Guided video intake: a conversant uploads a video, names their staff
//! identity, confirms it, and receives a tracking code of the form
//! `{identity_key}_M{sequence}` that is recorded in an append-only ledger.
//!
//! ## Flow
//!
//! ```text
//! Transport ──InboundEnvelope──→ SessionOrchestrator ──→ SubmissionSession
//!                                                          │        │
//!                                            IdentityDirectory   CodeAllocator
//!                                                                    │
//!                                                                CodeLedger
//!            ←──OutboundEffect──────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//!
//! | Invariant | Enforcement | Location |
//! |-----------|-------------|----------|
//! | Next code is `max(existing) + 1` per identity | Full ledger scan | allocator.rs |
//! | No duplicate code under concurrent confirmation | Per-key async lock around scan + append | allocator.rs |
//! | Malformed history never yields a code | `MalformedLedgerRecord` fail-fast | allocator.rs |
//! | Code reported only after a durable append | Allocation returns after `append` succeeds | session.rs |
//! | Events for one conversant never interleave | Per-session FIFO mutex | orchestrator.rs |
//!
//! ## Hexagonal Architecture
//!
//! - **Domain Layer** (`domain/`): identities, artifacts, codes, records
//! - **Ports Layer** (`ports/`): `IntakeApi` inbound, roster and ledger outbound
//! - **Adapters Layer** (`adapters/`): in-memory roster, file and in-memory ledgers
//! - **Services**: `allocator`, `session`, `orchestrator`

pub mod adapters;
pub mod allocator;
pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod ports;
pub mod session;

pub use adapters::{FileLedger, InMemoryDirectory, InMemoryLedger, BUILTIN_ROSTER};
pub use allocator::{CodeAllocator, MalformedRow, SequenceIndex};
pub use config::{ConfigError, IntakeConfig};
pub use domain::{
    Artifact, CaptureInstant, Code, CodeParseError, Identity, IdentityKey, SubmissionRecord,
    RECORD_COLUMNS,
};
pub use error::{IntakeError, IntakeResult};
pub use events::{
    prompts, Choice, ConversantId, InboundEnvelope, InboundEvent, OutboundEffect,
};
pub use orchestrator::SessionOrchestrator;
pub use ports::{CodeLedger, DirectoryError, IdentityDirectory, IntakeApi, LedgerError};
pub use session::{PendingClaim, SessionData, SessionState, SubmissionSession};
