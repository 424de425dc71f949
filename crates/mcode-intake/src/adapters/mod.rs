//! # Adapters Layer
//!
//! Secondary adapters implementing the roster and ledger ports.

pub mod directory;
pub mod ledger;

pub use directory::{InMemoryDirectory, BUILTIN_ROSTER};
pub use ledger::{FileLedger, InMemoryLedger};
