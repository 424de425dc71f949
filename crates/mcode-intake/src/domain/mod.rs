//! # Domain Layer
//!
//! Pure intake types: identities, artifacts, codes and ledger records.
//!
//! ## Hexagonal Architecture
//!
//! This module contains NO I/O dependencies. Roster and ledger access go
//! through the traits in `ports`.

pub mod artifact;
pub mod code;
pub mod identity;
pub mod record;

pub use artifact::*;
pub use code::*;
pub use identity::*;
pub use record::*;
