//! Events crossing the transport boundary.
//!
//! - `incoming`: events delivered by the chat transport
//! - `outgoing`: effects the transport must render back to the conversant

pub mod incoming;
pub mod outgoing;

pub use incoming::*;
pub use outgoing::*;
