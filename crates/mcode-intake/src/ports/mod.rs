//! # Ports Layer
//!
//! - **Driving Ports (Inbound)**: the routing API consumed by transports
//! - **Driven Ports (Outbound)**: roster and ledger SPIs implemented by adapters

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
