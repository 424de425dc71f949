//! # MCode Intake Test Suite
//!
//! Cross-component tests that drive the orchestrator the way a transport
//! would.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── flows.rs        # Conversation flows end to end
//!     ├── allocation.rs   # Concurrent confirmations, malformed history
//!     └── file_ledger.rs  # Durable ledger columns and restarts
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p intake-tests
//! cargo test -p intake-tests integration::allocation
//! ```

#![allow(dead_code)]

pub mod integration;
