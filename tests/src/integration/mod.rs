//! Integration scenarios.

pub mod allocation;
pub mod file_ledger;
pub mod flows;
