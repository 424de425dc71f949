//! # Identities
//!
//! Submitter identities as sourced from the roster. This crate never
//! creates or destroys identities; it only resolves keys against them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized identity key (e.g. `G017`).
///
/// Construction always trims surrounding whitespace and upper-cases, so
/// `" g017 "` and `"G017"` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Normalize raw conversant input into a key.
    pub fn normalize(raw: &str) -> Self {
        Self(raw.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for IdentityKey {
    fn from(raw: String) -> Self {
        Self::normalize(&raw)
    }
}

impl From<&str> for IdentityKey {
    fn from(raw: &str) -> Self {
        Self::normalize(raw)
    }
}

impl From<IdentityKey> for String {
    fn from(key: IdentityKey) -> Self {
        key.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A submitter known to the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub key: IdentityKey,
    pub display_name: String,
    /// Organization tag (e.g. `GGG`, `TCO`).
    pub organization: String,
}

impl Identity {
    pub fn new(
        key: impl Into<IdentityKey>,
        display_name: impl Into<String>,
        organization: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
            organization: organization.into(),
        }
    }

    /// Composite `{key}_{display_name}` label written to the ledger.
    pub fn label(&self) -> String {
        format!("{}_{}", self.key, self.display_name)
    }
}
