//! # Roster Adapter
//!
//! In-memory implementation of the `IdentityDirectory` port. Loaded either
//! from the built-in staff roster or from a JSON file shaped as
//!
//! ```text
//! { "G017": ["KELVIN", "GGG"], "TCO2008": ["HAIKAL", "TCO"] }
//! ```

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::info;

use crate::domain::{Identity, IdentityKey};
use crate::ports::outbound::{DirectoryError, IdentityDirectory};

/// Staff roster shipped with the workflow: (key, display name, organization).
pub const BUILTIN_ROSTER: &[(&str, &str, &str)] = &[
    ("G003", "ARIF", "GGG"),
    ("G004", "ALYZZA", "GGG"),
    ("G009", "AZIM", "GGG"),
    ("G011", "AINA", "GGG"),
    ("G012", "SAFIRA", "GGG"),
    ("G014", "BATRISYA", "GGG"),
    ("G017", "KELVIN", "GGG"),
    ("G018", "HAIDA", "GGG"),
    ("TCO2008", "HAIKAL", "TCO"),
    ("TCO2013", "MIZAN", "TCO"),
    ("TCO2014", "ARINA", "TCO"),
    ("TCO2015", "JOE", "TCO"),
    ("TCO2034", "AISYAH", "TCO"),
    ("GGD001", "JAYDEN", "GGD"),
    ("GGD002", "ANGAH", "GGD"),
    ("GGD003", "ALVIN", "GGD"),
    ("GGD004", "RAI", "GGD"),
    ("GGD005", "ATIKA (ADMIN)", "GGD"),
    ("GGD006", "SHUHADA", "GGD"),
    ("KS001", "SHAZ", "KSSB"),
    ("KS002", "AFRIENA (ADMIN)", "KSSB"),
    ("KS003", "ANIS (ADMIN)", "KSSB"),
    ("KS004", "FARHANA", "KSSB"),
    ("KS005", "SHAZWA - RESIGN", "KSSB"),
    ("WJ001", "SHAO EN", "WJ"),
];

/// Roster held in memory. Immutable after construction.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    entries: HashMap<IdentityKey, Identity>,
}

impl InMemoryDirectory {
    pub fn new(identities: impl IntoIterator<Item = Identity>) -> Self {
        Self {
            entries: identities
                .into_iter()
                .map(|identity| (identity.key.clone(), identity))
                .collect(),
        }
    }

    /// Roster from [`BUILTIN_ROSTER`].
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_ROSTER
                .iter()
                .map(|(key, name, org)| Identity::new(*key, *name, *org)),
        )
    }

    /// Parse a JSON roster document.
    pub fn from_json_str(json: &str) -> Result<Self, DirectoryError> {
        let raw: BTreeMap<String, (String, String)> =
            serde_json::from_str(json).map_err(|e| DirectoryError::InvalidRoster {
                reason: e.to_string(),
            })?;

        let mut entries = HashMap::with_capacity(raw.len());
        for (key, (name, org)) in raw {
            let identity = Identity::new(key.as_str(), name, org);
            if identity.key.is_empty() {
                return Err(DirectoryError::InvalidRoster {
                    reason: "empty identity key".to_string(),
                });
            }
            if entries.insert(identity.key.clone(), identity).is_some() {
                return Err(DirectoryError::InvalidRoster {
                    reason: format!("duplicate identity key after normalization: {}", key),
                });
            }
        }

        Ok(Self { entries })
    }

    /// Load a JSON roster file.
    pub fn from_json_file(path: &Path) -> Result<Self, DirectoryError> {
        let json = std::fs::read_to_string(path).map_err(|e| DirectoryError::Unavailable {
            reason: format!("{}: {}", path.display(), e),
        })?;
        let directory = Self::from_json_str(&json)?;
        info!(
            "[intake] Loaded {} identities from {}",
            directory.len(),
            path.display()
        );
        Ok(directory)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl IdentityDirectory for InMemoryDirectory {
    async fn lookup(&self, key: &IdentityKey) -> Result<Option<Identity>, DirectoryError> {
        Ok(self.entries.get(key).cloned())
    }
}
