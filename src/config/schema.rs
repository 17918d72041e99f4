//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

/// Settings for one [`Registry`](crate::Registry).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Reject a propagator whose name is already registered.
    ///
    /// When disabled, duplicates are accepted with a warning and their
    /// headers overwrite each other on inject.
    pub reject_duplicate_names: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            reject_duplicate_names: true,
        }
    }
}
