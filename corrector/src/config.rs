//! Configuration for the corrector.

use serde::{Deserialize, Serialize};

/// Tunables of a [`QuantumCorrector`](crate::QuantumCorrector).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectorConfig {
    /// Correction log entries kept before the oldest are dropped
    pub log_capacity: usize,
}

impl Default for CorrectorConfig {
    fn default() -> Self {
        Self { log_capacity: 1000 }
    }
}

impl CorrectorConfig {
    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}
