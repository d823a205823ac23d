//! Configuration for the ingestion pipeline and the `digest` CLI.

use std::path::Path;

use serde::{Deserialize, Serialize};

use amygdala::AmygdalaConfig;
use codex::KNOWLEDGE_TEMPLATE;
use corrector::CorrectorConfig;

use crate::types::Result;

/// Parser tunables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Keywords kept per content unit
    pub max_keywords: usize,
    /// Bodies with fewer words are eliminated
    pub min_words: usize,
    /// Characters allowed in a plain-text first line used as title
    pub max_title_chars: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_keywords: 15,
            min_words: 3,
            max_title_chars: 120,
        }
    }
}

/// Admission thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbsorptionConfig {
    /// Minimum composite score to be absorbed
    pub threshold: u8,
    /// Threat severity at or above which content is rejected
    pub threat_severity: u8,
}

impl Default for AbsorptionConfig {
    fn default() -> Self {
        Self {
            threshold: 40,
            threat_severity: 60,
        }
    }
}

/// Layer thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Composite needed for the verified-events layer
    pub verified_composite: u8,
    /// External coherence needed for the verified-events layer
    pub verified_external: u8,
    /// Composite needed for the narratives layer
    pub narrative_composite: u8,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            verified_composite: 75,
            verified_external: 70,
            narrative_composite: 55,
        }
    }
}

/// Pipeline configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestionConfig {
    pub parser: ParserConfig,
    pub absorption: AbsorptionConfig,
    pub routing: RoutingConfig,
    /// Eliminated items kept for replay
    pub waste_capacity: usize,
    /// Translator template used for every item
    pub template: String,
    /// Recorded as the creator of stored nodes
    pub created_by: String,
    /// Seed for presentation positions; random when unset
    pub seed: Option<u64>,
}

impl Default for DigestionConfig {
    fn default() -> Self {
        Self {
            parser: ParserConfig::default(),
            absorption: AbsorptionConfig::default(),
            routing: RoutingConfig::default(),
            waste_capacity: 200,
            template: KNOWLEDGE_TEMPLATE.to_string(),
            created_by: "digestive-system".to_string(),
            seed: None,
        }
    }
}

impl DigestionConfig {
    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Everything the `digest` CLI configures, in one YAML document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub digestion: DigestionConfig,
    pub amygdala: AmygdalaConfig,
    pub corrector: CorrectorConfig,
    /// Screen every item with the anomaly detector
    pub detector_enabled: bool,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            digestion: DigestionConfig::default(),
            amygdala: AmygdalaConfig::default(),
            corrector: CorrectorConfig::default(),
            detector_enabled: true,
        }
    }
}

impl SystemConfig {
    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load config from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
