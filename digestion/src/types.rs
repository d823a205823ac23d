//! Core types for the ingestion pipeline.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use amygdala::ThreatSignal;
use codex::{Category, KnowledgeNode, ParsedContent, SourceKind, StorageLayer, TriDimensionalRecord};
use resonance::QualityScore;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Ingest,
    Parse,
    Translate,
    Absorb,
    Route,
    Store,
    /// Terminal stage of rejected content
    Eliminated,
}

impl Stage {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ingest => "INGEST",
            Self::Parse => "PARSE",
            Self::Translate => "TRANSLATE",
            Self::Absorb => "ABSORB",
            Self::Route => "ROUTE",
            Self::Store => "STORE",
            Self::Eliminated => "ELIMINATED",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of a result's stage log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageLog {
    pub stage: Stage,
    pub passed: bool,
    pub detail: String,
    pub at: DateTime<Utc>,
}

/// One item submitted for digestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestInput {
    pub source_kind: SourceKind,
    pub url: String,
    pub raw_bytes: String,
    pub content_type: String,
}

impl DigestInput {
    /// Create an input.
    pub fn new(
        source_kind: SourceKind,
        url: impl Into<String>,
        raw_bytes: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            source_kind,
            url: url.into(),
            raw_bytes: raw_bytes.into(),
            content_type: content_type.into(),
        }
    }
}

/// Outcome of digesting one item.
///
/// Rejection is an outcome, not an error: `stage` is then
/// [`Stage::Eliminated`] and `rejection_reason` explains why.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestedResult {
    pub raw_id: String,
    /// Last stage reached
    pub stage: Stage,
    /// Stage that rejected the item, when eliminated
    pub failed_at: Option<Stage>,
    pub stage_log: Vec<StageLog>,
    pub parsed: Option<ParsedContent>,
    pub record: Option<TriDimensionalRecord>,
    pub quality: Option<QualityScore>,
    pub threat: Option<ThreatSignal>,
    pub category: Option<Category>,
    pub layer: Option<StorageLayer>,
    pub node: Option<KnowledgeNode>,
    pub rejection_reason: Option<String>,
}

impl DigestedResult {
    pub(crate) fn new(raw_id: impl Into<String>) -> Self {
        Self {
            raw_id: raw_id.into(),
            stage: Stage::Ingest,
            failed_at: None,
            stage_log: Vec::new(),
            parsed: None,
            record: None,
            quality: None,
            threat: None,
            category: None,
            layer: None,
            node: None,
            rejection_reason: None,
        }
    }

    pub(crate) fn log(&mut self, stage: Stage, passed: bool, detail: impl Into<String>) {
        self.stage = stage;
        self.stage_log.push(StageLog {
            stage,
            passed,
            detail: detail.into(),
            at: Utc::now(),
        });
    }

    /// Whether the item was stored.
    pub fn is_absorbed(&self) -> bool {
        self.stage == Stage::Store && self.node.is_some()
    }

    pub fn is_eliminated(&self) -> bool {
        self.stage == Stage::Eliminated
    }
}

/// Engine-wide counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DigestionStats {
    pub total_ingested: u64,
    pub total_absorbed: u64,
    pub total_eliminated: u64,
    /// Absorbed / ingested
    pub absorption_rate: f64,
    /// Absorbed items per category
    pub by_category: BTreeMap<Category, u64>,
    /// Running average composite score of absorbed items
    pub average_composite: f64,
}

impl DigestionStats {
    pub(crate) fn record_ingested(&mut self) {
        self.total_ingested += 1;
        self.refresh_rate();
    }

    pub(crate) fn record_absorbed(&mut self, category: Category, composite: u8) {
        self.total_absorbed += 1;
        *self.by_category.entry(category).or_default() += 1;
        let n = self.total_absorbed as f64;
        self.average_composite += (composite as f64 - self.average_composite) / n;
        self.refresh_rate();
    }

    pub(crate) fn record_eliminated(&mut self) {
        self.total_eliminated += 1;
        self.refresh_rate();
    }

    fn refresh_rate(&mut self) {
        self.absorption_rate = if self.total_ingested == 0 {
            0.0
        } else {
            self.total_absorbed as f64 / self.total_ingested as f64
        };
    }
}

/// Outcome of a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub absorbed: Vec<DigestedResult>,
    pub eliminated: Vec<DigestedResult>,
    /// Statistics once the whole batch was digested
    pub stats: DigestionStats,
}

/// Observable pipeline events.
#[derive(Debug, Clone, PartialEq)]
pub enum DigestionEvent {
    FoodAbsorbed {
        raw_id: String,
        node_id: String,
        category: Category,
        layer: StorageLayer,
    },
    FoodEliminated {
        raw_id: String,
        stage: Stage,
        reason: String,
    },
    /// Emitted after every digest, whatever its outcome
    DigestionComplete { raw_id: String, stage: Stage },
}

impl DigestionEvent {
    /// Event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::FoodAbsorbed { .. } => "food_absorbed",
            Self::FoodEliminated { .. } => "food_eliminated",
            Self::DigestionComplete { .. } => "digestion_complete",
        }
    }
}

/// Pipeline errors.
///
/// Rejected content never produces one of these.
#[derive(Debug, Error)]
pub enum DigestionError {
    #[error("Configuration error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Waste entry not found: {0}")]
    WasteNotFound(String),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, DigestionError>;
