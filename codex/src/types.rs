//! Core types for the record format.
//!
//! These types model content as it moves from raw bytes to a stored
//! tri-dimensional record.
//!
//! With the `typescript` feature enabled, these types can be exported to TypeScript
//! using ts-rs for consistency with the web frontend.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::hashing::{hash_dimension, hash_payloads};

/// Where a piece of raw content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Fetched web page
    Web,
    /// Structured API response
    Api,
    /// Syndication feed entry
    Feed,
    /// Submitted by hand
    Manual,
}

impl SourceKind {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Api => "api",
            Self::Feed => "feed",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "web" => Ok(Self::Web),
            "api" => Ok(Self::Api),
            "feed" => Ok(Self::Feed),
            "manual" => Ok(Self::Manual),
            other => Err(format!("unknown source kind: {}", other)),
        }
    }
}

/// Raw content as delivered by an external fetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct RawContent {
    /// Unique identifier
    pub id: String,
    /// Kind of source
    pub source_kind: SourceKind,
    /// Origin URL
    pub url: String,
    /// Undecoded payload
    pub raw_bytes: String,
    /// When the content was fetched
    pub fetched_at: DateTime<Utc>,
    /// Declared MIME type
    pub content_type: String,
}

impl RawContent {
    /// Wrap fetched bytes.
    pub fn new(
        source_kind: SourceKind,
        url: impl Into<String>,
        raw_bytes: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source_kind,
            url: url.into(),
            raw_bytes: raw_bytes.into(),
            fetched_at: Utc::now(),
            content_type: content_type.into(),
        }
    }
}

/// A reference cited by a piece of content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct SourceRef {
    /// URL or citation text
    pub reference: String,
    /// Whether the reference could be verified
    pub verified: bool,
}

impl SourceRef {
    /// Create a reference.
    pub fn new(reference: impl Into<String>, verified: bool) -> Self {
        Self {
            reference: reference.into(),
            verified,
        }
    }
}

/// Content after parsing, derived deterministically from [`RawContent`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct ParsedContent {
    /// Unique identifier
    pub id: String,
    /// Raw content this was parsed from
    pub raw_content_id: String,
    /// Extracted title
    pub title: String,
    /// Extracted plain-text body
    pub body: String,
    /// Author, if found
    pub author: Option<String>,
    /// Publication date, if found
    pub published_at: Option<DateTime<Utc>>,
    /// Cited references
    pub source_refs: Vec<SourceRef>,
    /// Frequency-ranked keywords
    pub keywords: Vec<String>,
    /// Language code
    pub language: String,
    /// Number of words in the body
    pub word_count: usize,
}

/// The three independent dimensions of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Dimension {
    /// Machine-readable values
    Structural,
    /// Human-readable story
    Narrative,
    /// Tiered classification
    Classification,
}

impl Dimension {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structural => "STRUCTURAL",
            Self::Narrative => "NARRATIVE",
            Self::Classification => "CLASSIFICATION",
        }
    }

    /// All dimensions in canonical order.
    pub fn all() -> [Self; 3] {
        [Self::Structural, Self::Narrative, Self::Classification]
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural payload: typed values with a schema version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct StructuralPayload {
    /// Schema version of `values`
    pub schema_version: String,
    /// Kind of data carried
    pub data_type: String,
    /// Field values
    pub values: BTreeMap<String, serde_json::Value>,
    /// When the payload was built
    pub timestamp: DateTime<Utc>,
}

/// Emotional tone of a narrative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum EmotionalTone {
    /// Warns or flags uncertainty
    Cautionary,
    /// Plain statement of fact
    Neutral,
    /// Opens a question
    Curious,
    /// Points to a positive outcome
    Hopeful,
    /// Deep, well-structured insight
    Inspired,
}

impl EmotionalTone {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cautionary => "cautionary",
            Self::Neutral => "neutral",
            Self::Curious => "curious",
            Self::Hopeful => "hopeful",
            Self::Inspired => "inspired",
        }
    }
}

/// Narrative payload: the human-readable rendition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct NarrativePayload {
    /// The story itself
    pub narrative: String,
    /// Why it matters
    pub explanation: String,
    /// Suggested follow-up steps
    pub guide_steps: Vec<String>,
    /// Tone of voice
    pub emotional_tone: EmotionalTone,
    /// Language code
    pub language: String,
}

/// Classification payload: tier on a fixed scale plus its presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct ClassificationPayload {
    /// Tier (1-9)
    pub score_tier: u8,
    /// Tier mapped onto the scale (multiple of the base unit)
    pub scale_value: u32,
    /// Tier name
    pub tier_label: String,
    /// Display color
    pub tier_color: String,
    /// Geometric tag
    pub shape_tag: String,
    /// Four-number signature
    pub signature: [f64; 4],
    /// Proportion relative to the middle tier
    pub ratio: f64,
}

/// Per-dimension hashes attached by the corrector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct DimensionHashes {
    pub structural: String,
    pub narrative: String,
    pub classification: String,
}

impl DimensionHashes {
    /// Get the stored hash of one dimension.
    pub fn get(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::Structural => &self.structural,
            Dimension::Narrative => &self.narrative,
            Dimension::Classification => &self.classification,
        }
    }
}

/// The canonical unit flowing through all three engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct TriDimensionalRecord {
    /// Unique identifier
    pub id: String,
    /// Parsed content this record was translated from
    pub source_content_id: String,
    pub structural: StructuralPayload,
    pub narrative: NarrativePayload,
    pub classification: ClassificationPayload,
    /// Hash over all three payloads
    pub integrity_hash: String,
    /// Per-dimension hashes, present once enriched
    pub dimension_hashes: Option<DimensionHashes>,
}

impl TriDimensionalRecord {
    /// Assemble a record and seal it with its integrity hash.
    pub fn new(
        source_content_id: impl Into<String>,
        structural: StructuralPayload,
        narrative: NarrativePayload,
        classification: ClassificationPayload,
    ) -> Self {
        let integrity_hash = hash_payloads(&structural, &narrative, &classification);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source_content_id: source_content_id.into(),
            structural,
            narrative,
            classification,
            integrity_hash,
            dimension_hashes: None,
        }
    }

    /// Recompute the integrity hash from the current payloads.
    pub fn compute_integrity_hash(&self) -> String {
        hash_payloads(&self.structural, &self.narrative, &self.classification)
    }

    /// Whether the stored integrity hash matches the payloads.
    pub fn is_intact(&self) -> bool {
        self.compute_integrity_hash() == self.integrity_hash
    }

    /// Hash one dimension as it currently stands.
    pub fn compute_dimension_hash(&self, dimension: Dimension) -> String {
        hash_dimension(self, dimension)
    }

    /// Whether a dimension carries no usable content.
    pub fn is_dimension_empty(&self, dimension: Dimension) -> bool {
        match dimension {
            Dimension::Structural => self.structural.values.is_empty(),
            Dimension::Narrative => self.narrative.narrative.trim().is_empty(),
            Dimension::Classification => self.classification.score_tier == 0,
        }
    }

    /// Title carried in the structural values.
    pub fn title(&self) -> &str {
        self.structural
            .values
            .get("title")
            .and_then(|v| v.as_str())
            .unwrap_or("untitled")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_parse() {
        assert_eq!("WEB".parse::<SourceKind>().unwrap(), SourceKind::Web);
        assert!("carrier-pigeon".parse::<SourceKind>().is_err());
    }

    #[test]
    fn test_dimension_serializes_uppercase() {
        let json = serde_json::to_string(&Dimension::Classification).unwrap();
        assert_eq!(json, "\"CLASSIFICATION\"");
    }
}
