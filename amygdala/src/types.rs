//! Core types for the anomaly detector.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use codex::{
    compute_hash, hash_payloads, ClassificationPayload, Dimension, NarrativePayload,
    StructuralPayload, TriDimensionalRecord,
};

/// Structural values that differ between two translations of the same content.
const VOLATILE_VALUES: &[&str] = &["parsed_content_id"];

/// Alert posture, from calm to lockdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertLevel {
    /// Score 0-25
    Calm,
    /// Score 26-50
    Vigilant,
    /// Score 51-75
    Alert,
    /// Score 76-100
    Lockdown,
}

impl AlertLevel {
    /// Level for an alert score.
    pub fn from_score(score: f64) -> Self {
        if score <= 25.0 {
            Self::Calm
        } else if score <= 50.0 {
            Self::Vigilant
        } else if score <= 75.0 {
            Self::Alert
        } else {
            Self::Lockdown
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Calm => "CALM",
            Self::Vigilant => "VIGILANT",
            Self::Alert => "ALERT",
            Self::Lockdown => "LOCKDOWN",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of threat behind a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatType {
    /// Numeric classification outside its scale
    InvalidScore,
    /// Hash mismatch or missing payload
    IntegrityViolation,
    /// Score jumped too far from the previous scan
    SuddenShift,
    /// Repeated input or clustered signals
    CascadeRisk,
    /// Manipulative or divisive content
    HostileIntent,
    /// Extraction intent or breach of an immutable principle
    PrincipleViolation,
}

impl ThreatType {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidScore => "invalid_score",
            Self::IntegrityViolation => "integrity_violation",
            Self::SuddenShift => "sudden_shift",
            Self::CascadeRisk => "cascade_risk",
            Self::HostileIntent => "hostile_intent",
            Self::PrincipleViolation => "principle_violation",
        }
    }
}

impl fmt::Display for ThreatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which tier of checks produced a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pathway {
    Fast,
    Deep,
}

/// A threat accepted by the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatSignal {
    /// Unique signal ID
    pub id: String,
    pub threat_type: ThreatType,
    /// Severity (0-100)
    pub severity: u8,
    /// Alert level after the signal was applied
    pub alert_level: AlertLevel,
    /// Component that asked for the scan
    pub source_component: String,
    pub timestamp: DateTime<Utc>,
    /// Human-readable findings
    pub evidence: Vec<String>,
    pub pathway: Pathway,
}

/// One check's contribution to a signal.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Finding {
    pub threat_type: ThreatType,
    pub severity: u8,
    pub evidence: String,
    pub pathway: Pathway,
}

impl Finding {
    pub fn fast(threat_type: ThreatType, severity: u8, evidence: impl Into<String>) -> Self {
        Self {
            threat_type,
            severity,
            evidence: evidence.into(),
            pathway: Pathway::Fast,
        }
    }

    pub fn deep(threat_type: ThreatType, severity: u8, evidence: impl Into<String>) -> Self {
        Self {
            threat_type,
            severity,
            evidence: evidence.into(),
            pathway: Pathway::Deep,
        }
    }
}

/// Record payloads as seen by the detector; any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordProbe {
    pub structural: Option<StructuralPayload>,
    pub narrative: Option<NarrativePayload>,
    pub classification: Option<ClassificationPayload>,
    pub integrity_hash: Option<String>,
}

impl RecordProbe {
    /// Dimensions that are absent or carry no content.
    pub fn missing_dimensions(&self) -> Vec<Dimension> {
        let mut missing = Vec::new();
        if self.structural.as_ref().map_or(true, |s| s.values.is_empty()) {
            missing.push(Dimension::Structural);
        }
        if self
            .narrative
            .as_ref()
            .map_or(true, |n| n.narrative.trim().is_empty())
        {
            missing.push(Dimension::Narrative);
        }
        if self
            .classification
            .as_ref()
            .map_or(true, |c| c.score_tier == 0)
        {
            missing.push(Dimension::Classification);
        }
        missing
    }

    /// Whether the stored hash disagrees with the payloads.
    ///
    /// `None` when the probe is too incomplete to tell.
    pub fn integrity_mismatch(&self) -> Option<bool> {
        let (Some(s), Some(n), Some(c), Some(hash)) = (
            &self.structural,
            &self.narrative,
            &self.classification,
            &self.integrity_hash,
        ) else {
            return None;
        };
        Some(hash_payloads(s, n, c) != *hash)
    }
}

impl From<&TriDimensionalRecord> for RecordProbe {
    fn from(record: &TriDimensionalRecord) -> Self {
        Self {
            structural: Some(record.structural.clone()),
            narrative: Some(record.narrative.clone()),
            classification: Some(record.classification.clone()),
            integrity_hash: Some(record.integrity_hash.clone()),
        }
    }
}

/// A governance action submitted for screening.
///
/// Checklist answers left as `None` are inferred from the description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionIntent {
    pub description: String,
    pub serves_flourishing: Option<bool>,
    pub respects_autonomy: Option<bool>,
    pub transparent: Option<bool>,
    pub creates_net_value: Option<bool>,
    pub consistent_with_principles: Option<bool>,
    pub publicly_visible: Option<bool>,
}

impl ActionIntent {
    /// Action described in free text only.
    pub fn described(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }
}

#[derive(Serialize)]
struct StableView<'a> {
    source_component: &'a str,
    text: Option<&'a str>,
    score: Option<f64>,
    action: Option<&'a ActionIntent>,
    data_type: Option<&'a str>,
    values: Option<BTreeMap<&'a str, &'a Value>>,
    narrative: Option<&'a NarrativePayload>,
    classification: Option<&'a ClassificationPayload>,
}

/// Input to a scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanContext {
    /// Component requesting the scan
    pub source_component: String,
    /// Free text to screen
    pub text: Option<String>,
    /// Numeric classification score (0-100)
    pub score: Option<f64>,
    pub record: Option<RecordProbe>,
    pub action: Option<ActionIntent>,
}

impl ScanContext {
    /// Empty context for a component.
    pub fn new(source_component: impl Into<String>) -> Self {
        Self {
            source_component: source_component.into(),
            ..Default::default()
        }
    }

    /// Builder: set text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Builder: set score.
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    /// Builder: attach a record.
    pub fn with_record(mut self, record: &TriDimensionalRecord) -> Self {
        self.record = Some(RecordProbe::from(record));
        self
    }

    /// Builder: attach a governance action.
    pub fn with_action(mut self, action: ActionIntent) -> Self {
        self.action = Some(action);
        self
    }

    /// Key identifying repeated input.
    ///
    /// Leaves out the structural timestamp, volatile ids and the integrity
    /// hash covering them, so the same content translated twice yields the
    /// same key.
    pub fn repetition_key(&self) -> String {
        let record = self.record.as_ref();
        let structural = record.and_then(|r| r.structural.as_ref());
        let view = StableView {
            source_component: &self.source_component,
            text: self.text.as_deref(),
            score: self.score,
            action: self.action.as_ref(),
            data_type: structural.map(|s| s.data_type.as_str()),
            values: structural.map(|s| {
                s.values
                    .iter()
                    .filter(|(k, _)| !VOLATILE_VALUES.contains(&k.as_str()))
                    .map(|(k, v)| (k.as_str(), v))
                    .collect()
            }),
            narrative: record.and_then(|r| r.narrative.as_ref()),
            classification: record.and_then(|r| r.classification.as_ref()),
        };
        serde_json::to_vec(&view)
            .map(|bytes| compute_hash(&bytes))
            .unwrap_or_else(|_| self.source_component.clone())
    }

    /// Scalar score used for jump detection.
    ///
    /// The explicit score wins; otherwise the record tier is scaled to 0-100.
    pub fn scalar_score(&self) -> Option<f64> {
        match self.score {
            Some(score) if score.is_finite() => Some(score),
            Some(_) => None,
            None => self
                .record
                .as_ref()
                .and_then(|r| r.classification.as_ref())
                .filter(|c| (1..=9).contains(&c.score_tier))
                .map(|c| c.score_tier as f64 * 100.0 / 9.0),
        }
    }
}

/// Observable detector events.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertEvent {
    /// A signal was accepted
    ThreatDetected(ThreatSignal),
    /// The alert level changed
    AlertChanged {
        from: AlertLevel,
        to: AlertLevel,
        score: f64,
    },
    /// The detector entered lockdown
    LockdownEngaged { score: f64 },
    /// The detector returned to calm
    AllClear,
}

impl AlertEvent {
    /// Event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ThreatDetected(_) => "threat_detected",
            Self::AlertChanged { .. } => "alert_changed",
            Self::LockdownEngaged { .. } => "lockdown_engaged",
            Self::AllClear => "all_clear",
        }
    }
}

/// Detector state owned by one [`Amygdala`](crate::Amygdala).
#[derive(Debug, Clone, PartialEq)]
pub struct AlertState {
    /// Alert score (0-100)
    pub score: f64,
    pub level: AlertLevel,
    /// Adaptive sensitivity
    pub sensitivity: f64,
    pub last_scan: Option<DateTime<Utc>>,
    pub memory: crate::memory::AlertMemory,
}

impl AlertState {
    /// Calm state with the given sensitivity and memory capacity.
    pub fn new(sensitivity: f64, memory_capacity: usize) -> Self {
        Self {
            score: 0.0,
            level: AlertLevel::Calm,
            sensitivity,
            last_scan: None,
            memory: crate::memory::AlertMemory::new(memory_capacity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_boundaries() {
        assert_eq!(AlertLevel::from_score(0.0), AlertLevel::Calm);
        assert_eq!(AlertLevel::from_score(25.0), AlertLevel::Calm);
        assert_eq!(AlertLevel::from_score(26.0), AlertLevel::Vigilant);
        assert_eq!(AlertLevel::from_score(50.0), AlertLevel::Vigilant);
        assert_eq!(AlertLevel::from_score(51.0), AlertLevel::Alert);
        assert_eq!(AlertLevel::from_score(76.0), AlertLevel::Lockdown);
    }

    #[test]
    fn test_empty_probe_misses_everything() {
        let probe = RecordProbe::default();
        assert_eq!(probe.missing_dimensions().len(), 3);
        assert_eq!(probe.integrity_mismatch(), None);
    }

    #[test]
    fn test_scalar_score_ignores_non_finite() {
        assert_eq!(ScanContext::new("t").with_score(f64::NAN).scalar_score(), None);
        assert_eq!(ScanContext::new("t").with_score(12.0).scalar_score(), Some(12.0));
    }

    #[test]
    fn test_context_deserializes_leniently() {
        let context: ScanContext = serde_json::from_value(serde_json::json!({
            "source_component": "governance",
            "action": { "description": "publish the budget" }
        }))
        .unwrap();
        assert_eq!(context.action.unwrap().description, "publish the budget");
        assert!(context.record.is_none());
    }
}
