//! Diagnostics, log entries and errors of the corrector.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use codex::Dimension;

/// How badly a record is damaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorruptionSeverity {
    /// Nothing to repair
    None,
    /// One dimension, repairable
    Minor,
    /// Two dimensions, beyond repair
    Major,
    /// Every dimension, or a fault that cannot be localized
    Critical,
}

impl CorruptionSeverity {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Minor => "minor",
            Self::Major => "major",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for CorruptionSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of comparing a record against its per-dimension hashes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionDiagnostic {
    pub is_corrupted: bool,
    pub corrupted_dims: Vec<Dimension>,
    pub healthy_dims: Vec<Dimension>,
    /// Confidence that a repair would restore the record (0.0 - 1.0)
    pub confidence: f64,
    pub severity: CorruptionSeverity,
}

impl CorrectionDiagnostic {
    /// Diagnostic for a given set of corrupted dimensions.
    pub fn from_corrupted(corrupted_dims: Vec<Dimension>) -> Self {
        let healthy_dims = Dimension::all()
            .into_iter()
            .filter(|d| !corrupted_dims.contains(d))
            .collect();
        let (severity, confidence) = match corrupted_dims.len() {
            0 => (CorruptionSeverity::None, 1.0),
            1 => (CorruptionSeverity::Minor, 1.0),
            2 => (CorruptionSeverity::Major, 0.33),
            _ => (CorruptionSeverity::Critical, 0.0),
        };
        Self {
            is_corrupted: !corrupted_dims.is_empty(),
            corrupted_dims,
            healthy_dims,
            confidence,
            severity,
        }
    }

    /// Diagnostic for a record whose combined hash fails while no single
    /// dimension can be blamed.
    pub fn non_localizable() -> Self {
        Self {
            is_corrupted: true,
            corrupted_dims: Vec::new(),
            healthy_dims: Vec::new(),
            confidence: 0.0,
            severity: CorruptionSeverity::Critical,
        }
    }

    /// Whether the record is corrupted but no dimension could be singled out.
    pub fn is_non_localizable(&self) -> bool {
        self.is_corrupted && self.corrupted_dims.is_empty()
    }

    /// Whether a single-dimension repair applies.
    pub fn is_repairable(&self) -> bool {
        self.corrupted_dims.len() == 1
    }
}

/// What a correction attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionAction {
    /// Record found intact
    Verified,
    /// Dimension rebuilt
    Corrected,
    /// Repair impossible
    Failed,
}

/// One entry of the correction log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionLogEntry {
    pub timestamp: DateTime<Utc>,
    pub record_id: String,
    pub action: CorrectionAction,
    /// Dimension concerned, when one was singled out
    pub dimension: Option<Dimension>,
    pub severity: CorruptionSeverity,
    pub confidence: f64,
    pub detail: String,
}

/// Running counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectorStats {
    /// Records passed through `process`
    pub processed: u64,
    /// Corruptions detected
    pub detected: u64,
    /// Successful repairs
    pub corrected: u64,
    /// Failed repairs
    pub failed: u64,
}

/// Observable corrector events.
#[derive(Debug, Clone, PartialEq)]
pub enum CorrectionEvent {
    CorruptionDetected {
        record_id: String,
        diagnostic: CorrectionDiagnostic,
    },
    CorrectionSucceeded {
        record_id: String,
        dimension: Dimension,
    },
    CorrectionFailed {
        record_id: String,
        reason: String,
    },
}

impl CorrectionEvent {
    /// Event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CorruptionDetected { .. } => "corruption_detected",
            Self::CorrectionSucceeded { .. } => "correction_succeeded",
            Self::CorrectionFailed { .. } => "correction_failed",
        }
    }
}

/// Corrector errors.
#[derive(Debug, Error)]
pub enum CorrectionError {
    #[error("{} dimensions corrupted, at most one can be rebuilt", diagnostic.corrupted_dims.len())]
    Unreconstructable { diagnostic: CorrectionDiagnostic },

    #[error("corruption cannot be localized to a single dimension")]
    NonLocalizable { diagnostic: CorrectionDiagnostic },

    #[error("validation failed: {0}")]
    ValidationFailed(String),
}

impl CorrectionError {
    /// Diagnostic attached to a structural failure.
    pub fn diagnostic(&self) -> Option<&CorrectionDiagnostic> {
        match self {
            Self::Unreconstructable { diagnostic } | Self::NonLocalizable { diagnostic } => {
                Some(diagnostic)
            }
            Self::ValidationFailed(_) => None,
        }
    }
}

/// Result type for corrector operations.
pub type Result<T> = std::result::Result<T, CorrectionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_grades() {
        let none = CorrectionDiagnostic::from_corrupted(vec![]);
        assert!(!none.is_corrupted);
        assert_eq!(none.healthy_dims.len(), 3);

        let minor = CorrectionDiagnostic::from_corrupted(vec![Dimension::Narrative]);
        assert_eq!(minor.severity, CorruptionSeverity::Minor);
        assert_eq!(minor.confidence, 1.0);
        assert!(minor.is_repairable());

        let major =
            CorrectionDiagnostic::from_corrupted(vec![Dimension::Narrative, Dimension::Structural]);
        assert_eq!(major.severity, CorruptionSeverity::Major);
        assert_eq!(major.confidence, 0.33);
        assert_eq!(major.healthy_dims, vec![Dimension::Classification]);

        let critical = CorrectionDiagnostic::from_corrupted(Dimension::all().to_vec());
        assert_eq!(critical.severity, CorruptionSeverity::Critical);
        assert_eq!(critical.confidence, 0.0);
    }

    #[test]
    fn test_non_localizable() {
        let diagnostic = CorrectionDiagnostic::non_localizable();
        assert!(diagnostic.is_non_localizable());
        assert!(!diagnostic.is_repairable());
    }
}
