//! The corrector itself.

use std::collections::VecDeque;

use chrono::Utc;
use tracing::{debug, info, warn};

use codex::derive::{classification_from_narrative, narrative_from_structural, structural_from};
use codex::{Dimension, DimensionHashes, ListenerId, Listeners, TriDimensionalRecord};

use crate::config::CorrectorConfig;
use crate::types::{
    CorrectionAction, CorrectionDiagnostic, CorrectionError, CorrectionEvent, CorrectionLogEntry,
    CorrectorStats, Result,
};

/// Verifies records and rebuilds a single corrupted dimension from the
/// other two.
pub struct QuantumCorrector {
    config: CorrectorConfig,
    /// Log entries, oldest first
    log: VecDeque<CorrectionLogEntry>,
    stats: CorrectorStats,
    listeners: Listeners<CorrectionEvent>,
}

impl QuantumCorrector {
    /// Create a corrector with the default configuration.
    pub fn new() -> Self {
        Self::with_config(CorrectorConfig::default())
    }

    /// Create with custom config.
    pub fn with_config(config: CorrectorConfig) -> Self {
        Self {
            config,
            log: VecDeque::new(),
            stats: CorrectorStats::default(),
            listeners: Listeners::new(),
        }
    }

    /// Attach per-dimension hashes computed from the record as it is now.
    ///
    /// Already enriched records are returned unchanged so that later
    /// corruption stays localizable.
    pub fn enrich(&self, record: &TriDimensionalRecord) -> TriDimensionalRecord {
        let mut enriched = record.clone();
        if enriched.dimension_hashes.is_none() {
            enriched.dimension_hashes = Some(dimension_hashes(record));
        }
        enriched
    }

    /// Whether the combined integrity hash no longer matches the payloads.
    pub fn detect(&self, record: &TriDimensionalRecord) -> bool {
        let corrupted = !record.is_intact();
        if corrupted {
            debug!(record_id = %record.id, "Integrity hash mismatch");
        }
        corrupted
    }

    /// Localize corruption by comparing each payload with its stored hash.
    ///
    /// Without stored hashes only empty dimensions can be blamed. When the
    /// combined hash holds, the payloads are authoritative and nothing is
    /// reported as corrupted, whatever the stored dimension hashes say.
    pub fn diagnose(&self, record: &TriDimensionalRecord) -> CorrectionDiagnostic {
        if record.is_intact() {
            return CorrectionDiagnostic::from_corrupted(Vec::new());
        }
        let corrupted: Vec<Dimension> = Dimension::all()
            .into_iter()
            .filter(|&dimension| {
                record.is_dimension_empty(dimension)
                    || record.dimension_hashes.as_ref().is_some_and(|hashes| {
                        record.compute_dimension_hash(dimension) != hashes.get(dimension)
                    })
            })
            .collect();

        if corrupted.is_empty() && !record.is_intact() {
            return CorrectionDiagnostic::non_localizable();
        }
        CorrectionDiagnostic::from_corrupted(corrupted)
    }

    /// Rebuild the single corrupted dimension named by `diagnostic`.
    ///
    /// Returns a new record with a fresh integrity hash and fresh
    /// per-dimension hashes.
    pub fn correct(
        &mut self,
        record: &TriDimensionalRecord,
        diagnostic: &CorrectionDiagnostic,
    ) -> Result<TriDimensionalRecord> {
        if !diagnostic.is_corrupted {
            self.append(record, CorrectionAction::Verified, None, diagnostic, "intact");
            return Ok(record.clone());
        }

        self.stats.detected += 1;
        self.listeners.emit(&CorrectionEvent::CorruptionDetected {
            record_id: record.id.clone(),
            diagnostic: diagnostic.clone(),
        });

        if diagnostic.is_non_localizable() {
            let error = CorrectionError::NonLocalizable {
                diagnostic: diagnostic.clone(),
            };
            return Err(self.fail(record, diagnostic, error));
        }
        if !diagnostic.is_repairable() {
            let error = CorrectionError::Unreconstructable {
                diagnostic: diagnostic.clone(),
            };
            return Err(self.fail(record, diagnostic, error));
        }

        let dimension = diagnostic.corrupted_dims[0];
        let rebuilt = rebuild(record, dimension);
        if let Err(error) = self.validate(&rebuilt) {
            return Err(self.fail(record, diagnostic, error));
        }

        self.stats.corrected += 1;
        self.append(
            record,
            CorrectionAction::Corrected,
            Some(dimension),
            diagnostic,
            "rebuilt from the two healthy dimensions",
        );
        info!(
            record_id = %record.id,
            dimension = %dimension,
            "Corrupted dimension rebuilt"
        );
        self.listeners.emit(&CorrectionEvent::CorrectionSucceeded {
            record_id: record.id.clone(),
            dimension,
        });

        Ok(rebuilt)
    }

    /// Check that a record is whole and self-consistent.
    pub fn validate(&self, record: &TriDimensionalRecord) -> Result<()> {
        if let Some(empty) = Dimension::all()
            .into_iter()
            .find(|&d| record.is_dimension_empty(d))
        {
            return Err(CorrectionError::ValidationFailed(format!(
                "{} dimension is empty",
                empty
            )));
        }
        if !record.classification.is_on_scale() {
            return Err(CorrectionError::ValidationFailed(format!(
                "tier {} is off the scale",
                record.classification.score_tier
            )));
        }
        if !record.is_intact() {
            return Err(CorrectionError::ValidationFailed(
                "integrity hash does not match payloads".to_string(),
            ));
        }
        if let Some(hashes) = &record.dimension_hashes {
            if *hashes != dimension_hashes(record) {
                return Err(CorrectionError::ValidationFailed(
                    "dimension hashes do not match payloads".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Enrich, detect, diagnose, correct and validate in one pass.
    ///
    /// Corruption that predates enrichment leaves the per-dimension hashes
    /// consistent with the damaged content; the combined hash still fails
    /// and the record is reported as non-localizable.
    pub fn process(&mut self, record: &TriDimensionalRecord) -> Result<TriDimensionalRecord> {
        self.stats.processed += 1;
        let mut enriched = self.enrich(record);
        let diagnostic = self.diagnose(&enriched);

        if !self.detect(&enriched) {
            let sealed = dimension_hashes(&enriched);
            let detail = if enriched.dimension_hashes.as_ref() == Some(&sealed) {
                "intact"
            } else {
                warn!(record_id = %enriched.id, "Stale dimension hashes resealed");
                enriched.dimension_hashes = Some(sealed);
                "dimension hashes resealed"
            };
            self.append(&enriched, CorrectionAction::Verified, None, &diagnostic, detail);
            return Ok(enriched);
        }

        let corrected = self.correct(&enriched, &diagnostic)?;
        self.validate(&corrected)?;
        Ok(corrected)
    }

    /// Most recent log entries, newest first.
    pub fn log(&self, limit: usize) -> Vec<CorrectionLogEntry> {
        self.log.iter().rev().take(limit).cloned().collect()
    }

    pub fn stats(&self) -> CorrectorStats {
        self.stats
    }

    pub fn config(&self) -> &CorrectorConfig {
        &self.config
    }

    /// Register a listener for correction events.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&CorrectionEvent) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    fn fail(
        &mut self,
        record: &TriDimensionalRecord,
        diagnostic: &CorrectionDiagnostic,
        error: CorrectionError,
    ) -> CorrectionError {
        self.stats.failed += 1;
        let reason = error.to_string();

        if diagnostic.corrupted_dims.is_empty() {
            self.append(record, CorrectionAction::Failed, None, diagnostic, &reason);
        }
        for dimension in &diagnostic.corrupted_dims {
            self.append(
                record,
                CorrectionAction::Failed,
                Some(*dimension),
                diagnostic,
                &reason,
            );
        }

        warn!(
            record_id = %record.id,
            severity = %diagnostic.severity,
            reason = %reason,
            "Correction failed"
        );
        self.listeners.emit(&CorrectionEvent::CorrectionFailed {
            record_id: record.id.clone(),
            reason,
        });
        error
    }

    fn append(
        &mut self,
        record: &TriDimensionalRecord,
        action: CorrectionAction,
        dimension: Option<Dimension>,
        diagnostic: &CorrectionDiagnostic,
        detail: &str,
    ) {
        if self.config.log_capacity == 0 {
            return;
        }
        while self.log.len() >= self.config.log_capacity {
            self.log.pop_front();
        }
        self.log.push_back(CorrectionLogEntry {
            timestamp: Utc::now(),
            record_id: record.id.clone(),
            action,
            dimension,
            severity: diagnostic.severity,
            confidence: diagnostic.confidence,
            detail: detail.to_string(),
        });
    }
}

impl Default for QuantumCorrector {
    fn default() -> Self {
        Self::new()
    }
}

fn dimension_hashes(record: &TriDimensionalRecord) -> DimensionHashes {
    DimensionHashes {
        structural: record.compute_dimension_hash(Dimension::Structural),
        narrative: record.compute_dimension_hash(Dimension::Narrative),
        classification: record.compute_dimension_hash(Dimension::Classification),
    }
}

/// Rebuild one dimension from the other two.
fn rebuild(record: &TriDimensionalRecord, dimension: Dimension) -> TriDimensionalRecord {
    let mut rebuilt = record.clone();
    match dimension {
        Dimension::Classification => {
            rebuilt.classification = classification_from_narrative(&record.narrative);
        }
        Dimension::Narrative => {
            rebuilt.narrative = narrative_from_structural(
                &record.structural.values,
                record.classification.score_tier,
            );
        }
        Dimension::Structural => {
            rebuilt.structural = structural_from(
                &record.narrative,
                &record.classification,
                record.structural.timestamp,
            );
        }
    }
    rebuilt.integrity_hash = rebuilt.compute_integrity_hash();
    rebuilt.dimension_hashes = Some(dimension_hashes(&rebuilt));
    rebuilt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CorruptionSeverity;
    use codex::{
        ClassificationPayload, EmotionalTone, KnowledgeTranslator, ParsedContent, SourceRef,
        Translator, KNOWLEDGE_TEMPLATE,
    };
    use std::sync::{Arc, Mutex};

    fn record() -> TriDimensionalRecord {
        let parsed = ParsedContent::new(
            "raw-1",
            "Restauration des zones humides",
            "Une étude conduite sur cinq ans décrit la restauration de zones humides côtières. \
             Les chercheurs mesurent le retour des oiseaux migrateurs et la qualité de l'eau. \
             Les résultats encouragent d'autres communes à suivre la même démarche.",
        )
        .with_keywords(vec![
            "zones".to_string(),
            "humides".to_string(),
            "restauration".to_string(),
        ])
        .with_sources(vec![SourceRef::new("https://example.org/etude", true)]);
        let translator = KnowledgeTranslator::with_knowledge_template();
        tokio_test::block_on(translator.translate(KNOWLEDGE_TEMPLATE, &parsed)).unwrap()
    }

    fn other_tier(tier: u8) -> u8 {
        if tier == 9 {
            1
        } else {
            tier + 1
        }
    }

    #[test]
    fn test_intact_record_passes() {
        let mut corrector = QuantumCorrector::new();
        let original = record();
        let processed = corrector.process(&original).unwrap();
        assert!(processed.dimension_hashes.is_some());
        assert_eq!(processed.integrity_hash, original.integrity_hash);
        assert_eq!(corrector.log(1)[0].action, CorrectionAction::Verified);
        assert_eq!(corrector.stats().processed, 1);
        assert_eq!(corrector.stats().detected, 0);
    }

    #[test]
    fn test_classification_recovered_exactly() {
        let mut corrector = QuantumCorrector::new();
        let original = corrector.enrich(&record());
        let mut damaged = original.clone();
        damaged.classification =
            ClassificationPayload::from_tier(other_tier(original.classification.score_tier));

        assert!(corrector.detect(&damaged));
        let diagnostic = corrector.diagnose(&damaged);
        assert_eq!(diagnostic.corrupted_dims, vec![Dimension::Classification]);
        assert_eq!(diagnostic.severity, CorruptionSeverity::Minor);

        let repaired = corrector.process(&damaged).unwrap();
        assert_eq!(repaired.classification, original.classification);
        assert_eq!(repaired.integrity_hash, original.integrity_hash);
        assert_eq!(corrector.stats().corrected, 1);
    }

    #[test]
    fn test_narrative_recovered_exactly() {
        let mut corrector = QuantumCorrector::new();
        let original = corrector.enrich(&record());
        let mut damaged = original.clone();
        damaged.narrative.narrative = "texte altéré".to_string();
        damaged.narrative.emotional_tone = EmotionalTone::Cautionary;

        let repaired = corrector.process(&damaged).unwrap();
        assert_eq!(repaired.narrative, original.narrative);
        assert!(repaired.is_intact());
    }

    #[test]
    fn test_structural_rebuilt_from_other_dimensions() {
        let mut corrector = QuantumCorrector::new();
        let original = corrector.enrich(&record());
        let mut damaged = original.clone();
        damaged.structural.values.clear();

        let repaired = corrector.process(&damaged).unwrap();
        assert!(repaired.is_intact());
        assert_eq!(
            repaired.structural.data_type,
            codex::derive::data_type_from_tone(original.narrative.emotional_tone)
        );
        assert_eq!(
            repaired.structural.values["summary"],
            serde_json::json!(original.narrative.narrative)
        );
        assert_eq!(corrector.log(1)[0].dimension, Some(Dimension::Structural));
    }

    #[test]
    fn test_damaged_dimension_hash_never_rewrites_payloads() {
        let mut corrector = QuantumCorrector::new();
        let original = corrector.enrich(&record());
        let mut stale = original.clone();
        if let Some(hashes) = stale.dimension_hashes.as_mut() {
            hashes.structural = "0".repeat(64);
        }

        assert!(!corrector.detect(&stale));
        assert!(!corrector.diagnose(&stale).is_corrupted);

        let processed = corrector.process(&stale).unwrap();
        assert_eq!(processed.structural, original.structural);
        assert_eq!(processed.dimension_hashes, original.dimension_hashes);
        assert_eq!(corrector.log(1)[0].action, CorrectionAction::Verified);
        assert_eq!(corrector.log(1)[0].detail, "dimension hashes resealed");
        assert_eq!(corrector.stats().corrected, 0);
        assert_eq!(corrector.stats().detected, 0);
    }

    #[test]
    fn test_two_dimensions_are_irreparable() {
        let mut corrector = QuantumCorrector::new();
        let original = corrector.enrich(&record());
        let mut damaged = original.clone();
        damaged.narrative.narrative = "texte altéré".to_string();
        damaged.classification =
            ClassificationPayload::from_tier(other_tier(original.classification.score_tier));

        let error = corrector.process(&damaged).unwrap_err();
        match &error {
            CorrectionError::Unreconstructable { diagnostic } => {
                assert_eq!(diagnostic.severity, CorruptionSeverity::Major);
                assert_eq!(diagnostic.confidence, 0.33);
                assert_eq!(diagnostic.healthy_dims, vec![Dimension::Structural]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(corrector.stats().failed, 1);
        // One log entry per corrupted dimension.
        assert_eq!(corrector.log(10).len(), 2);
    }

    #[test]
    fn test_corruption_before_enrichment_is_not_localizable() {
        let mut corrector = QuantumCorrector::new();
        let mut damaged = record();
        damaged.classification =
            ClassificationPayload::from_tier(other_tier(damaged.classification.score_tier));

        let error = corrector.process(&damaged).unwrap_err();
        assert!(matches!(error, CorrectionError::NonLocalizable { .. }));
        assert_eq!(
            error.diagnostic().map(|d| d.severity),
            Some(CorruptionSeverity::Critical)
        );
    }

    #[test]
    fn test_events() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let mut corrector = QuantumCorrector::new();
        corrector.subscribe(move |e| sink.lock().unwrap().push(e.name()));

        let original = corrector.enrich(&record());
        let mut damaged = original.clone();
        damaged.narrative.narrative = "texte altéré".to_string();
        corrector.process(&damaged).unwrap();

        assert_eq!(
            *events.lock().unwrap(),
            vec!["corruption_detected", "correction_succeeded"]
        );
    }

    #[test]
    fn test_log_is_bounded() {
        let mut corrector = QuantumCorrector::with_config(CorrectorConfig { log_capacity: 3 });
        let original = record();
        for _ in 0..5 {
            corrector.process(&original).unwrap();
        }
        assert_eq!(corrector.log(10).len(), 3);
        assert_eq!(corrector.stats().processed, 5);
    }

    #[test]
    fn test_validate_rejects_off_scale_tier() {
        let corrector = QuantumCorrector::new();
        let mut bad = record();
        bad.classification.scale_value += 1;
        bad.integrity_hash = bad.compute_integrity_hash();
        assert!(matches!(
            corrector.validate(&bad),
            Err(CorrectionError::ValidationFailed(_))
        ));
    }
}
