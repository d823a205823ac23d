//! The detector state machine.
//!
//! A scan runs in four steps:
//!
//! 1. Lazy decay of the alert score (and of sensitivity, when calm) for
//!    the minutes elapsed since the previous scan
//! 2. Fast path checks, always
//! 3. Deep path checks, when the fast path fired or the level is above calm
//! 4. Folding the findings into one [`ThreatSignal`] and applying it
//!
//! Scanning takes `&mut self`: callers sharing a detector put it behind a
//! lock, which serializes scans against the same [`AlertState`].

use std::collections::{BTreeSet, VecDeque};

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use codex::{ListenerId, Listeners};
use resonance::{detect_intention, intention_evidence};

use crate::config::AmygdalaConfig;
use crate::memory::{AlertMemory, RepetitionTracker};
use crate::principles::check_principles;
use crate::service::ServiceEvaluator;
use crate::types::{
    AlertEvent, AlertLevel, AlertState, Finding, Pathway, RecordProbe, ScanContext, ThreatSignal,
    ThreatType,
};

const INVALID_SCORE_SEVERITY: u8 = 45;
const HASH_MISMATCH_SEVERITY: u8 = 70;
const MISSING_DIMENSION_SEVERITY: u8 = 60;
const SUDDEN_SHIFT_SEVERITY: u8 = 35;
const REPETITION_SEVERITY: u8 = 50;
const HOSTILE_INTENT_SEVERITY: u8 = 65;
const PRINCIPLE_SEVERITY: u8 = 70;
/// Service checklist: base plus a step per failed criterion.
const SERVICE_BASE_SEVERITY: u8 = 25;
const SERVICE_STEP_SEVERITY: u8 = 15;
/// Added per finding beyond the strongest one.
const EXTRA_FINDING_SEVERITY: u8 = 5;

/// Two-tier anomaly detector with its own alert state.
pub struct Amygdala {
    config: AmygdalaConfig,
    state: AlertState,
    active: VecDeque<ThreatSignal>,
    repetition: RepetitionTracker,
    last_score: Option<f64>,
    service: ServiceEvaluator,
    listeners: Listeners<AlertEvent>,
}

impl Amygdala {
    /// Create a detector with the default configuration.
    pub fn new() -> Self {
        Self::with_config(AmygdalaConfig::default())
    }

    /// Create a detector with a custom configuration.
    pub fn with_config(config: AmygdalaConfig) -> Self {
        let state = AlertState::new(config.sensitivity_baseline, config.memory_capacity);
        Self::with_state(config, state)
    }

    /// Resume from a previously captured state.
    pub fn with_state(config: AmygdalaConfig, state: AlertState) -> Self {
        let repetition = RepetitionTracker::new(
            config.repetition_capacity,
            Duration::seconds(config.repetition_window_secs),
        );
        Self {
            config,
            state,
            active: VecDeque::new(),
            repetition,
            last_score: None,
            service: ServiceEvaluator,
            listeners: Listeners::new(),
        }
    }

    pub fn config(&self) -> &AmygdalaConfig {
        &self.config
    }

    /// Current alert state.
    pub fn state(&self) -> &AlertState {
        &self.state
    }

    pub fn alert_level(&self) -> AlertLevel {
        self.state.level
    }

    pub fn alert_score(&self) -> f64 {
        self.state.score
    }

    pub fn sensitivity(&self) -> f64 {
        self.state.sensitivity
    }

    /// Signals accepted within the active window of the last scan.
    pub fn active_threats(&self) -> Vec<ThreatSignal> {
        self.active.iter().cloned().collect()
    }

    pub fn memory(&self) -> &AlertMemory {
        &self.state.memory
    }

    /// Register a listener for detector events.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&AlertEvent) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Scan a context now.
    pub fn scan(&mut self, context: &ScanContext) -> Option<ThreatSignal> {
        self.scan_at(context, Utc::now())
    }

    /// Scan an untyped JSON context.
    ///
    /// A context that does not deserialize yields no signal.
    pub fn scan_value(&mut self, value: &Value) -> Option<ThreatSignal> {
        match serde_json::from_value::<ScanContext>(value.clone()) {
            Ok(context) => self.scan(&context),
            Err(e) => {
                warn!(error = %e, "Malformed scan context ignored");
                None
            }
        }
    }

    /// Scan a context at an explicit instant.
    pub fn scan_at(&mut self, context: &ScanContext, now: DateTime<Utc>) -> Option<ThreatSignal> {
        self.apply_decay(now);
        self.prune_active(now);

        let mut findings = self.fast_path(context, now);
        let escalate = !findings.is_empty() || self.state.level != AlertLevel::Calm;
        if escalate {
            findings.extend(self.deep_path(context));
        }

        if let Some(score) = context.scalar_score().filter(|s| (0.0..=100.0).contains(s)) {
            self.last_score = Some(score);
        }

        if findings.is_empty() {
            return None;
        }

        let signal = self.build_signal(context, findings, now);
        Some(self.accept(signal, now))
    }

    /// Force the detector back to calm.
    ///
    /// Clears the score, active window, repetition history and last
    /// score; long-term memory is kept.
    pub fn reset_alert(&mut self) {
        let previous = self.state.level;
        self.state.score = 0.0;
        self.state.level = AlertLevel::Calm;
        self.state.sensitivity = self.config.sensitivity_baseline;
        self.active.clear();
        self.repetition.clear();
        self.last_score = None;

        info!(from = %previous, "Alert reset");
        if previous != AlertLevel::Calm {
            self.listeners.emit(&AlertEvent::AlertChanged {
                from: previous,
                to: AlertLevel::Calm,
                score: 0.0,
            });
        }
        self.listeners.emit(&AlertEvent::AllClear);
    }

    fn apply_decay(&mut self, now: DateTime<Utc>) {
        let Some(last) = self.state.last_scan else {
            self.state.last_scan = Some(now);
            return;
        };
        self.state.last_scan = Some(now.max(last));

        let minutes = (now - last).num_milliseconds() as f64 / 60_000.0;
        if minutes <= 0.0 {
            return;
        }

        self.state.score = (self.state.score - self.config.decay_per_minute * minutes).max(0.0);
        let level = AlertLevel::from_score(self.state.score);

        if level == AlertLevel::Calm {
            let baseline = self.config.sensitivity_baseline;
            let step = self.config.sensitivity_decay_per_minute * minutes;
            let current = self.state.sensitivity;
            self.state.sensitivity = if current > baseline {
                (current - step).max(baseline)
            } else {
                (current + step).min(baseline)
            };
        }

        self.transition(level);
    }

    fn prune_active(&mut self, now: DateTime<Utc>) {
        let cutoff = now - Duration::seconds(self.config.active_window_secs);
        while self.active.front().is_some_and(|s| s.timestamp < cutoff) {
            self.active.pop_front();
        }
    }

    fn fast_path(&mut self, context: &ScanContext, now: DateTime<Utc>) -> Vec<Finding> {
        let mut findings = Vec::new();

        if let Some(score) = context.score {
            if !score.is_finite() || !(0.0..=100.0).contains(&score) {
                findings.push(Finding::fast(
                    ThreatType::InvalidScore,
                    INVALID_SCORE_SEVERITY,
                    format!("score {} outside 0-100", score),
                ));
            }
        }

        if let Some(record) = &context.record {
            findings.extend(Self::check_record(record));
        }

        if let (Some(previous), Some(current)) = (self.last_score, context.scalar_score()) {
            let jump = (current - previous).abs();
            if (0.0..=100.0).contains(&current) && jump > self.config.jump_threshold {
                findings.push(Finding::fast(
                    ThreatType::SuddenShift,
                    SUDDEN_SHIFT_SEVERITY,
                    format!("score jumped {:.1} points ({:.1} -> {:.1})", jump, previous, current),
                ));
            }
        }

        let key = context.repetition_key();
        let seen = self.repetition.record(&key, now);
        if seen > self.config.repetition_limit {
            findings.push(Finding::fast(
                ThreatType::CascadeRisk,
                REPETITION_SEVERITY,
                format!(
                    "identical input seen {} times within {}s",
                    seen, self.config.repetition_window_secs
                ),
            ));
        }

        for finding in &findings {
            debug!(
                source = %context.source_component,
                threat_type = %finding.threat_type,
                severity = finding.severity,
                "Fast path finding"
            );
        }
        findings
    }

    fn check_record(record: &RecordProbe) -> Vec<Finding> {
        let mut findings = Vec::new();

        if let Some(classification) = &record.classification {
            if classification.score_tier != 0 && !classification.is_on_scale() {
                findings.push(Finding::fast(
                    ThreatType::InvalidScore,
                    INVALID_SCORE_SEVERITY,
                    format!(
                        "classification tier {} / scale value {} off the scale",
                        classification.score_tier, classification.scale_value
                    ),
                ));
            }
        }

        if record.integrity_mismatch() == Some(true) {
            findings.push(Finding::fast(
                ThreatType::IntegrityViolation,
                HASH_MISMATCH_SEVERITY,
                "integrity hash does not match payloads",
            ));
        }

        let missing = record.missing_dimensions();
        if !missing.is_empty() {
            let names: Vec<_> = missing.iter().map(|d| d.as_str()).collect();
            findings.push(Finding::fast(
                ThreatType::IntegrityViolation,
                MISSING_DIMENSION_SEVERITY,
                format!("missing dimensions: {}", names.join(", ")),
            ));
        }

        findings
    }

    fn deep_path(&self, context: &ScanContext) -> Vec<Finding> {
        let mut findings = Vec::new();

        let mut screened = String::new();
        if let Some(text) = &context.text {
            screened.push_str(text);
        }
        if let Some(action) = &context.action {
            screened.push('\n');
            screened.push_str(&action.description);
        }

        if !screened.trim().is_empty() {
            let intention = detect_intention(&screened);
            if intention.is_hostile() {
                let markers: Vec<_> = intention_evidence(&screened)
                    .into_iter()
                    .filter(|(tag, _)| *tag == intention)
                    .flat_map(|(_, found)| found)
                    .collect();
                findings.push(Finding::deep(
                    ThreatType::HostileIntent,
                    HOSTILE_INTENT_SEVERITY,
                    format!("{} intention: {}", intention.label(), markers.join(", ")),
                ));
            }

            let violations = check_principles(&screened);
            if !violations.is_empty() {
                let ids: Vec<_> = violations.iter().map(|v| v.principle.id).collect();
                findings.push(Finding::deep(
                    ThreatType::PrincipleViolation,
                    PRINCIPLE_SEVERITY,
                    format!("immutable principles at risk: {}", ids.join(", ")),
                ));
            }
        }

        if let Some(action) = &context.action {
            let evaluation = self.service.evaluate(action);
            if !evaluation.is_service() {
                let failed = evaluation.failures.len().min(u8::MAX as usize) as u8;
                let severity = SERVICE_BASE_SEVERITY
                    .saturating_add(SERVICE_STEP_SEVERITY.saturating_mul(failed))
                    .min(100);
                let criteria: Vec<_> = evaluation
                    .failures
                    .iter()
                    .map(|(c, reason)| format!("{} ({})", c, reason))
                    .collect();
                findings.push(Finding::deep(
                    ThreatType::PrincipleViolation,
                    severity,
                    format!("extraction over service: {}", criteria.join("; ")),
                ));
            }
        }

        for finding in &findings {
            debug!(
                source = %context.source_component,
                threat_type = %finding.threat_type,
                severity = finding.severity,
                "Deep path finding"
            );
        }
        findings
    }

    fn build_signal(
        &self,
        context: &ScanContext,
        mut findings: Vec<Finding>,
        now: DateTime<Utc>,
    ) -> ThreatSignal {
        // Strongest first; stable, so ties keep check order.
        findings.sort_by(|a, b| b.severity.cmp(&a.severity));
        let top = &findings[0];
        // A repeated input is reported as such, whatever else it carries.
        let threat_type = if findings
            .iter()
            .any(|f| f.threat_type == ThreatType::CascadeRisk)
        {
            ThreatType::CascadeRisk
        } else {
            top.threat_type
        };

        let extra = (findings.len() - 1).min(20) as u8;
        let mut severity = top
            .severity
            .saturating_add(EXTRA_FINDING_SEVERITY.saturating_mul(extra));
        let mut pathway = if findings.iter().any(|f| f.pathway == Pathway::Deep) {
            Pathway::Deep
        } else {
            Pathway::Fast
        };
        let mut evidence: Vec<String> = findings.iter().map(|f| f.evidence.clone()).collect();

        let cascade_cutoff = now - Duration::seconds(self.config.cascade_window_secs);
        let recent: Vec<_> = self
            .active
            .iter()
            .filter(|s| s.timestamp >= cascade_cutoff)
            .collect();
        let mut types: BTreeSet<ThreatType> = recent.iter().map(|s| s.threat_type).collect();
        types.insert(threat_type);
        let count = recent.len() + 1;
        if count >= self.config.cascade_min_signals && types.len() >= self.config.cascade_min_types {
            severity = severity.saturating_add(self.config.cascade_bonus);
            pathway = Pathway::Deep;
            evidence.push(format!(
                "cascade: {} signals of {} types within {}s",
                count,
                types.len(),
                self.config.cascade_window_secs
            ));
        }

        ThreatSignal {
            id: Uuid::new_v4().to_string(),
            threat_type,
            severity: severity.min(100),
            alert_level: self.state.level,
            source_component: context.source_component.clone(),
            timestamp: now,
            evidence,
            pathway,
        }
    }

    fn accept(&mut self, mut signal: ThreatSignal, now: DateTime<Utc>) -> ThreatSignal {
        let contribution =
            signal.severity as f64 * self.state.sensitivity * self.config.score_factor;
        self.state.score = (self.state.score + contribution).clamp(0.0, 100.0);

        let window_start = now - Duration::seconds(self.config.sensitivity_window_secs);
        let recent = self.state.memory.since(window_start).count() + 1;
        if recent >= self.config.sensitivity_trigger_signals {
            self.state.sensitivity = (self.state.sensitivity + self.config.sensitivity_increment)
                .clamp(self.config.sensitivity_min, self.config.sensitivity_max);
        }

        let level = AlertLevel::from_score(self.state.score);
        signal.alert_level = level;

        info!(
            signal_id = %signal.id,
            threat_type = %signal.threat_type,
            severity = signal.severity,
            pathway = ?signal.pathway,
            score = self.state.score,
            "Threat signal accepted"
        );

        self.state.memory.push(signal.clone());
        self.active.push_back(signal.clone());
        self.listeners.emit(&AlertEvent::ThreatDetected(signal.clone()));
        self.transition(level);

        signal
    }

    fn transition(&mut self, level: AlertLevel) {
        let previous = self.state.level;
        if previous == level {
            return;
        }
        self.state.level = level;
        let score = self.state.score;

        info!(from = %previous, to = %level, score, "Alert level changed");
        self.listeners.emit(&AlertEvent::AlertChanged {
            from: previous,
            to: level,
            score,
        });

        match level {
            AlertLevel::Lockdown => {
                warn!(score, "Lockdown engaged");
                self.listeners.emit(&AlertEvent::LockdownEngaged { score });
            }
            AlertLevel::Calm => self.listeners.emit(&AlertEvent::AllClear),
            _ => {}
        }
    }
}

impl Default for Amygdala {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Amygdala {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Amygdala")
            .field("level", &self.state.level)
            .field("score", &self.state.score)
            .field("sensitivity", &self.state.sensitivity)
            .field("active", &self.active.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ActionIntent;
    use codex::{
        ClassificationPayload, KnowledgeTranslator, ParsedContent, Translator,
        TriDimensionalRecord, KNOWLEDGE_TEMPLATE,
    };
    use std::sync::{Arc, Mutex};

    fn record() -> TriDimensionalRecord {
        let parsed = ParsedContent::new(
            "raw-1",
            "Rapport sur la qualité de l'eau",
            "Les analyses menées cette année montrent une amélioration nette de la qualité de l'eau dans la région. Les auteurs citent trois laboratoires indépendants.",
        );
        let translator = KnowledgeTranslator::with_knowledge_template();
        tokio_test::block_on(translator.translate(KNOWLEDGE_TEMPLATE, &parsed)).unwrap()
    }

    #[test]
    fn test_clean_scan_yields_nothing() {
        let mut amygdala = Amygdala::new();
        let context = ScanContext::new("test").with_record(&record());
        assert!(amygdala.scan(&context).is_none());
        assert_eq!(amygdala.alert_level(), AlertLevel::Calm);
    }

    #[test]
    fn test_invalid_score() {
        let mut amygdala = Amygdala::new();
        let signal = amygdala
            .scan(&ScanContext::new("test").with_score(150.0))
            .unwrap();
        assert_eq!(signal.threat_type, ThreatType::InvalidScore);
        assert_eq!(signal.pathway, Pathway::Fast);
    }

    #[test]
    fn test_tampered_record_is_integrity_violation() {
        let mut amygdala = Amygdala::new();
        let mut tampered = record();
        tampered.classification = ClassificationPayload::from_tier(9);
        let signal = amygdala
            .scan(&ScanContext::new("test").with_record(&tampered))
            .unwrap();
        assert_eq!(signal.threat_type, ThreatType::IntegrityViolation);
    }

    #[test]
    fn test_missing_dimension() {
        let mut amygdala = Amygdala::new();
        let mut context = ScanContext::new("test").with_record(&record());
        if let Some(probe) = context.record.as_mut() {
            probe.narrative = None;
            probe.integrity_hash = None;
        }
        let signal = amygdala.scan(&context).unwrap();
        assert_eq!(signal.threat_type, ThreatType::IntegrityViolation);
        assert!(signal.evidence[0].contains("NARRATIVE"));
    }

    #[test]
    fn test_sudden_shift() {
        let mut amygdala = Amygdala::new();
        let now = Utc::now();
        assert!(amygdala
            .scan_at(&ScanContext::new("test").with_score(20.0), now)
            .is_none());
        let signal = amygdala
            .scan_at(
                &ScanContext::new("test").with_score(90.0),
                now + Duration::seconds(1),
            )
            .unwrap();
        assert_eq!(signal.threat_type, ThreatType::SuddenShift);
    }

    #[test]
    fn test_repetition_escalates_to_cascade_risk() {
        let mut amygdala = Amygdala::new();
        let context = ScanContext::new("test").with_text("Le conseil municipal se réunit jeudi.");
        let start = Utc::now();

        let mut signals = Vec::new();
        for i in 0..4 {
            if let Some(signal) = amygdala.scan_at(&context, start + Duration::seconds(i)) {
                signals.push(signal);
            }
        }
        assert!(signals
            .iter()
            .any(|s| s.threat_type == ThreatType::CascadeRisk));

        amygdala.reset_alert();
        assert_eq!(amygdala.alert_level(), AlertLevel::Calm);
        assert_eq!(amygdala.alert_score(), 0.0);
        assert!(amygdala.active_threats().is_empty());
        assert!(!amygdala.memory().is_empty());
    }

    #[test]
    fn test_repeated_tampered_record_reports_cascade_risk() {
        let mut amygdala = Amygdala::new();
        let mut tampered = record();
        tampered.integrity_hash = "0".repeat(64);
        let context = ScanContext::new("test").with_record(&tampered);
        let start = Utc::now();

        let types: Vec<_> = (0..4)
            .map(|i| {
                amygdala
                    .scan_at(&context, start + Duration::seconds(i))
                    .map(|s| s.threat_type)
            })
            .collect();
        assert_eq!(types[0], Some(ThreatType::IntegrityViolation));
        assert_eq!(types[3], Some(ThreatType::CascadeRisk));

        let active = amygdala.active_threats();
        let last = &active[3];
        assert!(last
            .evidence
            .iter()
            .any(|e| e.contains("integrity hash")));
        assert!(last.severity >= 75);
    }

    #[test]
    fn test_same_content_translated_twice_repeats() {
        let mut amygdala = Amygdala::new();
        let start = Utc::now();

        // Each translation carries fresh ids and timestamps.
        let types: Vec<_> = (0..4)
            .map(|i| {
                let context = ScanContext::new("test")
                    .with_text("Rapport sur la qualité de l'eau")
                    .with_record(&record());
                amygdala
                    .scan_at(&context, start + Duration::seconds(i))
                    .map(|s| s.threat_type)
            })
            .collect();
        assert_eq!(types, vec![None, None, None, Some(ThreatType::CascadeRisk)]);
    }

    #[test]
    fn test_deep_path_runs_when_fast_path_fires() {
        let mut amygdala = Amygdala::new();
        let context = ScanContext::new("test")
            .with_score(-5.0)
            .with_text("Dernière chance ! Agissez maintenant avant qu'il ne soit trop tard.");
        let signal = amygdala.scan(&context).unwrap();
        assert_eq!(signal.threat_type, ThreatType::HostileIntent);
        assert_eq!(signal.pathway, Pathway::Deep);
        // Strongest finding plus one extra.
        assert_eq!(signal.severity, 70);
    }

    #[test]
    fn test_deep_path_skipped_when_calm() {
        let mut amygdala = Amygdala::new();
        let context = ScanContext::new("test")
            .with_text("Dernière chance ! Agissez maintenant avant qu'il ne soit trop tard.");
        assert!(amygdala.scan(&context).is_none());
    }

    #[test]
    fn test_extraction_action_when_vigilant() {
        let mut amygdala = Amygdala::new();
        amygdala.state.score = 40.0;
        amygdala.state.level = AlertLevel::Vigilant;

        let action = ActionIntent::described(
            "Introduce hidden fees behind closed doors to maximize profit",
        );
        let signal = amygdala
            .scan(&ScanContext::new("governance").with_action(action))
            .unwrap();
        assert_eq!(signal.threat_type, ThreatType::PrincipleViolation);
        assert_eq!(signal.pathway, Pathway::Deep);
    }

    #[test]
    fn test_score_decays_lazily() {
        let mut amygdala = Amygdala::new();
        let start = Utc::now();
        amygdala.scan_at(&ScanContext::new("test").with_score(500.0), start);
        let score = amygdala.alert_score();
        assert!(score > 0.0);

        // Ten calm minutes later the score has fully decayed.
        let later = start + Duration::minutes(10);
        assert!(amygdala
            .scan_at(&ScanContext::new("other"), later)
            .is_none());
        assert_eq!(amygdala.alert_score(), 0.0);
        assert_eq!(amygdala.alert_level(), AlertLevel::Calm);
        assert!(amygdala.active_threats().is_empty());
    }

    #[test]
    fn test_sensitivity_rises_under_pressure() {
        let mut amygdala = Amygdala::new();
        let start = Utc::now();
        for i in 0..3 {
            amygdala.scan_at(
                &ScanContext::new(format!("c{}", i)).with_score(-1.0),
                start + Duration::seconds(i),
            );
        }
        assert!(amygdala.sensitivity() > amygdala.config().sensitivity_baseline);
        assert!(amygdala.sensitivity() <= amygdala.config().sensitivity_max);
    }

    #[test]
    fn test_sensitivity_returns_to_baseline_when_calm() {
        let mut amygdala = Amygdala::new();
        let baseline = amygdala.config().sensitivity_baseline;
        let start = Utc::now();
        for i in 0..3 {
            amygdala.scan_at(
                &ScanContext::new(format!("c{}", i)).with_score(-1.0),
                start + Duration::seconds(i),
            );
        }
        let raised = amygdala.sensitivity();
        assert!((raised - (baseline + 0.1)).abs() < 1e-9);
        assert_eq!(amygdala.alert_level(), AlertLevel::Vigilant);

        // One minute later the score is calm again and sensitivity eases off.
        let quiet = ScanContext::new("quiet");
        assert!(amygdala
            .scan_at(&quiet, start + Duration::seconds(62))
            .is_none());
        assert_eq!(amygdala.alert_level(), AlertLevel::Calm);
        assert!((amygdala.sensitivity() - (raised - 0.05)).abs() < 1e-9);

        // Long calm stretches settle on the baseline, never below it.
        amygdala.scan_at(&quiet, start + Duration::minutes(30));
        assert_eq!(amygdala.sensitivity(), baseline);
        amygdala.scan_at(&quiet, start + Duration::minutes(60));
        assert_eq!(amygdala.sensitivity(), baseline);
    }

    #[test]
    fn test_cascade_bonus() {
        let mut amygdala = Amygdala::new();
        let now = Utc::now();
        amygdala.scan_at(&ScanContext::new("a").with_score(-1.0), now);
        amygdala.scan_at(&ScanContext::new("b").with_score(f64::INFINITY), now);
        let mut tampered = record();
        tampered.integrity_hash = "0".repeat(64);
        let signal = amygdala
            .scan_at(&ScanContext::new("c").with_record(&tampered), now)
            .unwrap();
        assert!(signal.evidence.iter().any(|e| e.starts_with("cascade")));
        assert_eq!(signal.severity, 70 + 15);
    }

    #[test]
    fn test_events_and_lockdown() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let mut amygdala = Amygdala::new();
        let id = amygdala.subscribe(move |e| sink.lock().unwrap().push(e.name()));

        amygdala.state.score = 75.0;
        amygdala.state.level = AlertLevel::Alert;
        amygdala.scan(&ScanContext::new("test").with_score(-1.0));
        amygdala.reset_alert();

        let names = events.lock().unwrap().clone();
        assert_eq!(
            names,
            vec![
                "threat_detected",
                "alert_changed",
                "lockdown_engaged",
                "alert_changed",
                "all_clear"
            ]
        );
        assert!(amygdala.unsubscribe(id));
        assert!(!amygdala.unsubscribe(id));
    }

    #[test]
    fn test_malformed_value_yields_nothing() {
        let mut amygdala = Amygdala::new();
        assert!(amygdala
            .scan_value(&serde_json::json!({ "score": "high" }))
            .is_none());
        let signal = amygdala.scan_value(&serde_json::json!({
            "source_component": "api",
            "score": 101.0
        }));
        assert_eq!(signal.unwrap().threat_type, ThreatType::InvalidScore);
    }

    #[test]
    fn test_independent_instances() {
        let mut first = Amygdala::new();
        let second = Amygdala::new();
        first.scan(&ScanContext::new("test").with_score(-1.0));
        assert!(first.alert_score() > 0.0);
        assert_eq!(second.alert_score(), 0.0);
    }
}
