//! The ingestion pipeline.
//!
//! ```text
//! ingest ─► parse ─► translate ─► absorb ─► route ─► store
//!             │          │           │                 │
//!             └──────────┴───────────┴─────────────────┴─► eliminate ─► waste log
//! ```
//!
//! Every stage appends a pass/fail line to the result's stage log.
//! Rejections are tagged results; nothing here returns an error for bad
//! content.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use amygdala::{Amygdala, ScanContext, ThreatSignal};
use codex::{
    KnowledgeStore, ListenerId, Listeners, ParsedContent, Placement, RawContent, SourceKind,
    Translator, TriDimensionalRecord,
};
use corrector::QuantumCorrector;
use resonance::{IntentionTag, QualityScore, ResonanceRequest, ResonanceScorer};

use crate::config::DigestionConfig;
use crate::parser::{discloses_methodology, ContentParser};
use crate::router::Router;
use crate::types::{
    BatchResult, DigestInput, DigestedResult, DigestionError, DigestionEvent, DigestionStats,
    Result, Stage,
};
use crate::waste::{WasteEntry, WasteLog};

/// Component name reported to the detector and recorded on nodes.
pub const COMPONENT: &str = "digestive_system";

/// Positions are degrees on a category ring.
const POSITION_RANGE: u16 = 360;

/// Why the absorb stage turned an item away.
enum Rejection {
    Hostile(IntentionTag),
    Threat { threat_type: String, severity: u8 },
    LowScore(u8),
}

/// Ingestion pipeline deciding what enters the knowledge store.
pub struct DigestiveSystem {
    config: DigestionConfig,
    parser: ContentParser,
    scorer: ResonanceScorer,
    router: Router,
    translator: Arc<dyn Translator>,
    store: Arc<dyn KnowledgeStore>,
    amygdala: Option<Arc<RwLock<Amygdala>>>,
    corrector: Option<Arc<RwLock<QuantumCorrector>>>,
    stats: Arc<RwLock<DigestionStats>>,
    waste: Arc<RwLock<WasteLog>>,
    rng: Mutex<StdRng>,
    listeners: RwLock<Listeners<DigestionEvent>>,
}

impl DigestiveSystem {
    /// Create a pipeline over a translator and a store.
    pub fn new(
        config: DigestionConfig,
        translator: Arc<dyn Translator>,
        store: Arc<dyn KnowledgeStore>,
    ) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            parser: ContentParser::new(config.parser.clone())?,
            scorer: ResonanceScorer::new(),
            router: Router::new(config.routing.clone()),
            translator,
            store,
            amygdala: None,
            corrector: None,
            stats: Arc::new(RwLock::new(DigestionStats::default())),
            waste: Arc::new(RwLock::new(WasteLog::new(config.waste_capacity))),
            rng: Mutex::new(rng),
            listeners: RwLock::new(Listeners::new()),
            config,
        })
    }

    /// Screen every item with an anomaly detector.
    pub fn with_amygdala(mut self, amygdala: Arc<RwLock<Amygdala>>) -> Self {
        self.amygdala = Some(amygdala);
        self
    }

    /// Attach per-dimension hashes to records before they are stored.
    pub fn with_corrector(mut self, corrector: Arc<RwLock<QuantumCorrector>>) -> Self {
        self.corrector = Some(corrector);
        self
    }

    pub fn config(&self) -> &DigestionConfig {
        &self.config
    }

    pub fn amygdala(&self) -> Option<&Arc<RwLock<Amygdala>>> {
        self.amygdala.as_ref()
    }

    /// Statistics snapshot.
    pub async fn stats(&self) -> DigestionStats {
        self.stats.read().await.clone()
    }

    /// Most recent eliminations, newest first.
    pub async fn waste(&self, limit: usize) -> Vec<WasteEntry> {
        self.waste.read().await.recent(limit)
    }

    /// Register a listener for pipeline events.
    pub async fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&DigestionEvent) + Send + Sync + 'static,
    {
        self.listeners.write().await.subscribe(listener)
    }

    pub async fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners.write().await.unsubscribe(id)
    }

    /// Digest one item.
    pub async fn digest(
        &self,
        source_kind: SourceKind,
        url: &str,
        raw_bytes: &str,
        content_type: &str,
    ) -> DigestedResult {
        let raw = RawContent::new(source_kind, url, raw_bytes, content_type);
        self.digest_raw(raw).await
    }

    /// Digest one prepared input.
    pub async fn digest_input(&self, input: &DigestInput) -> DigestedResult {
        self.digest(input.source_kind, &input.url, &input.raw_bytes, &input.content_type)
            .await
    }

    /// Digest a batch; items are independent of each other.
    pub async fn digest_batch(&self, items: Vec<DigestInput>) -> BatchResult {
        let results = join_all(items.iter().map(|item| self.digest_input(item))).await;

        let (absorbed, eliminated): (Vec<_>, Vec<_>) = results.into_iter().partition(DigestedResult::is_absorbed);
        BatchResult {
            absorbed,
            eliminated,
            stats: self.stats().await,
        }
    }

    /// Digest an eliminated item again, as a fresh ingestion.
    pub async fn replay_waste(&self, waste_id: &str) -> Result<DigestedResult> {
        let raw = {
            let waste = self.waste.read().await;
            let entry = waste
                .get(waste_id)
                .ok_or_else(|| DigestionError::WasteNotFound(waste_id.to_string()))?;
            entry.raw.clone()
        };
        info!(waste_id = %waste_id, raw_id = %raw.id, "Replaying eliminated content");
        Ok(self
            .digest(raw.source_kind, &raw.url, &raw.raw_bytes, &raw.content_type)
            .await)
    }

    async fn digest_raw(&self, raw: RawContent) -> DigestedResult {
        let mut result = DigestedResult::new(&raw.id);
        result.log(
            Stage::Ingest,
            true,
            format!("{} bytes from {} ({})", raw.raw_bytes.len(), raw.source_kind, raw.url),
        );
        self.stats.write().await.record_ingested();

        // Parse
        let parsed = self.parser.parse(&raw);
        let min_words = self.config.parser.min_words;
        if parsed.word_count < min_words {
            let reason = format!(
                "word count {} below minimum {}",
                parsed.word_count, min_words
            );
            result.parsed = Some(parsed);
            return self.eliminate(result, raw, Stage::Parse, reason).await;
        }
        result.log(
            Stage::Parse,
            true,
            format!("{} words, language {}", parsed.word_count, parsed.language),
        );
        debug!(raw_id = %raw.id, title = %parsed.title, "Parsed content");

        // Translate
        let record = match self.translator.translate(&self.config.template, &parsed).await {
            Ok(record) => record,
            Err(e) => {
                warn!(raw_id = %raw.id, error = %e, "Translation failed");
                result.parsed = Some(parsed);
                let reason = format!("translation failed: {}", e);
                return self.eliminate(result, raw, Stage::Translate, reason).await;
            }
        };
        result.log(
            Stage::Translate,
            true,
            format!("tier {}", record.classification.score_tier),
        );

        // Absorb
        let quality = self.score(&parsed);
        let threat = self.screen(&parsed, &record).await;
        let rejection = self.rejection(&quality, threat.as_ref());
        result.quality = Some(quality.clone());
        result.threat = threat;
        if let Some(rejection) = rejection {
            result.parsed = Some(parsed);
            result.record = Some(record);
            let reason = match rejection {
                Rejection::Hostile(tag) => {
                    format!("intention {}: hostile content is never absorbed", tag.label())
                }
                Rejection::Threat {
                    threat_type,
                    severity,
                } => format!("threat {} with severity {}", threat_type, severity),
                Rejection::LowScore(composite) => format!(
                    "composite score {} below absorption threshold {}",
                    composite, self.config.absorption.threshold
                ),
            };
            return self.eliminate(result, raw, Stage::Absorb, reason).await;
        }
        result.log(
            Stage::Absorb,
            true,
            format!(
                "composite {} ({})",
                quality.composite_score, quality.intention_tag
            ),
        );

        // Route
        let (category, layer) = self.router.route(&parsed.keywords, &quality);
        result.category = Some(category);
        result.layer = Some(layer);
        result.log(Stage::Route, true, format!("{}/{}", category, layer));

        // Store
        let record = match &self.corrector {
            Some(corrector) => corrector.read().await.enrich(&record),
            None => record,
        };
        let placement = Placement {
            category,
            layer,
            position: self.rng.lock().await.gen_range(0..POSITION_RANGE),
            created_by: self.config.created_by.clone(),
        };
        result.parsed = Some(parsed);
        match self.store.store(record.clone(), placement).await {
            Ok(node) => {
                result.record = Some(record);
                result.log(Stage::Store, true, format!("node {}", node.id));
                self.stats
                    .write()
                    .await
                    .record_absorbed(category, quality.composite_score);

                info!(
                    raw_id = %raw.id,
                    node_id = %node.id,
                    category = %category,
                    layer = %layer,
                    composite = quality.composite_score,
                    "Content absorbed"
                );
                self.emit(DigestionEvent::FoodAbsorbed {
                    raw_id: raw.id.clone(),
                    node_id: node.id.clone(),
                    category,
                    layer,
                })
                .await;
                self.emit(DigestionEvent::DigestionComplete {
                    raw_id: raw.id.clone(),
                    stage: Stage::Store,
                })
                .await;

                result.node = Some(node);
                result
            }
            Err(e) => {
                warn!(raw_id = %raw.id, error = %e, "Store failed");
                result.record = Some(record);
                let reason = format!("store failed: {}", e);
                self.eliminate(result, raw, Stage::Store, reason).await
            }
        }
    }

    fn score(&self, parsed: &ParsedContent) -> QualityScore {
        let text = format!("{}\n{}", parsed.title, parsed.body);
        self.scorer.analyze(&ResonanceRequest {
            content_id: Some(&parsed.id),
            text: &text,
            author_id: parsed.author.as_deref(),
            sources: &parsed.source_refs,
            methodology_disclosed: discloses_methodology(&parsed.body),
            author_history_score: None,
        })
    }

    async fn screen(
        &self,
        parsed: &ParsedContent,
        record: &TriDimensionalRecord,
    ) -> Option<ThreatSignal> {
        let amygdala = self.amygdala.as_ref()?;
        let context = ScanContext::new(COMPONENT)
            .with_text(format!("{}\n{}", parsed.title, parsed.body))
            .with_record(record);
        let signal = amygdala.write().await.scan(&context);
        if let Some(signal) = &signal {
            debug!(
                raw_id = %parsed.raw_content_id,
                threat_type = %signal.threat_type,
                severity = signal.severity,
                "Detector signal"
            );
        }
        signal
    }

    fn rejection(
        &self,
        quality: &QualityScore,
        threat: Option<&ThreatSignal>,
    ) -> Option<Rejection> {
        if quality.intention_tag.is_hostile() {
            return Some(Rejection::Hostile(quality.intention_tag));
        }
        if let Some(signal) = threat {
            if signal.severity >= self.config.absorption.threat_severity {
                return Some(Rejection::Threat {
                    threat_type: signal.threat_type.to_string(),
                    severity: signal.severity,
                });
            }
        }
        if quality.composite_score < self.config.absorption.threshold {
            return Some(Rejection::LowScore(quality.composite_score));
        }
        None
    }

    async fn eliminate(
        &self,
        mut result: DigestedResult,
        raw: RawContent,
        stage: Stage,
        reason: String,
    ) -> DigestedResult {
        result.log(stage, false, reason.clone());
        result.log(Stage::Eliminated, false, reason.clone());
        result.failed_at = Some(stage);
        result.rejection_reason = Some(reason.clone());

        self.stats.write().await.record_eliminated();
        let waste_id = format!("waste-{}", raw.id);
        self.waste.write().await.push(WasteEntry {
            id: waste_id.clone(),
            raw,
            failed_at: stage,
            reason: reason.clone(),
            eliminated_at: Utc::now(),
        });

        info!(
            raw_id = %result.raw_id,
            waste_id = %waste_id,
            stage = %stage,
            reason = %reason,
            "Content eliminated"
        );
        self.emit(DigestionEvent::FoodEliminated {
            raw_id: result.raw_id.clone(),
            stage,
            reason,
        })
        .await;
        self.emit(DigestionEvent::DigestionComplete {
            raw_id: result.raw_id.clone(),
            stage: Stage::Eliminated,
        })
        .await;

        result
    }

    async fn emit(&self, event: DigestionEvent) {
        self.listeners.read().await.emit(&event);
    }
}
