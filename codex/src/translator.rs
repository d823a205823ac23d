//! Translation of parsed content into tri-dimensional records.
//!
//! [`Translator`] is the narrow contract the ingestion pipeline depends on;
//! [`KnowledgeTranslator`] is the deterministic implementation shipped with
//! the workspace.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::derive::{
    data_type_from_tone, narrative_from_structural, narrative_text, score_tier_from_text,
    structural_values, SCHEMA_VERSION,
};
use crate::text::{detect_language, word_count};
use crate::types::{
    ClassificationPayload, ParsedContent, SourceRef, StructuralPayload, TriDimensionalRecord,
};

/// Template every translator must register before first use.
pub const KNOWLEDGE_TEMPLATE: &str = "knowledge";

/// Error types for translation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranslationError {
    /// Template was never registered
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    /// Parsed content cannot be turned into a record
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Backend failure (remote translators)
    #[error("Translator unavailable: {0}")]
    Unavailable(String),
}

/// Converts parsed content into a record.
///
/// Implementations must fail explicitly on malformed input rather than
/// return a partially-filled record.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `parsed` using the named template.
    async fn translate(
        &self,
        template: &str,
        parsed: &ParsedContent,
    ) -> Result<TriDimensionalRecord, TranslationError>;
}

/// Deterministic translator built on the cross-dimension derivation rules.
pub struct KnowledgeTranslator {
    templates: Arc<RwLock<HashSet<String>>>,
}

impl KnowledgeTranslator {
    /// Create a translator with no templates registered.
    pub fn new() -> Self {
        Self {
            templates: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Create a translator with the knowledge template already registered.
    pub fn with_knowledge_template() -> Self {
        let mut templates = HashSet::new();
        templates.insert(KNOWLEDGE_TEMPLATE.to_string());
        Self {
            templates: Arc::new(RwLock::new(templates)),
        }
    }

    /// Register a template name.
    pub async fn register_template(&self, name: &str) {
        let mut templates = self.templates.write().await;
        templates.insert(name.to_string());
    }

    /// Whether a template is registered.
    pub async fn has_template(&self, name: &str) -> bool {
        let templates = self.templates.read().await;
        templates.contains(name)
    }
}

impl Default for KnowledgeTranslator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Translator for KnowledgeTranslator {
    async fn translate(
        &self,
        template: &str,
        parsed: &ParsedContent,
    ) -> Result<TriDimensionalRecord, TranslationError> {
        if !self.has_template(template).await {
            return Err(TranslationError::UnknownTemplate(template.to_string()));
        }
        if parsed.body.trim().is_empty() {
            return Err(TranslationError::MalformedInput(format!(
                "content {} has an empty body",
                parsed.id
            )));
        }
        if parsed.title.trim().is_empty() {
            return Err(TranslationError::MalformedInput(format!(
                "content {} has an empty title",
                parsed.id
            )));
        }

        let values = structural_values(parsed);
        let tier = score_tier_from_text(&narrative_text(&values));
        let classification = ClassificationPayload::from_tier(tier);
        let narrative = narrative_from_structural(&values, tier);
        let structural = StructuralPayload {
            schema_version: SCHEMA_VERSION.to_string(),
            data_type: data_type_from_tone(narrative.emotional_tone).to_string(),
            values,
            timestamp: Utc::now(),
        };

        debug!(
            parsed_id = %parsed.id,
            template = %template,
            tier = tier,
            "Translated content"
        );

        Ok(TriDimensionalRecord::new(
            parsed.id.clone(),
            structural,
            narrative,
            classification,
        ))
    }
}

impl ParsedContent {
    /// Minimal parsed content for a title and plain-text body.
    pub fn new(
        raw_content_id: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        let body = body.into();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            raw_content_id: raw_content_id.into(),
            title: title.into(),
            language: detect_language(&body),
            word_count: word_count(&body),
            body,
            author: None,
            published_at: None,
            source_refs: Vec::new(),
            keywords: Vec::new(),
        }
    }

    /// Builder: set keywords.
    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }

    /// Builder: set cited references.
    pub fn with_sources(mut self, sources: Vec<SourceRef>) -> Self {
        self.source_refs = sources;
        self
    }

    /// Builder: set author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::classification_from_narrative;
    use tokio_test::assert_err;

    fn sample() -> ParsedContent {
        ParsedContent::new(
            "raw-1",
            "Restauration des zones humides",
            "Une étude publiée par l'université décrit la restauration de trois zones humides. \
             Les mesures montrent un retour rapide des espèces locales.",
        )
        .with_keywords(vec!["zones".into(), "humides".into(), "restauration".into()])
        .with_sources(vec![SourceRef::new("https://example.org/etude", true)])
    }

    #[tokio::test]
    async fn test_unregistered_template_fails() {
        let translator = KnowledgeTranslator::new();
        let result = translator.translate(KNOWLEDGE_TEMPLATE, &sample()).await;
        assert_eq!(
            result.unwrap_err(),
            TranslationError::UnknownTemplate("knowledge".to_string())
        );
    }

    #[tokio::test]
    async fn test_translate_produces_intact_record() {
        let translator = KnowledgeTranslator::new();
        translator.register_template(KNOWLEDGE_TEMPLATE).await;

        let record = translator.translate(KNOWLEDGE_TEMPLATE, &sample()).await.unwrap();
        assert!(record.is_intact());
        assert!(record.dimension_hashes.is_none());
        assert_eq!(record.title(), "Restauration des zones humides");
        assert_eq!(record.narrative.guide_steps.len(), 4);
        // The classification is exactly what the narrative implies.
        assert_eq!(classification_from_narrative(&record.narrative), record.classification);
    }

    #[tokio::test]
    async fn test_empty_body_is_malformed() {
        let translator = KnowledgeTranslator::with_knowledge_template();
        let parsed = ParsedContent::new("raw-2", "Titre", "   ");
        assert_err!(translator.translate(KNOWLEDGE_TEMPLATE, &parsed).await);
    }
}
