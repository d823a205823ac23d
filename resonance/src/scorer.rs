//! Five-axis resonance scoring.
//!
//! Every sub-score is a fixed, explainable heuristic in 0..=100:
//!
//! | axis | heuristic |
//! |---|---|
//! | internal coherence | length, punctuation, source presence, attribution |
//! | external coherence | share of verified sources |
//! | source diversity | distinct sources, 20 points each |
//! | methodology transparency | base 30, +70 when disclosed |
//! | author reliability | caller history, else 50 for a named author, 30 if anonymous |

use std::collections::HashSet;

use codex::compute_hash;
use codex::text::{sentence_count, word_count, PhraseIndex};
use codex::SourceRef;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::intention::{detect_intention, IntentionTag};

/// Phrases that attribute a claim to someone.
const ATTRIBUTION_MARKERS: &[&str] = &[
    "selon",
    "d'après",
    "a déclaré",
    "a affirmé",
    "a indiqué",
    "rapporte",
    "étude",
    "according to",
    "said",
    "stated",
    "reported",
    "study",
];

const METHODOLOGY_BASE: u8 = 30;
const METHODOLOGY_BONUS: u8 = 70;
const NAMED_AUTHOR_PRIOR: u8 = 50;
const ANONYMOUS_AUTHOR_PRIOR: u8 = 30;
const POINTS_PER_SOURCE: usize = 20;

/// Weights of the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub internal: f64,
    pub external: f64,
    pub diversity: f64,
    pub transparency: f64,
    pub author: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            internal: 0.20,
            external: 0.25,
            diversity: 0.20,
            transparency: 0.15,
            author: 0.20,
        }
    }
}

/// Quality assessment of one content unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityScore {
    pub content_id: String,
    pub coherence_internal: u8,
    pub coherence_external: u8,
    pub source_diversity: u8,
    pub methodology_transparency: u8,
    pub author_reliability: u8,
    pub intention_tag: IntentionTag,
    /// Weighted sum of the five axes, rounded
    pub composite_score: u8,
}

/// Inputs to a resonance analysis.
#[derive(Debug, Clone, Default)]
pub struct ResonanceRequest<'a> {
    /// Identifier to attach to the score; defaults to a hash of the text
    pub content_id: Option<&'a str>,
    pub text: &'a str,
    pub author_id: Option<&'a str>,
    pub sources: &'a [SourceRef],
    pub methodology_disclosed: bool,
    /// Caller-supplied author reliability prior
    pub author_history_score: Option<f64>,
}

/// Scorer with configurable composite weights.
#[derive(Debug, Clone, Default)]
pub struct ResonanceScorer {
    weights: ScoreWeights,
}

impl ResonanceScorer {
    /// Create a scorer with the default weights.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom weights.
    pub fn with_weights(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    /// Score a content unit.
    pub fn analyze(&self, request: &ResonanceRequest<'_>) -> QualityScore {
        let internal = coherence_internal(request.text, request.sources);
        let external = coherence_external(request.sources);
        let diversity = source_diversity(request.sources);
        let transparency = if request.methodology_disclosed {
            METHODOLOGY_BASE + METHODOLOGY_BONUS
        } else {
            METHODOLOGY_BASE
        };
        let author = author_reliability(request.author_id, request.author_history_score);

        let w = &self.weights;
        let weighted = w.internal * internal as f64
            + w.external * external as f64
            + w.diversity * diversity as f64
            + w.transparency * transparency as f64
            + w.author * author as f64;
        let composite = weighted.round().clamp(0.0, 100.0) as u8;

        let content_id = match request.content_id {
            Some(id) => id.to_string(),
            None => compute_hash(request.text.as_bytes()),
        };

        debug!(
            content_id = %content_id,
            internal, external, diversity, transparency, author, composite,
            "Resonance analyzed"
        );

        QualityScore {
            content_id,
            coherence_internal: internal,
            coherence_external: external,
            source_diversity: diversity,
            methodology_transparency: transparency,
            author_reliability: author,
            intention_tag: detect_intention(request.text),
            composite_score: composite,
        }
    }
}

/// Score a text with the default weights.
pub fn analyze_resonance(
    text: &str,
    author_id: Option<&str>,
    sources: Option<&[SourceRef]>,
    methodology_disclosed: Option<bool>,
    author_history_score: Option<f64>,
) -> QualityScore {
    ResonanceScorer::new().analyze(&ResonanceRequest {
        content_id: None,
        text,
        author_id,
        sources: sources.unwrap_or_default(),
        methodology_disclosed: methodology_disclosed.unwrap_or(false),
        author_history_score,
    })
}

fn coherence_internal(text: &str, sources: &[SourceRef]) -> u8 {
    let words = word_count(text);
    let mut score: i32 = match words {
        80.. => 30,
        30..=79 => 20,
        10..=29 => 10,
        _ => 0,
    };

    score += match sentence_count(text) {
        0 => 0,
        1 => 10,
        _ => 20,
    };

    // Shouting and stacked punctuation
    if text.contains("!!") || text.contains("?!") {
        score -= 10;
    }
    let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() >= 20 {
        let upper = letters.iter().filter(|c| c.is_uppercase()).count();
        if upper as f64 / letters.len() as f64 > 0.3 {
            score -= 15;
        }
    }

    if !sources.is_empty() {
        score += 25;
    }
    if !PhraseIndex::new(text).matching(ATTRIBUTION_MARKERS).is_empty() {
        score += 25;
    }

    score.clamp(0, 100) as u8
}

fn coherence_external(sources: &[SourceRef]) -> u8 {
    if sources.is_empty() {
        return 0;
    }
    let verified = sources.iter().filter(|s| s.verified).count();
    (verified as f64 * 100.0 / sources.len() as f64).round() as u8
}

/// Host part of a URL, or the whole reference for citations.
fn source_key(reference: &str) -> String {
    let lower = reference.trim().to_lowercase();
    let without_scheme = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower);
    without_scheme
        .split('/')
        .next()
        .unwrap_or(without_scheme)
        .trim_start_matches("www.")
        .to_string()
}

fn source_diversity(sources: &[SourceRef]) -> u8 {
    let distinct: HashSet<String> = sources
        .iter()
        .map(|s| source_key(&s.reference))
        .filter(|k| !k.is_empty())
        .collect();
    (distinct.len() * POINTS_PER_SOURCE).min(100) as u8
}

fn author_reliability(author_id: Option<&str>, history: Option<f64>) -> u8 {
    match (history, author_id) {
        (Some(score), _) if score.is_finite() => score.round().clamp(0.0, 100.0) as u8,
        (_, Some(id)) if !id.trim().is_empty() => NAMED_AUTHOR_PRIOR,
        _ => ANONYMOUS_AUTHOR_PRIOR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources() -> Vec<SourceRef> {
        vec![
            SourceRef::new("https://www.insee.fr/rapport", true),
            SourceRef::new("https://who.int/data", true),
            SourceRef::new("http://blog.example.com/post", false),
        ]
    }

    #[test]
    fn test_empty_input_is_bounded() {
        let score = analyze_resonance("", None, None, None, None);
        assert!(score.composite_score <= 100);
        assert_eq!(score.coherence_internal, 0);
        assert_eq!(score.coherence_external, 0);
        assert_eq!(score.source_diversity, 0);
        assert_eq!(score.methodology_transparency, 30);
        assert_eq!(score.author_reliability, 30);
        // 0.15 * 30 + 0.20 * 30 = 10.5
        assert_eq!(score.composite_score, 11);
    }

    #[test]
    fn test_adversarial_history_is_clamped() {
        let score = analyze_resonance("x", Some("a"), None, Some(true), Some(1e9));
        assert_eq!(score.author_reliability, 100);
        let score = analyze_resonance("x", Some("a"), None, Some(true), Some(f64::NAN));
        assert_eq!(score.author_reliability, 50);
        let score = analyze_resonance("x", None, None, None, Some(-40.0));
        assert_eq!(score.author_reliability, 0);
    }

    #[test]
    fn test_well_sourced_text_scores_high() {
        let text = "Selon le rapport annuel, la consommation d'eau a baissé de 12 % en dix ans. \
                    Les auteurs décrivent leur méthode de mesure et publient les données brutes. \
                    Plusieurs organismes indépendants confirment cette tendance.";
        let sources = sources();
        let score = analyze_resonance(text, Some("author-1"), Some(&sources), Some(true), None);

        assert_eq!(score.coherence_external, 67);
        assert_eq!(score.source_diversity, 60);
        assert_eq!(score.methodology_transparency, 100);
        assert_eq!(score.intention_tag, IntentionTag::Informative);
        assert!(score.composite_score >= 60, "composite {}", score.composite_score);
    }

    #[test]
    fn test_source_diversity_counts_hosts() {
        let same_host = vec![
            SourceRef::new("https://example.org/a", true),
            SourceRef::new("https://www.example.org/b", true),
        ];
        assert_eq!(source_diversity(&same_host), 20);
    }

    #[test]
    fn test_shouting_is_penalized() {
        let calm = coherence_internal("Le conseil municipal a voté le budget. Il sera publié demain.", &[]);
        let loud = coherence_internal("LE CONSEIL MUNICIPAL A VOTE LE BUDGET!! IL SERA PUBLIE DEMAIN!!", &[]);
        assert!(loud < calm);
    }

    #[test]
    fn test_explicit_content_id() {
        let scorer = ResonanceScorer::new();
        let score = scorer.analyze(&ResonanceRequest {
            content_id: Some("parsed-7"),
            text: "Texte court.",
            ..Default::default()
        });
        assert_eq!(score.content_id, "parsed-7");
    }
}
