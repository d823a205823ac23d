//! Category and layer routing of absorbed content.
//!
//! Categories come from keyword overlap with a fixed lexicon. Lexicon
//! terms are stored folded (lowercase, no diacritics) to match the
//! parser's keywords.

use codex::{Category, StorageLayer};
use resonance::QualityScore;

use crate::config::RoutingConfig;

/// Category lexicon in routing order; the first category wins ties.
pub const CATEGORY_LEXICON: &[(Category, &[&str])] = &[
    (
        Category::Science,
        &[
            "science", "scientifique", "scientifiques", "recherche", "chercheurs", "etude",
            "physique", "chimie", "biologie", "astronomie", "laboratoire", "experience",
            "research", "researchers", "scientist", "scientists", "study", "physics",
            "chemistry", "biology", "laboratory", "experiment",
        ],
    ),
    (
        Category::Technology,
        &[
            "technologie", "numerique", "logiciel", "algorithme", "intelligence",
            "artificielle", "internet", "informatique", "robot", "donnees", "technology",
            "software", "digital", "algorithm", "computer", "data", "cyber", "network",
        ],
    ),
    (
        Category::Health,
        &[
            "sante", "medecin", "medecins", "maladie", "maladies", "hopital", "vaccin",
            "patients", "soins", "epidemie", "health", "medical", "disease", "hospital",
            "vaccine", "doctor", "doctors", "virus",
        ],
    ),
    (
        Category::Environment,
        &[
            "environnement", "climat", "climatique", "biodiversite", "pollution", "eau",
            "foret", "energie", "carbone", "ecologie", "especes", "humides", "rivieres",
            "environment", "climate", "biodiversity", "water", "forest", "energy", "carbon",
            "emissions", "species", "wetlands", "rivers",
        ],
    ),
    (
        Category::Economy,
        &[
            "economie", "economique", "marche", "emploi", "inflation", "entreprise",
            "entreprises", "croissance", "finance", "commerce", "prix", "economy", "market",
            "jobs", "employment", "business", "growth", "trade", "prices",
        ],
    ),
    (
        Category::Governance,
        &[
            "gouvernement", "loi", "parlement", "election", "elections", "politique",
            "democratie", "vote", "conseil", "municipal", "ministre", "budget",
            "government", "law", "parliament", "policy", "democracy", "council", "minister",
        ],
    ),
    (
        Category::Culture,
        &[
            "culture", "culturel", "art", "musique", "cinema", "litterature", "patrimoine",
            "musee", "festival", "theatre", "music", "film", "literature", "heritage",
            "museum",
        ],
    ),
    (
        Category::Education,
        &[
            "education", "ecole", "ecoles", "enseignement", "eleves", "universite",
            "etudiants", "formation", "enseignants", "school", "schools", "teaching",
            "students", "university", "teachers", "learning",
        ],
    ),
    (
        Category::Society,
        &[
            "societe", "social", "sociale", "famille", "familles", "communaute", "logement",
            "solidarite", "society", "community", "family", "housing",
        ],
    ),
];

/// Routes absorbed content to a category and a storage layer.
#[derive(Debug, Clone, Default)]
pub struct Router {
    config: RoutingConfig,
}

impl Router {
    pub fn new(config: RoutingConfig) -> Self {
        Self { config }
    }

    /// Category with the largest keyword overlap.
    ///
    /// Falls back to [`Category::Society`] when nothing matches.
    pub fn category(&self, keywords: &[String]) -> Category {
        let mut best = (Category::Society, 0usize);
        for (category, terms) in CATEGORY_LEXICON {
            let overlap = keywords
                .iter()
                .filter(|k| terms.contains(&k.as_str()))
                .count();
            if overlap > best.1 {
                best = (*category, overlap);
            }
        }
        best.0
    }

    /// Storage layer for a quality score.
    pub fn layer(&self, quality: &QualityScore) -> StorageLayer {
        if quality.composite_score >= self.config.verified_composite
            && quality.coherence_external >= self.config.verified_external
        {
            StorageLayer::VerifiedEvents
        } else if quality.composite_score >= self.config.narrative_composite {
            StorageLayer::Narratives
        } else {
            StorageLayer::Patterns
        }
    }

    /// Category and layer together.
    pub fn route(&self, keywords: &[String], quality: &QualityScore) -> (Category, StorageLayer) {
        (self.category(keywords), self.layer(quality))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resonance::IntentionTag;

    fn keywords(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn quality(composite: u8, external: u8) -> QualityScore {
        QualityScore {
            content_id: "c".to_string(),
            coherence_internal: 50,
            coherence_external: external,
            source_diversity: 50,
            methodology_transparency: 30,
            author_reliability: 30,
            intention_tag: IntentionTag::Informative,
            composite_score: composite,
        }
    }

    #[test]
    fn test_lexicon_terms_are_folded() {
        for (_, terms) in CATEGORY_LEXICON {
            for term in *terms {
                assert_eq!(codex::text::fold_diacritics(term), *term);
            }
        }
    }

    #[test]
    fn test_category_by_overlap() {
        let router = Router::default();
        assert_eq!(
            router.category(&keywords(&["vaccin", "hopital", "budget"])),
            Category::Health
        );
        assert_eq!(
            router.category(&keywords(&["climat", "eau", "ecole"])),
            Category::Environment
        );
    }

    #[test]
    fn test_ties_go_to_first_category() {
        let router = Router::default();
        assert_eq!(
            router.category(&keywords(&["logiciel", "recherche"])),
            Category::Science
        );
    }

    #[test]
    fn test_no_match_defaults_to_society() {
        assert_eq!(Router::default().category(&keywords(&["zzz"])), Category::Society);
        assert_eq!(Router::default().category(&[]), Category::Society);
    }

    #[test]
    fn test_layers() {
        let router = Router::default();
        assert_eq!(router.layer(&quality(80, 90)), StorageLayer::VerifiedEvents);
        assert_eq!(router.layer(&quality(80, 50)), StorageLayer::Narratives);
        assert_eq!(router.layer(&quality(55, 0)), StorageLayer::Narratives);
        assert_eq!(router.layer(&quality(45, 100)), StorageLayer::Patterns);
    }
}
