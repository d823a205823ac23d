//! Intention detection from marker-word families.
//!
//! A family classifies a text only when at least two of its markers are
//! present. Families are checked in priority order and the first one that
//! qualifies wins; a text no family claims is informative.

use std::fmt;

use codex::text::PhraseIndex;
use serde::{Deserialize, Serialize};

/// Minimum distinct markers a family needs to classify a text.
pub const MIN_MARKER_MATCHES: usize = 2;

/// Intent behind a piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentionTag {
    Informative,
    Persuasive,
    Manipulative,
    Commercial,
    Divisive,
}

impl IntentionTag {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Informative => "INFORMATIVE",
            Self::Persuasive => "PERSUASIVE",
            Self::Manipulative => "MANIPULATIVE",
            Self::Commercial => "COMMERCIAL",
            Self::Divisive => "DIVISIVE",
        }
    }

    /// French label used in user-facing rejection reasons.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Informative => "INFORMATIF",
            Self::Persuasive => "PERSUASIF",
            Self::Manipulative => "MANIPULATIF",
            Self::Commercial => "COMMERCIAL",
            Self::Divisive => "DIVISIF",
        }
    }

    /// Whether content with this intent must never be admitted.
    pub fn is_hostile(&self) -> bool {
        matches!(self, Self::Manipulative | Self::Divisive)
    }
}

impl fmt::Display for IntentionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Marker families in priority order.
pub const INTENTION_MARKERS: &[(IntentionTag, &[&str])] = &[
    (
        IntentionTag::Divisive,
        &[
            "eux contre nous",
            "ennemis du peuple",
            "traîtres",
            "ces gens-là",
            "invasion",
            "grand remplacement",
            "us versus them",
            "us vs them",
            "enemies of the people",
            "traitors",
            "those people",
            "destroy them",
        ],
    ),
    (
        IntentionTag::Manipulative,
        &[
            "dernière chance",
            "agissez maintenant",
            "ils ne veulent pas que vous sachiez",
            "la vérité cachée",
            "choquant",
            "avant qu'il ne soit trop tard",
            "on vous ment",
            "last chance",
            "act now",
            "they don't want you to know",
            "shocking truth",
            "before it's too late",
            "wake up",
        ],
    ),
    (
        IntentionTag::Commercial,
        &[
            "achetez",
            "code promo",
            "réduction",
            "soldes",
            "offre spéciale",
            "livraison gratuite",
            "prix imbattable",
            "buy now",
            "discount",
            "limited offer",
            "free shipping",
            "best price",
            "order today",
        ],
    ),
    (
        IntentionTag::Persuasive,
        &[
            "il faut absolument",
            "nous devons",
            "vous devez",
            "sans aucun doute",
            "il est évident",
            "tout le monde sait",
            "you must",
            "we must",
            "without a doubt",
            "obviously",
            "everyone knows",
            "clearly",
        ],
    ),
];

/// Classify the intent of a text.
pub fn detect_intention(text: &str) -> IntentionTag {
    let index = PhraseIndex::new(text);
    INTENTION_MARKERS
        .iter()
        .find(|(_, markers)| index.matching(markers).len() >= MIN_MARKER_MATCHES)
        .map(|(tag, _)| *tag)
        .unwrap_or(IntentionTag::Informative)
}

/// Markers of every family found in a text, in priority order.
pub fn intention_evidence(text: &str) -> Vec<(IntentionTag, Vec<&'static str>)> {
    let index = PhraseIndex::new(text);
    INTENTION_MARKERS
        .iter()
        .map(|(tag, markers)| (*tag, index.matching(markers)))
        .filter(|(_, found)| !found.is_empty())
        .collect()
}
