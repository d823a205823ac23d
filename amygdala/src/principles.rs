//! Immutable principles every record and action is held to.
//!
//! The violation markers attached to each principle are advisory: they
//! catch the obvious phrasings, not every possible breach.

use codex::text::PhraseIndex;

/// A principle no governance action may override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principle {
    /// Unique identifier
    pub id: &'static str,
    /// Human-readable name
    pub name: &'static str,
    /// The principle statement
    pub statement: &'static str,
    /// Phrases that suggest a breach
    pub violation_markers: &'static [&'static str],
}

/// The fixed list of immutable principles.
pub const IMMUTABLE_PRINCIPLES: &[Principle] = &[
    Principle {
        id: "dignity",
        name: "Human Dignity",
        statement: "Every person keeps an inherent dignity that no action may trade away.",
        violation_markers: &[
            "humilier",
            "déshumaniser",
            "esclavage",
            "humiliate",
            "dehumanize",
            "slavery",
        ],
    },
    Principle {
        id: "agency",
        name: "Preserved Agency",
        statement: "No system may be built to permanently capture human agency or create inescapable dependency.",
        violation_markers: &[
            "dépendance permanente",
            "capturer les utilisateurs",
            "permanent dependency",
            "capture users",
            "no way out",
        ],
    },
    Principle {
        id: "consent",
        name: "Meaningful Consent",
        statement: "Consent requires understanding, voluntary choice and a real ability to refuse.",
        violation_markers: &[
            "sans consentement",
            "non consenti",
            "without consent",
            "without their knowledge",
        ],
    },
    Principle {
        id: "child-protection",
        name: "Child Protection",
        statement: "The developmental vulnerability of children must never be exploited.",
        violation_markers: &[
            "cibler les enfants",
            "exploiter les mineurs",
            "target children",
            "exploit minors",
        ],
    },
    Principle {
        id: "truthfulness",
        name: "Truthful Records",
        statement: "Knowledge records are never falsified or concealed.",
        violation_markers: &[
            "falsifier",
            "dissimuler les preuves",
            "falsify",
            "cover up",
            "tamper with records",
        ],
    },
    Principle {
        id: "non-violence",
        name: "Non-violence",
        statement: "No action may incite violence against people or groups.",
        violation_markers: &[
            "inciter à la violence",
            "génocide",
            "incite violence",
            "genocide",
        ],
    },
];

/// A principle a text appears to breach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipleViolation {
    pub principle: &'static Principle,
    /// Markers that matched
    pub markers: Vec<&'static str>,
}

/// Principles a text appears to breach.
pub fn check_principles(text: &str) -> Vec<PrincipleViolation> {
    let index = PhraseIndex::new(text);
    IMMUTABLE_PRINCIPLES
        .iter()
        .filter_map(|principle| {
            let markers = index.matching(principle.violation_markers);
            (!markers.is_empty()).then_some(PrincipleViolation { principle, markers })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_principle_ids_are_unique() {
        let mut ids: Vec<_> = IMMUTABLE_PRINCIPLES.iter().map(|p| p.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), IMMUTABLE_PRINCIPLES.len());
    }

    #[test]
    fn test_detects_violation() {
        let violations = check_principles("Collect location data without consent and target children.");
        let ids: Vec<_> = violations.iter().map(|v| v.principle.id).collect();
        assert_eq!(ids, vec!["consent", "child-protection"]);
    }

    #[test]
    fn test_clean_text() {
        assert!(check_principles("Publish the annual budget and open it to comments.").is_empty());
    }
}
