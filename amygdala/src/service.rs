//! Extraction-versus-service evaluation of actions.
//!
//! An action passes when it meets every criterion of a short checklist.
//! Explicit answers on the [`ActionIntent`] win; unanswered criteria are
//! inferred from extraction cues in the description.

use std::fmt;

use codex::text::PhraseIndex;

use crate::types::ActionIntent;

/// One question of the checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceCriterion {
    ServesFlourishing,
    RespectsAutonomy,
    Transparent,
    CreatesNetValue,
    ConsistentWithPrinciples,
    PubliclyVisible,
}

impl ServiceCriterion {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ServesFlourishing => "serves_flourishing",
            Self::RespectsAutonomy => "respects_autonomy",
            Self::Transparent => "transparent",
            Self::CreatesNetValue => "creates_net_value",
            Self::ConsistentWithPrinciples => "consistent_with_principles",
            Self::PubliclyVisible => "publicly_visible",
        }
    }

    fn declared(&self, action: &ActionIntent) -> Option<bool> {
        match self {
            Self::ServesFlourishing => action.serves_flourishing,
            Self::RespectsAutonomy => action.respects_autonomy,
            Self::Transparent => action.transparent,
            Self::CreatesNetValue => action.creates_net_value,
            Self::ConsistentWithPrinciples => action.consistent_with_principles,
            Self::PubliclyVisible => action.publicly_visible,
        }
    }
}

impl fmt::Display for ServiceCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extraction cues that fail each criterion.
const EXTRACTION_CUES: &[(ServiceCriterion, &[&str])] = &[
    (
        ServiceCriterion::ServesFlourishing,
        &["addiction", "addictive", "addictif", "exploiter", "exploit", "dépendance"],
    ),
    (
        ServiceCriterion::RespectsAutonomy,
        &["forcer", "obligatoire", "sans possibilité de refus", "force users", "mandatory", "no opt-out", "lock-in"],
    ),
    (
        ServiceCriterion::Transparent,
        &["caché", "cachés", "cachée", "opaque", "hidden", "undisclosed", "dark pattern"],
    ),
    (
        ServiceCriterion::CreatesNetValue,
        &["extraire", "maximiser les profits", "rente", "extract value", "maximize profit", "rent seeking"],
    ),
    (
        ServiceCriterion::ConsistentWithPrinciples,
        &["contourner", "ignorer les règles", "bypass", "override the rules", "ignore the rules"],
    ),
    (
        ServiceCriterion::PubliclyVisible,
        &["accord privé", "en coulisses", "confidentiel", "private deal", "behind closed doors", "confidential"],
    ),
];

/// Outcome of a checklist evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceEvaluation {
    /// Criteria the action fails, with the reason
    pub failures: Vec<(ServiceCriterion, String)>,
}

impl ServiceEvaluation {
    /// Whether the action serves rather than extracts.
    pub fn is_service(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Evaluates actions against the checklist.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceEvaluator;

impl ServiceEvaluator {
    /// Evaluate a declared action.
    pub fn evaluate(&self, action: &ActionIntent) -> ServiceEvaluation {
        let index = PhraseIndex::new(&action.description);
        let mut failures = Vec::new();

        for (criterion, cues) in EXTRACTION_CUES {
            match criterion.declared(action) {
                Some(true) => {}
                Some(false) => failures.push((*criterion, "declared as failing".to_string())),
                None => {
                    let found = index.matching(cues);
                    if !found.is_empty() {
                        failures.push((*criterion, format!("cues: {}", found.join(", "))));
                    }
                }
            }
        }

        ServiceEvaluation { failures }
    }

    /// Evaluate free text as an undeclared action.
    pub fn evaluate_text(&self, text: &str) -> ServiceEvaluation {
        self.evaluate(&ActionIntent::described(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_action_passes() {
        let evaluation = ServiceEvaluator.evaluate_text("Open the community garden to every resident.");
        assert!(evaluation.is_service());
    }

    #[test]
    fn test_extraction_cues_fail_criteria() {
        let evaluation = ServiceEvaluator
            .evaluate_text("Add hidden fees and a mandatory subscription to maximize profit.");
        let failed: Vec<_> = evaluation.failures.iter().map(|(c, _)| *c).collect();
        assert_eq!(
            failed,
            vec![
                ServiceCriterion::RespectsAutonomy,
                ServiceCriterion::Transparent,
                ServiceCriterion::CreatesNetValue,
            ]
        );
    }

    #[test]
    fn test_declared_answers_override_cues() {
        let action = ActionIntent {
            description: "Confidential review of hidden costs".to_string(),
            transparent: Some(true),
            publicly_visible: Some(true),
            serves_flourishing: Some(false),
            ..Default::default()
        };
        let evaluation = ServiceEvaluator.evaluate(&action);
        assert_eq!(evaluation.failures.len(), 1);
        assert_eq!(evaluation.failures[0].0, ServiceCriterion::ServesFlourishing);
    }
}
