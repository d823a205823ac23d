//! Cross-dimension derivation rules.
//!
//! Any payload of a record can be rebuilt from the other two:
//!
//! - classification tier ← narrative text (scoring function)
//! - narrative ← structural values + classification tier (tone)
//! - structural ← narrative + classification (data type from tone)
//!
//! The translator builds records with these same rules, so rebuilding the
//! classification or narrative payload reproduces the original exactly.
//! Structural reconstruction keeps only what the narrative still carries.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::text::{sentence_count, tokens};
use crate::types::{
    ClassificationPayload, EmotionalTone, NarrativePayload, ParsedContent, StructuralPayload,
};

/// Schema version written into structural payloads.
pub const SCHEMA_VERSION: &str = "1.0";

/// Maximum body excerpt carried in a narrative.
const NARRATIVE_EXCERPT_CHARS: usize = 600;

/// Keywords turned into guide steps.
const GUIDE_KEYWORDS: usize = 3;

/// Deterministic quality tier (1-9) of a text.
///
/// One point each for reaching 20, 60, 150 and 400 words, for a lexical
/// diversity of 0.5 and 0.7, for an average word length of 5 characters,
/// and for at least three sentences.
pub fn score_tier_from_text(text: &str) -> u8 {
    let words = tokens(text);
    if words.is_empty() {
        return 1;
    }

    let count = words.len();
    let unique: HashSet<&str> = words.iter().map(String::as_str).collect();
    let diversity = unique.len() as f64 / count as f64;
    let avg_len = words.iter().map(|w| w.chars().count()).sum::<usize>() as f64 / count as f64;

    let mut points = 0u8;
    for threshold in [20, 60, 150, 400] {
        if count >= threshold {
            points += 1;
        }
    }
    if diversity >= 0.5 {
        points += 1;
    }
    if diversity >= 0.7 {
        points += 1;
    }
    if avg_len >= 5.0 {
        points += 1;
    }
    if sentence_count(text) >= 3 {
        points += 1;
    }

    (1 + points).min(9)
}

/// Tone carried by a tier.
pub fn tone_from_tier(tier: u8) -> EmotionalTone {
    match tier {
        0..=2 => EmotionalTone::Cautionary,
        3..=4 => EmotionalTone::Neutral,
        5..=6 => EmotionalTone::Curious,
        7..=8 => EmotionalTone::Hopeful,
        _ => EmotionalTone::Inspired,
    }
}

/// Structural data type implied by a tone.
pub fn data_type_from_tone(tone: EmotionalTone) -> &'static str {
    match tone {
        EmotionalTone::Cautionary => "alert",
        EmotionalTone::Neutral => "fact",
        EmotionalTone::Curious => "exploration",
        EmotionalTone::Hopeful => "insight",
        EmotionalTone::Inspired => "wisdom",
    }
}

/// Structural values for a parsed content unit.
pub fn structural_values(parsed: &ParsedContent) -> BTreeMap<String, Value> {
    let mut values = BTreeMap::new();
    values.insert("title".to_string(), json!(parsed.title));
    values.insert("body".to_string(), json!(parsed.body));
    values.insert("keywords".to_string(), json!(parsed.keywords));
    values.insert("word_count".to_string(), json!(parsed.word_count));
    values.insert("language".to_string(), json!(parsed.language));
    values.insert("author".to_string(), json!(parsed.author));
    values.insert(
        "published_at".to_string(),
        json!(parsed.published_at.map(|d| d.to_rfc3339())),
    );
    values.insert("source_count".to_string(), json!(parsed.source_refs.len()));
    values.insert("parsed_content_id".to_string(), json!(parsed.id));
    values
}

fn value_str<'a>(values: &'a BTreeMap<String, Value>, key: &str) -> &'a str {
    values.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn value_keywords(values: &BTreeMap<String, Value>) -> Vec<String> {
    values
        .get("keywords")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Cut `text` to at most `max` characters, preferring a word boundary.
fn excerpt(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    match cut.rfind(char::is_whitespace) {
        Some(idx) if idx > 0 => format!("{}…", cut[..idx].trim_end()),
        _ => format!("{}…", cut),
    }
}

/// Narrative text composed from structural values.
pub fn narrative_text(values: &BTreeMap<String, Value>) -> String {
    let title = value_str(values, "title").trim();
    let body = excerpt(value_str(values, "body").trim(), NARRATIVE_EXCERPT_CHARS);

    if title.is_empty() && body.is_empty() {
        // Reconstructed structural payloads only carry a summary.
        value_str(values, "summary").trim().to_string()
    } else if title.is_empty() || title == "untitled" {
        body
    } else if body.is_empty() {
        title.to_string()
    } else {
        format!("{}. {}", title.trim_end_matches('.'), body)
    }
}

/// Rebuild the narrative payload from structural values and a tier.
pub fn narrative_from_structural(values: &BTreeMap<String, Value>, tier: u8) -> NarrativePayload {
    let language = match value_str(values, "language") {
        "" => "fr".to_string(),
        lang => lang.to_string(),
    };
    let english = language == "en";
    let keywords = value_keywords(values);

    let explanation = if keywords.is_empty() {
        if english {
            "No dominant theme identified.".to_string()
        } else {
            "Aucun thème dominant identifié.".to_string()
        }
    } else {
        let themes = keywords.iter().take(5).cloned().collect::<Vec<_>>().join(", ");
        if english {
            format!("Central themes: {}.", themes)
        } else {
            format!("Thèmes centraux : {}.", themes)
        }
    };

    let mut guide_steps: Vec<String> = keywords
        .iter()
        .take(GUIDE_KEYWORDS)
        .map(|k| {
            if english {
                format!("Explore \"{}\"", k)
            } else {
                format!("Approfondir « {} »", k)
            }
        })
        .collect();

    let source_count = values
        .get("source_count")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    if source_count > 0 {
        guide_steps.push(if english {
            "Check the cited sources".to_string()
        } else {
            "Vérifier les sources citées".to_string()
        });
    }

    NarrativePayload {
        narrative: narrative_text(values),
        explanation,
        guide_steps,
        emotional_tone: tone_from_tier(tier),
        language,
    }
}

/// Rebuild the classification payload from a narrative.
pub fn classification_from_narrative(narrative: &NarrativePayload) -> ClassificationPayload {
    ClassificationPayload::from_tier(score_tier_from_text(&narrative.narrative))
}

/// Rebuild a structural payload from the narrative and classification.
pub fn structural_from(
    narrative: &NarrativePayload,
    classification: &ClassificationPayload,
    timestamp: DateTime<Utc>,
) -> StructuralPayload {
    let mut values = BTreeMap::new();
    values.insert("summary".to_string(), json!(narrative.narrative));
    values.insert("language".to_string(), json!(narrative.language));
    values.insert("score_tier".to_string(), json!(classification.score_tier));
    values.insert("reconstructed".to_string(), json!(true));

    StructuralPayload {
        schema_version: SCHEMA_VERSION.to_string(),
        data_type: data_type_from_tone(narrative.emotional_tone).to_string(),
        values,
        timestamp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_is_lowest_tier() {
        assert_eq!(score_tier_from_text(""), 1);
    }

    #[test]
    fn test_rich_text_scores_higher() {
        let short = "Short note.";
        let rich = "Les chercheurs ont publié une analyse détaillée des écosystèmes marins. \
                    Leurs observations couvrent plusieurs décennies de mesures rigoureuses. \
                    Ils proposent ensuite des recommandations concrètes pour la protection côtière.";
        assert!(score_tier_from_text(rich) > score_tier_from_text(short));
    }

    #[test]
    fn test_tone_and_data_type_chain() {
        assert_eq!(tone_from_tier(1), EmotionalTone::Cautionary);
        assert_eq!(tone_from_tier(9), EmotionalTone::Inspired);
        assert_eq!(data_type_from_tone(tone_from_tier(5)), "exploration");
    }

    #[test]
    fn test_excerpt_cuts_on_word_boundary() {
        let text = "alpha beta gamma delta";
        assert_eq!(excerpt(text, 12), "alpha beta…");
        assert_eq!(excerpt(text, 100), text);
    }

    #[test]
    fn test_narrative_text_skips_untitled() {
        let mut values = BTreeMap::new();
        values.insert("title".to_string(), json!("untitled"));
        values.insert("body".to_string(), json!("Corps du texte"));
        assert_eq!(narrative_text(&values), "Corps du texte");

        values.insert("title".to_string(), json!("Titre"));
        assert_eq!(narrative_text(&values), "Titre. Corps du texte");
    }
}
