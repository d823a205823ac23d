//! Text normalization shared by the parser, the scorer and the detector.
//!
//! Matching is done on folded text: lowercase, diacritics removed, words
//! separated by single spaces.

/// French and English function words ignored by keyword extraction.
pub const STOPWORDS: &[&str] = &[
    // French
    "le", "la", "les", "un", "une", "des", "du", "de", "et", "ou", "mais", "donc", "car", "ni",
    "que", "qui", "quoi", "dont", "ce", "cet", "cette", "ces", "son", "sa", "ses", "leur",
    "leurs", "mon", "ma", "mes", "ton", "ta", "tes", "nous", "vous", "ils", "elles", "il",
    "elle", "on", "je", "tu", "est", "sont", "etait", "etre", "avoir", "ont", "avait", "pour",
    "par", "sur", "dans", "avec", "sans", "sous", "entre", "vers", "chez", "plus", "moins",
    "tres", "aussi", "comme", "tout", "tous", "toute", "toutes", "pas", "ne", "se", "en", "au",
    "aux", "ete", "fait", "peut", "selon", "lors", "alors", "ainsi", "cela", "ceci",
    // English
    "the", "a", "an", "and", "or", "but", "of", "to", "in", "on", "at", "for", "with", "by",
    "from", "is", "are", "was", "were", "be", "been", "being", "this", "that", "these",
    "those", "it", "its", "as", "not", "no", "have", "has", "had", "do", "does", "did", "will",
    "would", "can", "could", "should", "may", "might", "must", "they", "them", "their", "we",
    "our", "you", "your", "he", "she", "his", "her", "which", "who", "what", "when", "where",
    "how", "than", "then", "there", "here", "also", "into", "about", "more", "most", "such",
    "only", "other", "some", "any", "all", "each", "very", "just", "over", "after", "before",
];

/// Words that are distinctive for French text.
const FRENCH_MARKERS: &[&str] = &[
    "le", "la", "les", "des", "est", "une", "et", "du", "dans", "pour", "que", "qui", "sur",
    "avec", "pas", "sont", "nous", "vous", "selon",
];

/// Words that are distinctive for English text.
const ENGLISH_MARKERS: &[&str] = &[
    "the", "and", "is", "are", "of", "to", "in", "that", "with", "for", "this", "was", "were",
    "have", "from", "according",
];

/// Remove diacritics from a single lowercase character.
fn fold_char(c: char, out: &mut String) {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => out.push('a'),
        'ç' => out.push('c'),
        'è' | 'é' | 'ê' | 'ë' => out.push('e'),
        'ì' | 'í' | 'î' | 'ï' => out.push('i'),
        'ñ' => out.push('n'),
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => out.push('o'),
        'ù' | 'ú' | 'û' | 'ü' => out.push('u'),
        'ý' | 'ÿ' => out.push('y'),
        'œ' => out.push_str("oe"),
        'æ' => out.push_str("ae"),
        'ß' => out.push_str("ss"),
        '\u{2019}' | '\u{2018}' => out.push('\''),
        _ => out.push(c),
    }
}

/// Lowercase and strip diacritics.
pub fn fold_diacritics(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars().flat_map(char::to_lowercase) {
        fold_char(c, &mut out);
    }
    out
}

/// Folded alphanumeric tokens in order of appearance.
pub fn tokens(text: &str) -> Vec<String> {
    fold_diacritics(text)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whitespace-separated word count of already-stripped text.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Number of sentence terminators, counting runs once.
pub fn sentence_count(text: &str) -> usize {
    let mut count = 0;
    let mut in_run = false;
    for c in text.chars() {
        if matches!(c, '.' | '!' | '?') {
            if !in_run {
                count += 1;
            }
            in_run = true;
        } else {
            in_run = false;
        }
    }
    count
}

/// Whether a folded token is a stopword.
pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

/// Searchable form of a text: folded tokens joined by single spaces, padded.
///
/// Phrases matched against it with [`contains_phrase`] only match on word
/// boundaries.
#[derive(Debug, Clone)]
pub struct PhraseIndex {
    padded: String,
}

impl PhraseIndex {
    /// Index a text.
    pub fn new(text: &str) -> Self {
        Self {
            padded: format!(" {} ", tokens(text).join(" ")),
        }
    }

    /// Whether `phrase` occurs in the text on word boundaries.
    pub fn contains_phrase(&self, phrase: &str) -> bool {
        let needle = format!(" {} ", tokens(phrase).join(" "));
        !needle.trim().is_empty() && self.padded.contains(&needle)
    }

    /// Phrases from `candidates` that occur in the text.
    pub fn matching<'a>(&self, candidates: &[&'a str]) -> Vec<&'a str> {
        candidates
            .iter()
            .copied()
            .filter(|p| self.contains_phrase(p))
            .collect()
    }
}

/// Detect the language of a text, defaulting to French.
pub fn detect_language(text: &str) -> String {
    let mut french = 0usize;
    let mut english = 0usize;
    for token in tokens(text) {
        if FRENCH_MARKERS.contains(&token.as_str()) {
            french += 1;
        }
        if ENGLISH_MARKERS.contains(&token.as_str()) {
            english += 1;
        }
    }

    if english > french {
        "en".to_string()
    } else {
        "fr".to_string()
    }
}
