//! Parsing of raw content into [`ParsedContent`].
//!
//! HTML, JSON and plain text are handled with layered fallbacks:
//!
//! - HTML title: `<title>`, then the first `<h1>`, then `og:title` /
//!   `twitter:title`, then `"untitled"`
//! - HTML body: `<article>`, then `<main>`, then the whole document
//! - JSON that fails to parse is read as plain text
//!
//! Parsing never fails; content too thin to keep is caught by the
//! pipeline's word-count check.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use regex::{Captures, Regex};
use serde_json::Value;

use codex::text::{detect_language, is_stopword, tokens, word_count, PhraseIndex};
use codex::{ParsedContent, RawContent, SourceRef};

use crate::config::ParserConfig;
use crate::types::Result;

/// Title used when none can be found.
pub const UNTITLED: &str = "untitled";

const JSON_TITLE_KEYS: &[&str] = &["title", "headline", "name", "subject"];
const JSON_BODY_KEYS: &[&str] = &["body", "content", "text", "articleBody", "description", "summary"];
const JSON_AUTHOR_KEYS: &[&str] = &["author", "byline", "creator"];
const JSON_DATE_KEYS: &[&str] = &["published_at", "datePublished", "date", "pubDate"];
const JSON_SOURCE_KEYS: &[&str] = &["sources", "references", "citations"];

const TITLE_META: &[&str] = &["og:title", "twitter:title"];
const AUTHOR_META: &[&str] = &["author", "article:author"];
const DATE_META: &[&str] = &["article:published_time", "date", "dc.date"];

/// Phrases showing that a text discloses how its claims were established.
const METHODOLOGY_MARKERS: &[&str] = &[
    "méthodologie",
    "méthode",
    "échantillon",
    "protocole",
    "nous avons mesuré",
    "données brutes",
    "intervalle de confiance",
    "methodology",
    "sample size",
    "protocol",
    "raw data",
    "we measured",
    "confidence interval",
];

/// Named entities decoded in HTML text.
const ENTITIES: &[(&str, &str)] = &[
    ("amp", "&"),
    ("lt", "<"),
    ("gt", ">"),
    ("quot", "\""),
    ("apos", "'"),
    ("nbsp", " "),
    ("eacute", "é"),
    ("egrave", "è"),
    ("ecirc", "ê"),
    ("euml", "ë"),
    ("agrave", "à"),
    ("acirc", "â"),
    ("ccedil", "ç"),
    ("icirc", "î"),
    ("iuml", "ï"),
    ("ocirc", "ô"),
    ("ugrave", "ù"),
    ("ucirc", "û"),
    ("oelig", "œ"),
    ("Eacute", "É"),
    ("Agrave", "À"),
    ("laquo", "«"),
    ("raquo", "»"),
    ("lsquo", "\u{2018}"),
    ("rsquo", "\u{2019}"),
    ("ldquo", "\u{201c}"),
    ("rdquo", "\u{201d}"),
    ("hellip", "…"),
    ("ndash", "–"),
    ("mdash", "—"),
];

/// Whether a text discloses its methodology.
pub fn discloses_methodology(text: &str) -> bool {
    !PhraseIndex::new(text).matching(METHODOLOGY_MARKERS).is_empty()
}

/// Top non-stopword tokens by frequency, ties broken by first appearance.
pub fn extract_keywords(text: &str, max: usize) -> Vec<String> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (position, token) in tokens(text).into_iter().enumerate() {
        if token.chars().count() < 3
            || is_stopword(&token)
            || token.chars().all(|c| c.is_ascii_digit())
        {
            continue;
        }
        counts.entry(token).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|(_, (ca, pa)), (_, (cb, pb))| cb.cmp(ca).then(pa.cmp(pb)));
    ranked.into_iter().take(max).map(|(token, _)| token).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Html,
    Json,
    Text,
}

/// Fields extracted by a format-specific pass.
#[derive(Debug, Default)]
struct Extracted {
    title: Option<String>,
    body: String,
    author: Option<String>,
    published_at: Option<DateTime<Utc>>,
    sources: Vec<SourceRef>,
}

/// Parser for HTML, JSON and plain-text content.
#[derive(Debug, Clone)]
pub struct ContentParser {
    config: ParserConfig,
    title_tag: Regex,
    h1_tag: Regex,
    meta_tag: Regex,
    attribute: Regex,
    article: Regex,
    main: Regex,
    hidden_block: Regex,
    comment: Regex,
    block_tag: Regex,
    any_tag: Regex,
    link: Regex,
    bare_url: Regex,
    entity: Regex,
}

impl ContentParser {
    /// Compile the parser's patterns.
    pub fn new(config: ParserConfig) -> Result<Self> {
        Ok(Self {
            config,
            title_tag: Regex::new(r"(?is)<title[^>]*>(.*?)</title>")?,
            h1_tag: Regex::new(r"(?is)<h1[^>]*>(.*?)</h1>")?,
            meta_tag: Regex::new(r"(?is)<meta\s[^>]*>")?,
            attribute: Regex::new(r#"(?is)([a-z:-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)?,
            article: Regex::new(r"(?is)<article\b[^>]*>(.*?)</article>")?,
            main: Regex::new(r"(?is)<main\b[^>]*>(.*?)</main>")?,
            hidden_block: Regex::new(
                r"(?is)<(?:script|style|noscript|template|head)\b[^>]*>.*?</(?:script|style|noscript|template|head)>",
            )?,
            comment: Regex::new(r"(?s)<!--.*?-->")?,
            block_tag: Regex::new(
                r"(?i)</?(?:p|div|br|h[1-6]|li|ul|ol|tr|td|section|header|footer|blockquote)\b[^>]*>",
            )?,
            any_tag: Regex::new(r"(?s)<[^>]*>")?,
            link: Regex::new(r#"(?is)<a\s[^>]*href\s*=\s*["'](https?://[^"']+)["']"#)?,
            bare_url: Regex::new(r#"https?://[^\s<>"')\]]+"#)?,
            entity: Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);")?,
        })
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse raw content.
    pub fn parse(&self, raw: &RawContent) -> ParsedContent {
        let extracted = match self.detect_format(raw) {
            Format::Html => self.parse_html(&raw.raw_bytes),
            Format::Json => match serde_json::from_str::<Value>(&raw.raw_bytes) {
                Ok(value) => self.parse_json(&value),
                Err(_) => self.parse_text(&raw.raw_bytes),
            },
            Format::Text => self.parse_text(&raw.raw_bytes),
        };

        let title = extracted
            .title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNTITLED.to_string());
        let body = extracted.body;
        let titled = if title == UNTITLED { "" } else { title.as_str() };
        let keywords = extract_keywords(&format!("{} {}", titled, body), self.config.max_keywords);

        ParsedContent {
            id: format!("parsed-{}", raw.id),
            raw_content_id: raw.id.clone(),
            language: detect_language(&format!("{} {}", title, body)),
            word_count: word_count(&body),
            title,
            body,
            author: extracted.author,
            published_at: extracted.published_at,
            source_refs: extracted.sources,
            keywords,
        }
    }

    fn detect_format(&self, raw: &RawContent) -> Format {
        let content_type = raw.content_type.to_ascii_lowercase();
        if content_type.contains("html") || content_type.contains("xml") {
            return Format::Html;
        }
        if content_type.contains("json") {
            return Format::Json;
        }

        let start = raw.raw_bytes.trim_start();
        if content_type.is_empty() || content_type.contains("octet-stream") {
            if start.starts_with('{') || start.starts_with('[') {
                return Format::Json;
            }
            if start.starts_with('<') {
                return Format::Html;
            }
        }
        Format::Text
    }

    fn parse_html(&self, html: &str) -> Extracted {
        let meta = self.meta_map(html);
        let from_meta = |names: &[&str]| {
            names
                .iter()
                .find_map(|name| meta.get(*name))
                .map(|v| self.clean_inline(v))
                .filter(|v| !v.is_empty())
        };

        let title = self
            .first_capture(&self.title_tag, html)
            .or_else(|| self.first_capture(&self.h1_tag, html))
            .or_else(|| from_meta(TITLE_META));

        let container = self
            .article
            .captures(html)
            .or_else(|| self.main.captures(html))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .unwrap_or(html);

        let mut seen = HashSet::new();
        let sources = self
            .link
            .captures_iter(html)
            .filter_map(|c| c.get(1))
            .map(|m| self.decode_entities(m.as_str()))
            .filter(|url| seen.insert(url.clone()))
            .map(|url| {
                let verified = url.starts_with("https://");
                SourceRef::new(url, verified)
            })
            .collect();

        Extracted {
            title,
            body: self.html_to_text(container),
            author: from_meta(AUTHOR_META),
            published_at: from_meta(DATE_META).and_then(|d| parse_date(&d)),
            sources,
        }
    }

    fn parse_json(&self, value: &Value) -> Extracted {
        let Some(object) = value.as_object() else {
            let mut parts = Vec::new();
            collect_strings(value, &mut parts);
            return Extracted {
                body: self.clean_block(&parts.join("\n")),
                ..Default::default()
            };
        };

        let lookup = |keys: &[&str]| keys.iter().find_map(|k| object.get(*k));

        let title = lookup(JSON_TITLE_KEYS)
            .and_then(Value::as_str)
            .map(|t| self.clean_inline(t))
            .filter(|t| !t.is_empty());

        let body = match lookup(JSON_BODY_KEYS).and_then(Value::as_str) {
            Some(body) => self.clean_block(body),
            None => {
                let mut parts = Vec::new();
                for (key, v) in object {
                    if !JSON_TITLE_KEYS.contains(&key.as_str()) {
                        collect_strings(v, &mut parts);
                    }
                }
                self.clean_block(&parts.join("\n"))
            }
        };

        let author = lookup(JSON_AUTHOR_KEYS)
            .and_then(|a| match a {
                Value::String(name) => Some(name.clone()),
                Value::Object(fields) => fields
                    .get("name")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            })
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());

        let published_at = lookup(JSON_DATE_KEYS)
            .and_then(Value::as_str)
            .and_then(parse_date);

        let sources = lookup(JSON_SOURCE_KEYS)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(json_source).collect())
            .unwrap_or_default();

        Extracted {
            title,
            body,
            author,
            published_at,
            sources,
        }
    }

    fn parse_text(&self, text: &str) -> Extracted {
        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
        let first = lines.next();
        let has_more = lines.next().is_some();

        let title = first
            .filter(|line| has_more && line.chars().count() <= self.config.max_title_chars)
            .map(str::to_string);

        let mut seen = HashSet::new();
        let sources = self
            .bare_url
            .find_iter(text)
            .map(|m| m.as_str().trim_end_matches(['.', ',', ';']).to_string())
            .filter(|url| seen.insert(url.clone()))
            .map(|url| {
                let verified = url.starts_with("https://");
                SourceRef::new(url, verified)
            })
            .collect();

        Extracted {
            title,
            body: collapse_whitespace(text),
            sources,
            ..Default::default()
        }
    }

    fn meta_map(&self, html: &str) -> HashMap<String, String> {
        let mut map = HashMap::new();
        for tag in self.meta_tag.find_iter(html) {
            let mut key = None;
            let mut content = None;
            for attr in self.attribute.captures_iter(tag.as_str()) {
                let name = attr[1].to_ascii_lowercase();
                let value = attr
                    .get(2)
                    .or_else(|| attr.get(3))
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default();
                match name.as_str() {
                    "name" | "property" => key = Some(value.to_ascii_lowercase()),
                    "content" => content = Some(value),
                    _ => {}
                }
            }
            if let (Some(key), Some(content)) = (key, content) {
                map.entry(key).or_insert(content);
            }
        }
        map
    }

    fn first_capture(&self, pattern: &Regex, html: &str) -> Option<String> {
        pattern
            .captures(html)
            .and_then(|c| c.get(1))
            .map(|m| self.clean_inline(m.as_str()))
            .filter(|t| !t.is_empty())
    }

    fn html_to_text(&self, html: &str) -> String {
        let text = self.comment.replace_all(html, " ");
        let text = self.hidden_block.replace_all(&text, " ");
        let text = self.block_tag.replace_all(&text, "\n");
        let text = self.any_tag.replace_all(&text, " ");
        collapse_whitespace(&self.decode_entities(&text))
    }

    /// Text that may carry markup, flattened.
    fn clean_block(&self, text: &str) -> String {
        if text.contains('<') {
            self.html_to_text(text)
        } else {
            collapse_whitespace(&self.decode_entities(text))
        }
    }

    fn clean_inline(&self, text: &str) -> String {
        let text = self.any_tag.replace_all(text, " ");
        collapse_whitespace(&self.decode_entities(&text))
    }

    fn decode_entities(&self, text: &str) -> String {
        self.entity
            .replace_all(text, |caps: &Captures| {
                let name = &caps[1];
                let decoded = if let Some(hex) = name
                    .strip_prefix("#x")
                    .or_else(|| name.strip_prefix("#X"))
                {
                    u32::from_str_radix(hex, 16)
                        .ok()
                        .and_then(char::from_u32)
                        .map(String::from)
                } else if let Some(dec) = name.strip_prefix('#') {
                    dec.parse::<u32>()
                        .ok()
                        .and_then(char::from_u32)
                        .map(String::from)
                } else {
                    ENTITIES
                        .iter()
                        .find(|(entity, _)| *entity == name)
                        .map(|(_, ch)| ch.to_string())
                };
                decoded.unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_strings(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(s.clone()),
        Value::Array(items) => items.iter().for_each(|v| collect_strings(v, out)),
        Value::Object(fields) => fields.values().for_each(|v| collect_strings(v, out)),
        _ => {}
    }
}

fn json_source(value: &Value) -> Option<SourceRef> {
    match value {
        Value::String(reference) => {
            let verified = reference.starts_with("https://");
            Some(SourceRef::new(reference.clone(), verified))
        }
        Value::Object(fields) => {
            let reference = ["url", "reference", "href"]
                .iter()
                .find_map(|k| fields.get(*k).and_then(Value::as_str))?;
            let verified = fields
                .get("verified")
                .and_then(Value::as_bool)
                .unwrap_or_else(|| reference.starts_with("https://"));
            Some(SourceRef::new(reference, verified))
        }
        _ => None,
    }
}

fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    DateTime::parse_from_rfc3339(text)
        .map(|d| d.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|d| d.and_utc())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use codex::SourceKind;

    fn parser() -> ContentParser {
        ContentParser::new(ParserConfig::default()).unwrap()
    }

    fn raw(bytes: &str, content_type: &str) -> RawContent {
        RawContent::new(SourceKind::Web, "https://example.org/a", bytes, content_type)
    }

    #[test]
    fn test_html_title_and_article() {
        let html = r#"<html><head><title>Le  budget &amp; la ville</title>
            <meta name="author" content="Claire Martin">
            <meta property="article:published_time" content="2024-03-01T08:00:00Z">
            <script>var x = "ignored words here";</script></head>
            <body><nav>Menu accueil contact</nav>
            <article><h1>Budget</h1><p>Le conseil a voté le budget.</p>
            <p>Voir <a href="https://www.insee.fr/x">l&#39;INSEE</a>.</p></article>
            <footer>Mentions légales</footer></body></html>"#;
        let parsed = parser().parse(&raw(html, "text/html; charset=utf-8"));

        assert_eq!(parsed.title, "Le budget & la ville");
        assert_eq!(parsed.body, "Budget Le conseil a voté le budget. Voir l'INSEE .");
        assert_eq!(parsed.author.as_deref(), Some("Claire Martin"));
        assert!(parsed.published_at.is_some());
        assert_eq!(parsed.source_refs, vec![SourceRef::new("https://www.insee.fr/x", true)]);
        assert!(!parsed.body.contains("ignored"));
        assert!(!parsed.body.contains("Menu"));
    }

    #[test]
    fn test_html_title_fallbacks() {
        let p = parser();
        let h1 = p.parse(&raw("<body><h1>Titre <em>principal</em></h1><p>Texte</p></body>", "text/html"));
        assert_eq!(h1.title, "Titre principal");

        let og = p.parse(&raw(
            r#"<head><meta property="og:title" content="Titre social"></head><p>Texte</p>"#,
            "text/html",
        ));
        assert_eq!(og.title, "Titre social");

        let none = p.parse(&raw("<p>Juste du texte</p>", "text/html"));
        assert_eq!(none.title, UNTITLED);
    }

    #[test]
    fn test_pure_markup_has_no_words() {
        let parsed = parser().parse(&raw("<html><body><div><br/></div></body></html>", "text/html"));
        assert_eq!(parsed.word_count, 0);
        assert!(parsed.body.is_empty());
    }

    #[test]
    fn test_json_fields() {
        let json = r#"{
            "headline": "Water quality report",
            "articleBody": "<p>The study covers <b>five</b> rivers.</p>",
            "author": {"name": "Sam Lee"},
            "datePublished": "2024-05-02",
            "sources": ["https://who.int/report", {"url": "http://blog.example.com", "verified": false}]
        }"#;
        let parsed = parser().parse(&raw(json, "application/json"));
        assert_eq!(parsed.title, "Water quality report");
        assert_eq!(parsed.body, "The study covers five rivers.");
        assert_eq!(parsed.author.as_deref(), Some("Sam Lee"));
        assert_eq!(parsed.source_refs.len(), 2);
        assert!(parsed.source_refs[0].verified);
        assert!(!parsed.source_refs[1].verified);
        assert_eq!(parsed.language, "en");
    }

    #[test]
    fn test_broken_json_falls_back_to_text() {
        let parsed = parser().parse(&raw("{ not json at all", "application/json"));
        assert_eq!(parsed.body, "{ not json at all");
        assert_eq!(parsed.title, UNTITLED);
    }

    #[test]
    fn test_plain_text_title_and_urls() {
        let text = "Rapport annuel\nLes chiffres sont publiés sur https://data.gouv.fr/r1. Voir aussi http://exemple.com.";
        let parsed = parser().parse(&raw(text, "text/plain"));
        assert_eq!(parsed.title, "Rapport annuel");
        assert_eq!(parsed.source_refs.len(), 2);
        assert_eq!(parsed.source_refs[0].reference, "https://data.gouv.fr/r1");
        assert!(!parsed.source_refs[1].verified);
    }

    #[test]
    fn test_title_keywords_skip_only_the_placeholder() {
        let p = parser();
        let untitled = p.parse(&raw("<p>Relevés des oiseaux migrateurs</p>", "text/html"));
        assert!(!untitled.keywords.contains(&UNTITLED.to_string()));

        let html = "<head><title>untitled goose sightings</title></head>\
            <body><article><p>Trois observateurs ont compté les oies sauvages.</p></article></body>";
        let parsed = p.parse(&raw(html, "text/html"));
        assert_eq!(parsed.title, "untitled goose sightings");
        assert!(parsed.keywords.contains(&"untitled".to_string()));
        assert!(parsed.keywords.contains(&"goose".to_string()));
        assert!(parsed.keywords.contains(&"sightings".to_string()));
    }

    #[test]
    fn test_keywords_ranked_and_bounded() {
        let text = "eau eau eau rivière rivière pollution le la les de 2024 analyse";
        let keywords = extract_keywords(text, 3);
        assert_eq!(keywords, vec!["eau", "riviere", "pollution"]);

        let many: String = (0..40).map(|i| format!("mot{} ", i)).collect();
        assert_eq!(extract_keywords(&many, 15).len(), 15);
    }

    #[test]
    fn test_parse_is_deterministic() {
        let p = parser();
        let item = raw("<title>T</title><p>Un deux trois quatre</p>", "text/html");
        let a = p.parse(&item);
        let b = p.parse(&item);
        assert_eq!(a.id, b.id);
        assert_eq!(a.body, b.body);
        assert_eq!(a.keywords, b.keywords);
    }

    #[test]
    fn test_methodology_markers() {
        assert!(discloses_methodology("Notre méthodologie est décrite en annexe."));
        assert!(!discloses_methodology("Rien à signaler."));
    }
}
