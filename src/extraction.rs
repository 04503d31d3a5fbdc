//! # Field Extraction Module
//!
//! Deterministic tiered extraction of clinical fields from OCR text.
//!
//! ## Features
//!
//! - Exact alias matching via generated regex patterns (value, range, unit)
//! - Numeric range collapsing (`10 - 20` becomes the rounded mean `15.0`)
//! - Fuzzy token fallback using partial string similarity
//! - Label-anchored text and date extraction with `DD-MM-YYYY` normalization
//! - Specialized extractors for blood pressure, patient names, and medications
//!
//! A field that matches no tier is simply absent; that is the expected common
//! case, not an error.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use parking_lot::Mutex;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::warn;

use crate::aliases::unit_alternation;

/// Confidence assigned to exact alias/regex tier matches
pub const REGEX_CONFIDENCE: f32 = 0.95;
/// Confidence assigned to fuzzy token tier matches
pub const FUZZY_CONFIDENCE: f32 = 0.6;
/// Minimum partial-similarity score (0-100) for the fuzzy tier
pub const FUZZY_THRESHOLD: u32 = 85;

/// The typed value of an extracted field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// A numeric measurement (possibly collapsed from a range)
    Number(f64),
    /// Free text captured after a label
    Text(String),
    /// A date, normalized to `YYYY-MM-DD` when parseable
    Date(String),
    /// An ordered list of captured strings (medications)
    List(Vec<String>),
}

/// How a field value was obtained
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Exact alias regex match
    AliasRegex,
    /// Fuzzy token similarity match
    FuzzyToken,
    /// Label-anchored text capture
    Label,
    /// Label-anchored date capture
    DateLabel,
    /// Fixed-format blood pressure match
    BloodPressure,
    /// Capitalized-token pattern scan (medications)
    TokenScan,
    /// Named-entity recognition fallback
    Entity,
}

/// One extracted field: value, optional unit from the closed vocabulary,
/// field-level confidence in [0, 1], and the tier that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedField {
    pub value: FieldValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub confidence: f32,
    pub method: ExtractionMethod,
}

impl ExtractedField {
    pub(crate) fn number(
        value: f64,
        unit: Option<String>,
        confidence: f32,
        method: ExtractionMethod,
    ) -> Self {
        Self {
            value: FieldValue::Number(value),
            unit,
            confidence,
            method,
        }
    }

    pub(crate) fn text(value: String, method: ExtractionMethod) -> Self {
        Self {
            value: FieldValue::Text(value),
            unit: None,
            confidence: REGEX_CONFIDENCE,
            method,
        }
    }
}

/// Optional entity-recognition collaborator for the name-extraction fallback.
///
/// Callers that have no recognizer pass `None`; extraction degrades to the
/// label and fuzzy tiers instead of failing.
pub trait EntityRecognizer: Send + Sync {
    /// Detected person-name spans, in reading order.
    fn person_entities(&self, text: &str) -> Vec<String>;
}

lazy_static! {
    static ref CLEAN_SEPARATORS: Regex = Regex::new(r"[\t|:\u{2013}\u{2014}]").unwrap();
    static ref CLEAN_WHITESPACE: Regex = Regex::new(r"\s{2,}").unwrap();
    static ref NUMBER: Regex = Regex::new(r"\d+(\.\d+)?").unwrap();
    static ref BLOOD_PRESSURE: Regex =
        Regex::new(r"(?i)(BP|Blood Pressure)[\s\-:]+(\d{2,3}/\d{2,3})").unwrap();
    static ref NAME_LINE: Regex = Regex::new(r"(?i)Name[\s\-:]*([A-Za-z\s]+)").unwrap();
    static ref MEDICATION: Regex = Regex::new(r"\b([A-Z][a-z]+( [0-9]+mg)?)").unwrap();

    /// Compiled patterns keyed by the alias or label they were built from.
    /// Aliases and labels form a small closed set, so the cache is bounded.
    static ref PATTERN_CACHE: Mutex<HashMap<String, Regex>> = Mutex::new(HashMap::new());
}

/// Collapse separators and whitespace so field patterns see one flat line.
///
/// Applied once per document; all category parsers share the cleaned buffer.
pub fn clean_report_text(text: &str) -> String {
    let text = CLEAN_SEPARATORS.replace_all(text, " ");
    let text = text.replace('\n', " ");
    CLEAN_WHITESPACE.replace_all(text.trim(), " ").to_string()
}

/// Pattern for one alias: the alias label, an optional comparison marker, a
/// number, an optional range tail, and an optional unit from the vocabulary.
fn alias_pattern(alias: &str) -> Regex {
    let key = format!("alias:{}", alias);
    let mut cache = PATTERN_CACHE.lock();
    cache
        .entry(key)
        .or_insert_with(|| {
            let pattern = format!(
                r"(?i){}[\s\-:]*([><~]?\s*[\d\.]+)(?:\s*(?:-|\u{{2013}}|to)\s*([\d\.]+))?\s*({})?",
                regex::escape(alias),
                unit_alternation()
            );
            Regex::new(&pattern).expect("alias pattern must compile")
        })
        .clone()
}

/// Pattern for a label followed by free text.
fn label_pattern(label: &str) -> Regex {
    let key = format!("label:{}", label);
    let mut cache = PATTERN_CACHE.lock();
    cache
        .entry(key)
        .or_insert_with(|| {
            let pattern = format!(r"(?i){}[\s\-:]+([A-Za-z0-9\s,\.]+)", regex::escape(label));
            Regex::new(&pattern).expect("label pattern must compile")
        })
        .clone()
}

/// Pattern for a label followed by a date-shaped value.
fn date_pattern(label: &str) -> Regex {
    let key = format!("date:{}", label);
    let mut cache = PATTERN_CACHE.lock();
    cache
        .entry(key)
        .or_insert_with(|| {
            let pattern = format!(
                r"(?i){}[\s\-:]+(\d{{1,2}}[/\-]\d{{1,2}}[/\-]\d{{2,4}})",
                regex::escape(label)
            );
            Regex::new(&pattern).expect("date pattern must compile")
        })
        .clone()
}

/// Round to two decimal places (range means are reported at this precision)
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Partial string-similarity score on a 0-100 scale.
///
/// Slides a window the length of the shorter string over the longer one and
/// keeps the best normalized Levenshtein similarity, so an alias embedded in
/// a longer token still scores high.
pub fn partial_ratio(a: &str, b: &str) -> u32 {
    let (shorter, longer) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };

    let short_len = shorter.chars().count();
    if short_len == 0 {
        return 0;
    }

    let long_chars: Vec<char> = longer.chars().collect();
    if short_len >= long_chars.len() {
        return (strsim::normalized_levenshtein(shorter, longer) * 100.0).round() as u32;
    }

    let mut best = 0.0f64;
    for window in long_chars.windows(short_len) {
        let candidate: String = window.iter().collect();
        let score = strsim::normalized_levenshtein(shorter, &candidate);
        if score > best {
            best = score;
        }
    }
    (best * 100.0).round() as u32
}

/// Tiered numeric extraction for one canonical field.
///
/// Tier 1 tries each alias pattern in priority order; tier 2 falls back to
/// fuzzy token matching. Comparison markers (`>`, `<`, `~`) are stripped
/// before parsing; ranges collapse to their rounded mean.
pub fn extract_by_aliases(text: &str, aliases: &[&str]) -> Option<ExtractedField> {
    // Tier 1: exact alias regex
    for alias in aliases {
        let pattern = alias_pattern(alias);
        if let Some(caps) = pattern.captures(text) {
            let raw = caps
                .get(1)
                .map(|m| m.as_str().trim_start_matches(['>', '<', '~']).trim_start())
                .unwrap_or_default();
            let first: f64 = match raw.parse() {
                Ok(v) => v,
                Err(e) => {
                    warn!(alias = %alias, raw = %raw, error = %e, "Failed parsing matched value");
                    continue;
                }
            };
            let second = caps.get(2).and_then(|m| m.as_str().parse::<f64>().ok());
            let unit = caps.get(3).map(|m| m.as_str().to_string());

            let value = match second {
                Some(high) => round2((first + high) / 2.0),
                None => first,
            };
            return Some(ExtractedField::number(
                value,
                unit,
                REGEX_CONFIDENCE,
                ExtractionMethod::AliasRegex,
            ));
        }
    }

    // Tier 2: fuzzy token fallback, only when no alias pattern matched
    for word in text.split_whitespace() {
        for alias in aliases {
            if partial_ratio(&alias.to_lowercase(), &word.to_lowercase()) > FUZZY_THRESHOLD {
                if let Some(num) = NUMBER.find(word) {
                    if let Ok(value) = num.as_str().parse::<f64>() {
                        return Some(ExtractedField::number(
                            value,
                            None,
                            FUZZY_CONFIDENCE,
                            ExtractionMethod::FuzzyToken,
                        ));
                    }
                }
            }
        }
    }

    None
}

/// Capture free text following a label. Returns the trimmed capture.
pub fn extract_text_field(text: &str, label: &str) -> Option<String> {
    label_pattern(label)
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Capture a date following a label and normalize `DD-MM-YYYY` to
/// `YYYY-MM-DD`. A matched but unparseable date is returned verbatim,
/// never discarded.
pub fn extract_date(text: &str, label: &str) -> Option<String> {
    let caps = date_pattern(label).captures(text)?;
    let raw = caps.get(1)?.as_str();
    match NaiveDate::parse_from_str(raw, "%d-%m-%Y") {
        Ok(date) => Some(date.format("%Y-%m-%d").to_string()),
        Err(_) => Some(raw.to_string()),
    }
}

/// Fixed-format blood pressure matcher: `BP`/`Blood Pressure` immediately
/// followed by an `NNN/NNN` token. No range or unit logic applies.
pub fn extract_blood_pressure(text: &str) -> Option<String> {
    BLOOD_PRESSURE
        .captures(text)
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str().to_string())
}

/// Three-tier patient name extraction.
///
/// 1. Prioritized label patterns, accepted only when the capture has at least
///    two whitespace-separated tokens.
/// 2. Fuzzy line-level match against the word "name" plus a capture regex.
/// 3. Entity-recognition fallback, skipped when no recognizer is available.
///
/// Each tier runs only if the previous one found nothing; the returned field
/// records which tier produced the name.
pub fn extract_name(
    text: &str,
    recognizer: Option<&dyn EntityRecognizer>,
) -> Option<ExtractedField> {
    const NAME_LABELS: [&str; 4] = ["Patient Name", "Pt Name", "Name", "Name of Patient"];

    for label in NAME_LABELS {
        if let Some(name) = extract_text_field(text, label) {
            if name.split_whitespace().count() >= 2 {
                return Some(ExtractedField::text(name, ExtractionMethod::Label));
            }
        }
    }

    for line in text.split(". ") {
        if partial_ratio("name", &line.to_lowercase()) > 80 {
            if let Some(caps) = NAME_LINE.captures(line) {
                let name = caps.get(1).map(|m| m.as_str().trim().to_string())?;
                if !name.is_empty() {
                    return Some(ExtractedField {
                        value: FieldValue::Text(name),
                        unit: None,
                        confidence: FUZZY_CONFIDENCE,
                        method: ExtractionMethod::FuzzyToken,
                    });
                }
            }
        }
    }

    if let Some(recognizer) = recognizer {
        if let Some(entity) = recognizer.person_entities(text).into_iter().next() {
            let entity = entity.trim().to_string();
            if !entity.is_empty() {
                return Some(ExtractedField {
                    value: FieldValue::Text(entity),
                    unit: None,
                    confidence: FUZZY_CONFIDENCE,
                    method: ExtractionMethod::Entity,
                });
            }
        }
    }

    None
}

/// Scan for medication-shaped tokens: a capitalized word, optionally followed
/// by a dosage in milligrams. De-duplicates while preserving first-seen order.
pub fn extract_medications(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut medications = Vec::new();
    for caps in MEDICATION.captures_iter(text) {
        if let Some(m) = caps.get(1) {
            let med = m.as_str().to_string();
            if seen.insert(med.clone()) {
                medications.push(med);
            }
        }
    }
    medications
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_ratio_embedded_alias() {
        assert_eq!(partial_ratio("hgb", "hgb12.5"), 100);
        assert!(partial_ratio("hemoglobin", "xyz") < 50);
    }

    #[test]
    fn test_partial_ratio_empty_input() {
        assert_eq!(partial_ratio("", "anything"), 0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(15.0), 15.0);
        assert_eq!(round2((10.0 + 21.0) / 2.0), 15.5);
    }

    #[test]
    fn test_clean_report_text_flattens_separators() {
        let cleaned = clean_report_text("Hemoglobin:\t13.5\ng/dL  |  WBC: 8000");
        assert_eq!(cleaned, "Hemoglobin 13.5 g/dL WBC 8000");
    }
}
