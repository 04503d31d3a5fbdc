//! # Report Assembler
//!
//! Runs all eleven category parsers against one shared cleaned text buffer
//! and keeps only the sections that produced at least one field. No
//! cross-category reconciliation happens here; categories are not expected
//! to overlap.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::extraction::{clean_report_text, EntityRecognizer};
use crate::parsers::{parse_category, Category, ReportSection};

/// The structured result of one document: non-empty sections keyed by
/// category name, the raw aggregated OCR text, and the document identifier.
///
/// Engine-level OCR confidence is on the 0-100 scale and is distinct from the
/// per-field confidence tiers in [0, 1] inside the sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredReport {
    /// Document identifier (job id)
    pub job_id: String,
    /// Non-empty category sections
    pub sections: BTreeMap<String, ReportSection>,
    /// Raw aggregated OCR text, including page markers
    pub raw_text: String,
    /// Document-level OCR confidence (0-100)
    pub ocr_confidence: f64,
}

impl StructuredReport {
    /// Whether a section with the given key is present
    pub fn has_section(&self, key: &str) -> bool {
        self.sections.contains_key(key)
    }

    /// Convenience accessor for a section by category
    pub fn section(&self, category: Category) -> Option<&ReportSection> {
        self.sections.get(category.as_str())
    }
}

/// Assemble a structured report from aggregated OCR text.
///
/// Text cleaning happens once; every category parser sees the same buffer.
/// Parsers that find nothing contribute no section. Deterministic: the same
/// input text always assembles the same report.
pub fn assemble_report(
    job_id: &str,
    raw_text: &str,
    ocr_confidence: f64,
    recognizer: Option<&dyn EntityRecognizer>,
) -> StructuredReport {
    let cleaned = clean_report_text(raw_text);

    let mut sections = BTreeMap::new();
    for category in Category::ALL {
        let section = parse_category(category, &cleaned, recognizer);
        if !section.is_empty() {
            sections.insert(category.as_str().to_string(), section);
        }
    }

    info!(
        job_id = %job_id,
        sections = sections.len(),
        categories = ?sections.keys().collect::<Vec<_>>(),
        "Report assembled"
    );

    StructuredReport {
        job_id: job_id.to_string(),
        sections,
        raw_text: raw_text.to_string(),
        ocr_confidence,
    }
}
