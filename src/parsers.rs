//! # Category Parsers
//!
//! The eleven report categories are configuration, not code: alias-driven
//! categories are fixed ordered field lists run through the tiered extractor,
//! and the structurally distinct categories (dialysis, prescription, vitals,
//! metadata) are fixed lists of named extraction calls. Every parser operates
//! on the same cleaned text buffer and returns only the fields it found;
//! not-found fields are omitted, never zero-filled.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::aliases::aliases_for;
use crate::extraction::{
    extract_blood_pressure, extract_by_aliases, extract_date, extract_medications, extract_name,
    extract_text_field, EntityRecognizer, ExtractedField, ExtractionMethod, FieldValue,
};
use crate::observability;

/// One of the eleven fixed report categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Cbc,
    Lft,
    Kft,
    Lipid,
    Thyroid,
    Sugar,
    Electrolytes,
    Dialysis,
    Prescription,
    Vitals,
    Metadata,
}

impl Category {
    /// All categories in parse order
    pub const ALL: [Category; 11] = [
        Category::Cbc,
        Category::Lft,
        Category::Kft,
        Category::Lipid,
        Category::Thyroid,
        Category::Sugar,
        Category::Electrolytes,
        Category::Dialysis,
        Category::Prescription,
        Category::Vitals,
        Category::Metadata,
    ];

    /// Stable key used in the assembled report and the persistence contract
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Cbc => "cbc",
            Category::Lft => "lft",
            Category::Kft => "kft",
            Category::Lipid => "lipid",
            Category::Thyroid => "thyroid",
            Category::Sugar => "sugar",
            Category::Electrolytes => "electrolytes",
            Category::Dialysis => "dialysis",
            Category::Prescription => "prescription",
            Category::Vitals => "vitals",
            Category::Metadata => "metadata",
        }
    }
}

/// Partial mapping from field name to extracted value for one category
pub type ReportSection = BTreeMap<String, ExtractedField>;

// Field lists for the alias-driven categories, in extraction order.
const CBC_FIELDS: &[&str] = &["hemoglobin", "wbc", "rbc", "platelets", "mcv", "mch", "mchc"];
const LFT_FIELDS: &[&str] = &["sgot", "sgpt", "bilirubin_total", "bilirubin_direct", "alp"];
const KFT_FIELDS: &[&str] = &["urea", "creatinine", "uric_acid", "bun"];
const LIPID_FIELDS: &[&str] = &["cholesterol_total", "hdl", "ldl", "triglycerides"];
const THYROID_FIELDS: &[&str] = &["t3", "t4", "tsh"];
const SUGAR_FIELDS: &[&str] = &["fbs", "ppbs", "rbs", "hba1c"];
const ELECTROLYTE_FIELDS: &[&str] = &["sodium", "potassium", "chloride", "calcium"];
const VITALS_FIELDS: &[&str] = &["temperature", "heart_rate", "respiratory_rate", "spo2"];

/// Run one category parser over cleaned report text.
///
/// The entity recognizer is only consulted by the metadata parser's name
/// fallback; all other categories ignore it.
pub fn parse_category(
    category: Category,
    text: &str,
    recognizer: Option<&dyn EntityRecognizer>,
) -> ReportSection {
    let section = match category {
        Category::Cbc => parse_alias_fields(text, CBC_FIELDS),
        Category::Lft => parse_alias_fields(text, LFT_FIELDS),
        Category::Kft => parse_alias_fields(text, KFT_FIELDS),
        Category::Lipid => parse_alias_fields(text, LIPID_FIELDS),
        Category::Thyroid => parse_alias_fields(text, THYROID_FIELDS),
        Category::Sugar => parse_alias_fields(text, SUGAR_FIELDS),
        Category::Electrolytes => parse_alias_fields(text, ELECTROLYTE_FIELDS),
        Category::Dialysis => parse_dialysis(text),
        Category::Prescription => parse_prescription(text),
        Category::Vitals => parse_vitals(text),
        Category::Metadata => parse_metadata(text, recognizer),
    };

    debug!(
        category = category.as_str(),
        fields = section.len(),
        "Category parser finished"
    );
    observability::record_extraction_metrics(category.as_str(), section.len());
    section
}

/// Generic extraction for alias-driven categories: each canonical field runs
/// through the tiered extractor, found fields land in the section.
fn parse_alias_fields(text: &str, fields: &[&str]) -> ReportSection {
    let mut section = ReportSection::new();
    for field in fields {
        if let Some(extracted) = extract_by_aliases(text, aliases_for(field)) {
            section.insert((*field).to_string(), extracted);
        }
    }
    section
}

fn insert_text(section: &mut ReportSection, key: &str, value: Option<String>) {
    if let Some(value) = value {
        section.insert(
            key.to_string(),
            ExtractedField::text(value, ExtractionMethod::Label),
        );
    }
}

fn insert_date(section: &mut ReportSection, key: &str, value: Option<String>) {
    if let Some(value) = value {
        section.insert(
            key.to_string(),
            ExtractedField {
                value: FieldValue::Date(value),
                unit: None,
                confidence: crate::extraction::REGEX_CONFIDENCE,
                method: ExtractionMethod::DateLabel,
            },
        );
    }
}

fn insert_blood_pressure(section: &mut ReportSection, key: &str, text: &str) {
    if let Some(bp) = extract_blood_pressure(text) {
        section.insert(
            key.to_string(),
            ExtractedField {
                value: FieldValue::Text(bp),
                unit: None,
                confidence: crate::extraction::REGEX_CONFIDENCE,
                method: ExtractionMethod::BloodPressure,
            },
        );
    }
}

fn parse_dialysis(text: &str) -> ReportSection {
    let mut section = ReportSection::new();
    if let Some(v) = extract_by_aliases(text, &["pre-weight", "pre weight"]) {
        section.insert("pre_weight".to_string(), v);
    }
    if let Some(v) = extract_by_aliases(text, &["post-weight", "post weight"]) {
        section.insert("post_weight".to_string(), v);
    }
    insert_blood_pressure(&mut section, "bp_pre", text);
    if let Some(v) = extract_by_aliases(text, &["uf volume"]) {
        section.insert("uf_volume".to_string(), v);
    }
    if let Some(v) = extract_by_aliases(text, &["session duration"]) {
        section.insert("session_duration".to_string(), v);
    }
    insert_text(&mut section, "machine_id", extract_text_field(text, "Machine ID"));
    insert_text(
        &mut section,
        "dialysis_type",
        extract_text_field(text, "Dialysis Type"),
    );
    section
}

fn parse_prescription(text: &str) -> ReportSection {
    let mut section = ReportSection::new();
    insert_date(&mut section, "prescription_date", extract_date(text, "Date"));

    let medications = extract_medications(text);
    if !medications.is_empty() {
        section.insert(
            "medications".to_string(),
            ExtractedField {
                value: FieldValue::List(medications),
                unit: None,
                confidence: crate::extraction::REGEX_CONFIDENCE,
                method: ExtractionMethod::TokenScan,
            },
        );
    }

    insert_text(&mut section, "timing", extract_text_field(text, "Timing"));
    insert_text(&mut section, "diagnosis", extract_text_field(text, "Diagnosis"));
    insert_date(&mut section, "follow_up", extract_date(text, "Follow-up"));
    section
}

fn parse_vitals(text: &str) -> ReportSection {
    let mut section = parse_alias_fields(text, VITALS_FIELDS);
    insert_blood_pressure(&mut section, "bp", text);
    section
}

fn parse_metadata(text: &str, recognizer: Option<&dyn EntityRecognizer>) -> ReportSection {
    let mut section = ReportSection::new();
    if let Some(name) = extract_name(text, recognizer) {
        section.insert("patient_name".to_string(), name);
    }
    insert_text(&mut section, "patient_id", extract_text_field(text, "Patient ID"));
    insert_date(&mut section, "report_date", extract_date(text, "Date"));
    insert_text(&mut section, "lab_name", extract_text_field(text, "Lab"));
    insert_text(&mut section, "sample_id", extract_text_field(text, "Sample ID"));
    insert_text(&mut section, "doctor_name", extract_text_field(text, "Doctor"));
    insert_text(
        &mut section,
        "report_status",
        extract_text_field(text, "Report Status"),
    );
    section
}
