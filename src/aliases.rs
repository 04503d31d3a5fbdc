//! # Field Alias Registry
//!
//! Static mapping from canonical clinical field names to the surface forms
//! they appear under in report text (synonyms, abbreviations), in priority
//! order with the most specific alias first, plus the closed unit vocabulary
//! accepted during numeric extraction.

use lazy_static::lazy_static;
use std::collections::HashMap;

/// Units recognized immediately after a numeric value. Closed vocabulary;
/// anything else is not captured as a unit.
pub const EXPECTED_UNITS: [&str; 5] = ["mg/dL", "g/dL", "%", "mmHg", "mmol/L"];

lazy_static! {
    /// Canonical field name -> alias strings in match-priority order.
    pub static ref FIELD_ALIASES: HashMap<&'static str, &'static [&'static str]> = {
        let mut m: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
        m.insert("hemoglobin", &["hemoglobin", "hgb", "hb"][..]);
        m.insert("wbc", &["wbc", "white blood cells"][..]);
        m.insert("rbc", &["rbc", "red blood cells"][..]);
        m.insert("platelets", &["platelets", "plt"][..]);
        m.insert("mcv", &["mcv"][..]);
        m.insert("mch", &["mch"][..]);
        m.insert("mchc", &["mchc"][..]);
        m.insert("sgot", &["sgot", "ast"][..]);
        m.insert("sgpt", &["sgpt", "alt"][..]);
        m.insert("bilirubin_total", &["bilirubin total", "total bilirubin"][..]);
        m.insert("bilirubin_direct", &["bilirubin direct", "direct bilirubin"][..]);
        m.insert("alp", &["alkaline phosphatase", "alp"][..]);
        m.insert("urea", &["urea", "blood urea"][..]);
        m.insert("creatinine", &["creatinine"][..]);
        m.insert("uric_acid", &["uric acid"][..]);
        m.insert("bun", &["bun", "blood urea nitrogen"][..]);
        m.insert("cholesterol_total", &["total cholesterol"][..]);
        m.insert("hdl", &["hdl"][..]);
        m.insert("ldl", &["ldl"][..]);
        m.insert("triglycerides", &["triglycerides"][..]);
        m.insert("t3", &["t3"][..]);
        m.insert("t4", &["t4"][..]);
        m.insert("tsh", &["tsh"][..]);
        m.insert("fbs", &["fbs", "fasting blood sugar"][..]);
        m.insert("ppbs", &["ppbs", "postprandial blood sugar"][..]);
        m.insert("rbs", &["rbs", "random blood sugar"][..]);
        m.insert("hba1c", &["hba1c"][..]);
        m.insert("sodium", &["sodium", "na"][..]);
        m.insert("potassium", &["potassium", "k"][..]);
        m.insert("chloride", &["chloride", "cl"][..]);
        m.insert("calcium", &["calcium", "ca"][..]);
        m.insert("temperature", &["temperature"][..]);
        m.insert("heart_rate", &["heart rate", "pulse"][..]);
        m.insert("respiratory_rate", &["respiratory rate"][..]);
        m.insert("spo2", &["spo2", "oxygen saturation"][..]);
        m.insert("bp", &["blood pressure", "bp"][..]);
        m
    };
}

/// Look up the alias list for a canonical field.
///
/// Returns an empty slice for unknown field names so callers can treat an
/// unknown field the same as a field with no matches.
pub fn aliases_for(field: &str) -> &'static [&'static str] {
    FIELD_ALIASES.get(field).copied().unwrap_or(&[])
}

/// Build the alternation fragment of the unit vocabulary for embedding in an
/// extraction pattern. Units are escaped and joined with `|`.
pub fn unit_alternation() -> String {
    EXPECTED_UNITS
        .iter()
        .map(|u| regex::escape(u))
        .collect::<Vec<_>>()
        .join("|")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_field_has_aliases() {
        let aliases = aliases_for("hemoglobin");
        assert_eq!(aliases, ["hemoglobin", "hgb", "hb"]);
    }

    #[test]
    fn test_unknown_field_yields_empty_slice() {
        assert!(aliases_for("no_such_field").is_empty());
    }

    #[test]
    fn test_unit_alternation_escapes_specials() {
        let alternation = unit_alternation();
        // "mg/dL" survives verbatim, "%" must be present
        assert!(alternation.contains("mg/dL"));
        assert!(alternation.contains('%'));
    }
}
