//! # Report Classifier/Router
//!
//! Pure routing decision from which section keys are populated in a
//! structured report, never from field values. `Unknown` is surfaced to the
//! caller as a routing failure signal, not silently swallowed.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::report::StructuredReport;

/// Persistence category for a structured report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingDecision {
    BloodTest,
    Prescription,
    Xray,
    Unknown,
}

impl RoutingDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingDecision::BloodTest => "blood_test",
            RoutingDecision::Prescription => "prescription",
            RoutingDecision::Xray => "xray",
            RoutingDecision::Unknown => "unknown",
        }
    }
}

/// Classify by present key names, in fixed precedence order.
///
/// Operates on key names rather than the category enum so reports assembled
/// by an alternative structuring strategy (which may carry `findings` or
/// `image_url` sections) route through the same contract.
pub fn classify_keys<'a>(keys: impl Iterator<Item = &'a str>) -> RoutingDecision {
    let present: Vec<&str> = keys.collect();
    let has = |key: &str| present.iter().any(|k| *k == key);

    if has("cbc") || has("lipid") || has("thyroid") {
        RoutingDecision::BloodTest
    } else if has("prescription") {
        RoutingDecision::Prescription
    } else if has("findings") || has("image_url") {
        RoutingDecision::Xray
    } else {
        RoutingDecision::Unknown
    }
}

/// Classify a structured report by its populated sections.
pub fn classify(report: &StructuredReport) -> RoutingDecision {
    let decision = classify_keys(report.sections.keys().map(String::as_str));
    if decision == RoutingDecision::Unknown {
        warn!(job_id = %report.job_id, "Unknown report type detected in structured data");
    }
    decision
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blood_test_precedence_over_prescription() {
        let decision = classify_keys(["prescription", "thyroid"].into_iter());
        assert_eq!(decision, RoutingDecision::BloodTest);
    }

    #[test]
    fn test_xray_keys_route_to_xray() {
        assert_eq!(classify_keys(["findings"].into_iter()), RoutingDecision::Xray);
        assert_eq!(classify_keys(["image_url"].into_iter()), RoutingDecision::Xray);
    }

    #[test]
    fn test_no_recognized_keys_is_unknown() {
        assert_eq!(
            classify_keys(["metadata", "vitals"].into_iter()),
            RoutingDecision::Unknown
        );
        assert_eq!(
            classify_keys(std::iter::empty::<&str>()),
            RoutingDecision::Unknown
        );
    }
}
