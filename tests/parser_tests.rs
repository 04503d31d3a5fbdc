#[cfg(test)]
mod tests {
    use mediscan::classifier::{classify, RoutingDecision};
    use mediscan::extraction::{clean_report_text, FieldValue};
    use mediscan::parsers::{parse_category, Category};
    use mediscan::report::assemble_report;

    const CBC_TEXT: &str = "Hemoglobin: 13.5 g/dL WBC 8000 Platelets: 250000";

    fn number(section: &mediscan::parsers::ReportSection, key: &str) -> f64 {
        match &section.get(key).expect(key).value {
            FieldValue::Number(n) => *n,
            other => panic!("{} is not numeric: {:?}", key, other),
        }
    }

    #[test]
    fn test_cbc_parser_returns_only_found_fields() {
        let cleaned = clean_report_text(CBC_TEXT);
        let section = parse_category(Category::Cbc, &cleaned, None);

        assert_eq!(number(&section, "hemoglobin"), 13.5);
        assert_eq!(number(&section, "wbc"), 8000.0);
        assert_eq!(number(&section, "platelets"), 250000.0);
        // absent fields are omitted, never zero-filled
        assert!(!section.contains_key("mcv"));
        assert!(!section.contains_key("mchc"));
    }

    #[test]
    fn test_vitals_parser_includes_blood_pressure() {
        let cleaned = clean_report_text("BP: 120/80 Pulse: 72 Temperature: 98.6");
        let section = parse_category(Category::Vitals, &cleaned, None);

        assert_eq!(number(&section, "heart_rate"), 72.0);
        assert_eq!(number(&section, "temperature"), 98.6);
        assert_eq!(
            section.get("bp").unwrap().value,
            FieldValue::Text("120/80".to_string())
        );
    }

    #[test]
    fn test_dialysis_parser_mixes_numeric_and_text_fields() {
        let cleaned =
            clean_report_text("Pre Weight 72.5 Post Weight 70.1 UF Volume 2.5 Machine ID MX450");
        let section = parse_category(Category::Dialysis, &cleaned, None);

        assert_eq!(number(&section, "pre_weight"), 72.5);
        assert_eq!(number(&section, "post_weight"), 70.1);
        assert_eq!(number(&section, "uf_volume"), 2.5);
        assert_eq!(
            section.get("machine_id").unwrap().value,
            FieldValue::Text("MX450".to_string())
        );
    }

    #[test]
    fn test_prescription_parser_collects_medications_and_date() {
        let cleaned = clean_report_text("Tab Dolo 650mg Diagnosis: Viral Fever Date: 01-01-2024");
        let section = parse_category(Category::Prescription, &cleaned, None);

        match &section.get("medications").unwrap().value {
            FieldValue::List(meds) => {
                assert!(meds.contains(&"Dolo 650mg".to_string()));
                assert!(meds.contains(&"Tab".to_string()));
            }
            other => panic!("medications is not a list: {:?}", other),
        }
        assert_eq!(
            section.get("prescription_date").unwrap().value,
            FieldValue::Date("2024-01-01".to_string())
        );
        match &section.get("diagnosis").unwrap().value {
            FieldValue::Text(diagnosis) => assert!(diagnosis.starts_with("Viral Fever")),
            other => panic!("diagnosis is not text: {:?}", other),
        }
    }

    #[test]
    fn test_metadata_parser_extracts_name_and_date() {
        let cleaned = clean_report_text("Patient Name: Asha Rao Date: 05-06-2024");
        let section = parse_category(Category::Metadata, &cleaned, None);

        match &section.get("patient_name").unwrap().value {
            FieldValue::Text(name) => assert!(name.starts_with("Asha Rao")),
            other => panic!("patient_name is not text: {:?}", other),
        }
        assert_eq!(
            section.get("report_date").unwrap().value,
            FieldValue::Date("2024-06-05".to_string())
        );
    }

    #[test]
    fn test_assembler_drops_empty_sections() {
        let report = assemble_report(
            "job_test",
            "the quick brown fox jumps over the lazy dog repeatedly",
            42.0,
            None,
        );
        assert!(report.sections.is_empty());
        assert_eq!(report.ocr_confidence, 42.0);
        assert_eq!(classify(&report), RoutingDecision::Unknown);
    }

    #[test]
    fn test_assembler_is_idempotent() {
        let first = assemble_report("job_test", CBC_TEXT, 88.0, None);
        let second = assemble_report("job_test", CBC_TEXT, 88.0, None);
        assert_eq!(first, second);
    }

    #[test]
    fn test_cbc_report_routes_to_blood_test() {
        let report = assemble_report("job_test", CBC_TEXT, 88.0, None);
        assert!(report.has_section("cbc"));
        assert_eq!(classify(&report), RoutingDecision::BloodTest);
    }

    #[test]
    fn test_prescription_report_routes_to_prescription() {
        let report = assemble_report(
            "job_test",
            "Tab Dolo 650mg Diagnosis: Viral Fever Date: 01-01-2024",
            75.0,
            None,
        );
        assert!(report.has_section("prescription"));
        assert!(!report.has_section("cbc"));
        assert_eq!(classify(&report), RoutingDecision::Prescription);
    }

    #[test]
    fn test_raw_text_survives_assembly_untouched() {
        let raw = "Hemoglobin:\t13.5\ng/dL";
        let report = assemble_report("job_test", raw, 90.0, None);
        assert_eq!(report.raw_text, raw);
    }
}
