mod test_helpers;

#[cfg(test)]
mod tests {
    use crate::test_helpers::{png_fixture, CannedEngine};
    use mediscan::classifier::RoutingDecision;
    use mediscan::config::AppConfig;
    use mediscan::errors::AppError;
    use mediscan::extraction::{EntityRecognizer, FieldValue};
    use mediscan::pipeline::Pipeline;
    use std::sync::Arc;

    const CBC_TEXT: &str = "Patient Name: Asha Rao Hemoglobin: 13.5 g/dL WBC 8000";

    #[tokio::test]
    async fn test_full_pipeline_produces_routed_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = png_fixture(&dir, "cbc.png");

        let pipeline = Pipeline::new(
            AppConfig::default(),
            Arc::new(CannedEngine::with_text(CBC_TEXT)),
        );
        let outcome = pipeline.process_document(&path).await.unwrap();

        assert_eq!(outcome.routing, RoutingDecision::BloodTest);
        assert_eq!(outcome.pages, 1);
        assert!(outcome.report.job_id.starts_with("job_"));
        assert_eq!(outcome.report.ocr_confidence, 90.0);

        let cbc = outcome.report.section(mediscan::parsers::Category::Cbc).unwrap();
        assert_eq!(cbc.get("hemoglobin").unwrap().value, FieldValue::Number(13.5));

        // the source file is left alone unless the pipeline owns it
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_unsupported_extension_rejected_before_processing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "plain text").unwrap();

        let pipeline = Pipeline::new(
            AppConfig::default(),
            Arc::new(CannedEngine::with_text(CBC_TEXT)),
        );
        let err = pipeline.process_document(&path).await.unwrap_err();
        assert!(matches!(err, AppError::UnsupportedFile(_)));
    }

    #[tokio::test]
    async fn test_blank_scan_surfaces_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = png_fixture(&dir, "blank.png");

        let pipeline = Pipeline::new(AppConfig::default(), Arc::new(CannedEngine::blank()));
        let err = pipeline.process_document(&path).await.unwrap_err();
        assert!(matches!(err, AppError::EmptyDocument(_)));
    }

    #[tokio::test]
    async fn test_owned_source_file_is_deleted_after_processing() {
        let dir = tempfile::tempdir().unwrap();
        let path = png_fixture(&dir, "owned.png");

        let config = AppConfig {
            delete_after_processing: true,
            ..Default::default()
        };
        let pipeline = Pipeline::new(config, Arc::new(CannedEngine::with_text(CBC_TEXT)));
        pipeline.process_document(&path).await.unwrap();

        assert!(!path.exists());
    }

    struct StubRecognizer;

    impl EntityRecognizer for StubRecognizer {
        fn person_entities(&self, _text: &str) -> Vec<String> {
            vec!["Ramesh Kumar".to_string()]
        }
    }

    #[tokio::test]
    async fn test_injected_recognizer_backs_name_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let path = png_fixture(&dir, "unlabeled.png");

        // no name label anywhere in the text
        let pipeline = Pipeline::new(
            AppConfig::default(),
            Arc::new(CannedEngine::with_text("Hemoglobin: 13.5 g/dL WBC 8000")),
        )
        .with_recognizer(Arc::new(StubRecognizer));

        let outcome = pipeline.process_document(&path).await.unwrap();
        let metadata = outcome
            .report
            .section(mediscan::parsers::Category::Metadata)
            .unwrap();
        assert_eq!(
            metadata.get("patient_name").unwrap().value,
            FieldValue::Text("Ramesh Kumar".to_string())
        );
    }
}
