//! # Document Processing Pipeline
//!
//! The synchronous-from-the-caller's-view pipeline for one document:
//! ingest, OCR acquisition, field extraction, classification. The only
//! internal parallelism is the page-level OCR fan-out inside the
//! orchestrator. No component holds cross-document state, so distinct
//! documents may be processed concurrently.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn, Instrument};

use crate::classifier::{classify, RoutingDecision};
use crate::config::AppConfig;
use crate::document::Document;
use crate::engine::OcrEngine;
use crate::errors::{error_logging, AppResult};
use crate::extraction::EntityRecognizer;
use crate::observability;
use crate::ocr::extract_document_text;
use crate::report::{assemble_report, StructuredReport};

/// The result handed back to callers: the structured report plus the
/// persistence category chosen for it.
#[derive(Debug, Clone)]
pub struct ProcessingOutcome {
    pub report: StructuredReport,
    pub routing: RoutingDecision,
    /// Number of pages the document rasterized to
    pub pages: usize,
    /// Wall-clock time for the whole run
    pub elapsed_ms: u64,
}

/// One configured pipeline. Shared configuration is read-only after
/// construction; the pipeline itself is safe to share across tasks.
pub struct Pipeline {
    config: AppConfig,
    engine: Arc<dyn OcrEngine>,
    recognizer: Option<Arc<dyn EntityRecognizer>>,
}

impl Pipeline {
    pub fn new(config: AppConfig, engine: Arc<dyn OcrEngine>) -> Self {
        Self {
            config,
            engine,
            recognizer: None,
        }
    }

    /// Attach an optional entity-recognition collaborator for the
    /// name-extraction fallback tier.
    pub fn with_recognizer(mut self, recognizer: Arc<dyn EntityRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    /// Process one document end to end.
    ///
    /// Returns the structured report and routing decision, or one of the
    /// pipeline error kinds with the failing stage logged under the job id.
    /// When configured to own input files, the source file is deleted after
    /// processing completes or fails.
    pub async fn process_document(&self, path: impl AsRef<Path>) -> AppResult<ProcessingOutcome> {
        let path = path.as_ref();
        let start = Instant::now();

        let document = match Document::ingest(path, &self.config.ocr) {
            Ok(document) => document,
            Err(e) => {
                error_logging::log_pipeline_error(&e, "ingest", "-", path.to_str());
                observability::record_document_metrics("rejected", start.elapsed(), 0);
                return Err(e);
            }
        };

        let span = observability::pipeline_span(&document.job_id);
        let result = self.run(&document, start).instrument(span).await;

        if self.config.delete_after_processing {
            cleanup_source(&document);
        }

        let outcome_label = match &result {
            Ok(_) => "success",
            Err(e) => match e {
                crate::errors::AppError::EmptyDocument(_) => "empty",
                _ => "error",
            },
        };
        let pages = result.as_ref().map(|o| o.pages).unwrap_or(0);
        observability::record_document_metrics(outcome_label, start.elapsed(), pages);

        result
    }

    async fn run(&self, document: &Document, start: Instant) -> AppResult<ProcessingOutcome> {
        let document_text = extract_document_text(
            document,
            &self.config.ocr,
            Arc::clone(&self.engine),
        )
        .await
        .map_err(|e| {
            error_logging::log_pipeline_error(
                &e,
                "ocr",
                &document.job_id,
                document.path.to_str(),
            );
            e
        })?;

        // Extraction and classification are pure, synchronous text work
        let report = assemble_report(
            &document.job_id,
            &document_text.text,
            document_text.confidence,
            self.recognizer.as_deref(),
        );
        let routing = classify(&report);

        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            job_id = %document.job_id,
            routing = routing.as_str(),
            sections = report.sections.len(),
            elapsed_ms,
            "Document processing completed"
        );

        Ok(ProcessingOutcome {
            report,
            routing,
            pages: document_text.pages.len(),
            elapsed_ms,
        })
    }
}

/// Delete a processed source file. Failure is a warning, never an error.
fn cleanup_source(document: &Document) {
    match std::fs::remove_file(&document.path) {
        Ok(()) => info!(job_id = %document.job_id, path = %document.path.display(), "Cleaned up source file"),
        Err(e) => warn!(
            job_id = %document.job_id,
            path = %document.path.display(),
            error = %e,
            "Source file cleanup failed"
        ),
    }
}
