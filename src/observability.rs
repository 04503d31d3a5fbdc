//! Observability module for centralized tracing and metrics setup.
//!
//! This module provides:
//! - Structured logging with configurable levels via `RUST_LOG`
//! - Optional JSON log output for aggregation (`LOG_FORMAT=json`)
//! - Tracing span helpers for the pipeline stages
//! - Metric recording for OCR and extraction operations

use anyhow::Result;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber from environment configuration.
///
/// `RUST_LOG` controls the filter (default `info`); `LOG_FORMAT=json`
/// switches to JSON output for log aggregation.
pub fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_output = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_output {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {}", e))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {}", e))?;
    }

    tracing::info!(json_output, "Tracing initialized");
    Ok(())
}

/// Create a tracing span for OCR operations
pub fn ocr_span(operation: &str, job_id: &str) -> tracing::Span {
    tracing::info_span!("ocr", operation = %operation, job_id = %job_id)
}

/// Create a tracing span for one full document pipeline run
pub fn pipeline_span(job_id: &str) -> tracing::Span {
    tracing::info_span!("pipeline", job_id = %job_id)
}

/// Record OCR page metrics
pub fn record_page_metrics(success: bool, duration: std::time::Duration, blocks: usize) {
    metrics::counter!("ocr_pages_processed_total", "result" => if success { "success" } else { "failure" })
        .increment(1);
    metrics::histogram!("ocr_page_duration_seconds").record(duration.as_secs_f64());
    metrics::histogram!("ocr_page_blocks").record(blocks as f64);
}

/// Record document-level pipeline metrics
pub fn record_document_metrics(outcome: &str, duration: std::time::Duration, pages: usize) {
    metrics::counter!("documents_processed_total", "outcome" => outcome.to_string()).increment(1);
    metrics::histogram!("document_duration_seconds").record(duration.as_secs_f64());
    metrics::histogram!("document_pages").record(pages as f64);
}

/// Record how many fields one category parser extracted
pub fn record_extraction_metrics(category: &str, fields_found: usize) {
    metrics::counter!("fields_extracted_total", "category" => category.to_string())
        .increment(fields_found as u64);
}
