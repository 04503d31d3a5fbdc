//! # Document OCR Orchestrator
//!
//! Fans a multi-page document into bounded-parallel per-page OCR jobs and
//! reassembles the results in page-index order. Pages share no mutable
//! state; concurrency is capped by a semaphore sized from configuration.
//!
//! Per-page failures degrade to an empty zero-confidence page rather than
//! failing the document. Only a document whose every page came back blank is
//! a terminal failure (`EmptyDocument`), distinct from a low-confidence but
//! nonempty result, which proceeds to extraction.

use std::sync::Arc;
use std::time::Instant;

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::document::Document;
use crate::engine::{join_block_text, page_confidence, qualifying_block_count, OcrEngine};
use crate::errors::{error_logging, AppError, AppResult};
use crate::language::select_language;
use crate::observability;
use crate::ocr_config::{OcrConfig, RecoveryConfig};
use crate::ocr_errors::OcrError;
use crate::pdf::rasterize_pdf;
use crate::preprocessing::{preprocess_image, read_exif_orientation};

/// OCR outcome for one page. Produced once, immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-based page number
    pub page: usize,
    /// Recognized text, whitespace-joined in engine order
    pub text: String,
    /// Engine-level confidence on the 0-100 scale
    pub confidence: f64,
    /// Number of blocks that carried a usable confidence
    pub blocks: usize,
    /// Language profile the engine ran with
    pub lang_used: String,
    /// Wall-clock time for this page
    pub elapsed_ms: u64,
}

impl PageResult {
    fn empty(page: usize, lang_used: String, elapsed_ms: u64) -> Self {
        Self {
            page,
            text: String::new(),
            confidence: 0.0,
            blocks: 0,
            lang_used,
            elapsed_ms,
        }
    }
}

/// Aggregated OCR output for a whole document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentText {
    /// Page texts joined with page-boundary markers, ascending page order
    pub text: String,
    /// Unweighted mean of page confidences (0-100); 0.0 for zero pages
    pub confidence: f64,
    /// Per-page results in page order
    pub pages: Vec<PageResult>,
    /// Wall-clock time for the whole acquisition stage
    pub elapsed_ms: u64,
}

/// Calculate retry delay with exponential backoff and jitter.
pub fn calculate_retry_delay(attempt: u32, recovery: &RecoveryConfig) -> u64 {
    #[allow(clippy::cast_precision_loss)]
    let base_delay = recovery.base_retry_delay_ms as f64;
    let exponential_delay = base_delay * (2.0_f64).powf(f64::from(attempt.saturating_sub(1)));
    #[allow(clippy::cast_precision_loss)]
    let delay = exponential_delay.min(recovery.max_retry_delay_ms as f64) as u64;

    // Jitter spreads concurrent page retries apart
    let jitter = rand::random::<u64>() % (delay / 4).max(1);
    delay + jitter
}

/// OCR one page with retry, timeout, and graceful failure.
///
/// The page is preprocessed first; when no language profile is pinned, a
/// per-page sample selects one. Engine failures retry with backoff; a page
/// that exhausts its attempts contributes empty text and zero confidence.
pub async fn ocr_page(
    engine: Arc<dyn OcrEngine>,
    raw_image: Arc<DynamicImage>,
    exif_orientation: Option<u32>,
    pinned_language: Option<String>,
    recovery: RecoveryConfig,
    job_id: String,
    page: usize,
) -> PageResult {
    let start = Instant::now();

    // Preprocess and select the language on a blocking thread; both recover
    // internally and never fail the page.
    let prepared = {
        let engine = Arc::clone(&engine);
        let raw = Arc::clone(&raw_image);
        tokio::task::spawn_blocking(move || {
            let image = Arc::new(preprocess_image(raw.as_ref().clone(), exif_orientation));
            let language = pinned_language
                .unwrap_or_else(|| select_language(engine.as_ref(), image.as_ref()));
            (image, language)
        })
        .await
    };
    let (image, language) = match prepared {
        Ok(prepared) => prepared,
        Err(e) => {
            error_logging::log_ocr_error(&e, "page_preprocess", &job_id, Some(page), None);
            return PageResult::empty(page, String::new(), elapsed_ms(start));
        }
    };

    let max_attempts = recovery.max_retries + 1;
    let mut attempt = 0;

    loop {
        attempt += 1;

        let engine_call = {
            let engine = Arc::clone(&engine);
            let image = Arc::clone(&image);
            let language = language.clone();
            tokio::task::spawn_blocking(move || engine.recognize(image.as_ref(), &language))
        };

        let timeout = tokio::time::Duration::from_secs(recovery.operation_timeout_secs);
        let error = match tokio::time::timeout(timeout, engine_call).await {
            Ok(Ok(Ok(blocks))) => {
                let text = join_block_text(&blocks);
                let confidence = page_confidence(&blocks);
                let block_count = qualifying_block_count(&blocks);
                info!(
                    job_id = %job_id,
                    page,
                    attempt,
                    confidence = format!("{:.2}", confidence),
                    blocks = block_count,
                    "Page OCR completed"
                );
                observability::record_page_metrics(true, start.elapsed(), block_count);
                return PageResult {
                    page,
                    text,
                    confidence,
                    blocks: block_count,
                    lang_used: language,
                    elapsed_ms: elapsed_ms(start),
                };
            }
            Ok(Ok(Err(e))) => e,
            Ok(Err(join_err)) => OcrError::Extraction(format!("OCR task failed: {}", join_err)),
            Err(_) => OcrError::Timeout(format!(
                "Page OCR timed out after {} seconds",
                recovery.operation_timeout_secs
            )),
        };

        if attempt >= max_attempts {
            error_logging::log_ocr_error(
                &error,
                "page_ocr",
                &job_id,
                Some(page),
                Some(start.elapsed()),
            );
            observability::record_page_metrics(false, start.elapsed(), 0);
            return PageResult::empty(page, language, elapsed_ms(start));
        }

        let delay_ms = calculate_retry_delay(attempt, &recovery);
        warn!(
            job_id = %job_id,
            page,
            attempt,
            error = %error,
            "Page OCR attempt failed. Retrying in {}ms",
            delay_ms
        );
        tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
    }
}

/// Run the full OCR acquisition stage for one document.
///
/// Pages run concurrently up to `page_concurrency`; results are reassembled
/// in ascending page order regardless of completion order.
pub async fn extract_document_text(
    document: &Document,
    config: &OcrConfig,
    engine: Arc<dyn OcrEngine>,
) -> AppResult<DocumentText> {
    let start = Instant::now();
    let bytes = document.read_bytes()?;

    let (page_images, exif_orientation) = if document.is_pdf() {
        let pages = rasterize_pdf(&bytes, config.pdf_render_dpi).map_err(AppError::from)?;
        (pages, None)
    } else {
        let orientation = read_exif_orientation(&bytes);
        let image = image::load_from_memory(&bytes).map_err(|e| {
            AppError::from(OcrError::ImageLoad(format!(
                "Failed to decode image {}: {}",
                document.path.display(),
                e
            )))
        })?;
        (vec![image], orientation)
    };

    info!(
        job_id = %document.job_id,
        pages = page_images.len(),
        concurrency = config.page_concurrency,
        "Starting page OCR fan-out"
    );

    let semaphore = Arc::new(Semaphore::new(config.page_concurrency));
    let mut handles = Vec::with_capacity(page_images.len());

    for (index, page_image) in page_images.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let engine = Arc::clone(&engine);
        let recovery = config.recovery.clone();
        let job_id = document.job_id.clone();
        let raw = Arc::new(page_image);

        handles.push(tokio::spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .expect("page semaphore closed");
            ocr_page(engine, raw, exif_orientation, None, recovery, job_id, index + 1).await
        }));
    }

    // Awaiting handles in spawn order reassembles pages in page-index order
    // no matter which pages finished first.
    let mut pages = Vec::with_capacity(handles.len());
    for handle in handles {
        let result = handle
            .await
            .map_err(|e| AppError::Internal(format!("Page OCR task panicked: {}", e)))?;
        pages.push(result);
    }

    let document_text = aggregate_pages(pages, elapsed_ms(start));

    if document_text
        .pages
        .iter()
        .all(|p| p.text.trim().is_empty())
    {
        return Err(AppError::EmptyDocument(format!(
            "OCR returned no usable text for {} ({} pages). Document may be blank, blurry, or corrupted.",
            document.job_id,
            document_text.pages.len()
        )));
    }

    info!(
        job_id = %document.job_id,
        pages = document_text.pages.len(),
        confidence = format!("{:.2}", document_text.confidence),
        elapsed_ms = document_text.elapsed_ms,
        "Document OCR completed"
    );

    Ok(document_text)
}

/// Concatenate page results with page-boundary markers and average their
/// confidences, unweighted by page length.
pub fn aggregate_pages(pages: Vec<PageResult>, elapsed_ms: u64) -> DocumentText {
    let text = pages
        .iter()
        .map(|p| {
            format!(
                "--- Page {} (conf: {:.2}) ---\n{}",
                p.page, p.confidence, p.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let confidence = if pages.is_empty() {
        0.0
    } else {
        pages.iter().map(|p| p.confidence).sum::<f64>() / pages.len() as f64
    };

    DocumentText {
        text,
        confidence,
        pages,
        elapsed_ms,
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_delay_grows_exponentially_with_cap() {
        let recovery = RecoveryConfig {
            max_retries: 5,
            base_retry_delay_ms: 500,
            max_retry_delay_ms: 2000,
            operation_timeout_secs: 30,
        };
        let d1 = calculate_retry_delay(1, &recovery);
        let d2 = calculate_retry_delay(2, &recovery);
        let d4 = calculate_retry_delay(4, &recovery);
        assert!((500..625).contains(&d1));
        assert!((1000..1250).contains(&d2));
        // capped at max_retry_delay_ms plus jitter
        assert!((2000..2500).contains(&d4));
    }

    #[test]
    fn test_aggregate_pages_orders_and_averages() {
        let pages = vec![
            PageResult {
                page: 1,
                text: "first page".to_string(),
                confidence: 80.0,
                blocks: 2,
                lang_used: "eng".to_string(),
                elapsed_ms: 10,
            },
            PageResult {
                page: 2,
                text: "second page".to_string(),
                confidence: 60.0,
                blocks: 2,
                lang_used: "eng".to_string(),
                elapsed_ms: 12,
            },
        ];
        let aggregated = aggregate_pages(pages, 25);
        assert_eq!(aggregated.confidence, 70.0);
        let first = aggregated.text.find("first page").unwrap();
        let second = aggregated.text.find("second page").unwrap();
        assert!(first < second);
        assert!(aggregated.text.contains("--- Page 1 (conf: 80.00) ---"));
        assert!(aggregated.text.contains("--- Page 2 (conf: 60.00) ---"));
    }

    #[test]
    fn test_aggregate_zero_pages_is_zero_confidence() {
        let aggregated = aggregate_pages(Vec::new(), 0);
        assert_eq!(aggregated.confidence, 0.0);
        assert!(aggregated.text.is_empty());
    }
}
