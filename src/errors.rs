//! # Application Error Types
//!
//! This module defines common error types used throughout the mediscan pipeline.
//! It provides structured error handling for the document processing stages.

use std::fmt;

/// General application error type for consistent error handling
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Configuration validation errors
    Config(String),
    /// Extension/size precondition failed; rejected before any processing
    UnsupportedFile(String),
    /// OCR produced no usable text; the pipeline cannot proceed to extraction
    EmptyDocument(String),
    /// Classifier could not assign a persistence category
    UnknownReportType(String),
    /// OCR processing errors
    Ocr(String),
    /// Database operation errors
    Database(String),
    /// Internal application errors
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "[CONFIG] {}", msg),
            AppError::UnsupportedFile(msg) => write!(f, "[UNSUPPORTED_FILE] {}", msg),
            AppError::EmptyDocument(msg) => write!(f, "[EMPTY_DOCUMENT] {}", msg),
            AppError::UnknownReportType(msg) => write!(f, "[UNKNOWN_REPORT_TYPE] {}", msg),
            AppError::Ocr(msg) => write!(f, "[OCR] {}", msg),
            AppError::Database(msg) => write!(f, "[DATABASE] {}", msg),
            AppError::Internal(msg) => write!(f, "[INTERNAL] {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<crate::ocr_errors::OcrError> for AppError {
    fn from(err: crate::ocr_errors::OcrError) -> Self {
        AppError::Ocr(err.to_string())
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Standardized error logging utilities for consistent error reporting across the pipeline
pub mod error_logging {
    use tracing::error;

    /// Log OCR processing errors with image and processing context
    pub fn log_ocr_error(
        error: &impl std::fmt::Display,
        operation: &str,
        job_id: &str,
        page: Option<usize>,
        processing_duration: Option<std::time::Duration>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            job_id = %job_id,
            page = ?page,
            processing_duration_ms = ?processing_duration.map(|d| d.as_millis()),
            "OCR processing failed"
        );
    }

    /// Log document pipeline errors with the stage that failed
    pub fn log_pipeline_error(
        error: &impl std::fmt::Display,
        stage: &str,
        job_id: &str,
        file_path: Option<&str>,
    ) {
        error!(
            error = %error,
            stage = %stage,
            job_id = %job_id,
            file_path = ?file_path,
            "Document processing failed"
        );
    }

    /// Log database operation errors with contextual information
    pub fn log_database_error(
        error: &impl std::fmt::Display,
        operation: &str,
        patient_id: Option<&str>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            patient_id = ?patient_id,
            "Database operation failed"
        );
    }

    /// Log configuration errors during startup/initialization
    pub fn log_config_error(error: &impl std::fmt::Display, config_key: &str, operation: &str) {
        error!(
            error = %error,
            config_key = %config_key,
            operation = %operation,
            "Configuration error"
        );
    }
}
