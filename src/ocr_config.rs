//! # OCR Configuration Module
//!
//! This module defines configuration structures for the OCR acquisition stage,
//! including recovery settings, document preconditions, and rasterization
//! parameters.

// Constants for OCR configuration
pub const DEFAULT_LANGUAGES: &str = "eng+hin+tam";
pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024; // 50MB ceiling for uploaded documents
pub const PDF_RENDER_DPI: u32 = 300;
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["pdf", "jpg", "jpeg", "png", "bmp", "tiff"];

/// Recovery configuration for error handling
#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Base delay between retries in milliseconds
    pub base_retry_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_retry_delay_ms: u64,
    /// Timeout for a single page OCR operation in seconds
    pub operation_timeout_secs: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_retry_delay_ms: 500,   // 0.5 seconds
            max_retry_delay_ms: 5000,   // 5 seconds
            operation_timeout_secs: 30, // 30 seconds
        }
    }
}

impl RecoveryConfig {
    /// Validate recovery configuration parameters
    pub fn validate(&self) -> crate::errors::AppResult<()> {
        if self.base_retry_delay_ms == 0 {
            return Err(crate::errors::AppError::Config(
                "base_retry_delay_ms must be greater than 0".to_string(),
            ));
        }
        if self.max_retry_delay_ms < self.base_retry_delay_ms {
            return Err(crate::errors::AppError::Config(format!(
                "max_retry_delay_ms ({}) must be >= base_retry_delay_ms ({})",
                self.max_retry_delay_ms, self.base_retry_delay_ms
            )));
        }
        if self.operation_timeout_secs == 0 {
            return Err(crate::errors::AppError::Config(
                "operation_timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Page Segmentation Mode for Tesseract OCR
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PageSegMode {
    /// Fully automatic page segmentation
    #[default]
    Auto = 3,
    /// Assume a single column of text
    SingleColumn = 4,
    /// Assume a single uniform block of text
    SingleBlock = 6,
    /// Find as much text as possible in no particular order
    SparseText = 11,
}

impl PageSegMode {
    /// Convert PSM mode to string value for Tesseract
    pub fn as_str(&self) -> &'static str {
        match self {
            PageSegMode::Auto => "3",
            PageSegMode::SingleColumn => "4",
            PageSegMode::SingleBlock => "6",
            PageSegMode::SparseText => "11",
        }
    }
}

/// OCR configuration for document processing
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Tesseract language profile (e.g. "eng", "eng+hin+tam")
    pub languages: String,
    /// Page segmentation mode
    pub psm_mode: PageSegMode,
    /// Maximum document file size in bytes
    pub max_file_size: u64,
    /// Rasterization resolution for PDF pages
    pub pdf_render_dpi: u32,
    /// Maximum number of pages OCR'd concurrently within one document
    pub page_concurrency: usize,
    /// Error recovery settings
    pub recovery: RecoveryConfig,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            languages: DEFAULT_LANGUAGES.to_string(),
            psm_mode: PageSegMode::default(),
            max_file_size: MAX_FILE_SIZE,
            pdf_render_dpi: PDF_RENDER_DPI,
            page_concurrency: 4,
            recovery: RecoveryConfig::default(),
        }
    }
}

impl OcrConfig {
    /// Validate OCR configuration
    pub fn validate(&self) -> crate::errors::AppResult<()> {
        if self.languages.trim().is_empty() {
            return Err(crate::errors::AppError::Config(
                "languages cannot be empty".to_string(),
            ));
        }
        if self.max_file_size == 0 {
            return Err(crate::errors::AppError::Config(
                "max_file_size must be greater than 0".to_string(),
            ));
        }
        if self.pdf_render_dpi < 72 || self.pdf_render_dpi > 600 {
            return Err(crate::errors::AppError::Config(format!(
                "pdf_render_dpi ({}) must be between 72 and 600",
                self.pdf_render_dpi
            )));
        }
        if self.page_concurrency == 0 {
            return Err(crate::errors::AppError::Config(
                "page_concurrency must be greater than 0".to_string(),
            ));
        }
        self.recovery.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(OcrConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_dpi_rejected() {
        let config = OcrConfig {
            pdf_render_dpi: 10,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = OcrConfig {
            page_concurrency: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_delays_must_be_ordered() {
        let recovery = RecoveryConfig {
            base_retry_delay_ms: 2000,
            max_retry_delay_ms: 1000,
            ..Default::default()
        };
        assert!(recovery.validate().is_err());
    }
}
