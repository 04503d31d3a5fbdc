//! # Document Ingestion
//!
//! A [`Document`] is the immutable unit of one pipeline run: a job id, the
//! source path, and the declared extension and size. Ingestion enforces the
//! extension and size preconditions as hard requirements: a document that
//! fails them is rejected before any OCR work happens.

use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{info, warn};

use crate::errors::{AppError, AppResult};
use crate::ocr_config::{OcrConfig, SUPPORTED_EXTENSIONS};

/// One ingested document, owned by the orchestrator for a single run.
#[derive(Debug, Clone)]
pub struct Document {
    /// Job identifier carried through logs and the structured report
    pub job_id: String,
    /// Source file path
    pub path: PathBuf,
    /// Lower-cased file extension without the dot
    pub extension: String,
    /// File size in bytes
    pub size_bytes: u64,
}

impl Document {
    /// Validate and ingest a document file.
    ///
    /// Rejects unsupported extensions and files over the size ceiling before
    /// any processing. Both checks are preconditions, not warnings.
    pub fn ingest(path: impl AsRef<Path>, config: &OcrConfig) -> AppResult<Self> {
        let path = path.as_ref();

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
            warn!(path = %path.display(), extension = %extension, "Unsupported file type");
            return Err(AppError::UnsupportedFile(format!(
                "Unsupported file type: .{} ({})",
                extension,
                path.display()
            )));
        }

        let metadata = std::fs::metadata(path).map_err(|e| {
            AppError::Internal(format!("Cannot read file metadata ({}): {}", path.display(), e))
        })?;

        if !metadata.is_file() {
            return Err(AppError::UnsupportedFile(format!(
                "Path is not a file: {}",
                path.display()
            )));
        }

        let size_bytes = metadata.len();
        if size_bytes > config.max_file_size {
            warn!(
                path = %path.display(),
                size_bytes,
                limit = config.max_file_size,
                "File too large"
            );
            return Err(AppError::UnsupportedFile(format!(
                "File too large: {} bytes (maximum allowed: {} bytes)",
                size_bytes, config.max_file_size
            )));
        }

        if size_bytes == 0 {
            return Err(AppError::UnsupportedFile(format!(
                "File is empty: {}",
                path.display()
            )));
        }

        let job_id = generate_job_id();
        info!(job_id = %job_id, path = %path.display(), size_bytes, "Document ingested");

        Ok(Self {
            job_id,
            path: path.to_path_buf(),
            extension,
            size_bytes,
        })
    }

    /// Whether this document needs PDF rasterization before OCR
    pub fn is_pdf(&self) -> bool {
        self.extension == "pdf"
    }

    /// Read the document bytes from disk
    pub fn read_bytes(&self) -> AppResult<Vec<u8>> {
        std::fs::read(&self.path).map_err(|e| {
            AppError::Internal(format!("Cannot read file ({}): {}", self.path.display(), e))
        })
    }
}

/// Job identifiers: `job_<8 hex chars>_<YYYYmmdd_HHMMSS>`
fn generate_job_id() -> String {
    format!(
        "job_{:08x}_{}",
        rand::random::<u32>(),
        Local::now().format("%Y%m%d_%H%M%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_unsupported_extension_rejected() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(file, "hello").unwrap();
        let err = Document::ingest(file.path(), &OcrConfig::default()).unwrap_err();
        assert!(matches!(err, AppError::UnsupportedFile(_)));
    }

    #[test]
    fn test_oversized_file_rejected() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(&[0u8; 128]).unwrap();
        let config = OcrConfig {
            max_file_size: 64,
            ..Default::default()
        };
        let err = Document::ingest(file.path(), &config).unwrap_err();
        assert!(matches!(err, AppError::UnsupportedFile(_)));
    }

    #[test]
    fn test_valid_image_ingested_with_job_id() {
        let mut file = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
        file.write_all(&[0u8; 64]).unwrap();
        let doc = Document::ingest(file.path(), &OcrConfig::default()).unwrap();
        assert!(doc.job_id.starts_with("job_"));
        assert_eq!(doc.extension, "jpg");
        assert!(!doc.is_pdf());
    }
}
