//! Shared helpers for integration tests: canned OCR engines and on-disk
//! image fixtures. No Tesseract or PDFium binaries are required.

#![allow(dead_code)]

use image::DynamicImage;
use mediscan::engine::{OcrEngine, TextBlock};
use mediscan::ocr_errors::OcrError;
use std::sync::Mutex;

/// OCR engine double that returns the same canned blocks for every call and
/// records the language profile of each invocation.
pub struct CannedEngine {
    blocks: Vec<TextBlock>,
    pub calls: Mutex<Vec<String>>,
}

impl CannedEngine {
    pub fn new(blocks: Vec<TextBlock>) -> Self {
        Self {
            blocks,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Engine that recognizes `text` as a single fully-confident block
    pub fn with_text(text: &str) -> Self {
        Self::new(vec![TextBlock {
            text: text.to_string(),
            confidence: Some(90.0),
        }])
    }

    /// Engine that recognizes nothing at all
    pub fn blank() -> Self {
        Self::new(Vec::new())
    }

    pub fn languages_seen(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl OcrEngine for CannedEngine {
    fn recognize(&self, _image: &DynamicImage, languages: &str) -> Result<Vec<TextBlock>, OcrError> {
        self.calls.lock().unwrap().push(languages.to_string());
        Ok(self.blocks.clone())
    }
}

/// Engine that fails a fixed number of times before succeeding
pub struct FlakyEngine {
    failures_remaining: Mutex<u32>,
    blocks: Vec<TextBlock>,
}

impl FlakyEngine {
    pub fn new(failures: u32, text: &str) -> Self {
        Self {
            failures_remaining: Mutex::new(failures),
            blocks: vec![TextBlock {
                text: text.to_string(),
                confidence: Some(80.0),
            }],
        }
    }
}

impl OcrEngine for FlakyEngine {
    fn recognize(&self, _image: &DynamicImage, _languages: &str) -> Result<Vec<TextBlock>, OcrError> {
        let mut remaining = self.failures_remaining.lock().unwrap();
        if *remaining > 0 {
            *remaining -= 1;
            return Err(OcrError::Extraction("transient engine failure".to_string()));
        }
        Ok(self.blocks.clone())
    }
}

/// Engine that always fails
pub struct BrokenEngine;

impl OcrEngine for BrokenEngine {
    fn recognize(&self, _image: &DynamicImage, _languages: &str) -> Result<Vec<TextBlock>, OcrError> {
        Err(OcrError::Extraction("engine is down".to_string()))
    }
}

/// Encode a small grayscale test image as PNG bytes
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = DynamicImage::new_luma8(width, height);
    let mut bytes = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

/// Write a PNG fixture into a temp directory, returning the directory guard
/// and the file path.
pub fn png_fixture(dir: &tempfile::TempDir, name: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, png_bytes(16, 16)).unwrap();
    path
}
