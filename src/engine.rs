//! # Page OCR Engine
//!
//! The [`OcrEngine`] trait is the seam between the pipeline and the external
//! text-recognition engine: one preprocessed image plus a language profile
//! in, confidence-scored text blocks out. The production implementation
//! drives Tesseract through `leptess`; tests substitute their own engines.

use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

use crate::instance_manager::OcrInstanceManager;
use crate::ocr_config::{OcrConfig, PageSegMode};
use crate::ocr_errors::OcrError;

/// One recognized text block with its engine confidence (0-100 scale).
///
/// A block whose confidence the engine did not report carries `None`; such
/// blocks contribute text but are excluded from confidence aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub text: String,
    pub confidence: Option<f32>,
}

/// External text-recognition collaborator.
///
/// Implementations must be safe to share across the page fan-out; a failure
/// on one page is reported as an error and never aborts sibling pages.
pub trait OcrEngine: Send + Sync {
    /// Recognize text blocks in a preprocessed page image.
    fn recognize(&self, image: &DynamicImage, languages: &str) -> Result<Vec<TextBlock>, OcrError>;
}

/// Whitespace-joined concatenation of recognized block texts, engine order
/// preserved.
pub fn join_block_text(blocks: &[TextBlock]) -> String {
    blocks
        .iter()
        .map(|b| b.text.as_str())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Average of per-block confidences that are present and strictly greater
/// than zero; 0.0 if no block qualifies.
pub fn page_confidence(blocks: &[TextBlock]) -> f64 {
    let qualifying: Vec<f64> = blocks
        .iter()
        .filter_map(|b| b.confidence)
        .filter(|c| *c > 0.0)
        .map(f64::from)
        .collect();
    if qualifying.is_empty() {
        0.0
    } else {
        qualifying.iter().sum::<f64>() / qualifying.len() as f64
    }
}

/// Number of blocks that carry a qualifying confidence value
pub fn qualifying_block_count(blocks: &[TextBlock]) -> usize {
    blocks
        .iter()
        .filter(|b| b.confidence.map(|c| c > 0.0).unwrap_or(false))
        .count()
}

/// Parse Tesseract TSV output into text blocks.
///
/// TSV rows carry 12 tab-separated columns; column 10 is the confidence and
/// column 11 the recognized text. Rows without text (page/block/line
/// structure rows) are skipped. A confidence cell that does not parse as a
/// number yields a block with no confidence.
pub fn parse_tsv_blocks(tsv: &str) -> Vec<TextBlock> {
    let mut blocks = Vec::new();
    for line in tsv.lines() {
        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() < 12 {
            continue;
        }
        let text = columns[11].trim();
        if text.is_empty() {
            continue;
        }
        let confidence = columns[10].trim().parse::<f32>().ok();
        blocks.push(TextBlock {
            text: text.to_string(),
            confidence,
        });
    }
    blocks
}

/// Tesseract-backed [`OcrEngine`] with per-language-profile instance reuse.
pub struct TesseractEngine {
    instances: OcrInstanceManager,
    psm_mode: PageSegMode,
    source_dpi: u32,
}

impl TesseractEngine {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            instances: OcrInstanceManager::new(),
            psm_mode: config.psm_mode,
            source_dpi: config.pdf_render_dpi,
        }
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, image: &DynamicImage, languages: &str) -> Result<Vec<TextBlock>, OcrError> {
        // Tesseract reads images from memory as encoded bytes
        let mut png = Cursor::new(Vec::new());
        image
            .write_to(&mut png, image::ImageFormat::Png)
            .map_err(|e| OcrError::ImageLoad(format!("Failed to encode page image: {}", e)))?;

        let instance = self
            .instances
            .get_instance(languages, self.psm_mode)
            .map_err(|e| OcrError::Initialization(e.to_string()))?;

        let tsv = {
            let mut tess = instance
                .lock()
                .expect("Failed to acquire Tesseract instance lock");
            tess.set_image_from_mem(png.get_ref()).map_err(|e| {
                OcrError::ImageLoad(format!("Failed to load image for OCR: {}", e))
            })?;
            // In-memory pages carry no resolution metadata
            tess.set_source_resolution(self.source_dpi as i32);
            tess.get_tsv_text(0).map_err(|e| {
                OcrError::Extraction(format!("Failed to extract text from image: {}", e))
            })?
        };

        let blocks = parse_tsv_blocks(&tsv);
        debug!(
            languages = %languages,
            blocks = blocks.len(),
            "Tesseract recognition complete"
        );
        Ok(blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(text: &str, confidence: Option<f32>) -> TextBlock {
        TextBlock {
            text: text.to_string(),
            confidence,
        }
    }

    #[test]
    fn test_page_confidence_ignores_zero_and_missing() {
        let blocks = vec![
            block("a", Some(0.0)),
            block("b", Some(55.0)),
            block("c", None),
            block("d", Some(75.0)),
        ];
        assert_eq!(page_confidence(&blocks), 65.0);
        assert_eq!(qualifying_block_count(&blocks), 2);
    }

    #[test]
    fn test_page_confidence_zero_when_nothing_qualifies() {
        let blocks = vec![block("a", Some(-1.0)), block("b", None)];
        assert_eq!(page_confidence(&blocks), 0.0);
        assert_eq!(qualifying_block_count(&blocks), 0);
    }

    #[test]
    fn test_join_block_text_preserves_order() {
        let blocks = vec![
            block("Hemoglobin", Some(90.0)),
            block("", None),
            block("13.5", Some(88.0)),
        ];
        assert_eq!(join_block_text(&blocks), "Hemoglobin 13.5");
    }

    #[test]
    fn test_parse_tsv_skips_structure_rows() {
        let tsv = "1\t1\t0\t0\t0\t0\t0\t0\t300\t400\t-1\t\n\
                   5\t1\t1\t1\t1\t1\t10\t10\t50\t20\t91.5\tHemoglobin\n\
                   5\t1\t1\t1\t1\t2\t70\t10\t40\t20\tx\t13.5\n";
        let blocks = parse_tsv_blocks(tsv);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, "Hemoglobin");
        assert_eq!(blocks[0].confidence, Some(91.5));
        assert_eq!(blocks[1].text, "13.5");
        assert_eq!(blocks[1].confidence, None);
    }
}
