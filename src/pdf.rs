//! # PDF Rasterization
//!
//! Renders PDF pages to raster images via Google PDFium so scanned PDFs run
//! through the same per-page OCR pipeline as photographs. Pages render at a
//! fixed DPI with a dimension guard against absurd page sizes.
//!
//! The `Pdfium` handle is loaded per call because the upstream type is not
//! `Send`; the OS caches the underlying `dlopen`, so repeat loads are cheap.

use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::{debug, warn};

use crate::ocr_errors::OcrError;

/// PDF points per inch (standard PDF unit)
const POINTS_PER_INCH: f32 = 72.0;

/// Maximum dimension (width or height) for rendered page images
const MAX_DIMENSION_PX: u32 = 4096;

/// Load the PDFium dynamic library.
///
/// Discovery order: `PDFIUM_DYNAMIC_LIB_PATH` env var, then the system
/// library search paths.
fn load_pdfium() -> Result<Pdfium, OcrError> {
    if let Ok(path) = std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
        debug!(path = %path, "Loading PDFium from env var");
        let bindings = Pdfium::bind_to_library(&path).map_err(|e| {
            OcrError::PdfRender(format!("Failed to load PDFium from {}: {}", path, e))
        })?;
        return Ok(Pdfium::new(bindings));
    }

    let bindings = Pdfium::bind_to_system_library().map_err(|e| {
        OcrError::PdfRender(format!(
            "PDFium library not found. Set PDFIUM_DYNAMIC_LIB_PATH or install PDFium: {}",
            e
        ))
    })?;
    Ok(Pdfium::new(bindings))
}

/// Compute pixel dimensions for rendering, applying the dimension guard.
///
/// Preserves aspect ratio when capping; both dimensions stay in
/// `[1, MAX_DIMENSION_PX]`.
fn compute_render_dimensions(width_points: f32, height_points: f32, dpi: u32) -> (u32, u32) {
    let scale = dpi as f32 / POINTS_PER_INCH;
    let raw_w = (width_points * scale).max(1.0);
    let raw_h = (height_points * scale).max(1.0);

    let max_dim = raw_w.max(raw_h);
    if max_dim > MAX_DIMENSION_PX as f32 {
        let ratio = MAX_DIMENSION_PX as f32 / max_dim;
        let w = ((raw_w * ratio) as u32).clamp(1, MAX_DIMENSION_PX);
        let h = ((raw_h * ratio) as u32).clamp(1, MAX_DIMENSION_PX);
        (w, h)
    } else {
        (raw_w as u32, raw_h as u32)
    }
}

/// Rasterize every page of a PDF at the given DPI, in page order.
pub fn rasterize_pdf(pdf_bytes: &[u8], dpi: u32) -> Result<Vec<DynamicImage>, OcrError> {
    let pdfium = load_pdfium()?;
    let document = pdfium
        .load_pdf_from_byte_slice(pdf_bytes, None)
        .map_err(|e| OcrError::PdfRender(format!("Failed to load PDF: {}", e)))?;

    let pages = document.pages();
    let mut images = Vec::with_capacity(pages.len() as usize);

    for (index, page) in pages.iter().enumerate() {
        let width_points = page.width().value;
        let height_points = page.height().value;
        let (target_w, target_h) = compute_render_dimensions(width_points, height_points, dpi);

        let uncapped_w = (width_points * dpi as f32 / POINTS_PER_INCH) as u32;
        if target_w != uncapped_w {
            warn!(
                page = index,
                capped_width = target_w,
                capped_height = target_h,
                "Page dimensions capped to {}px",
                MAX_DIMENSION_PX
            );
        }

        let config = PdfRenderConfig::new()
            .set_target_width(target_w as i32)
            .set_maximum_height(target_h as i32);

        let bitmap = page.render_with_config(&config).map_err(|e| {
            OcrError::PdfRender(format!("Rendering failed on page {}: {}", index + 1, e))
        })?;

        debug!(page = index + 1, width = target_w, height = target_h, "Rendered PDF page");
        images.push(bitmap.as_image());
    }

    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a4_at_300_dpi() {
        // A4 is 595x842 points; at 300 DPI both dimensions stay in the guard
        let (w, h) = compute_render_dimensions(595.0, 842.0, 300);
        assert_eq!(w, 2479);
        assert_eq!(h, 3508);
    }

    #[test]
    fn test_oversized_page_is_capped_with_aspect_ratio() {
        let (w, h) = compute_render_dimensions(2000.0, 4000.0, 300);
        assert!(w <= MAX_DIMENSION_PX && h <= MAX_DIMENSION_PX);
        assert!(h >= MAX_DIMENSION_PX - 1);
        // 1:2 aspect ratio survives the cap
        assert!((h as f32 / w as f32 - 2.0).abs() < 0.01);
    }

    #[test]
    fn test_tiny_page_never_collapses_to_zero() {
        let (w, h) = compute_render_dimensions(0.1, 0.1, 72);
        assert!(w >= 1 && h >= 1);
    }
}
