//! # Image Preprocessing Module
//!
//! Normalizes a page image before OCR with a fixed transform order:
//! EXIF orientation correction, grayscale conversion, median-filter denoise,
//! sharpening, and a 1.5x upscale. Preprocessing never fails the pipeline;
//! on any error the original image is returned with a warning and OCR
//! proceeds on the best available image.

use image::imageops::FilterType;
use image::DynamicImage;
use tracing::{debug, warn};

/// Both dimensions are scaled by this factor after filtering
const UPSCALE_FACTOR: f32 = 1.5;

/// Upper bound on either dimension after upscaling. Prevents OOM on
/// adversarially large inputs; hitting it falls back to the original image.
const MAX_DIMENSION_PX: u32 = 8192;

/// Standard 3x3 sharpening kernel
const SHARPEN_KERNEL: [f32; 9] = [0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0];

/// Errors internal to the preprocessing chain. These are recovered locally;
/// callers always receive an image.
#[derive(Debug, Clone)]
pub enum PreprocessingError {
    /// Image processing operation failed
    ProcessingFailed { message: String },
    /// Upscaled dimensions would exceed the safety bound
    ImageTooLarge { width: u32, height: u32 },
}

impl std::fmt::Display for PreprocessingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreprocessingError::ProcessingFailed { message } => {
                write!(f, "Image processing failed: {}", message)
            }
            PreprocessingError::ImageTooLarge { width, height } => {
                write!(
                    f,
                    "Upscaled dimensions {}x{} exceed the {}px bound",
                    width, height, MAX_DIMENSION_PX
                )
            }
        }
    }
}

impl std::error::Error for PreprocessingError {}

/// Read the EXIF orientation tag from raw image bytes, if present.
///
/// Phone photos routinely carry orientation metadata instead of rotated
/// pixels; Tesseract needs the pixels upright.
pub fn read_exif_orientation(bytes: &[u8]) -> Option<u32> {
    let mut cursor = std::io::Cursor::new(bytes);
    let exif = exif::Reader::new().read_from_container(&mut cursor).ok()?;
    exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
}

/// Apply the fixed preprocessing chain, falling back to the unmodified input
/// on any failure.
pub fn preprocess_image(image: DynamicImage, orientation: Option<u32>) -> DynamicImage {
    match apply_chain(&image, orientation) {
        Ok(processed) => {
            debug!(
                width = processed.width(),
                height = processed.height(),
                "Image preprocessing complete"
            );
            processed
        }
        Err(e) => {
            warn!(error = %e, "Image preprocessing failed; using original image");
            image
        }
    }
}

fn apply_chain(
    image: &DynamicImage,
    orientation: Option<u32>,
) -> Result<DynamicImage, PreprocessingError> {
    // 1. EXIF orientation correction; unrecognized tag values are no-ops
    let oriented = match orientation {
        Some(3) => image.rotate180(),
        Some(6) => image.rotate90(),
        Some(8) => image.rotate270(),
        _ => image.clone(),
    };

    // 2. Grayscale, 3. salt-and-pepper denoise, 4. sharpen
    let gray = oriented.to_luma8();
    let denoised = imageproc::filter::median_filter(&gray, 1, 1);
    let sharpened = DynamicImage::ImageLuma8(denoised).filter3x3(&SHARPEN_KERNEL);

    // 5. 1.5x upscale on both dimensions
    let new_width = (sharpened.width() as f32 * UPSCALE_FACTOR) as u32;
    let new_height = (sharpened.height() as f32 * UPSCALE_FACTOR) as u32;
    if new_width == 0 || new_height == 0 {
        return Err(PreprocessingError::ProcessingFailed {
            message: "image has zero dimension".to_string(),
        });
    }
    if new_width > MAX_DIMENSION_PX || new_height > MAX_DIMENSION_PX {
        return Err(PreprocessingError::ImageTooLarge {
            width: new_width,
            height: new_height,
        });
    }

    Ok(sharpened.resize_exact(new_width, new_height, FilterType::CatmullRom))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, RgbImage};

    fn checkerboard(width: u32, height: u32) -> DynamicImage {
        let img = GrayImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Luma([220u8])
            } else {
                Luma([40u8])
            }
        });
        DynamicImage::ImageLuma8(img)
    }

    #[test]
    fn test_preprocessing_upscales_dimensions() {
        let processed = preprocess_image(checkerboard(40, 20), None);
        assert_eq!(processed.width(), 60);
        assert_eq!(processed.height(), 30);
    }

    #[test]
    fn test_orientation_six_swaps_dimensions() {
        let processed = preprocess_image(checkerboard(40, 20), Some(6));
        // rotated 90 degrees before the 1.5x upscale
        assert_eq!(processed.width(), 30);
        assert_eq!(processed.height(), 60);
    }

    #[test]
    fn test_unknown_orientation_is_noop() {
        let processed = preprocess_image(checkerboard(40, 20), Some(7));
        assert_eq!(processed.width(), 60);
        assert_eq!(processed.height(), 30);
    }

    #[test]
    fn test_oversized_upscale_falls_back_to_original() {
        let original = DynamicImage::ImageRgb8(RgbImage::new(8000, 10));
        let processed = preprocess_image(original.clone(), None);
        // 1.5x would exceed the dimension bound, so the original is returned
        assert_eq!(processed.width(), original.width());
        assert_eq!(processed.height(), original.height());
    }

    #[test]
    fn test_exif_orientation_absent_in_plain_png() {
        let mut bytes = Vec::new();
        checkerboard(4, 4)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        assert_eq!(read_exif_orientation(&bytes), None);
    }
}
