//! # Language Selector
//!
//! Samples a page with an English-biased OCR pass, detects the natural
//! language of the sampled text, and maps it to a Tesseract language profile.
//! Detection is heuristic script counting: the document population is
//! English, Hindi, and Tamil, and those scripts are unambiguous at the
//! character level. Any detection failure or unmapped code falls back to the
//! fixed multi-language profile so OCR is never blocked on ambiguity.

use image::DynamicImage;
use tracing::{debug, warn};

use crate::engine::{join_block_text, OcrEngine};
use crate::ocr_config::DEFAULT_LANGUAGES;

/// Minimum sampled characters before detection is trusted
const MIN_SAMPLE_CHARS: usize = 20;

/// Select the Tesseract language profile for one preprocessed page.
pub fn select_language(engine: &dyn OcrEngine, image: &DynamicImage) -> String {
    match sample_language(engine, image) {
        Some(profile) => profile,
        None => {
            debug!(fallback = DEFAULT_LANGUAGES, "Using default language profile");
            DEFAULT_LANGUAGES.to_string()
        }
    }
}

fn sample_language(engine: &dyn OcrEngine, image: &DynamicImage) -> Option<String> {
    let blocks = match engine.recognize(image, "eng") {
        Ok(blocks) => blocks,
        Err(e) => {
            warn!(error = %e, "Language detection sample failed");
            return None;
        }
    };
    let sample = join_block_text(&blocks);
    let code = detect_language_code(&sample)?;
    map_language(code).map(str::to_string)
}

/// Map an ISO language code to a Tesseract profile. Unmapped codes yield
/// `None`, which callers turn into the multi-language default.
pub fn map_language(code: &str) -> Option<&'static str> {
    match code {
        "en" => Some("eng"),
        "hi" => Some("hin"),
        "ta" => Some("tam"),
        _ => None,
    }
}

/// Detect the dominant language of sampled text by script frequency.
///
/// Returns an ISO 639-1 code, or `None` when the sample is too short to
/// trust or no known script dominates.
pub fn detect_language_code(text: &str) -> Option<&'static str> {
    let mut latin = 0usize;
    let mut devanagari = 0usize;
    let mut tamil = 0usize;

    for c in text.chars() {
        match c {
            'a'..='z' | 'A'..='Z' => latin += 1,
            '\u{0900}'..='\u{097F}' => devanagari += 1,
            '\u{0B80}'..='\u{0BFF}' => tamil += 1,
            _ => {}
        }
    }

    let total = latin + devanagari + tamil;
    if total < MIN_SAMPLE_CHARS {
        return None;
    }

    if devanagari > latin && devanagari >= tamil {
        Some("hi")
    } else if tamil > latin && tamil > devanagari {
        Some("ta")
    } else {
        Some("en")
    }
}
