//! # OCR Instance Manager Module
//!
//! Thread-safe reuse of Tesseract instances keyed by language profile.
//! Initializing Tesseract costs 100-500ms per language profile; a document
//! pipeline that touches the same profile for every page should pay that
//! once, not per page.

use leptess::LepTess;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::info;

use crate::ocr_config::PageSegMode;

/// Pool of Tesseract instances, one per language profile.
///
/// Instances are created on first request and reused for subsequent requests
/// with the same profile. Each instance is wrapped in its own mutex; callers
/// hold the lock only for the duration of one page recognition.
pub struct OcrInstanceManager {
    instances: Mutex<HashMap<String, Arc<Mutex<LepTess>>>>,
}

impl OcrInstanceManager {
    /// Create an empty instance pool
    pub fn new() -> Self {
        Self {
            instances: Mutex::new(HashMap::new()),
        }
    }

    /// Get or create a Tesseract instance for the given language profile.
    ///
    /// # Errors
    ///
    /// Returns an error if Tesseract initialization fails (e.g. language
    /// data files for the profile are not installed).
    pub fn get_instance(
        &self,
        languages: &str,
        psm_mode: PageSegMode,
    ) -> anyhow::Result<Arc<Mutex<LepTess>>> {
        {
            let instances = self
                .instances
                .lock()
                .expect("Failed to acquire instances lock");
            if let Some(instance) = instances.get(languages) {
                return Ok(Arc::clone(instance));
            }
        }

        info!(languages = %languages, "Creating new OCR instance");

        let mut tess = LepTess::new(None, languages)
            .map_err(|e| anyhow::anyhow!("Failed to initialize Tesseract OCR instance: {}", e))?;

        tess.set_variable(leptess::Variable::TesseditPagesegMode, psm_mode.as_str())
            .map_err(|e| anyhow::anyhow!("Failed to set PSM mode: {}", e))?;

        let instance = Arc::new(Mutex::new(tess));

        {
            let mut instances = self
                .instances
                .lock()
                .expect("Failed to acquire instances lock");
            instances.insert(languages.to_string(), Arc::clone(&instance));
        }

        Ok(instance)
    }

    /// Number of cached instances
    pub fn instance_count(&self) -> usize {
        self.instances
            .lock()
            .expect("Failed to acquire instances lock")
            .len()
    }
}

impl Default for OcrInstanceManager {
    fn default() -> Self {
        Self::new()
    }
}
