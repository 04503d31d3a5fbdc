//! # Mediscan Document Pipeline
//!
//! Ingests scanned or photographed medical documents and produces
//! structured, typed clinical data: OCR acquisition with per-page
//! confidence, tiered heuristic field extraction onto a fixed schema of
//! lab/vitals/prescription fields, and report-category classification that
//! routes the result to the correct persistence shape.

pub mod aliases;
pub mod classifier;
pub mod config;
pub mod db;
pub mod document;
pub mod engine;
pub mod errors;
pub mod extraction;
pub mod instance_manager;
pub mod language;
pub mod observability;
pub mod ocr;
pub mod ocr_config;
pub mod ocr_errors;
pub mod parsers;
pub mod pdf;
pub mod pipeline;
pub mod preprocessing;
pub mod report;

// Re-export types for easier access
pub use classifier::{classify, classify_keys, RoutingDecision};
pub use engine::{OcrEngine, TesseractEngine, TextBlock};
pub use extraction::{EntityRecognizer, ExtractedField, ExtractionMethod, FieldValue};
pub use pipeline::{Pipeline, ProcessingOutcome};
pub use report::{assemble_report, StructuredReport};
