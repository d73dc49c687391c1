//! omr_engine - Optical mark recognition for scanned paper forms
//!
//! Applies a form template (calibration corners plus barcode and bubble
//! fields) to a scanned page and produces a structured, deduplicated answer
//! set. The pipeline registers the scan into template space, decodes barcode
//! fields on the grayscale page, thresholds and inverts it, classifies every
//! bubble by its dominant blob and finally groups the hits into rows.

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Grouping and deduplication of field hits
pub mod aggregate;
/// Engine configuration
pub mod config;
/// Intermediate-image capture
pub mod debug;
/// Registration, cropping, barcode and bubble detection
pub mod detector;
/// Error types
pub mod error;
/// Core data structures (Template, Field, OmrPageOutput, Point, etc.)
pub mod models;
/// Page pipeline and state machine
pub mod pipeline;
/// Scanned-image readiness contract
pub mod scan;
/// Utility functions (grayscale, binarization)
pub mod utils;

pub use config::EngineConfig;
pub use detector::FieldOutcome;
pub use detector::barcode::{BarcodeOptions, BarcodeReader, BarcodeResult, QrReader};
pub use error::{OmrError, ScanError, TemplateError};
pub use models::{
    Answer, AnswerRecord, BarcodeAnswer, BarcodeField, BarcodeFormat, BubbleAnswer, BubbleField,
    Field, OmrPageOutput, Point, Quad, RowGroup, ScanOutcome, Size, Template,
};
pub use pipeline::{Engine, PageState};
pub use scan::{ScanState, ScannedImage, StaticScan};

/// Apply a template to a scanned page with the default engine
///
/// # Example
/// ```
/// use image::{DynamicImage, RgbImage};
/// use omr_engine::{Quad, ScanOutcome, StaticScan, Template};
///
/// let template = Template::new("blank", Quad::from_rect(0.0, 0.0, 32.0, 32.0));
/// let mut scan = StaticScan::new(DynamicImage::ImageRgb8(RgbImage::new(32, 32)), "blank");
/// let output = omr_engine::apply_template(&template, &mut scan).unwrap();
/// assert_eq!(output.outcome, ScanOutcome::Success);
/// # if let Some(path) = output.analyzed_image { let _ = std::fs::remove_file(path); }
/// ```
pub fn apply_template<S>(template: &Template, scan: &mut S) -> Result<OmrPageOutput, ScanError>
where
    S: ScannedImage + ?Sized,
{
    Engine::default().apply_template(template, scan)
}
