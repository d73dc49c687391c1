//! Field detection modules
//!
//! This module contains the per-page and per-field image logic:
//! - Registration of the scan into template space
//! - Field region extraction
//! - Barcode decoding on the grayscale page
//! - Connected components and bubble mark detection on the inverted page

use crate::models::Answer;

/// Barcode field decoding over a pluggable reader
pub mod barcode;
/// Bubble classification by dominant blob area
pub mod bubble;
/// Foreground blob labelling
pub mod connected_components;
/// Field window cropping
pub mod region;
/// Scale-and-translate registration into template space
pub mod registration;

/// Result of reading a single field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOutcome {
    /// The field produced an answer
    Hit(Answer),
    /// Nothing was marked or decoded
    NoHit,
    /// The field could not be read; the page carries on
    SoftError(String),
}

impl FieldOutcome {
    /// The answer, for hits
    pub fn answer(&self) -> Option<&Answer> {
        match self {
            FieldOutcome::Hit(answer) => Some(answer),
            FieldOutcome::NoHit | FieldOutcome::SoftError(_) => None,
        }
    }
}
