//! Barcode field decoding.
//!
//! Symbology decoding is a service behind [`BarcodeReader`]; this module owns
//! the field-level policy around it: cropping the grayscale (pre-threshold)
//! page, optionally retrying with inverted polarity, and mapping the reader's
//! result points back into working-image coordinates.

use crate::detector::FieldOutcome;
use crate::detector::region::{FieldRegion, extract_region};
use crate::models::{Answer, BarcodeAnswer, BarcodeField, BarcodeFormat, Point};
use image::{GrayImage, imageops};
use serde::{Deserialize, Serialize};

/// Vertical margin added below the first result point to approximate a box
pub const DEFAULT_BARCODE_MARGIN: f32 = 10.0;

/// Reader behaviour for barcode fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarcodeOptions {
    /// Also attempt the region with swapped black/white polarity
    pub try_inverted: bool,
    /// Spend extra attempts (upscaled region) before giving up
    pub try_harder: bool,
}

impl Default for BarcodeOptions {
    fn default() -> Self {
        Self {
            try_inverted: true,
            try_harder: false,
        }
    }
}

/// Symbol decoded from a field region
#[derive(Debug, Clone, PartialEq)]
pub struct BarcodeResult {
    /// Decoded text
    pub text: String,
    /// Symbology
    pub format: BarcodeFormat,
    /// Result points, local to the region that was decoded
    pub points: Vec<Point>,
}

/// Symbology decoding service
pub trait BarcodeReader: Send + Sync {
    /// Decode a single attempt on a grayscale region
    fn decode(&self, region: &GrayImage) -> Option<BarcodeResult>;
}

/// QR code reader backed by `rqrr`
#[derive(Debug, Clone, Copy, Default)]
pub struct QrReader {
    try_harder: bool,
}

impl QrReader {
    /// Create a reader; `try_harder` adds a 2x upscaled attempt
    pub fn new(try_harder: bool) -> Self {
        Self { try_harder }
    }

    fn decode_once(region: &GrayImage) -> Option<BarcodeResult> {
        let (w, h) = region.dimensions();
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(w as usize, h as usize, |x, y| {
            region.get_pixel(x as u32, y as u32).0[0]
        });
        prepared.detect_grids().into_iter().find_map(|grid| {
            let (_meta, text) = grid.decode().ok()?;
            let points = grid
                .bounds
                .iter()
                .map(|p| Point::new(p.x as f32, p.y as f32))
                .collect();
            Some(BarcodeResult {
                text,
                format: BarcodeFormat::QrCode,
                points,
            })
        })
    }
}

impl BarcodeReader for QrReader {
    fn decode(&self, region: &GrayImage) -> Option<BarcodeResult> {
        if let Some(result) = Self::decode_once(region) {
            return Some(result);
        }
        if !self.try_harder {
            return None;
        }

        let (w, h) = region.dimensions();
        let upscaled = imageops::resize(region, w * 2, h * 2, imageops::FilterType::Nearest);
        Self::decode_once(&upscaled).map(|mut result| {
            for p in &mut result.points {
                *p = Point::new(p.x / 2.0, p.y / 2.0);
            }
            result
        })
    }
}

/// Decode one barcode field on the grayscale page
pub fn decode_field<R: BarcodeReader + ?Sized>(
    reader: &R,
    field: &BarcodeField,
    gray: &GrayImage,
    options: &BarcodeOptions,
    margin: f32,
) -> FieldOutcome {
    let region = match extract_region(gray, &field.id, &field.corners) {
        Ok(region) => region,
        Err(err) => {
            tracing::debug!(field = %field.id, error = %err, "barcode window unavailable");
            return FieldOutcome::NoHit;
        }
    };

    match decode_region(reader, &region, options) {
        Some(result) => match locate(&region, &result, margin) {
            Some((top_left, bottom_right)) => {
                tracing::debug!(field = %field.id, text = %result.text, "barcode decoded");
                FieldOutcome::Hit(Answer::Barcode(BarcodeAnswer {
                    id: field.id.clone(),
                    data: result.text,
                    format: result.format,
                    top_left,
                    bottom_right,
                }))
            }
            None => FieldOutcome::NoHit,
        },
        None => FieldOutcome::NoHit,
    }
}

fn decode_region<R: BarcodeReader + ?Sized>(
    reader: &R,
    region: &FieldRegion,
    options: &BarcodeOptions,
) -> Option<BarcodeResult> {
    if let Some(result) = reader.decode(&region.image) {
        return Some(result);
    }
    if !options.try_inverted {
        return None;
    }
    let mut inverted = region.image.clone();
    imageops::invert(&mut inverted);
    reader.decode(&inverted)
}

/// Page-space box for a decode result.
///
/// The box spans from the first result point to the second point's column,
/// `margin` pixels below the first point's row.
pub fn locate(region: &FieldRegion, result: &BarcodeResult, margin: f32) -> Option<(Point, Point)> {
    let first = *result.points.first()?;
    let second = result.points.get(1).copied().unwrap_or(first);
    let top_left = region.to_page(&first);
    let bottom_right = Point::new(region.to_page(&second).x, top_left.y + margin);
    Some((top_left, bottom_right))
}
