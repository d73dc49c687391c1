//! Bubble mark detection.
//!
//! Works on the inverted binary page, where pencil and ink are white. The
//! dominant connected blob inside a bubble's window is the mark; blobs below
//! the configured area are treated as scanner noise.

use crate::detector::FieldOutcome;
use crate::detector::connected_components::largest_blob;
use crate::detector::region::extract_region;
use crate::error::Result;
use crate::models::{Answer, BubbleAnswer, BubbleField, Point};
use image::GrayImage;

/// Blobs smaller than this many pixels are noise
pub const DEFAULT_MIN_BLOB_AREA: usize = 3;

/// Classify one bubble field on the inverted page
pub fn detect_mark(field: &BubbleField, inverted: &GrayImage, min_area: usize) -> FieldOutcome {
    match read_bubble(field, inverted, min_area) {
        Ok(Some(answer)) => FieldOutcome::Hit(Answer::Bubble(answer)),
        Ok(None) => FieldOutcome::NoHit,
        Err(err) => {
            tracing::debug!(field = %field.id, error = %err, "bubble field unreadable");
            FieldOutcome::SoftError(err.to_string())
        }
    }
}

fn read_bubble(field: &BubbleField, inverted: &GrayImage, min_area: usize) -> Result<Option<BubbleAnswer>> {
    let region = extract_region(inverted, &field.id, &field.corners)?;
    let Some(blob) = largest_blob(&region.image) else {
        return Ok(None);
    };
    if blob.area < min_area {
        tracing::trace!(field = %field.id, area = blob.area, "blob below noise floor");
        return Ok(None);
    }

    let local_tl = Point::new(blob.x as f32, blob.y as f32);
    let local_br = Point::new((blob.x + blob.width) as f32, (blob.y + blob.height) as f32);
    Ok(Some(BubbleAnswer {
        id: field.id.clone(),
        key: field.question.clone(),
        value: field.value.clone(),
        top_left: region.to_page(&local_tl),
        bottom_right: region.to_page(&local_br),
        blob_area: blob.area,
    }))
}
