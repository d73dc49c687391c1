//! Registration of a scanned page into template space.
//!
//! The transform is a pure scale and translate: the scan is resampled to the
//! extent spanned by the template's top and left calibration edges and drawn
//! onto a canvas the size of the template's bottom-right corner, offset by the
//! top-left corner. Rotation and skew are not corrected.

use crate::error::{OmrError, Result};
use crate::models::{Point, Quad};
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};

/// Largest RGB buffer registration will allocate, in bytes
pub const MAX_CANVAS_BYTES: u64 = 1 << 31;

/// Pixel dimensions for a float extent, rejecting sizes past the allocation budget
fn checked_extent(what: &str, width: f32, height: f32) -> Result<(u32, u32)> {
    let too_large = || {
        OmrError::Registration(format!(
            "{} {}x{} exceeds the {} byte image budget",
            what, width, height, MAX_CANVAS_BYTES
        ))
    };
    if !width.is_finite() || !height.is_finite() || width > u32::MAX as f32 || height > u32::MAX as f32 {
        return Err(too_large());
    }
    let (w, h) = (width as u32, height as u32);
    let bytes = (w as u64)
        .checked_mul(h as u64)
        .and_then(|px| px.checked_mul(3))
        .ok_or_else(too_large)?;
    if bytes > MAX_CANVAS_BYTES {
        return Err(too_large());
    }
    Ok((w, h))
}

/// Scale and offset mapping scan pixels onto the template canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegistrationTransform {
    /// Canvas width in pixels
    pub canvas_width: u32,
    /// Canvas height in pixels
    pub canvas_height: u32,
    /// Resampled scan width
    pub target_width: u32,
    /// Resampled scan height
    pub target_height: u32,
    /// Horizontal scale factor
    pub scale_x: f32,
    /// Vertical scale factor
    pub scale_y: f32,
    /// Where the scan's origin lands on the canvas
    pub offset: Point,
}

impl RegistrationTransform {
    /// Compute the transform for a scan of `scan_width` x `scan_height`
    pub fn new(corners: &Quad, scan_width: u32, scan_height: u32) -> Result<Self> {
        let canvas = corners.bottom_right;
        let (width, height) = (corners.width(), corners.height());

        if !(canvas.x >= 1.0 && canvas.y >= 1.0) {
            return Err(OmrError::Registration(format!(
                "canvas {}x{} must be positive",
                canvas.x, canvas.y
            )));
        }
        if !(width >= 1.0 && height >= 1.0) {
            return Err(OmrError::Registration(format!(
                "calibration extent {}x{} must be positive",
                width, height
            )));
        }
        if scan_width == 0 || scan_height == 0 {
            return Err(OmrError::Registration(format!(
                "scanned image {}x{} is empty",
                scan_width, scan_height
            )));
        }

        let (canvas_width, canvas_height) = checked_extent("canvas", canvas.x, canvas.y)?;
        let (target_width, target_height) =
            checked_extent("calibration extent", width.round(), height.round())?;

        Ok(Self {
            canvas_width,
            canvas_height,
            target_width,
            target_height,
            scale_x: width / scan_width as f32,
            scale_y: height / scan_height as f32,
            offset: corners.top_left,
        })
    }

    /// Map a scan pixel position into template space
    pub fn map_point(&self, p: &Point) -> Point {
        Point::new(
            p.x * self.scale_x + self.offset.x,
            p.y * self.scale_y + self.offset.y,
        )
    }

    /// True when the scan is drawn without resampling or translation
    pub fn is_identity(&self) -> bool {
        self.scale_x == 1.0 && self.scale_y == 1.0 && self.offset == Point::default()
    }
}

/// Draw the scan into a new canvas in template coordinate space
pub fn register(scan: &DynamicImage, corners: &Quad) -> Result<RgbImage> {
    let transform = RegistrationTransform::new(corners, scan.width(), scan.height())?;
    tracing::debug!(
        scale_x = transform.scale_x,
        scale_y = transform.scale_y,
        offset_x = transform.offset.x,
        offset_y = transform.offset.y,
        "registering scan"
    );

    let rgb = scan.to_rgb8();
    let placed = if rgb.dimensions() == (transform.target_width, transform.target_height) {
        rgb
    } else {
        imageops::resize(
            &rgb,
            transform.target_width,
            transform.target_height,
            FilterType::Triangle,
        )
    };

    if transform.is_identity() && placed.dimensions() == (transform.canvas_width, transform.canvas_height) {
        return Ok(placed);
    }

    let mut canvas = RgbImage::new(transform.canvas_width, transform.canvas_height);
    imageops::replace(
        &mut canvas,
        &placed,
        transform.offset.x as i64,
        transform.offset.y as i64,
    );
    Ok(canvas)
}
