/// Field region extraction: crops a field's window out of the working image
use crate::error::{OmrError, Result};
use crate::models::{Point, Quad};
use image::{GrayImage, imageops};

/// Axis-aligned crop window in working-image pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    /// Left edge
    pub x: u32,
    /// Top edge
    pub y: u32,
    /// Width
    pub width: u32,
    /// Height
    pub height: u32,
}

impl CropWindow {
    /// Window for a field rectangle within an image of the given size.
    ///
    /// Coordinates are truncated to whole pixels. Windows that are empty or
    /// not fully inside the image are rejected.
    pub fn for_field(field_id: &str, corners: &Quad, image_width: u32, image_height: u32) -> Result<Self> {
        let x = corners.top_left.x as i64;
        let y = corners.top_left.y as i64;
        let width = corners.width() as i64;
        let height = corners.height() as i64;

        let inside = x >= 0
            && y >= 0
            && width > 0
            && height > 0
            && x + width <= image_width as i64
            && y + height <= image_height as i64;
        if !inside {
            return Err(OmrError::FieldBounds {
                field_id: field_id.to_string(),
                x,
                y,
                width,
                height,
                image_width,
                image_height,
            });
        }

        Ok(Self {
            x: x as u32,
            y: y as u32,
            width: width as u32,
            height: height as u32,
        })
    }

    /// Top-left offset used to map crop-local points back to the page
    pub fn offset(&self) -> Point {
        Point::new(self.x as f32, self.y as f32)
    }
}

/// A field's pixels, copied out of the working image
#[derive(Debug, Clone)]
pub struct FieldRegion {
    /// Owned copy of the window; never aliases the page buffer
    pub image: GrayImage,
    /// Where the copy came from
    pub window: CropWindow,
}

impl FieldRegion {
    /// Map a crop-local point into working-image coordinates
    pub fn to_page(&self, p: &Point) -> Point {
        let origin = self.window.offset();
        p.translate(origin.x, origin.y)
    }
}

/// Copy the field's window out of `image`
pub fn extract_region(image: &GrayImage, field_id: &str, corners: &Quad) -> Result<FieldRegion> {
    let window = CropWindow::for_field(field_id, corners, image.width(), image.height())?;
    let cropped = imageops::crop_imm(image, window.x, window.y, window.width, window.height).to_image();
    Ok(FieldRegion {
        image: cropped,
        window,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_extract_region_copies_pixels() {
        let mut page = GrayImage::new(40, 40);
        page.put_pixel(12, 15, Luma([200]));

        let mut region = extract_region(&page, "f1", &Quad::from_rect(10.0, 10.0, 8.0, 8.0)).unwrap();
        assert_eq!(region.image.dimensions(), (8, 8));
        assert_eq!(region.image.get_pixel(2, 5).0[0], 200);

        // Writing into the crop leaves the page untouched
        region.image.put_pixel(0, 0, Luma([99]));
        assert_eq!(page.get_pixel(10, 10).0[0], 0);
        assert_eq!(region.to_page(&Point::new(2.0, 5.0)), Point::new(12.0, 15.0));
    }

    #[test]
    fn test_fractional_corners_truncate() {
        let window = CropWindow::for_field("f", &Quad::from_rect(3.7, 4.2, 10.9, 5.5), 50, 50).unwrap();
        assert_eq!(window, CropWindow { x: 3, y: 4, width: 10, height: 5 });
        assert_eq!(window.offset(), Point::new(3.0, 4.0));
    }

    #[test]
    fn test_out_of_bounds_window() {
        let page = GrayImage::new(20, 20);
        let err = extract_region(&page, "edge", &Quad::from_rect(15.0, 15.0, 10.0, 10.0)).unwrap_err();
        assert!(matches!(err, OmrError::FieldBounds { ref field_id, .. } if field_id == "edge"));

        let negative = extract_region(&page, "neg", &Quad::from_rect(-2.0, 0.0, 5.0, 5.0));
        assert!(negative.is_err());

        let empty = extract_region(&page, "empty", &Quad::from_rect(2.0, 2.0, 0.0, 5.0));
        assert!(empty.is_err());
    }
}
