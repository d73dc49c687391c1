//! Fixed-threshold binarization and polarity inversion.
//!
//! Binary images keep the `Luma<u8>` layout with only two levels, 0 and 255,
//! so they can be cropped, persisted and blob-labelled like any other page.

use image::GrayImage;

/// Cutoff separating ink from paper on a 0-255 scale
pub const DEFAULT_THRESHOLD: u8 = 120;

/// Foreground level of a binary image
pub const WHITE: u8 = 255;
/// Background level of a binary image
pub const BLACK: u8 = 0;

/// Pixels at or above `threshold` become white, the rest black
pub fn threshold_in_place(image: &mut GrayImage, threshold: u8) {
    for pixel in image.pixels_mut() {
        pixel.0[0] = if pixel.0[0] >= threshold { WHITE } else { BLACK };
    }
}

/// Simple global threshold binarization into a new image
pub fn threshold_binarize(gray: &GrayImage, threshold: u8) -> GrayImage {
    let mut binary = gray.clone();
    threshold_in_place(&mut binary, threshold);
    binary
}

/// Swap foreground and background so pencil marks become the bright blobs
pub fn invert_in_place(image: &mut GrayImage) {
    image::imageops::invert(image);
}
