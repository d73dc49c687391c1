//! Error types for template application
//!
//! Three families of failure exist and they never mix:
//! - [`ScanError`] comes from the scanned-image readiness contract and is
//!   returned to the caller before a page output exists.
//! - [`OmrError`] aborts a single page; the engine records it as a failed
//!   outcome on the page output.
//! - [`TemplateError`] reports a template that cannot be applied at all.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while a page is being processed
#[derive(Error, Debug)]
pub enum OmrError {
    /// Template calibration corners do not describe a usable canvas
    #[error("registration failed: {0}")]
    Registration(String),

    /// Crop window falls outside the working image
    #[error(
        "field {field_id} window ({x}, {y}, {width}x{height}) is outside the {image_width}x{image_height} image"
    )]
    FieldBounds {
        /// Field whose window was rejected
        field_id: String,
        /// Window left edge
        x: i64,
        /// Window top edge
        y: i64,
        /// Window width
        width: i64,
        /// Window height
        height: i64,
        /// Width of the image being cropped
        image_width: u32,
        /// Height of the image being cropped
        image_height: u32,
    },

    /// Image encoding or decoding failure
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// File system failure inside the image pipeline
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the scanned-image readiness contract
#[derive(Error, Debug)]
pub enum ScanError {
    /// The image could not be analyzed
    #[error("scanned image could not be analyzed: {0}")]
    Analysis(String),

    /// The image could not be loaded from disk
    #[error("failed to load scanned image {path}: {source}")]
    Load {
        /// File that failed to load
        path: PathBuf,
        /// Underlying decoder error
        #[source]
        source: image::ImageError,
    },
}

/// Errors raised while loading or validating a template
#[derive(Error, Debug)]
pub enum TemplateError {
    /// Template geometry is invalid
    #[error("invalid template geometry: {0}")]
    Geometry(String),

    /// Field lies outside the template canvas
    #[error("field {0} lies outside the template bounds")]
    FieldOutOfBounds(String),

    /// Two fields share an identifier
    #[error("duplicate field id {0}")]
    DuplicateField(String),

    /// Template document could not be parsed
    #[error("failed to parse template: {0}")]
    Parse(#[from] serde_json::Error),

    /// Template document could not be read
    #[error("failed to read template: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for page pipeline operations
pub type Result<T> = std::result::Result<T, OmrError>;
