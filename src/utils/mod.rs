//! Utility functions for image processing
//!
//! This module provides the page-wide transforms of the mark pipeline:
//! - Grayscale conversion (RGB to luminance)
//! - Binarization (fixed threshold) and inversion

pub mod binarization;
pub mod grayscale;
