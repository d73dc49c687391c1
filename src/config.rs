//! Engine configuration, passed explicitly into every page run.
//!
//! Defaults reproduce the reference behaviour; `from_env` overlays the
//! `OMR_*` environment variables for command-line use.

use crate::detector::barcode::{BarcodeOptions, DEFAULT_BARCODE_MARGIN};
use crate::detector::bubble::DEFAULT_MIN_BLOB_AREA;
use crate::utils::binarization::DEFAULT_THRESHOLD;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn parse_env_u8(name: &str, default: u8) -> u8 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u8>().ok())
        .unwrap_or(default)
}

fn parse_env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

fn parse_env_bool_u8(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u8>().ok())
        .map(|v| v != 0)
        .unwrap_or(default)
}

fn parse_env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Settings for one engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Write a snapshot of every pipeline stage
    pub save_intermediate_images: bool,
    /// Directory for stage snapshots, created on demand
    pub debug_dir: PathBuf,
    /// Font for field labels on the overlay snapshot; system fonts when unset
    pub label_font: Option<PathBuf>,
    /// Directory for the analyzed image; the system temp dir when unset
    pub analyzed_image_dir: Option<PathBuf>,
    /// Binarization cutoff
    pub threshold: u8,
    /// Smallest blob area counted as a mark
    pub min_blob_area: usize,
    /// Height of the approximate barcode box
    pub barcode_margin: f32,
    /// Barcode reader behaviour
    pub barcode: BarcodeOptions,
    /// Read the fields of a stage on the rayon pool
    pub parallel_fields: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            save_intermediate_images: false,
            debug_dir: PathBuf::from("imgproc"),
            label_font: None,
            analyzed_image_dir: None,
            threshold: DEFAULT_THRESHOLD,
            min_blob_area: DEFAULT_MIN_BLOB_AREA,
            barcode_margin: DEFAULT_BARCODE_MARGIN,
            barcode: BarcodeOptions::default(),
            parallel_fields: false,
        }
    }
}

impl EngineConfig {
    /// Defaults overlaid with `OMR_*` environment variables
    pub fn from_env() -> Self {
        let base = Self::default();
        Self {
            save_intermediate_images: parse_env_bool_u8(
                "OMR_SAVE_INTERMEDIATE",
                base.save_intermediate_images,
            ),
            debug_dir: parse_env_path("OMR_DEBUG_DIR").unwrap_or(base.debug_dir),
            label_font: parse_env_path("OMR_LABEL_FONT").or(base.label_font),
            analyzed_image_dir: parse_env_path("OMR_ANALYZED_DIR").or(base.analyzed_image_dir),
            threshold: parse_env_u8("OMR_THRESHOLD", base.threshold),
            min_blob_area: parse_env_usize("OMR_MIN_BLOB_AREA", base.min_blob_area),
            barcode_margin: base.barcode_margin,
            barcode: base.barcode,
            parallel_fields: parse_env_bool_u8("OMR_PARALLEL_FIELDS", base.parallel_fields),
        }
    }

    /// Enable stage snapshots into `dir`
    pub fn with_debug_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.save_intermediate_images = true;
        self.debug_dir = dir.into();
        self
    }

    /// Directory the analyzed image is written to
    pub fn analyzed_dir(&self) -> PathBuf {
        self.analyzed_image_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}
