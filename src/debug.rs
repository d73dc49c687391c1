//! Intermediate-image capture.
//!
//! When enabled, every pipeline stage writes a lossless BMP snapshot named
//! `{page_id}-{params}-{suffix}.bmp`, where `{params}` is each scan parameter
//! followed by a dot. Writes are best-effort: a failure is logged and the
//! page carries on.

use crate::models::Field;
use ab_glyph::{FontVec, PxScale};
use image::{DynamicImage, GrayImage, ImageFormat, ImageResult, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::fmt;
use std::path::{Path, PathBuf};

/// Fonts tried for field labels when none is configured
const SYSTEM_FONT_PATHS: [&str; 4] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Pixel height of field labels on the overlay
pub const LABEL_SCALE: f32 = 12.0;

fn read_font(path: &Path) -> Option<FontVec> {
    let data = std::fs::read(path).ok()?;
    FontVec::try_from_vec(data).ok()
}

/// Font for overlay labels.
///
/// A configured path is used as given; without one, common system font
/// locations are tried. `None` means the overlay is drawn without labels.
pub fn load_label_font(configured: Option<&Path>) -> Option<FontVec> {
    if let Some(path) = configured {
        let font = read_font(path);
        if font.is_none() {
            tracing::warn!(path = %path.display(), "label font not loaded");
        }
        return font;
    }
    let found = SYSTEM_FONT_PATHS
        .iter()
        .find_map(|p| read_font(Path::new(p)).map(|font| (p, font)));
    match found {
        Some((path, font)) => {
            tracing::debug!(path = %path, "loaded label font");
            Some(font)
        }
        None => {
            tracing::debug!("no label font found, field ids omitted from overlay");
            None
        }
    }
}

/// Pipeline stage a snapshot belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugStage {
    /// Raw scan
    Initial,
    /// Registered into template space
    Registered,
    /// Registered page with field rectangles drawn
    Fields,
    /// Grayscale page
    Grayscale,
    /// Thresholded page
    Binary,
    /// Inverted page
    Inverted,
}

impl DebugStage {
    /// Every stage, in pipeline order
    pub const ALL: [DebugStage; 6] = [
        DebugStage::Initial,
        DebugStage::Registered,
        DebugStage::Fields,
        DebugStage::Grayscale,
        DebugStage::Binary,
        DebugStage::Inverted,
    ];

    /// File name suffix
    pub fn suffix(self) -> &'static str {
        match self {
            DebugStage::Initial => "init",
            DebugStage::Registered => "tx",
            DebugStage::Fields => "fields",
            DebugStage::Grayscale => "gs",
            DebugStage::Binary => "bw",
            DebugStage::Inverted => "inv",
        }
    }
}

/// Snapshot file name for a stage
pub fn snapshot_name(page_id: &str, parameters: &[String], stage: DebugStage) -> String {
    let params: String = parameters.iter().map(|p| format!("{p}.")).collect();
    format!("{}-{}-{}.bmp", page_id, params, stage.suffix())
}

/// Anything that can be written as a BMP snapshot
pub trait Snapshot {
    /// Encode to `path` as BMP
    fn write_bmp(&self, path: &Path) -> ImageResult<()>;
}

impl Snapshot for RgbImage {
    fn write_bmp(&self, path: &Path) -> ImageResult<()> {
        self.save_with_format(path, ImageFormat::Bmp)
    }
}

impl Snapshot for GrayImage {
    fn write_bmp(&self, path: &Path) -> ImageResult<()> {
        self.save_with_format(path, ImageFormat::Bmp)
    }
}

impl Snapshot for DynamicImage {
    fn write_bmp(&self, path: &Path) -> ImageResult<()> {
        self.save_with_format(path, ImageFormat::Bmp)
    }
}

/// Snapshot writer for a single page
pub struct DebugCapture {
    dir: PathBuf,
    page_id: String,
    parameters: Vec<String>,
    label_font: Option<FontVec>,
}

impl fmt::Debug for DebugCapture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugCapture")
            .field("dir", &self.dir)
            .field("page_id", &self.page_id)
            .field("parameters", &self.parameters)
            .field("labels", &self.label_font.is_some())
            .finish()
    }
}

impl DebugCapture {
    /// Prepare capture into `dir`, creating it if absent
    pub fn new(dir: impl Into<PathBuf>, page_id: &str, parameters: &[String]) -> Self {
        let dir = dir.into();
        if let Err(err) = std::fs::create_dir_all(&dir) {
            tracing::warn!(dir = %dir.display(), error = %err, "cannot create debug image directory");
        }
        Self {
            dir,
            page_id: page_id.to_string(),
            parameters: parameters.to_vec(),
            label_font: None,
        }
    }

    /// Label field rectangles on the overlay with `font`
    pub fn with_label_font(mut self, font: Option<FontVec>) -> Self {
        self.label_font = font;
        self
    }

    /// File names of every snapshot this capture produces
    pub fn file_names(&self) -> Vec<String> {
        DebugStage::ALL
            .iter()
            .map(|&stage| snapshot_name(&self.page_id, &self.parameters, stage))
            .collect()
    }

    /// Full path of a stage's snapshot
    pub fn path(&self, stage: DebugStage) -> PathBuf {
        self.dir
            .join(snapshot_name(&self.page_id, &self.parameters, stage))
    }

    /// Write a stage snapshot, logging failures
    pub fn save<S: Snapshot + ?Sized>(&self, stage: DebugStage, image: &S) {
        let path = self.path(stage);
        match image.write_bmp(&path) {
            Ok(()) => tracing::trace!(path = %path.display(), "debug snapshot written"),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "debug snapshot not written")
            }
        }
    }

    /// Write the registered page with every field rectangle outlined
    pub fn save_field_overlay(&self, registered: &RgbImage, fields: &[Field]) {
        let overlay = self.field_overlay(registered, fields);
        self.save(DebugStage::Fields, &overlay);
    }

    fn field_overlay(&self, registered: &RgbImage, fields: &[Field]) -> RgbImage {
        let mut overlay = registered.clone();
        let black = Rgb([0, 0, 0]);
        for field in fields {
            let c = field.corners();
            let (x, y) = (c.top_left.x as i32, c.top_left.y as i32);
            let rect = Rect::at(x, y).of_size((c.width() as u32).max(1), (c.height() as u32).max(1));
            draw_hollow_rect_mut(&mut overlay, rect, black);
            if let Some(font) = &self.label_font {
                let scale = PxScale::from(LABEL_SCALE);
                draw_text_mut(&mut overlay, black, x + 2, y + 2, scale, font, field.id());
            }
        }
        overlay
    }
}
