//! Scanned-image readiness contract.
//!
//! Capture and pre-analysis of a scan live outside the engine. The engine only
//! needs to know whether an image is ready, to ask for analysis and
//! preparation when it is not, and to read its pixels and parameters.

use crate::error::ScanError;
use image::DynamicImage;
use std::path::Path;

/// Readiness of a scanned image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Nothing is known about the image yet
    Unanalyzed,
    /// Analysis succeeded; the page can be prepared
    Scannable,
    /// Ready for template application
    Ready,
}

/// A scanned page as seen by the engine
pub trait ScannedImage {
    /// True once the image is ready for template application
    fn is_ready_for_scan(&self) -> bool;

    /// True once analysis has succeeded
    fn is_scannable(&self) -> bool;

    /// Analyze the raw image; fails on unreadable input
    fn analyze(&mut self) -> Result<(), ScanError>;

    /// Prepare an analyzed image for processing
    fn prepare_processing(&mut self) -> Result<(), ScanError>;

    /// Free-form parameters identifying the page
    fn parameters(&self) -> &[String];

    /// Name of the template this page was captured for
    fn template_name(&self) -> &str;

    /// Raw pixels
    fn image(&self) -> &DynamicImage;

    /// Drive the image to the ready state; a no-op when already ready
    fn ensure_ready(&mut self) -> Result<(), ScanError> {
        if self.is_ready_for_scan() {
            return Ok(());
        }
        if !self.is_scannable() {
            self.analyze()?;
        }
        self.prepare_processing()
    }
}

/// In-memory scanned image
#[derive(Debug, Clone)]
pub struct StaticScan {
    image: DynamicImage,
    template_name: String,
    parameters: Vec<String>,
    state: ScanState,
}

impl StaticScan {
    /// Wrap a decoded image
    pub fn new(image: DynamicImage, template_name: impl Into<String>) -> Self {
        Self {
            image,
            template_name: template_name.into(),
            parameters: Vec::new(),
            state: ScanState::Unanalyzed,
        }
    }

    /// Load a scan from an image file
    pub fn open<P: AsRef<Path>>(path: P, template_name: impl Into<String>) -> Result<Self, ScanError> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|source| ScanError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(image, template_name))
    }

    /// Attach identifying parameters
    pub fn with_parameters<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters = parameters.into_iter().map(Into::into).collect();
        self
    }

    /// Current readiness state
    pub fn state(&self) -> ScanState {
        self.state
    }
}

impl ScannedImage for StaticScan {
    fn is_ready_for_scan(&self) -> bool {
        self.state == ScanState::Ready
    }

    fn is_scannable(&self) -> bool {
        self.state != ScanState::Unanalyzed
    }

    fn analyze(&mut self) -> Result<(), ScanError> {
        if self.image.width() == 0 || self.image.height() == 0 {
            return Err(ScanError::Analysis(format!(
                "image is empty ({}x{})",
                self.image.width(),
                self.image.height()
            )));
        }
        if self.state == ScanState::Unanalyzed {
            self.state = ScanState::Scannable;
        }
        Ok(())
    }

    fn prepare_processing(&mut self) -> Result<(), ScanError> {
        if self.state == ScanState::Unanalyzed {
            return Err(ScanError::Analysis("image has not been analyzed".to_string()));
        }
        self.state = ScanState::Ready;
        Ok(())
    }

    fn parameters(&self) -> &[String] {
        &self.parameters
    }

    fn template_name(&self) -> &str {
        &self.template_name
    }

    fn image(&self) -> &DynamicImage {
        &self.image
    }
}
