//! Page pipeline: applies a template to one scanned image.
//!
//! Stages run strictly in sequence on images owned by the run:
//! registration, barcode decoding on the grayscale page, thresholding and
//! inversion, bubble detection, aggregation. Any stage error fails the page;
//! field-level problems only ever affect their own field.

use crate::aggregate::aggregate;
use crate::config::EngineConfig;
use crate::debug::{DebugCapture, DebugStage, load_label_font};
use crate::detector::FieldOutcome;
use crate::detector::barcode::{BarcodeReader, QrReader, decode_field};
use crate::detector::bubble::detect_mark;
use crate::detector::registration::register;
use crate::error::{Result, ScanError};
use crate::models::{AnswerRecord, Field, OmrPageOutput, ScanOutcome, Size, Template};
use crate::scan::ScannedImage;
use crate::utils::binarization::{invert_in_place, threshold_in_place};
use crate::utils::grayscale::to_grayscale;
use chrono::{DateTime, Local, Utc};
use image::GrayImage;
use image::codecs::jpeg::JpegEncoder;
use rayon::prelude::*;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::TempPath;

/// Stage a page is in while the pipeline runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    /// Output record created
    Created,
    /// Mapping the scan into template space
    Registering,
    /// Reading barcode fields
    Decoding,
    /// Grayscale, threshold, invert
    Binarizing,
    /// Reading bubble fields
    DetectingMarks,
    /// Building the answer tree
    Aggregating,
    /// Finished successfully
    Succeeded,
    /// Finished with an error
    Failed,
}

/// Everything a successful run hands to the output record
struct PageResult {
    details: Vec<AnswerRecord>,
    bounding_size: Size,
    analyzed_image: TempPath,
}

/// In-progress page record; only [`PendingPage::finish`] yields an output
struct PendingPage {
    id: String,
    template_id: String,
    parameters: Vec<String>,
    start_time: DateTime<Utc>,
    debug_images: Option<Vec<String>>,
    state: PageState,
}

impl PendingPage {
    fn new(template_name: &str, parameters: &[String]) -> Self {
        let start_time = Utc::now();
        Self {
            id: page_id(template_name, &start_time),
            template_id: template_name.to_string(),
            parameters: parameters.to_vec(),
            start_time,
            debug_images: None,
            state: PageState::Created,
        }
    }

    fn advance(&mut self, state: PageState) {
        tracing::debug!(page = %self.id, from = ?self.state, to = ?state, "page state");
        self.state = state;
    }

    fn finish(mut self, result: Result<PageResult>) -> OmrPageOutput {
        let (outcome, error_message, details, bounding_size, analyzed_image) = match result {
            Ok(page) => match page.analyzed_image.keep() {
                Ok(path) => (
                    ScanOutcome::Success,
                    None,
                    page.details,
                    Some(page.bounding_size),
                    Some(path),
                ),
                Err(err) => (
                    ScanOutcome::Failure,
                    Some(err.error.to_string()),
                    Vec::new(),
                    None,
                    None,
                ),
            },
            Err(err) => (
                ScanOutcome::Failure,
                Some(err.to_string()),
                Vec::new(),
                None,
                None,
            ),
        };

        match outcome {
            ScanOutcome::Success => self.advance(PageState::Succeeded),
            ScanOutcome::Failure => {
                self.advance(PageState::Failed);
                tracing::error!(
                    page = %self.id,
                    error = error_message.as_deref().unwrap_or_default(),
                    "page failed"
                );
            }
        }

        OmrPageOutput {
            id: self.id,
            template_id: self.template_id,
            parameters: self.parameters,
            start_time: self.start_time,
            stop_time: Utc::now(),
            outcome,
            error_message,
            details,
            bounding_size,
            analyzed_image,
            debug_images: self.debug_images,
        }
    }
}

/// Template name followed by the local wall-clock start time
fn page_id(template_name: &str, start_time: &DateTime<Utc>) -> String {
    format!(
        "{}{}",
        template_name,
        start_time.with_timezone(&Local).format("%Y%m%d%H%M%S")
    )
}

/// Template application engine
///
/// Holds only configuration and a barcode reader, so one engine can process
/// many pages, including concurrently.
#[derive(Debug, Clone)]
pub struct Engine<R = QrReader> {
    config: EngineConfig,
    reader: R,
}

impl Engine<QrReader> {
    /// Engine with the built-in QR reader
    pub fn new(config: EngineConfig) -> Self {
        let reader = QrReader::new(config.barcode.try_harder);
        Self { config, reader }
    }
}

impl Default for Engine<QrReader> {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl<R: BarcodeReader> Engine<R> {
    /// Engine with a custom barcode reader
    pub fn with_reader(config: EngineConfig, reader: R) -> Self {
        Self { config, reader }
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Apply `template` to `scan`.
    ///
    /// The scan is analyzed and prepared first if needed; failures there are
    /// returned as `Err` and no output is produced. Once the page starts,
    /// every error is recorded on the returned output instead.
    pub fn apply_template<S>(&self, template: &Template, scan: &mut S) -> std::result::Result<OmrPageOutput, ScanError>
    where
        S: ScannedImage + ?Sized,
    {
        scan.ensure_ready()?;

        let mut page = PendingPage::new(scan.template_name(), scan.parameters());
        tracing::info!(page = %page.id, template = %template.name, fields = template.fields.len(), "applying template");

        let capture = self.config.save_intermediate_images.then(|| {
            DebugCapture::new(&self.config.debug_dir, &page.id, scan.parameters())
                .with_label_font(load_label_font(self.config.label_font.as_deref()))
        });
        page.debug_images = capture.as_ref().map(DebugCapture::file_names);

        let result = self.run(&mut page, template, &*scan, capture.as_ref());
        let output = page.finish(result);
        tracing::info!(
            page = %output.id,
            outcome = ?output.outcome,
            answers = output.answers().count(),
            "page finished"
        );
        Ok(output)
    }

    fn run<S>(
        &self,
        page: &mut PendingPage,
        template: &Template,
        scan: &S,
        capture: Option<&DebugCapture>,
    ) -> Result<PageResult>
    where
        S: ScannedImage + ?Sized,
    {
        page.advance(PageState::Registering);
        if let Some(c) = capture {
            c.save(DebugStage::Initial, scan.image());
        }
        let registered = register(scan.image(), &template.corners)?;
        if let Some(c) = capture {
            c.save(DebugStage::Registered, &registered);
            c.save_field_overlay(&registered, &template.fields);
        }

        page.advance(PageState::Decoding);
        let mut working = to_grayscale(&registered);
        drop(registered);

        let mut outcomes = vec![FieldOutcome::NoHit; template.fields.len()];
        let barcodes = self.read_fields(template, |field| match field {
            Field::Barcode(b) => Some(decode_field(
                &self.reader,
                b,
                &working,
                &self.config.barcode,
                self.config.barcode_margin,
            )),
            Field::Bubble(_) => None,
        });
        for (index, outcome) in barcodes {
            outcomes[index] = outcome;
        }

        page.advance(PageState::Binarizing);
        if let Some(c) = capture {
            c.save(DebugStage::Grayscale, &working);
        }
        threshold_in_place(&mut working, self.config.threshold);
        if let Some(c) = capture {
            c.save(DebugStage::Binary, &working);
        }
        let analyzed_image = persist_analyzed(&working, &self.config.analyzed_dir())?;
        let bounding_size = Size::new(working.width() as f32, working.height() as f32);
        invert_in_place(&mut working);
        if let Some(c) = capture {
            c.save(DebugStage::Inverted, &working);
        }

        page.advance(PageState::DetectingMarks);
        let min_area = self.config.min_blob_area;
        let bubbles = self.read_fields(template, |field| match field {
            Field::Bubble(b) => Some(detect_mark(b, &working, min_area)),
            Field::Barcode(_) => None,
        });
        for (index, outcome) in bubbles {
            outcomes[index] = outcome;
        }
        drop(working);

        page.advance(PageState::Aggregating);
        let soft_errors = outcomes
            .iter()
            .filter(|o| matches!(o, FieldOutcome::SoftError(_)))
            .count();
        if soft_errors > 0 {
            tracing::debug!(page = %page.id, soft_errors, "fields treated as unanswered");
        }
        let details = aggregate(template.fields.iter().zip(outcomes.iter()));

        Ok(PageResult {
            details,
            bounding_size,
            analyzed_image,
        })
    }

    /// Read the fields `read` accepts, returning `(field index, outcome)` in
    /// declaration order
    fn read_fields<F>(&self, template: &Template, read: F) -> Vec<(usize, FieldOutcome)>
    where
        F: Fn(&Field) -> Option<FieldOutcome> + Sync,
    {
        if self.config.parallel_fields {
            template
                .fields
                .par_iter()
                .enumerate()
                .filter_map(|(i, field)| read(field).map(|o| (i, o)))
                .collect()
        } else {
            template
                .fields
                .iter()
                .enumerate()
                .filter_map(|(i, field)| read(field).map(|o| (i, o)))
                .collect()
        }
    }
}

/// Write the thresholded page as a JPEG in `dir`; removed again unless kept
fn persist_analyzed(binary: &GrayImage, dir: &Path) -> Result<TempPath> {
    let file = tempfile::Builder::new()
        .prefix("omr-")
        .suffix(".jpg")
        .tempfile_in(dir)?;
    let (file, path) = file.into_parts();
    let mut writer = BufWriter::new(file);
    binary.write_with_encoder(JpegEncoder::new(&mut writer))?;
    writer.flush()?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BubbleField, Quad};
    use crate::scan::StaticScan;
    use image::{DynamicImage, Rgb, RgbImage};

    fn template() -> Template {
        Template::new("quiz", Quad::from_rect(0.0, 0.0, 60.0, 40.0)).with_field(Field::Bubble(
            BubbleField {
                id: "q1a".to_string(),
                corners: Quad::from_rect(10.0, 10.0, 10.0, 10.0),
                question: "q1".to_string(),
                value: "A".to_string(),
                answer_row_group: None,
            },
        ))
    }

    fn engine(dir: &Path) -> Engine {
        Engine::new(EngineConfig {
            analyzed_image_dir: Some(dir.to_path_buf()),
            ..EngineConfig::default()
        })
    }

    #[test]
    fn test_page_id_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let scan = RgbImage::from_pixel(60, 40, Rgb([255, 255, 255]));
        let mut scan = StaticScan::new(DynamicImage::ImageRgb8(scan), "quiz").with_parameters(["s1"]);
        let output = engine(dir.path()).apply_template(&template(), &mut scan).unwrap();

        assert_eq!(output.outcome, ScanOutcome::Success);
        assert_eq!(output.template_id, "quiz");
        let local = output.start_time.with_timezone(&Local);
        assert_eq!(output.id, format!("quiz{}", local.format("%Y%m%d%H%M%S")));
        assert_eq!(output.parameters, vec!["s1".to_string()]);
        assert!(output.stop_time >= output.start_time);
        assert_eq!(output.bounding_size, Some(Size::new(60.0, 40.0)));
        assert!(output.details.is_empty());
        assert!(output.debug_images.is_none());

        let analyzed = output.analyzed_image.unwrap();
        assert!(analyzed.starts_with(dir.path()));
        assert!(analyzed.is_file());
    }

    #[test]
    fn test_page_id_uses_local_time() {
        let start = DateTime::parse_from_rfc3339("2024-03-05T23:59:58Z")
            .unwrap()
            .with_timezone(&Utc);
        let expected = start.with_timezone(&Local).format("%Y%m%d%H%M%S").to_string();
        let id = page_id("exam", &start);
        assert_eq!(id, format!("exam{expected}"));
        assert_eq!(id.len(), "exam".len() + 14);
    }

    #[test]
    fn test_registration_failure_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let bad = Template::new("bad", Quad::from_rect(0.0, 0.0, 0.0, 40.0));
        let mut scan = StaticScan::new(DynamicImage::ImageRgb8(RgbImage::new(10, 10)), "bad");
        let output = engine(dir.path()).apply_template(&bad, &mut scan).unwrap();

        assert_eq!(output.outcome, ScanOutcome::Failure);
        assert!(output.error_message.unwrap().contains("registration"));
        assert!(output.analyzed_image.is_none());
        // Nothing left behind in the analyzed-image directory
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_oversized_template_fails_page() {
        let dir = tempfile::tempdir().unwrap();
        let huge = Template::new("huge", Quad::from_rect(0.0, 0.0, 10.0, 1e12));
        let mut scan = StaticScan::new(DynamicImage::ImageRgb8(RgbImage::new(10, 10)), "huge");
        let output = engine(dir.path()).apply_template(&huge, &mut scan).unwrap();

        assert_eq!(output.outcome, ScanOutcome::Failure);
        assert!(output.error_message.unwrap().contains("budget"));
        assert!(output.details.is_empty());
        assert!(output.bounding_size.is_none());
    }

    #[test]
    fn test_preparation_error_propagates() {
        let mut scan = StaticScan::new(DynamicImage::ImageRgb8(RgbImage::new(0, 0)), "quiz");
        let result = Engine::default().apply_template(&template(), &mut scan);
        assert!(matches!(result, Err(ScanError::Analysis(_))));
    }
}
