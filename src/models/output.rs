//! Page output: the structured answers read from one scanned page

use crate::models::{Point, Size};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Barcode symbology reported by a reader
///
/// Forms carry QR codes; linear symbologies are not read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BarcodeFormat {
    /// QR Code
    QrCode,
}

/// A filled bubble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BubbleAnswer {
    /// Originating field id
    pub id: String,
    /// Question key
    pub key: String,
    /// Answer value
    pub value: String,
    /// Blob top-left in working-image coordinates
    pub top_left: Point,
    /// Blob bottom-right in working-image coordinates
    pub bottom_right: Point,
    /// Foreground pixel count of the blob
    pub blob_area: usize,
}

/// A decoded barcode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarcodeAnswer {
    /// Originating field id
    pub id: String,
    /// Decoded text
    pub data: String,
    /// Decoded symbology
    pub format: BarcodeFormat,
    /// First result point in working-image coordinates
    pub top_left: Point,
    /// Approximate opposite corner in working-image coordinates
    pub bottom_right: Point,
}

/// Answers sharing one row of a matrix question
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowGroup {
    /// Row group id
    pub id: String,
    /// Answers in the row; never nested row groups
    pub details: Vec<Answer>,
}

impl RowGroup {
    /// Create an empty row group
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            details: Vec::new(),
        }
    }

    /// True when an equal answer is already in the row
    pub fn already_answered(&self, answer: &Answer) -> bool {
        self.details.iter().any(|a| a.same_answer(answer))
    }
}

/// A flat answer record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Answer {
    /// Bubble hit
    Bubble(BubbleAnswer),
    /// Barcode hit
    Barcode(BarcodeAnswer),
}

impl Answer {
    /// Originating field id
    pub fn id(&self) -> &str {
        match self {
            Answer::Bubble(b) => &b.id,
            Answer::Barcode(b) => &b.id,
        }
    }

    /// Dedup equality.
    ///
    /// Bubbles compare by question key and value, barcodes by field id and
    /// decoded text. Geometry, blob area and symbology are ignored.
    pub fn same_answer(&self, other: &Answer) -> bool {
        match (self, other) {
            (Answer::Bubble(a), Answer::Bubble(b)) => a.key == b.key && a.value == b.value,
            (Answer::Barcode(a), Answer::Barcode(b)) => a.id == b.id && a.data == b.data,
            _ => false,
        }
    }
}

/// Entry of the page `details` tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerRecord {
    /// Standalone answer
    Answer(Answer),
    /// Row of grouped answers
    RowGroup(RowGroup),
}

impl AnswerRecord {
    /// Record id: the field id for answers, the group id for rows
    pub fn id(&self) -> &str {
        match self {
            AnswerRecord::Answer(a) => a.id(),
            AnswerRecord::RowGroup(g) => &g.id,
        }
    }

    /// Borrow as a flat answer
    pub fn as_answer(&self) -> Option<&Answer> {
        match self {
            AnswerRecord::Answer(a) => Some(a),
            AnswerRecord::RowGroup(_) => None,
        }
    }

    /// Borrow as a row group
    pub fn as_row_group(&self) -> Option<&RowGroup> {
        match self {
            AnswerRecord::RowGroup(g) => Some(g),
            AnswerRecord::Answer(_) => None,
        }
    }
}

/// Terminal outcome of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanOutcome {
    /// Every stage completed
    Success,
    /// A stage failed; see `error_message`
    Failure,
}

/// Result of applying a template to one scanned page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OmrPageOutput {
    /// Template name followed by the start timestamp
    pub id: String,
    /// Template the page was read with
    pub template_id: String,
    /// Parameters copied from the scanned image
    pub parameters: Vec<String>,
    /// When processing started
    pub start_time: DateTime<Utc>,
    /// When processing stopped, on either path
    pub stop_time: DateTime<Utc>,
    /// Terminal outcome
    pub outcome: ScanOutcome,
    /// Failure description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Answers in template declaration order
    pub details: Vec<AnswerRecord>,
    /// Size of the working image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounding_size: Option<Size>,
    /// Persisted binarized image; owned by the caller once returned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyzed_image: Option<PathBuf>,
    /// Intermediate snapshot file names, when capture was enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_images: Option<Vec<String>>,
}

impl OmrPageOutput {
    /// True when the page completed
    pub fn is_success(&self) -> bool {
        self.outcome == ScanOutcome::Success
    }

    /// Flat answers at the top level and inside row groups
    pub fn answers(&self) -> impl Iterator<Item = &Answer> {
        self.details.iter().flat_map(|record| match record {
            AnswerRecord::Answer(a) => std::slice::from_ref(a).iter(),
            AnswerRecord::RowGroup(g) => g.details.iter(),
        })
    }

    /// Row group with the given id
    pub fn row_group(&self, id: &str) -> Option<&RowGroup> {
        self.details
            .iter()
            .filter_map(AnswerRecord::as_row_group)
            .find(|g| g.id == id)
    }
}

pub(crate) fn already_answered(details: &[AnswerRecord], answer: &Answer) -> bool {
    details
        .iter()
        .filter_map(AnswerRecord::as_answer)
        .any(|a| a.same_answer(answer))
}
