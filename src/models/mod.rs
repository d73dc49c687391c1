pub mod output;
pub mod point;
pub mod template;

pub use output::{
    Answer, AnswerRecord, BarcodeAnswer, BarcodeFormat, BubbleAnswer, OmrPageOutput, RowGroup,
    ScanOutcome,
};
pub use point::{Point, Quad, Size};
pub use template::{BarcodeField, BubbleField, Field, Template};
