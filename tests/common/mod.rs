#![allow(dead_code)]

use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use omr_engine::{
    BarcodeField, BarcodeFormat, BarcodeReader, BarcodeResult, BubbleField, Field, Point, Quad,
    StaticScan, Template,
};

pub const PAGE_WIDTH: u32 = 200;
pub const PAGE_HEIGHT: u32 = 100;
pub const BUBBLE: f32 = 12.0;

/// Reads "STUDENT-0042" from any region that is partly, but mostly not, dark
pub struct InkPatchReader;

impl BarcodeReader for InkPatchReader {
    fn decode(&self, region: &GrayImage) -> Option<BarcodeResult> {
        let dark = region.pixels().filter(|p| p.0[0] < 128).count();
        let total = (region.width() * region.height()) as usize;
        (dark > 0 && dark * 2 < total).then(|| BarcodeResult {
            text: "STUDENT-0042".to_string(),
            format: BarcodeFormat::QrCode,
            points: vec![Point::new(5.0, 5.0), Point::new(50.0, 15.0)],
        })
    }
}

pub fn bubble(id: &str, question: &str, value: &str, group: Option<&str>, x: f32, y: f32) -> Field {
    Field::Bubble(BubbleField {
        id: id.to_string(),
        corners: Quad::from_rect(x, y, BUBBLE, BUBBLE),
        question: question.to_string(),
        value: value.to_string(),
        answer_row_group: group.map(str::to_string),
    })
}

/// Exam sheet covering every grouping case
pub fn exam_template() -> Template {
    Template::new(
        "exam",
        Quad::from_rect(0.0, 0.0, PAGE_WIDTH as f32, PAGE_HEIGHT as f32),
    )
    .with_field(Field::Barcode(BarcodeField {
        id: "student".to_string(),
        corners: Quad::from_rect(120.0, 50.0, 70.0, 40.0),
    }))
    .with_field(bubble("q1a", "q1", "A", None, 10.0, 10.0))
    .with_field(bubble("q1b", "q1", "B", None, 30.0, 10.0))
    .with_field(bubble("q1a-copy", "q1", "A", None, 50.0, 10.0))
    .with_field(bubble("r1a", "q2", "A", Some("r1"), 10.0, 40.0))
    .with_field(bubble("r1b", "q2", "B", Some("r1"), 30.0, 40.0))
    .with_field(bubble("r1c", "q2", "C", Some("r1"), 50.0, 40.0))
    .with_field(bubble("r2a", "q3", "A", Some("r2"), 10.0, 70.0))
    .with_field(bubble("speck2", "q4", "X", None, 90.0, 10.0))
    .with_field(bubble("speck3", "q5", "X", None, 110.0, 10.0))
}

/// White page builder
pub struct Sheet {
    pixels: RgbImage,
}

impl Sheet {
    pub fn blank() -> Self {
        Self {
            pixels: RgbImage::from_pixel(PAGE_WIDTH, PAGE_HEIGHT, Rgb([255, 255, 255])),
        }
    }

    /// Fill the center of the bubble whose window starts at (x, y)
    pub fn mark(mut self, x: u32, y: u32) -> Self {
        for py in y + 3..y + 9 {
            for px in x + 3..x + 9 {
                self.pixels.put_pixel(px, py, Rgb([20, 20, 20]));
            }
        }
        self
    }

    pub fn dots(mut self, dots: &[(u32, u32)]) -> Self {
        for &(x, y) in dots {
            self.pixels.put_pixel(x, y, Rgb([0, 0, 0]));
        }
        self
    }

    /// Dark patch inside the barcode window
    pub fn barcode(mut self) -> Self {
        for py in 55..65 {
            for px in 125..135 {
                self.pixels.put_pixel(px, py, Rgb([0, 0, 0]));
            }
        }
        self
    }

    pub fn into_scan(self, params: &[&str]) -> StaticScan {
        StaticScan::new(DynamicImage::ImageRgb8(self.pixels), "exam")
            .with_parameters(params.iter().copied())
    }
}

/// Sheet with every case from `exam_template` exercised
pub fn full_sheet() -> Sheet {
    Sheet::blank()
        .barcode()
        .mark(10, 10)
        .mark(50, 10)
        .mark(10, 40)
        .mark(30, 40)
        .mark(10, 70)
        .dots(&[(93, 13), (94, 13)])
        .dots(&[(113, 13), (114, 13), (115, 13)])
}
