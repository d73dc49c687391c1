use serde::{Deserialize, Serialize};

/// 2D point with floating point coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl Point {
    /// Create a new point
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Translate point by (dx, dy)
    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Width/height pair in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl Size {
    /// Create a new size
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Four corners of an axis-aligned rectangle as authored in a template.
///
/// Only `top_left`, `top_right` and `bottom_left` take part in extent
/// computations; `bottom_right` is carried for completeness and, on a
/// template, defines the working canvas size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quad {
    /// Top-left corner
    pub top_left: Point,
    /// Top-right corner
    pub top_right: Point,
    /// Bottom-left corner
    pub bottom_left: Point,
    /// Bottom-right corner
    pub bottom_right: Point,
}

impl Quad {
    /// Build a quad from its origin and extent
    pub fn from_rect(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            top_left: Point::new(x, y),
            top_right: Point::new(x + width, y),
            bottom_left: Point::new(x, y + height),
            bottom_right: Point::new(x + width, y + height),
        }
    }

    /// Length of the top edge
    pub fn width(&self) -> f32 {
        self.top_right.x - self.top_left.x
    }

    /// Length of the left edge
    pub fn height(&self) -> f32 {
        self.bottom_left.y - self.top_left.y
    }

    /// True when `p` lies in the box spanned by `top_left` and `bottom_right`
    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.top_left.x
            && p.y >= self.top_left.y
            && p.x <= self.bottom_right.x
            && p.y <= self.bottom_right.y
    }

    /// Corners in top-left, top-right, bottom-left, bottom-right order
    pub fn points(&self) -> [Point; 4] {
        [self.top_left, self.top_right, self.bottom_left, self.bottom_right]
    }
}
