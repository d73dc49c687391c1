//! Form templates: calibration corners plus the fields to read

use crate::error::TemplateError;
use crate::models::Quad;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// A field expected to contain a machine-readable barcode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarcodeField {
    /// Identifier, unique within the template
    pub id: String,
    /// Field rectangle in template space
    pub corners: Quad,
}

/// A fillable bubble representing one candidate answer to a question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BubbleField {
    /// Identifier, unique within the template
    pub id: String,
    /// Field rectangle in template space
    pub corners: Quad,
    /// Question this bubble answers
    pub question: String,
    /// Answer value the bubble stands for
    pub value: String,
    /// Row group shared by sibling bubbles of a matrix answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_row_group: Option<String>,
}

/// Template field, dispatched by kind at every pipeline stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Field {
    /// Barcode region
    Barcode(BarcodeField),
    /// Bubble (mark-sense) region
    Bubble(BubbleField),
}

impl Field {
    /// Field identifier
    pub fn id(&self) -> &str {
        match self {
            Field::Barcode(f) => &f.id,
            Field::Bubble(f) => &f.id,
        }
    }

    /// Field rectangle in template space
    pub fn corners(&self) -> &Quad {
        match self {
            Field::Barcode(f) => &f.corners,
            Field::Bubble(f) => &f.corners,
        }
    }

    /// Non-empty row group key, if the field belongs to one
    pub fn row_group(&self) -> Option<&str> {
        match self {
            Field::Bubble(f) => f.answer_row_group.as_deref().filter(|g| !g.is_empty()),
            Field::Barcode(_) => None,
        }
    }

    /// True for barcode fields
    pub fn is_barcode(&self) -> bool {
        matches!(self, Field::Barcode(_))
    }
}

/// Geometric description of a form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Template name
    pub name: String,
    /// Calibration corners; bottom-right is the working canvas size
    pub corners: Quad,
    /// Fields in declaration order
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Template {
    /// Create an empty template with the given calibration corners
    pub fn new(name: impl Into<String>, corners: Quad) -> Self {
        Self {
            name: name.into(),
            corners,
            fields: Vec::new(),
        }
    }

    /// Append a field, keeping declaration order
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Load a template from a JSON document
    pub fn from_json(json: &str) -> Result<Self, TemplateError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a template from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TemplateError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Fields of the barcode kind, in declaration order
    pub fn barcode_fields(&self) -> impl Iterator<Item = &BarcodeField> {
        self.fields.iter().filter_map(|f| match f {
            Field::Barcode(b) => Some(b),
            Field::Bubble(_) => None,
        })
    }

    /// Fields of the bubble kind, in declaration order
    pub fn bubble_fields(&self) -> impl Iterator<Item = &BubbleField> {
        self.fields.iter().filter_map(|f| match f {
            Field::Bubble(b) => Some(b),
            Field::Barcode(_) => None,
        })
    }

    /// Check geometry, field containment and id uniqueness
    pub fn validate(&self) -> Result<(), TemplateError> {
        let c = &self.corners;
        if c.width() <= 0.0 || c.height() <= 0.0 {
            return Err(TemplateError::Geometry(format!(
                "calibration extent {}x{} must be positive",
                c.width(),
                c.height()
            )));
        }
        if c.bottom_right.x <= 0.0 || c.bottom_right.y <= 0.0 {
            return Err(TemplateError::Geometry(format!(
                "canvas {}x{} must be positive",
                c.bottom_right.x, c.bottom_right.y
            )));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.id()) {
                return Err(TemplateError::DuplicateField(field.id().to_string()));
            }
            let q = field.corners();
            let inside = q.points().iter().all(|p| c.contains(p));
            if q.width() <= 0.0 || q.height() <= 0.0 || !inside {
                return Err(TemplateError::FieldOutOfBounds(field.id().to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Point;

    fn bubble_at(id: &str, corners: Quad) -> Field {
        Field::Bubble(BubbleField {
            id: id.to_string(),
            corners,
            question: "q1".to_string(),
            value: id.to_string(),
            answer_row_group: None,
        })
    }

    fn bubble(id: &str, x: f32, group: Option<&str>) -> Field {
        Field::Bubble(BubbleField {
            id: id.to_string(),
            corners: Quad::from_rect(x, 10.0, 10.0, 10.0),
            question: "q1".to_string(),
            value: id.to_string(),
            answer_row_group: group.map(str::to_string),
        })
    }

    #[test]
    fn test_row_group_empty_is_absent() {
        assert_eq!(bubble("a", 0.0, Some("")).row_group(), None);
        assert_eq!(bubble("a", 0.0, Some("r1")).row_group(), Some("r1"));
        assert_eq!(bubble("a", 0.0, None).row_group(), None);
    }

    #[test]
    fn test_validate() {
        let template = Template::new("form", Quad::from_rect(0.0, 0.0, 100.0, 100.0))
            .with_field(bubble("a", 0.0, None))
            .with_field(bubble("b", 20.0, None));
        assert!(template.validate().is_ok());

        let dup = template.clone().with_field(bubble("a", 40.0, None));
        assert!(matches!(dup.validate(), Err(TemplateError::DuplicateField(_))));

        let outside = template.clone().with_field(bubble("c", 95.0, None));
        assert!(matches!(
            outside.validate(),
            Err(TemplateError::FieldOutOfBounds(_))
        ));

        let flat_field = template.clone().with_field(bubble_at("z", Quad::from_rect(60.0, 10.0, 0.0, 10.0)));
        assert!(matches!(
            flat_field.validate(),
            Err(TemplateError::FieldOutOfBounds(_))
        ));

        let flat = Template::new("flat", Quad::from_rect(0.0, 0.0, 100.0, 0.0));
        assert!(matches!(flat.validate(), Err(TemplateError::Geometry(_))));
    }

    #[test]
    fn test_validate_uses_calibration_box() {
        let inset = Template::new("inset", Quad::from_rect(50.0, 50.0, 100.0, 100.0));

        let origin = inset.clone().with_field(bubble_at("a", Quad::from_rect(0.0, 0.0, 10.0, 10.0)));
        assert!(matches!(
            origin.validate(),
            Err(TemplateError::FieldOutOfBounds(ref id)) if id == "a"
        ));

        // Only the bottom-right corner pokes out
        let mut skewed = Quad::from_rect(140.0, 140.0, 10.0, 10.0);
        skewed.bottom_right = Point::new(155.0, 155.0);
        let overhang = inset.clone().with_field(bubble_at("b", skewed));
        assert!(matches!(
            overhang.validate(),
            Err(TemplateError::FieldOutOfBounds(_))
        ));

        let edges = inset.with_field(bubble_at("c", Quad::from_rect(50.0, 50.0, 100.0, 100.0)));
        assert!(edges.validate().is_ok());
    }

    #[test]
    fn test_json_roundtrip_keeps_kind() {
        let json = r#"{
            "name": "exam",
            "corners": {
                "topLeft": {"x": 0, "y": 0},
                "topRight": {"x": 200, "y": 0},
                "bottomLeft": {"x": 0, "y": 300},
                "bottomRight": {"x": 200, "y": 300}
            },
            "fields": [
                {"type": "barcode", "id": "bc",
                 "corners": {"topLeft": {"x": 0, "y": 0}, "topRight": {"x": 50, "y": 0},
                             "bottomLeft": {"x": 0, "y": 20}, "bottomRight": {"x": 50, "y": 20}}},
                {"type": "bubble", "id": "q1a", "question": "q1", "value": "A",
                 "answerRowGroup": "row1",
                 "corners": {"topLeft": {"x": 10, "y": 40}, "topRight": {"x": 20, "y": 40},
                             "bottomLeft": {"x": 10, "y": 50}, "bottomRight": {"x": 20, "y": 50}}}
            ]
        }"#;
        let template = Template::from_json(json).unwrap();
        assert_eq!(template.fields.len(), 2);
        assert!(template.fields[0].is_barcode());
        assert_eq!(template.fields[1].row_group(), Some("row1"));
        assert_eq!(template.bubble_fields().count(), 1);
        assert!(template.validate().is_ok());
    }
}
