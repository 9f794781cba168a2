use geo_types::{coord, Rect};
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// An object found by the detector.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub bbox: Rect<f32>,
    pub label: String,
    pub class_id: i64,
    pub confidence: f32,
}

impl Detection {
    pub fn new(
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        label: &str,
        class_id: i64,
        confidence: f32,
    ) -> Self {
        let bbox = Rect::new(coord! { x: x1, y: y1 }, coord! { x: x2, y: y2 });

        Self {
            bbox,
            label: label.to_string(),
            class_id,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /** [x1, y1, x2, y2] */
    pub fn xyxy(&self) -> [f32; 4] {
        let (min, max) = (self.bbox.min(), self.bbox.max());
        [min.x, min.y, max.x, max.y]
    }

    /// Text drawn next to the box, e.g. `bottle: 0.87`.
    pub fn caption(&self) -> String {
        format!("{}: {:.2}", self.label, self.confidence)
    }
}

impl Serialize for Detection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Detection", 3)?;
        state.serialize_field("label", &self.label)?;
        state.serialize_field("confidence", &self.confidence)?;
        state.serialize_field("bbox", &self.xyxy())?;
        state.end()
    }
}
