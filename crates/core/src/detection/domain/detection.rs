use crate::shared::bounding_box::BoundingBox;

/// One predicted box with its class index and score.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub class_id: usize,
    pub confidence: f32,
}
