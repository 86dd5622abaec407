use std::path::Path;

use crate::detection::domain::class_names::ClassNames;
use crate::detection::domain::detection::Detection;
use crate::shared::frame::Frame;

/// Domain interface for a loaded detection model.
///
/// `&mut self` because inference sessions keep internal scratch state.
pub trait ObjectDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>>;

    /// Index → name mapping shipped with the model.
    fn class_names(&self) -> &ClassNames;
}

/// Constructs detectors from model files.
pub trait DetectorFactory: Send {
    fn load(&self, model_path: &Path) -> Result<Box<dyn ObjectDetector>, Box<dyn std::error::Error>>;
}
