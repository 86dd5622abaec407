//! YOLO object detector using ONNX Runtime via `ort`.
//!
//! Handles letterbox preprocessing, inference, and class-aware NMS for
//! Ultralytics-style detection exports (`[1, 4 + classes, anchors]`).
use std::path::Path;

use crate::detection::domain::class_names::ClassNames;
use crate::detection::domain::detection::Detection;
use crate::detection::domain::object_detector::{DetectorFactory, ObjectDetector};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::constants::CLASS_NAMES_EXTENSION;
use crate::shared::frame::Frame;

use super::execution_provider::detector_execution_providers;

/// Fallback input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

pub const DEFAULT_CONFIDENCE: f32 = 0.25;
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.7;

/// Upper bound on boxes kept per frame after NMS.
const MAX_DETECTIONS: usize = 300;

const BOX_VALUES: usize = 4;

/// YOLO detector backed by an ONNX Runtime session.
pub struct OnnxYoloDetector {
    session: ort::session::Session,
    class_names: ClassNames,
    confidence: f32,
    iou_threshold: f32,
    input_size: u32,
}

impl OnnxYoloDetector {
    /// Load a YOLO ONNX model and prepare for inference.
    ///
    /// The input resolution is read from the model's input shape (expecting NCHW).
    /// Falls back to 640 if the shape is dynamic or unreadable.
    pub fn new(
        model_path: &Path,
        confidence: f32,
        iou_threshold: f32,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?
            .with_execution_providers(detector_execution_providers())?
            .commit_from_file(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| {
                if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                    // [N, C, H, W], square input
                    if shape.len() >= 4 && shape[2] > 0 {
                        Some(shape[2] as u32)
                    } else {
                        None
                    }
                } else {
                    None
                }
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        let embedded = session
            .metadata()
            .ok()
            .and_then(|meta| meta.custom("names").ok().flatten());
        let class_names = resolve_class_names(embedded.as_deref(), model_path);

        log::info!(
            "Loaded {} ({} classes, input {input_size}px)",
            model_path.display(),
            class_names.len()
        );

        Ok(Self {
            session,
            class_names,
            confidence,
            iou_threshold,
            input_size,
        })
    }
}

impl ObjectDetector for OnnxYoloDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
        if frame.channels() != 3 || frame.width() == 0 || frame.height() == 0 {
            return Err(format!(
                "Unsupported frame {}x{}x{}",
                frame.width(),
                frame.height(),
                frame.channels()
            )
            .into());
        }

        let (input_tensor, scale, pad_x, pad_y) = letterbox(frame, self.input_size)?;

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("YOLO model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;

        let layout = OutputLayout::from_shape(&shape)?;
        let letterbox = Letterbox {
            scale,
            pad_x: pad_x as f32,
            pad_y: pad_y as f32,
        };
        let candidates = decode(data, layout, self.confidence, letterbox, frame);
        Ok(nms(candidates, self.iou_threshold, MAX_DETECTIONS))
    }

    fn class_names(&self) -> &ClassNames {
        &self.class_names
    }
}

/// Builds [`OnnxYoloDetector`]s with fixed thresholds.
pub struct OnnxDetectorFactory {
    pub confidence: f32,
    pub iou_threshold: f32,
}

impl Default for OnnxDetectorFactory {
    fn default() -> Self {
        Self {
            confidence: DEFAULT_CONFIDENCE,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
        }
    }
}

impl DetectorFactory for OnnxDetectorFactory {
    fn load(&self, model_path: &Path) -> Result<Box<dyn ObjectDetector>, Box<dyn std::error::Error>> {
        if !model_path.is_file() {
            return Err(format!("Model file not found: {}", model_path.display()).into());
        }
        let detector = OnnxYoloDetector::new(model_path, self.confidence, self.iou_threshold)?;
        Ok(Box::new(detector))
    }
}

/// Embedded metadata first, then a `.names` sidecar next to the model.
fn resolve_class_names(embedded: Option<&str>, model_path: &Path) -> ClassNames {
    if let Some(names) = embedded.and_then(ClassNames::parse_metadata) {
        return names;
    }
    let sidecar = model_path.with_extension(CLASS_NAMES_EXTENSION);
    if sidecar.is_file() {
        match ClassNames::read_sidecar(&sidecar) {
            Ok(names) => return names,
            Err(e) => log::warn!("Cannot read {}: {e}", sidecar.display()),
        }
    }
    log::warn!(
        "{} has no class names; labels fall back to class indices",
        model_path.display()
    );
    ClassNames::default()
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Letterbox-resize a frame to `target_size` × `target_size`.
///
/// Returns `(NCHW float32 tensor, scale, pad_x, pad_y)`.
fn letterbox(
    frame: &Frame,
    target_size: u32,
) -> Result<(ndarray::Array4<f32>, f32, u32, u32), ndarray::ShapeError> {
    let fw = frame.width() as f32;
    let fh = frame.height() as f32;
    let target = target_size as f32;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    // Gray 114 padding, YOLO convention
    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = frame.as_ndarray()?;
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    // Nearest-neighbor resize into the padded region
    for y in 0..new_h as usize {
        let src_y = ((y as f32 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f32 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    Ok((tensor, scale, pad_x, pad_y))
}

// ---------------------------------------------------------------------------
// Postprocessing
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq)]
struct OutputLayout {
    anchors: usize,
    features: usize,
    /// `[1, features, anchors]`, the default Ultralytics export.
    transposed: bool,
}

impl OutputLayout {
    fn from_shape(shape: &[usize]) -> Result<Self, Box<dyn std::error::Error>> {
        if shape.len() != 3 {
            return Err(format!("Unexpected YOLO output shape: {shape:?}").into());
        }
        let transposed = shape[1] < shape[2];
        let (anchors, features) = if transposed {
            (shape[2], shape[1])
        } else {
            (shape[1], shape[2])
        };
        if features <= BOX_VALUES {
            return Err(format!("YOLO output has no class scores: {shape:?}").into());
        }
        Ok(Self {
            anchors,
            features,
            transposed,
        })
    }

    fn at(&self, data: &[f32], anchor: usize, feature: usize) -> f32 {
        if self.transposed {
            data[feature * self.anchors + anchor]
        } else {
            data[anchor * self.features + feature]
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Letterbox {
    scale: f32,
    pad_x: f32,
    pad_y: f32,
}

/// Picks the best class per anchor and maps boxes back to frame coordinates.
fn decode(
    data: &[f32],
    layout: OutputLayout,
    confidence: f32,
    letterbox: Letterbox,
    frame: &Frame,
) -> Vec<Detection> {
    let mut out = Vec::new();
    if data.len() < layout.anchors * layout.features {
        return out;
    }
    for i in 0..layout.anchors {
        let mut best_class = 0;
        let mut best_score = f32::MIN;
        for c in 0..layout.features - BOX_VALUES {
            let score = layout.at(data, i, BOX_VALUES + c);
            if score > best_score {
                best_score = score;
                best_class = c;
            }
        }
        if best_score < confidence {
            continue;
        }

        let raw = BoundingBox::from_center(
            layout.at(data, i, 0),
            layout.at(data, i, 1),
            layout.at(data, i, 2),
            layout.at(data, i, 3),
        );
        let bbox = BoundingBox::new(
            (raw.x1 - letterbox.pad_x) / letterbox.scale,
            (raw.y1 - letterbox.pad_y) / letterbox.scale,
            (raw.x2 - letterbox.pad_x) / letterbox.scale,
            (raw.y2 - letterbox.pad_y) / letterbox.scale,
        )
        .clamp(frame.width(), frame.height());

        out.push(Detection {
            bbox,
            class_id: best_class,
            confidence: best_score,
        });
    }
    out
}

/// Greedy per-class NMS: sort by confidence descending, suppress same-class overlaps.
fn nms(mut dets: Vec<Detection>, iou_thresh: f32, max_keep: usize) -> Vec<Detection> {
    dets.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<Detection> = Vec::new();
    let mut suppressed = vec![false; dets.len()];

    for i in 0..dets.len() {
        if suppressed[i] {
            continue;
        }
        if keep.len() == max_keep {
            break;
        }
        keep.push(dets[i].clone());
        for j in (i + 1)..dets.len() {
            if suppressed[j] || dets[j].class_id != dets[i].class_id {
                continue;
            }
            if dets[i].bbox.iou(&dets[j].bbox) > iou_thresh {
                suppressed[j] = true;
            }
        }
    }
    keep
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn det(x1: f32, y1: f32, x2: f32, y2: f32, class_id: usize, confidence: f32) -> Detection {
        Detection {
            bbox: BoundingBox::new(x1, y1, x2, y2),
            class_id,
            confidence,
        }
    }

    #[test]
    fn test_letterbox_preserves_aspect_ratio() {
        // 200x100 → 640: scale 3.2, new 640x320, pad_y 160
        let frame = Frame::new(vec![128u8; 200 * 100 * 3], 200, 100, 3, 0);
        let (tensor, scale, pad_x, pad_y) = letterbox(&frame, 640).unwrap();

        assert_eq!(tensor.shape(), &[1, 3, 640, 640]);
        assert_relative_eq!(scale, 3.2, epsilon = 1e-4);
        assert_eq!(pad_x, 0);
        assert_eq!(pad_y, 160);
    }

    #[test]
    fn test_letterbox_values_normalized() {
        let frame = Frame::new(vec![255u8; 100 * 50 * 3], 100, 50, 3, 0);
        let (tensor, _, pad_x, pad_y) = letterbox(&frame, 640).unwrap();

        let y = pad_y as usize + 1;
        let x = pad_x as usize + 1;
        assert!((tensor[[0, 0, y, x]] - 1.0).abs() < 0.01);
        assert!((tensor[[0, 0, 0, 0]] - 114.0 / 255.0).abs() < 0.01);
    }

    #[test]
    fn test_layout_detects_transposed_export() {
        let layout = OutputLayout::from_shape(&[1, 7, 8400]).unwrap();
        assert!(layout.transposed);
        assert_eq!(layout.anchors, 8400);
        assert_eq!(layout.features, 7);

        let layout = OutputLayout::from_shape(&[1, 8400, 7]).unwrap();
        assert!(!layout.transposed);
    }

    #[test]
    fn test_layout_rejects_box_only_output() {
        assert!(OutputLayout::from_shape(&[1, 4, 8400]).is_err());
        assert!(OutputLayout::from_shape(&[8400, 7]).is_err());
    }

    #[test]
    fn test_decode_maps_back_to_frame_and_picks_best_class() {
        // Transposed layout, 2 anchors, 2 classes: one row per feature.
        let layout = OutputLayout {
            anchors: 2,
            features: 6,
            transposed: true,
        };
        #[rustfmt::skip]
        let data = vec![
            100.0, 200.0, // cx
            200.0, 10.0,  // cy
            40.0,  20.0,  // w
            20.0,  4.0,   // h
            0.1,   0.05,  // class 0
            0.9,   0.10,  // class 1
        ];
        let frame = Frame::new(vec![0u8; 400 * 300 * 3], 400, 300, 3, 0);
        let lb = Letterbox {
            scale: 1.0,
            pad_x: 0.0,
            pad_y: 50.0,
        };
        let dets = decode(&data, layout, 0.25, lb, &frame);

        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].class_id, 1);
        assert_relative_eq!(dets[0].confidence, 0.9);
        assert_eq!(dets[0].bbox, BoundingBox::new(80.0, 140.0, 120.0, 160.0));
    }

    #[test]
    fn test_nms_suppresses_same_class_overlap() {
        let dets = vec![
            det(0.0, 0.0, 100.0, 100.0, 0, 0.9),
            det(5.0, 5.0, 105.0, 105.0, 0, 0.8),
        ];
        let kept = nms(dets, 0.5, MAX_DETECTIONS);
        assert_eq!(kept.len(), 1);
        assert_relative_eq!(kept[0].confidence, 0.9);
    }

    #[test]
    fn test_nms_keeps_overlap_across_classes() {
        let dets = vec![
            det(0.0, 0.0, 100.0, 100.0, 0, 0.9),
            det(5.0, 5.0, 105.0, 105.0, 1, 0.8),
        ];
        assert_eq!(nms(dets, 0.5, MAX_DETECTIONS).len(), 2);
    }

    #[test]
    fn test_nms_confidence_ordering() {
        let dets = vec![
            det(0.0, 0.0, 100.0, 100.0, 2, 0.5),
            det(2.0, 2.0, 102.0, 102.0, 2, 0.9),
        ];
        let kept = nms(dets, 0.5, MAX_DETECTIONS);
        assert_eq!(kept.len(), 1);
        assert_relative_eq!(kept[0].confidence, 0.9);
    }

    #[test]
    fn test_nms_respects_max_keep() {
        let dets = (0..10)
            .map(|i| det(i as f32 * 50.0, 0.0, i as f32 * 50.0 + 10.0, 10.0, 0, 0.5))
            .collect();
        assert_eq!(nms(dets, 0.5, 3).len(), 3);
    }

    #[test]
    fn test_nms_empty_input() {
        assert!(nms(Vec::new(), 0.5, MAX_DETECTIONS).is_empty());
    }

    #[test]
    fn test_resolve_class_names_prefers_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("signs.onnx");
        std::fs::write(model.with_extension("names"), "sidecar\n").unwrap();

        let names = resolve_class_names(Some("{0: 'embedded'}"), &model);
        assert_eq!(names.name(0), "embedded");
    }

    #[test]
    fn test_resolve_class_names_falls_back_to_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("signs.onnx");
        std::fs::write(model.with_extension("names"), "stop\nyield\n").unwrap();

        let names = resolve_class_names(Some("not a dict"), &model);
        assert_eq!(names.name(1), "yield");
    }

    #[test]
    fn test_resolve_class_names_without_sources_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let names = resolve_class_names(None, &dir.path().join("bare.onnx"));
        assert!(names.is_empty());
        assert_eq!(names.name(3), "class_3");
    }

    #[test]
    fn test_factory_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let factory = OnnxDetectorFactory::default();
        assert!(factory.load(&dir.path().join("missing.onnx")).is_err());
    }

    #[test]
    fn test_factory_rejects_malformed_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.onnx");
        std::fs::write(&path, b"definitely not protobuf").unwrap();
        let factory = OnnxDetectorFactory::default();
        assert!(factory.load(&path).is_err());
    }
}
