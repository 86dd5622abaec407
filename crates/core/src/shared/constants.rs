/// Directory scanned for model files when no setting overrides it.
pub const DEFAULT_MODELS_DIR: &str = "models";

pub const MODEL_EXTENSION: &str = "onnx";

/// Sidecar label file extension: `<model-stem>.names`, one class per line.
pub const CLASS_NAMES_EXTENSION: &str = "names";

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi"];

/// Fixed polling period for video and camera runs.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 30;

pub const DEFAULT_CAMERA_INDEX: u32 = 0;
