use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use signwatch_core::detection::infrastructure::onnx_yolo_detector::{
    DEFAULT_CONFIDENCE, DEFAULT_IOU_THRESHOLD,
};
use signwatch_core::shared::constants::{
    DEFAULT_CAMERA_INDEX, DEFAULT_MODELS_DIR, DEFAULT_POLL_INTERVAL_MS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Appearance {
    System,
    Dark,
    #[default]
    Light,
}

/// User preferences, read once at startup. The app never writes this file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub models_dir: PathBuf,
    pub poll_interval_ms: u64,
    pub camera_index: u32,
    pub confidence: f32,
    pub iou_threshold: f32,
    pub label_font: Option<PathBuf>,
    pub appearance: Appearance,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from(DEFAULT_MODELS_DIR),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            camera_index: DEFAULT_CAMERA_INDEX,
            confidence: DEFAULT_CONFIDENCE,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            label_font: None,
            appearance: Appearance::default(),
        }
    }
}

impl Settings {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("SignWatch").join("settings.json"))
    }

    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(json) = fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str::<Settings>(&json) {
            Ok(settings) => settings.sanitized(),
            Err(e) => {
                log::warn!("Ignoring malformed settings at {}: {e}", path.display());
                Self::default()
            }
        }
    }

    fn sanitized(mut self) -> Self {
        self.poll_interval_ms = self.poll_interval_ms.max(1);
        self.confidence = self.confidence.clamp(0.0, 1.0);
        self.iou_threshold = self.iou_threshold.clamp(0.0, 1.0);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_settings(contents: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load_from(&dir.path().join("settings.json"));
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.poll_interval(), Duration::from_millis(30));
        assert_eq!(settings.models_dir, PathBuf::from("models"));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let (_dir, path) = write_settings(r#"{ "camera_index": 2, "appearance": "dark" }"#);
        let settings = Settings::load_from(&path);
        assert_eq!(settings.camera_index, 2);
        assert_eq!(settings.appearance, Appearance::Dark);
        assert_eq!(settings.poll_interval_ms, 30);
        assert!(settings.label_font.is_none());
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let (_dir, path) = write_settings("{ not json");
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let (_dir, path) =
            write_settings(r#"{ "poll_interval_ms": 0, "confidence": 3.0, "iou_threshold": -1 }"#);
        let settings = Settings::load_from(&path);
        assert_eq!(settings.poll_interval_ms, 1);
        assert_eq!(settings.confidence, 1.0);
        assert_eq!(settings.iou_threshold, 0.0);
    }
}
