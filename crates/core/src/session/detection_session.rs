use std::path::{Path, PathBuf};
use std::time::Instant;

use thiserror::Error;

use crate::detection::domain::detection::Detection;
use crate::detection::domain::object_detector::{DetectorFactory, ObjectDetector};
use crate::registry::class_registry::ClassRegistry;
use crate::rendering::annotator::Annotator;
use crate::shared::frame::Frame;
use crate::video::domain::frame_source::{CaptureOpener, FrameSource};
use crate::video::domain::image_reader::ImageReader;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("no model selected")]
    NoModel,
    #[error("failed to load model {path}: {message}")]
    ModelLoad { path: PathBuf, message: String },
    #[error("failed to read image {path}: {message}")]
    ImageRead { path: PathBuf, message: String },
    #[error("failed to open {target}: {message}")]
    CaptureOpen { target: String, message: String },
    #[error("inference failed: {0}")]
    Inference(String),
}

/// Current frame-source discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunningMode {
    Idle,
    Video,
    Camera,
}

impl std::fmt::Display for RunningMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunningMode::Idle => write!(f, "idle"),
            RunningMode::Video => write!(f, "video"),
            RunningMode::Camera => write!(f, "camera"),
        }
    }
}

/// Result of running one frame through the model.
#[derive(Debug, Clone)]
pub struct FrameOutcome {
    /// Input frame with boxes and labels drawn on it.
    pub frame: Frame,
    pub detections: Vec<Detection>,
    /// Class names seen for the first time since the model was loaded.
    pub new_classes: Vec<String>,
}

/// What a single [`DetectionSession::poll`] did.
#[derive(Debug, Clone)]
pub enum PollOutcome {
    Frame(FrameOutcome),
    /// The run ended on this poll (end of stream or read failure).
    Ended,
    /// Nothing was running; the tick arrived after the run was stopped.
    Idle,
}

struct LoadedModel {
    name: String,
    path: PathBuf,
    detector: Box<dyn ObjectDetector>,
}

/// Owns the loaded model, the capture handle, and the detected-class registry.
///
/// Every transition goes through here: starting a run always tears down the
/// previous capture handle first, and replacing the model clears the
/// registry. The caller drives `poll` on a fixed timer while
/// [`is_polling`](Self::is_polling) is true.
pub struct DetectionSession {
    factory: Box<dyn DetectorFactory>,
    images: Box<dyn ImageReader>,
    captures: Box<dyn CaptureOpener>,
    annotator: Annotator,
    model: Option<LoadedModel>,
    source: Option<Box<dyn FrameSource>>,
    mode: RunningMode,
    registry: ClassRegistry,
}

impl DetectionSession {
    pub fn new(
        factory: Box<dyn DetectorFactory>,
        images: Box<dyn ImageReader>,
        captures: Box<dyn CaptureOpener>,
        annotator: Annotator,
    ) -> Self {
        Self {
            factory,
            images,
            captures,
            annotator,
            model: None,
            source: None,
            mode: RunningMode::Idle,
            registry: ClassRegistry::new(),
        }
    }

    /// Stops any run and loads `path` as the active model.
    ///
    /// On failure the previous model and its registry stay in place.
    pub fn select_model(&mut self, path: &Path) -> Result<(), SessionError> {
        self.stop();
        let detector = self.factory.load(path).map_err(|e| {
            log::warn!("Model load failed for {}: {e}", path.display());
            SessionError::ModelLoad {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        log::info!("Active model: {name}");

        self.model = Some(LoadedModel {
            name,
            path: path.to_path_buf(),
            detector,
        });
        self.registry.clear();
        Ok(())
    }

    pub fn model_name(&self) -> Option<&str> {
        self.model.as_ref().map(|m| m.name.as_str())
    }

    /// True if `path` is the model currently loaded.
    pub fn is_active_model(&self, path: &Path) -> bool {
        self.model.as_ref().is_some_and(|m| m.path.as_path() == path)
    }

    /// Stops any run, then checks a model is loaded.
    ///
    /// Call before asking the user for an input file.
    pub fn prepare_run(&mut self) -> Result<(), SessionError> {
        self.stop();
        if self.model.is_none() {
            return Err(SessionError::NoModel);
        }
        Ok(())
    }

    /// Runs the model once over a still image.
    pub fn detect_image(&mut self, path: &Path) -> Result<FrameOutcome, SessionError> {
        self.prepare_run()?;
        let frame = self
            .images
            .read(path)
            .map_err(|e| SessionError::ImageRead {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        let outcome = self.process(frame)?;
        log::info!(
            "{}: {} detections",
            path.display(),
            outcome.detections.len()
        );
        Ok(outcome)
    }

    pub fn start_video(&mut self, path: &Path) -> Result<(), SessionError> {
        self.prepare_run()?;
        let source = self
            .captures
            .open_video(path)
            .map_err(|e| SessionError::CaptureOpen {
                target: path.display().to_string(),
                message: e.to_string(),
            })?;
        self.begin(source, RunningMode::Video);
        Ok(())
    }

    pub fn start_camera(&mut self, index: u32) -> Result<(), SessionError> {
        self.prepare_run()?;
        let source = self
            .captures
            .open_camera(index)
            .map_err(|e| SessionError::CaptureOpen {
                target: format!("camera {index}"),
                message: e.to_string(),
            })?;
        self.begin(source, RunningMode::Camera);
        Ok(())
    }

    fn begin(&mut self, source: Box<dyn FrameSource>, mode: RunningMode) {
        self.source = Some(source);
        self.mode = mode;
        log::info!("Started {mode} run");
    }

    /// Pulls and processes one frame from the active capture handle.
    ///
    /// End of stream and read failures stop the run and report
    /// [`PollOutcome::Ended`]. An inference failure stops the run and is
    /// returned.
    pub fn poll(&mut self) -> Result<PollOutcome, SessionError> {
        let Some(source) = self.source.as_mut() else {
            return Ok(PollOutcome::Idle);
        };

        let frame = match source.read() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                log::info!("End of {} stream", self.mode);
                self.stop();
                return Ok(PollOutcome::Ended);
            }
            Err(e) => {
                log::warn!("Frame read failed, stopping {} run: {e}", self.mode);
                self.stop();
                return Ok(PollOutcome::Ended);
            }
        };

        match self.process(frame) {
            Ok(outcome) => Ok(PollOutcome::Frame(outcome)),
            Err(e) => {
                self.stop();
                Err(e)
            }
        }
    }

    /// Releases the capture handle, if any, and returns to idle.
    pub fn stop(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.release();
            log::info!("Stopped {} run", self.mode);
        }
        self.mode = RunningMode::Idle;
    }

    pub fn mode(&self) -> RunningMode {
        self.mode
    }

    /// True iff the polling timer should be running.
    pub fn is_polling(&self) -> bool {
        matches!(self.mode, RunningMode::Video | RunningMode::Camera)
    }

    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    fn process(&mut self, frame: Frame) -> Result<FrameOutcome, SessionError> {
        let model = self.model.as_mut().ok_or(SessionError::NoModel)?;

        let t0 = Instant::now();
        let detections = model
            .detector
            .detect(&frame)
            .map_err(|e| SessionError::Inference(e.to_string()))?;
        let infer_ms = t0.elapsed().as_secs_f64() * 1000.0;

        let names = model.detector.class_names();
        let annotated = self.annotator.annotate(&frame, &detections, names);

        let mut new_classes = Vec::new();
        for det in &detections {
            let name = names.name(det.class_id);
            if self.registry.add(&name) {
                new_classes.push(name);
            }
        }

        log::debug!(
            "frame {}: {} detections, inference {infer_ms:.1}ms",
            frame.index(),
            detections.len()
        );

        Ok(FrameOutcome {
            frame: annotated,
            detections,
            new_classes,
        })
    }
}
