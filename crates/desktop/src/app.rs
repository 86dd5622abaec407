use std::path::{Path, PathBuf};

use iced::widget::{column, image};
use iced::{Element, Length, Subscription, Task, Theme};

use signwatch_core::catalog::model_catalog::{list_models, ModelEntry};
use signwatch_core::detection::infrastructure::onnx_yolo_detector::OnnxDetectorFactory;
use signwatch_core::rendering::annotator::Annotator;
use signwatch_core::rendering::display::to_rgba;
use signwatch_core::session::detection_session::{
    DetectionSession, FrameOutcome, PollOutcome, SessionError,
};
use signwatch_core::shared::constants::{IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};
use signwatch_core::shared::frame::Frame;
use signwatch_core::video::infrastructure::ffmpeg_capture::FfmpegCaptureOpener;
use signwatch_core::video::infrastructure::image_file_reader::ImageFileReader;

use crate::panels;
use crate::settings::{Appearance, Settings};
use crate::theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Image,
    Video,
    Camera,
}

impl Action {
    pub const ALL: &[Action] = &[Action::Image, Action::Video, Action::Camera];

    pub fn label(self) -> &'static str {
        match self {
            Action::Image => "Detect image",
            Action::Video => "Detect video",
            Action::Camera => "Open camera",
        }
    }

    pub fn message(self) -> Message {
        match self {
            Action::Image => Message::DetectImage,
            Action::Video => Message::DetectVideo,
            Action::Camera => Message::DetectCamera,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    ModelSelected(ModelEntry),
    DetectImage,
    ImagePicked(Option<PathBuf>),
    DetectVideo,
    VideoPicked(Option<PathBuf>),
    DetectCamera,
    Tick,
    ActionHovered(Action, bool),
    DialogClosed,
    PollSystemTheme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Status {
    pub kind: StatusKind,
    pub text: String,
}

impl Status {
    fn info(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Info,
            text: text.into(),
        }
    }

    fn success(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            text: text.into(),
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }
}

/// Latest annotated frame, ready for the image widget.
#[derive(Debug, Clone)]
pub struct Preview {
    pub handle: image::Handle,
    pub width: u32,
    pub height: u32,
}

impl Preview {
    fn from_frame(frame: &Frame) -> Self {
        Self {
            handle: image::Handle::from_rgba(frame.width(), frame.height(), to_rgba(frame)),
            width: frame.width(),
            height: frame.height(),
        }
    }
}

pub struct App {
    settings: Settings,
    session: DetectionSession,
    models: Vec<ModelEntry>,
    selected_model: Option<ModelEntry>,
    status: Status,
    preview: Option<Preview>,
    hovered: Option<Action>,
}

impl App {
    pub fn new() -> (Self, Task<Message>) {
        let settings = Settings::load();
        let models = list_models(&settings.models_dir).unwrap_or_else(|e| {
            log::warn!("{e}");
            Vec::new()
        });
        log::info!(
            "Found {} models in {}",
            models.len(),
            settings.models_dir.display()
        );

        let session = DetectionSession::new(
            Box::new(OnnxDetectorFactory {
                confidence: settings.confidence,
                iou_threshold: settings.iou_threshold,
            }),
            Box::new(ImageFileReader::new()),
            Box::new(FfmpegCaptureOpener),
            Annotator::with_font_file(settings.label_font.as_deref()),
        );

        let status = if models.is_empty() {
            Status::info(format!(
                "No models found in {}",
                settings.models_dir.display()
            ))
        } else {
            Status::info("Select a model to begin")
        };

        (
            Self {
                settings,
                session,
                models,
                selected_model: None,
                status,
                preview: None,
                hovered: None,
            },
            Task::none(),
        )
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::ModelSelected(entry) => {
                if self.session.is_active_model(&entry.path) {
                    return Task::none();
                }
                match self.session.select_model(&entry.path) {
                    Ok(()) => {
                        self.status = Status::success(format!("Model loaded: {}", entry.name));
                        self.selected_model = Some(entry);
                    }
                    Err(e) => return self.report(e),
                }
            }
            Message::DetectImage => {
                if let Err(e) = self.session.prepare_run() {
                    return self.report(e);
                }
                return pick_file("Select image", "Images", IMAGE_EXTENSIONS, Message::ImagePicked);
            }
            Message::ImagePicked(Some(path)) => match self.session.detect_image(&path) {
                Ok(outcome) => {
                    let count = outcome.detections.len();
                    self.show(outcome);
                    self.status =
                        Status::success(format!("{}: {count} detections", file_label(&path)));
                }
                Err(e) => return self.report(e),
            },
            Message::ImagePicked(None) => {}
            Message::DetectVideo => {
                if let Err(e) = self.session.prepare_run() {
                    return self.report(e);
                }
                return pick_file("Select video", "Videos", VIDEO_EXTENSIONS, Message::VideoPicked);
            }
            Message::VideoPicked(Some(path)) => match self.session.start_video(&path) {
                Ok(()) => self.status = Status::success(format!("Playing {}", file_label(&path))),
                Err(e) => return self.report(e),
            },
            Message::VideoPicked(None) => {}
            Message::DetectCamera => match self.session.start_camera(self.settings.camera_index) {
                Ok(()) => {
                    self.status =
                        Status::success(format!("Camera {} running", self.settings.camera_index))
                }
                Err(e) => return self.report(e),
            },
            Message::Tick => match self.session.poll() {
                Ok(PollOutcome::Frame(outcome)) => self.show(outcome),
                Ok(PollOutcome::Ended) => self.status = Status::info("Stopped"),
                Ok(PollOutcome::Idle) => {}
                Err(e) => return self.report(e),
            },
            Message::ActionHovered(action, hovered) => {
                if hovered {
                    self.hovered = Some(action);
                } else if self.hovered == Some(action) {
                    self.hovered = None;
                }
            }
            Message::DialogClosed => {}
            Message::PollSystemTheme => {
                // theme() re-resolves on every render.
            }
        }
        Task::none()
    }

    fn show(&mut self, outcome: FrameOutcome) {
        self.preview = Some(Preview::from_frame(&outcome.frame));
    }

    /// Puts the failure in the status line; load failures and a missing
    /// model also raise a dialog.
    fn report(&mut self, error: SessionError) -> Task<Message> {
        log::warn!("{error}");
        match error {
            SessionError::NoModel => {
                self.status = Status::error("Please select a model first");
                message_dialog(
                    rfd::MessageLevel::Warning,
                    "No model selected",
                    "Please select a model first.".to_string(),
                )
            }
            SessionError::ModelLoad { path, message } => {
                self.status = Status::error("Failed to load model");
                message_dialog(
                    rfd::MessageLevel::Error,
                    "Failed to load model",
                    format!("{}\n\n{message}", file_label(&path)),
                )
            }
            other => {
                self.status = Status::error(other.to_string());
                Task::none()
            }
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let theme = self.theme();
        column![
            panels::controls::view(
                &self.models,
                self.selected_model.as_ref(),
                self.session.model_name(),
                &self.status,
                self.hovered,
            ),
            panels::preview::view(self.preview.as_ref(), &theme),
            panels::detected_list::view(self.session.registry()),
        ]
        .spacing(14)
        .padding(20)
        .height(Length::Fill)
        .into()
    }

    pub fn theme(&self) -> Theme {
        theme::resolve_theme(self.settings.appearance)
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let polling = if self.session.is_polling() {
            iced::time::every(self.settings.poll_interval()).map(|_| Message::Tick)
        } else {
            Subscription::none()
        };

        let system_theme = if self.settings.appearance == Appearance::System {
            iced::time::every(std::time::Duration::from_secs(2)).map(|_| Message::PollSystemTheme)
        } else {
            Subscription::none()
        };

        Subscription::batch([polling, system_theme])
    }
}

fn pick_file(
    title: &'static str,
    filter_name: &'static str,
    extensions: &'static [&'static str],
    on_pick: fn(Option<PathBuf>) -> Message,
) -> Task<Message> {
    Task::perform(
        async move {
            rfd::AsyncFileDialog::new()
                .set_title(title)
                .add_filter(filter_name, extensions)
                .pick_file()
                .await
                .map(|h| h.path().to_path_buf())
        },
        on_pick,
    )
}

fn message_dialog(
    level: rfd::MessageLevel,
    title: &'static str,
    description: String,
) -> Task<Message> {
    Task::perform(
        async move {
            rfd::AsyncMessageDialog::new()
                .set_level(level)
                .set_title(title)
                .set_description(description)
                .set_buttons(rfd::MessageButtons::Ok)
                .show()
                .await;
        },
        |_| Message::DialogClosed,
    )
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
