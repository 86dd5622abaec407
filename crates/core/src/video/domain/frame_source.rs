use std::path::Path;

use crate::shared::frame::Frame;

/// Pull handle over a video file or camera stream.
///
/// The owner polls `read` on a fixed interval; `Ok(None)` means the
/// stream ended.
pub trait FrameSource: Send {
    /// Decodes the next frame.
    fn read(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>>;

    /// Closes the underlying handle. Calling it twice is a no-op.
    fn release(&mut self);
}

/// Opens capture handles for the running modes.
pub trait CaptureOpener: Send {
    fn open_video(&self, path: &Path) -> Result<Box<dyn FrameSource>, Box<dyn std::error::Error>>;

    fn open_camera(&self, index: u32) -> Result<Box<dyn FrameSource>, Box<dyn std::error::Error>>;
}
