use std::path::Path;

use ffmpeg_next::format::Pixel;
use ffmpeg_next::software::scaling;
use ffmpeg_next::util::frame::video::Video;

use crate::shared::frame::Frame;
use crate::video::domain::frame_source::{CaptureOpener, FrameSource};

/// Pull-based decoder over a video file or camera device, via ffmpeg-next.
///
/// Each `read` demuxes packets until the decoder yields a frame, converts
/// it to RGB24, and wraps it in a [`Frame`].
pub struct FfmpegCapture {
    state: Option<CaptureState>,
    frame_index: usize,
}

// Safety: FfmpegCapture is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegCapture {}

struct CaptureState {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: Option<((Pixel, u32, u32), scaling::Context)>,
    stream_index: usize,
    flushing: bool,
    done: bool,
}

impl FfmpegCapture {
    pub fn open_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;
        let ictx = ffmpeg_next::format::input(path)?;
        log::info!("Opened video {}", path.display());
        Self::from_input(ictx)
    }

    /// Opens camera `index` through the platform's capture backend.
    pub fn open_camera(index: u32) -> Result<Self, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;
        ffmpeg_next::device::register_all();

        let (backend, url) = camera_url(index);
        let format = ffmpeg_next::device::input::video()
            .find(|f| f.name() == backend)
            .ok_or_else(|| format!("Camera backend '{backend}' is not available"))?;

        let ctx = ffmpeg_next::format::open_with(
            &url,
            &ffmpeg_next::format::format::Format::Input(format),
            ffmpeg_next::Dictionary::new(),
        )?;
        let ictx = match ctx {
            ffmpeg_next::format::context::Context::Input(input) => input,
            ffmpeg_next::format::context::Context::Output(_) => {
                return Err(format!("Camera {url} did not open as an input").into())
            }
        };
        log::info!("Opened camera {index} ({backend} {url})");
        Self::from_input(ictx)
    }

    fn from_input(
        ictx: ffmpeg_next::format::context::Input,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let (stream_index, decoder) = {
            let stream = ictx
                .streams()
                .best(ffmpeg_next::media::Type::Video)
                .ok_or("No video stream found")?;
            let codec_ctx =
                ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
            (stream.index(), codec_ctx.decoder().video()?)
        };

        Ok(Self {
            state: Some(CaptureState {
                ictx,
                decoder,
                scaler: None,
                stream_index,
                flushing: false,
                done: false,
            }),
            frame_index: 0,
        })
    }

    pub fn is_open(&self) -> bool {
        self.state.is_some()
    }
}

impl FrameSource for FfmpegCapture {
    fn read(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let Some(state) = self.state.as_mut() else {
            return Err("FfmpegCapture: not opened".into());
        };
        let frame = state.next_frame(self.frame_index)?;
        if frame.is_some() {
            self.frame_index += 1;
        }
        Ok(frame)
    }

    fn release(&mut self) {
        if self.state.take().is_some() {
            log::debug!("Released capture after {} frames", self.frame_index);
        }
    }
}

impl CaptureState {
    fn next_frame(&mut self, index: usize) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        if self.done {
            return Ok(None);
        }
        if let Some(frame) = self.try_receive(index)? {
            return Ok(Some(frame));
        }
        if self.flushing {
            self.done = true;
            return Ok(None);
        }

        loop {
            let mut packet = ffmpeg_next::Packet::empty();
            match packet.read(&mut self.ictx) {
                Ok(()) => {}
                Err(ffmpeg_next::Error::Eof) => {
                    let _ = self.decoder.send_eof();
                    self.flushing = true;
                    if let Some(frame) = self.try_receive(index)? {
                        return Ok(Some(frame));
                    }
                    self.done = true;
                    return Ok(None);
                }
                Err(e) => return Err(Box::new(e)),
            }

            if packet.stream() != self.stream_index {
                continue;
            }
            if self.decoder.send_packet(&packet).is_err() {
                continue;
            }
            if let Some(frame) = self.try_receive(index)? {
                return Ok(Some(frame));
            }
        }
    }

    fn try_receive(&mut self, index: usize) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let mut decoded = Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }

        let width = decoded.width();
        let height = decoded.height();
        let key = (decoded.format(), width, height);

        // Camera streams may change format mid-run; rebuild on mismatch.
        let stale = !matches!(&self.scaler, Some((k, _)) if *k == key);
        if stale {
            let ctx = scaling::Context::get(
                decoded.format(),
                width,
                height,
                Pixel::RGB24,
                width,
                height,
                scaling::Flags::BILINEAR,
            )?;
            self.scaler = Some((key, ctx));
        }
        let Some((_, scaler)) = self.scaler.as_mut() else {
            return Err("RGB scaler unavailable".into());
        };

        let mut rgb_frame = Video::empty();
        scaler.run(&decoded, &mut rgb_frame)?;
        let pixels = extract_rgb_pixels(&rgb_frame, width, height);
        Ok(Some(Frame::new(pixels, width, height, 3, index)))
    }
}

/// Opens [`FfmpegCapture`] handles for video files and cameras.
#[derive(Default)]
pub struct FfmpegCaptureOpener;

impl CaptureOpener for FfmpegCaptureOpener {
    fn open_video(&self, path: &Path) -> Result<Box<dyn FrameSource>, Box<dyn std::error::Error>> {
        Ok(Box::new(FfmpegCapture::open_file(path)?))
    }

    fn open_camera(&self, index: u32) -> Result<Box<dyn FrameSource>, Box<dyn std::error::Error>> {
        Ok(Box::new(FfmpegCapture::open_camera(index)?))
    }
}

/// ffmpeg input device name and URL for camera `index`.
fn camera_url(index: u32) -> (&'static str, String) {
    #[cfg(target_os = "macos")]
    {
        ("avfoundation", format!("{index}:none"))
    }
    #[cfg(target_os = "windows")]
    {
        ("vfwcap", index.to_string())
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        ("video4linux2,v4l2", format!("/dev/video{index}"))
    }
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer.
///
/// ffmpeg frames may pad each row (stride > width*3); the padding is dropped.
fn extract_rgb_pixels(rgb_frame: &Video, width: u32, height: u32) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}
