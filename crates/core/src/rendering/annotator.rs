use std::fs;
use std::path::{Path, PathBuf};

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::detection::domain::class_names::ClassNames;
use crate::detection::domain::detection::Detection;
use crate::shared::frame::Frame;

const PALETTE_SIZE: usize = 20;
const LABEL_TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const LABEL_PADDING: u32 = 2;
const MIN_LINE_WIDTH: u32 = 2;
const MIN_FONT_PX: f32 = 14.0;

#[cfg(target_os = "macos")]
const SYSTEM_FONTS: &[&str] = &[
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
];

#[cfg(target_os = "windows")]
const SYSTEM_FONTS: &[&str] = &[r"C:\Windows\Fonts\segoeui.ttf", r"C:\Windows\Fonts\arial.ttf"];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
];

/// Burns detection boxes and class labels into a copy of a frame.
///
/// Without a font only the boxes are drawn.
pub struct Annotator {
    font: Option<FontArc>,
    colors: Vec<Rgb<u8>>,
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Annotator {
    pub fn new(font: Option<FontArc>) -> Self {
        let colors = (0..PALETTE_SIZE)
            .map(|i| hsv_to_rgb(i as f32 / PALETTE_SIZE as f32 * 360.0, 0.85, 0.9))
            .collect();
        Self { font, colors }
    }

    /// Loads the label font from `preferred`, else from well-known system paths.
    pub fn with_font_file(preferred: Option<&Path>) -> Self {
        let candidates = preferred
            .map(Path::to_path_buf)
            .into_iter()
            .chain(SYSTEM_FONTS.iter().map(PathBuf::from));

        for path in candidates {
            match load_font(&path) {
                Some(font) => {
                    log::debug!("Label font: {}", path.display());
                    return Self::new(Some(font));
                }
                None if preferred == Some(path.as_path()) => {
                    log::warn!("Cannot load label font {}", path.display());
                }
                None => {}
            }
        }
        log::warn!("No label font found; detections are drawn without labels");
        Self::new(None)
    }

    /// Returns `frame` with every detection drawn on it.
    ///
    /// Frames that are not 3-channel, and frames without detections, are
    /// returned unchanged.
    pub fn annotate(&self, frame: &Frame, detections: &[Detection], names: &ClassNames) -> Frame {
        if detections.is_empty() {
            return frame.clone();
        }
        let Some(mut img) = frame.to_rgb_image() else {
            return frame.clone();
        };

        let line_width = line_width(img.width(), img.height());
        let scale = PxScale::from((line_width as f32 * 7.0).max(MIN_FONT_PX));

        for det in detections {
            let color = self.colors[det.class_id % self.colors.len()];
            let bbox = det.bbox.clamp(img.width(), img.height());
            let x = bbox.x1 as i32;
            let y = bbox.y1 as i32;
            let w = (bbox.width() as u32).max(1);
            let h = (bbox.height() as u32).max(1);

            for inset in 0..line_width {
                if w <= inset * 2 || h <= inset * 2 {
                    break;
                }
                let rect = Rect::at(x + inset as i32, y + inset as i32)
                    .of_size(w - inset * 2, h - inset * 2);
                draw_hollow_rect_mut(&mut img, rect, color);
            }

            if let Some(font) = &self.font {
                let label = format!("{} {:.2}", names.name(det.class_id), det.confidence);
                let (tw, th) = text_size(scale, font, &label);
                let tag_h = th + LABEL_PADDING * 2;
                // Tag sits above the box unless that leaves the frame.
                let tag_y = if y >= tag_h as i32 { y - tag_h as i32 } else { y };
                draw_filled_rect_mut(
                    &mut img,
                    Rect::at(x, tag_y).of_size(tw + LABEL_PADDING * 2, tag_h),
                    color,
                );
                draw_text_mut(
                    &mut img,
                    LABEL_TEXT_COLOR,
                    x + LABEL_PADDING as i32,
                    tag_y + LABEL_PADDING as i32,
                    scale,
                    font,
                    &label,
                );
            }
        }

        Frame::from_rgb_image(img, frame.index())
    }
}

fn load_font(path: &Path) -> Option<FontArc> {
    let bytes = fs::read(path).ok()?;
    FontArc::try_from_vec(bytes).ok()
}

/// Box stroke width, growing with frame size.
fn line_width(width: u32, height: u32) -> u32 {
    let lw = ((width + height) as f32 / 2.0 * 0.003).round() as u32;
    lw.max(MIN_LINE_WIDTH)
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb<u8> {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match h {
        h if h < 60.0 => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    Rgb([
        ((r + m) * 255.0) as u8,
        ((g + m) * 255.0) as u8,
        ((b + m) * 255.0) as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::bounding_box::BoundingBox;

    fn gray_frame(width: u32, height: u32) -> Frame {
        Frame::new(vec![128u8; (width * height * 3) as usize], width, height, 3, 4)
    }

    fn detection(class_id: usize) -> Detection {
        Detection {
            bbox: BoundingBox::new(20.0, 30.0, 60.0, 70.0),
            class_id,
            confidence: 0.87,
        }
    }

    fn pixel(frame: &Frame, x: u32, y: u32) -> [u8; 3] {
        let i = ((y * frame.width() + x) * 3) as usize;
        [frame.data()[i], frame.data()[i + 1], frame.data()[i + 2]]
    }

    #[test]
    fn test_no_detections_returns_frame_unchanged() {
        let frame = gray_frame(64, 48);
        let out = Annotator::default().annotate(&frame, &[], &ClassNames::default());
        assert_eq!(out, frame);
    }

    #[test]
    fn test_box_outline_is_drawn_in_class_color() {
        let annotator = Annotator::default();
        let frame = gray_frame(100, 100);
        let out = annotator.annotate(&frame, &[detection(3)], &ClassNames::default());

        let expected = annotator.colors[3].0;
        assert_eq!(pixel(&out, 20, 50), expected);
        assert_eq!(pixel(&out, 40, 30), expected);
        // Interior stays untouched.
        assert_eq!(pixel(&out, 40, 50), [128, 128, 128]);
        assert_eq!(out.index(), 4);
    }

    #[test]
    fn test_out_of_frame_box_is_clamped() {
        let frame = gray_frame(50, 50);
        let det = Detection {
            bbox: BoundingBox::new(-20.0, -20.0, 500.0, 500.0),
            class_id: 0,
            confidence: 0.5,
        };
        let out = Annotator::default().annotate(&frame, &[det], &ClassNames::default());
        assert_eq!(out.width(), 50);
        assert_ne!(pixel(&out, 0, 0), [128, 128, 128]);
    }

    #[test]
    fn test_palette_wraps_large_class_ids() {
        let annotator = Annotator::default();
        let frame = gray_frame(100, 100);
        let a = annotator.annotate(&frame, &[detection(1)], &ClassNames::default());
        let b = annotator.annotate(&frame, &[detection(1 + PALETTE_SIZE)], &ClassNames::default());
        assert_eq!(a, b);
    }

    #[test]
    fn test_line_width_scales_with_frame() {
        assert_eq!(line_width(100, 100), MIN_LINE_WIDTH);
        assert_eq!(line_width(1920, 1080), 5);
    }

    #[test]
    fn test_missing_preferred_font_still_builds() {
        let annotator = Annotator::with_font_file(Some(Path::new("/nonexistent/font.ttf")));
        let frame = gray_frame(64, 64);
        let out = annotator.annotate(&frame, &[detection(0)], &ClassNames::from_list(["stop"]));
        assert_ne!(out, frame);
    }

    #[test]
    fn test_hsv_primaries() {
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), Rgb([255, 0, 0]));
        assert_eq!(hsv_to_rgb(120.0, 1.0, 1.0), Rgb([0, 255, 0]));
        assert_eq!(hsv_to_rgb(240.0, 1.0, 1.0), Rgb([0, 0, 255]));
    }
}
