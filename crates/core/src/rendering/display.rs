use crate::shared::frame::Frame;

/// Largest `(width, height)` with the source aspect ratio that fits `bounds`.
///
/// Called on every render so widget resizes between frames are picked up.
/// Degenerate sources or bounds yield `(0.0, 0.0)`.
pub fn fit_size(src_width: u32, src_height: u32, bounds: (f32, f32)) -> (f32, f32) {
    let (max_w, max_h) = bounds;
    if src_width == 0 || src_height == 0 || max_w <= 0.0 || max_h <= 0.0 {
        return (0.0, 0.0);
    }
    let scale = (max_w / src_width as f32).min(max_h / src_height as f32);
    (
        (src_width as f32 * scale).round().min(max_w),
        (src_height as f32 * scale).round().min(max_h),
    )
}

/// Expands frame pixels to RGBA8, the layout GUI image handles expect.
pub fn to_rgba(frame: &Frame) -> Vec<u8> {
    let data = frame.data();
    let pixels = frame.width() as usize * frame.height() as usize;
    let mut out = Vec::with_capacity(pixels * 4);
    match frame.channels() {
        4 => out.extend_from_slice(data),
        3 => {
            for px in data.chunks_exact(3) {
                out.extend_from_slice(px);
                out.push(u8::MAX);
            }
        }
        1 => {
            for &v in data {
                out.extend_from_slice(&[v, v, v, u8::MAX]);
            }
        }
        n => {
            log::warn!("Cannot display {n}-channel frame");
            out.resize(pixels * 4, 0);
        }
    }
    out
}
