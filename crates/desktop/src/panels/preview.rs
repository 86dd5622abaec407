use iced::widget::{image, responsive, text};
use iced::{Element, Theme};

use signwatch_core::rendering::display::fit_size;

use crate::app::{Message, Preview};
use crate::theme::{frame_border_color, muted_color, surface_color};
use crate::widgets::dashed_container::{dashed_container, DashedBorderStyle};

const MIN_HEIGHT: f32 = 400.0;
const BORDER_WIDTH: f32 = 3.0;

pub fn view<'a>(preview: Option<&Preview>, theme: &Theme) -> Element<'a, Message> {
    let content: Element<'a, Message> = match preview {
        Some(preview) => {
            let handle = preview.handle.clone();
            let (src_w, src_h) = (preview.width, preview.height);
            // Re-fit on every layout pass so window resizes between frames are honored.
            responsive(move |bounds| {
                let (w, h) = fit_size(src_w, src_h, (bounds.width, bounds.height));
                let fitted: Element<'a, Message> = image(handle.clone()).width(w).height(h).into();
                fitted
            })
            .into()
        }
        None => text("No image")
            .size(16)
            .color(muted_color(theme))
            .into(),
    };

    dashed_container(
        DashedBorderStyle {
            border_color: frame_border_color(theme),
            border_width: BORDER_WIDTH,
            dash_length: 8.0,
            gap_length: 6.0,
            corner_radius: 4.0,
            background: surface_color(theme),
        },
        8,
        content,
    )
    .min_height(MIN_HEIGHT)
    .into()
}
