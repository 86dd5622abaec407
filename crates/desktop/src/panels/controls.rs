use iced::widget::{column, pick_list, row, text};
use iced::{Alignment, Element, Font, Length, Theme};

use signwatch_core::catalog::model_catalog::ModelEntry;

use crate::app::{Action, Message, Status, StatusKind};
use crate::theme::{info_color, muted_color};
use crate::widgets::action_button::action_button;

/// Title, model picker, status line, and the three run buttons.
pub fn view<'a>(
    models: &'a [ModelEntry],
    selected: Option<&'a ModelEntry>,
    active_model: Option<&'a str>,
    status: &'a Status,
    hovered: Option<Action>,
) -> Element<'a, Message> {
    let title = text("Traffic Sign Detection").size(26).font(Font {
        weight: iced::font::Weight::Bold,
        ..Font::DEFAULT
    });

    let model_picker = pick_list(models, selected.cloned(), Message::ModelSelected)
        .placeholder("Select model")
        .width(Length::Fixed(320.0));

    let model_label = text(format!("Current model: {}", active_model.unwrap_or("none")))
        .size(14)
        .style(|theme: &Theme| text::Style {
            color: Some(muted_color(theme)),
        });

    let status_kind = status.kind;
    let status_line = text(status.text.as_str())
        .size(14)
        .style(move |theme: &Theme| {
            let palette = theme.palette();
            let color = match status_kind {
                StatusKind::Info => info_color(theme),
                StatusKind::Success => palette.success,
                StatusKind::Error => palette.danger,
            };
            text::Style { color: Some(color) }
        });

    let buttons = row(Action::ALL.iter().map(|&action| {
        action_button(
            action.label(),
            action.message(),
            hovered == Some(action),
            move |h| Message::ActionHovered(action, h),
        )
    }))
    .spacing(12);

    column![
        title,
        row![text("Model:").size(15), model_picker]
            .spacing(10)
            .align_y(Alignment::Center),
        model_label,
        status_line,
        buttons,
    ]
    .spacing(10)
    .into()
}
