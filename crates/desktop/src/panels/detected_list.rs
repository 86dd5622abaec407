use iced::border::Border;
use iced::widget::{column, container, scrollable, text};
use iced::{Element, Length, Theme};

use signwatch_core::registry::class_registry::ClassRegistry;

use crate::app::Message;
use crate::theme::{muted_color, ACCENT_TEAL};

const LIST_HEIGHT: f32 = 150.0;

pub fn view<'a>(registry: &'a ClassRegistry) -> Element<'a, Message> {
    let items: Element<'a, Message> = if registry.is_empty() {
        text("Nothing detected yet")
            .size(14)
            .style(|theme: &Theme| text::Style {
                color: Some(muted_color(theme)),
            })
            .into()
    } else {
        column(registry.iter().map(|name| text(name).size(15).into()))
            .spacing(4)
            .into()
    };

    let list = container(scrollable(items).width(Length::Fill).height(Length::Fill))
        .padding(8)
        .width(Length::Fill)
        .height(Length::Fixed(LIST_HEIGHT))
        .style(|theme: &Theme| container::Style {
            background: Some(theme.extended_palette().background.base.color.into()),
            border: Border {
                color: ACCENT_TEAL,
                width: 2.0,
                radius: 4.0.into(),
            },
            ..container::Style::default()
        });

    column![
        text(format!("Detected signs ({}):", registry.len())).size(16),
        list
    ]
    .spacing(6)
    .into()
}
