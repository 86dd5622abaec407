use std::time::Duration;

use iced::border::Border;
use iced::widget::{button, container, mouse_area, text};
use iced::{Color, Element, Length, Padding, Shadow, Theme, Vector};
use iced_anim::transition::Easing;
use iced_anim::AnimationBuilder;

use crate::theme::{ACCENT_ORANGE, ACCENT_ORANGE_HOVER};

const FLOAT_HEIGHT: f32 = 1.0;
const CORNER_RADIUS: f32 = 6.0;
const SHADOW_BLUR_BASE: f32 = 6.0;
const SHADOW_BLUR_HOVER: f32 = 12.0;
const SHADOW_ALPHA_BASE: f32 = 0.20;
const SHADOW_ALPHA_HOVER: f32 = 0.35;
const PADDING: [u16; 2] = [10, 20];
const ANIMATION_DURATION: Duration = Duration::from_millis(150);

/// Orange run button that eases to a darker shade while hovered.
pub fn action_button<'a, Message: Clone + 'a>(
    label: &'a str,
    on_press: Message,
    hovered: bool,
    on_hover: impl Fn(bool) -> Message + 'a,
) -> Element<'a, Message> {
    let target = if hovered { 1.0_f32 } else { 0.0 };

    let animated: Element<'a, Message> = AnimationBuilder::new(target, move |t: f32| {
        build_button(label, &on_press, t.clamp(0.0, 1.0))
    })
    .animates_layout(true)
    .animation(Easing::EASE_OUT.with_duration(ANIMATION_DURATION))
    .into();

    mouse_area(animated)
        .on_enter(on_hover(true))
        .on_exit(on_hover(false))
        .into()
}

fn build_button<'a, Message: Clone + 'a>(
    label: &'a str,
    on_press: &Message,
    hover_amount: f32,
) -> Element<'a, Message> {
    let btn = button(text(label).size(15).color(Color::WHITE))
        .on_press(on_press.clone())
        .padding(PADDING)
        .width(Length::Fill)
        .style(move |_theme: &Theme, status: button::Status| {
            let amount = if status == button::Status::Pressed {
                1.0
            } else {
                hover_amount
            };
            styled(amount)
        });

    let rise = hover_amount * FLOAT_HEIGHT;
    container(btn)
        .padding(Padding {
            top: FLOAT_HEIGHT - rise,
            bottom: rise,
            ..Padding::ZERO
        })
        .into()
}

fn styled(hover_amount: f32) -> button::Style {
    let t = hover_amount;
    let fill = lerp_color(ACCENT_ORANGE, ACCENT_ORANGE_HOVER, t);
    button::Style {
        background: Some(fill.into()),
        text_color: Color::WHITE,
        border: Border {
            radius: CORNER_RADIUS.into(),
            ..Border::default()
        },
        shadow: Shadow {
            color: Color {
                a: lerp(SHADOW_ALPHA_BASE, SHADOW_ALPHA_HOVER, t),
                ..ACCENT_ORANGE_HOVER
            },
            offset: Vector::new(0.0, 2.0),
            blur_radius: lerp(SHADOW_BLUR_BASE, SHADOW_BLUR_HOVER, t),
        },
        ..button::Style::default()
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn lerp_color(from: Color, to: Color, t: f32) -> Color {
    Color {
        r: lerp(from.r, to.r, t),
        g: lerp(from.g, to.g, t),
        b: lerp(from.b, to.b, t),
        a: lerp(from.a, to.a, t),
    }
}
