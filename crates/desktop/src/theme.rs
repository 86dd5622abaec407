use iced::color;
use iced::theme::Palette;
use iced::{Color, Theme};

use crate::settings::Appearance;

/// Action buttons.
pub const ACCENT_ORANGE: Color = color!(0xff, 0x91, 0x4d);
pub const ACCENT_ORANGE_HOVER: Color = color!(0xd9, 0x6b, 0x1f);
/// Detected-signs list border.
pub const ACCENT_TEAL: Color = color!(0x5e, 0xaa, 0xa8);

pub fn resolve_theme(appearance: Appearance) -> Theme {
    let is_dark = match appearance {
        Appearance::Dark => true,
        Appearance::Light => false,
        Appearance::System => detect_system_dark_mode(),
    };

    let palette = if is_dark {
        dark_palette()
    } else {
        light_palette()
    };

    Theme::custom("SignWatch", palette)
}

fn dark_palette() -> Palette {
    Palette {
        background: color!(0x1e, 0x1f, 0x22),
        text: color!(0xdd, 0xdd, 0xdd),
        primary: ACCENT_ORANGE,
        success: color!(0x4c, 0xc3, 0x6a),
        warning: color!(0xff, 0xcc, 0x00),
        danger: color!(0xff, 0x5a, 0x4f),
    }
}

fn light_palette() -> Palette {
    Palette {
        background: color!(0xfa, 0xfa, 0xfa),
        text: color!(0x22, 0x22, 0x22),
        primary: ACCENT_ORANGE,
        success: color!(0x2e, 0x9e, 0x4f),
        warning: color!(0xe0, 0x8a, 0x00),
        danger: color!(0xd9, 0x30, 0x25),
    }
}

/// Status line color while work is in progress or idle.
pub fn info_color(theme: &Theme) -> Color {
    if theme.extended_palette().is_dark {
        color!(0x6c, 0xb4, 0xff)
    } else {
        color!(0x1e, 0x5a, 0xc8)
    }
}

pub fn muted_color(theme: &Theme) -> Color {
    Color {
        a: 0.55,
        ..theme.palette().text
    }
}

/// Dashed border around the preview area.
pub fn frame_border_color(theme: &Theme) -> Color {
    if theme.extended_palette().is_dark {
        color!(0x55, 0x55, 0x55)
    } else {
        color!(0xcc, 0xcc, 0xcc)
    }
}

pub fn surface_color(theme: &Theme) -> Color {
    theme.extended_palette().background.weak.color
}

fn detect_system_dark_mode() -> bool {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("defaults")
            .args(["read", "-g", "AppleInterfaceStyle"])
            .output()
            .map(|o| {
                String::from_utf8_lossy(&o.stdout)
                    .trim()
                    .eq_ignore_ascii_case("dark")
            })
            .unwrap_or(false)
    }
    #[cfg(not(target_os = "macos"))]
    {
        false
    }
}
