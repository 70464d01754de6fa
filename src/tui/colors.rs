//! Color constants and palettes for the terminal user interface.

use ratatui::style::Color;

use crate::fields::Priority;
use crate::theme::ResolvedTheme;

/// High priority badge.
pub const PRIORITY_HIGH: Color = Color::Rgb(220, 38, 38);
/// Medium priority badge.
pub const PRIORITY_MEDIUM: Color = Color::Rgb(217, 119, 6);
/// Low priority badge.
pub const PRIORITY_LOW: Color = Color::Rgb(5, 150, 105);

pub fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => PRIORITY_HIGH,
        Priority::Medium => PRIORITY_MEDIUM,
        Priority::Low => PRIORITY_LOW,
    }
}

/// Parse a `#rrggbb` category color, falling back to gray.
pub fn hex_color(hex: &str) -> Color {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        return Color::Gray;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    match (channel(0), channel(2), channel(4)) {
        (Some(r), Some(g), Some(b)) => Color::Rgb(r, g, b),
        _ => Color::Gray,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub fg: Color,
    pub bg: Color,
    pub muted: Color,
    pub accent: Color,
    pub card: Color,
    pub selected_fg: Color,
}

impl Palette {
    pub fn for_theme(theme: ResolvedTheme) -> Self {
        match theme {
            ResolvedTheme::Dark => Palette {
                fg: Color::Rgb(229, 231, 235),
                bg: Color::Rgb(17, 24, 39),
                muted: Color::Rgb(107, 114, 128),
                accent: Color::Rgb(96, 165, 250),
                card: Color::Rgb(31, 41, 55),
                selected_fg: Color::Black,
            },
            ResolvedTheme::Light => Palette {
                fg: Color::Rgb(17, 24, 39),
                bg: Color::Rgb(249, 250, 251),
                muted: Color::Rgb(107, 114, 128),
                accent: Color::Rgb(37, 99, 235),
                card: Color::Rgb(229, 231, 235),
                selected_fg: Color::White,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_color() {
        assert_eq!(hex_color("#2563eb"), Color::Rgb(0x25, 0x63, 0xeb));
        assert_eq!(hex_color("nope"), Color::Gray);
        assert_eq!(hex_color("#zzzzzz"), Color::Gray);
    }
}
