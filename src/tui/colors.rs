// Palette shared by every screen
use ratatui::style::Color;

/// Delete actions and errors
pub const ACCENT_PRIMARY: Color = Color::Rgb(239, 83, 80);
/// Keep actions and success
pub const ACCENT_SECONDARY: Color = Color::Rgb(102, 187, 106);
/// Titles and key hints
pub const ACCENT_HIGHLIGHT: Color = Color::Rgb(255, 202, 40);

pub const TEXT_PRIMARY: Color = Color::Rgb(236, 239, 241);
pub const TEXT_SECONDARY: Color = Color::Rgb(144, 164, 174);

pub const BG_DARK: Color = Color::Rgb(30, 30, 36);
pub const BORDER_COLOR: Color = Color::Rgb(84, 110, 122);
