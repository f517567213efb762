//! Terminal capability detection and output styling

use owo_colors::{OwoColorize, colors::css};

/// Width used when stdout is not a terminal.
pub const DEFAULT_WIDTH: usize = 80;

/// Narrowest outline the tree view will lay out.
const MIN_WIDTH: usize = 40;

/// Width of the terminal on stdout, or [`DEFAULT_WIDTH`].
pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map_or(DEFAULT_WIDTH, |(width, _)| usize::from(width.0))
        .max(MIN_WIDTH)
}

/// What a piece of output represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// A passing check.
    Ok,
    /// A failed check.
    Error,
    /// An advisory.
    Warning,
    /// A sub-budget row.
    SubBudget,
    /// A title row.
    Title,
    /// Secondary text such as amounts and counts.
    Muted,
}

/// Applies [`Style`]s, or passes text through when color is disabled.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Colors when stdout supports them.
    pub fn detect() -> Self {
        Self::new(supports_color::on(supports_color::Stream::Stdout).is_some())
    }

    pub fn paint(self, style: Style, text: &str) -> String {
        if !self.enabled {
            return text.to_string();
        }
        match style {
            Style::Ok => text.fg::<css::Green>().to_string(),
            Style::Error => text.fg::<css::Red>().bold().to_string(),
            Style::Warning => text.fg::<css::Orange>().to_string(),
            Style::SubBudget => text.fg::<css::MediumPurple>().bold().to_string(),
            Style::Title => text.fg::<css::LightBlue>().to_string(),
            Style::Muted => text.dimmed().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_palette_passes_text_through() {
        let palette = Palette::new(false);
        assert_eq!(palette.paint(Style::Error, "boom"), "boom");
        assert_eq!(palette.paint(Style::Muted, "12.50"), "12.50");
    }

    #[test]
    fn enabled_palette_wraps_text() {
        let palette = Palette::new(true);
        let painted = palette.paint(Style::Title, "EARTHWORKS");
        assert!(painted.contains("EARTHWORKS"));
        assert_ne!(painted, "EARTHWORKS");
    }

    #[test]
    fn width_has_a_floor() {
        assert!(terminal_width() >= MIN_WIDTH);
    }
}
