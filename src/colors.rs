//! Color policy: choropleth bands, severity colors, chrome.
//!
//! Two palettes, matching dark and light terminal backgrounds. Band colors
//! are a monotonic step function of a country's cumulative attack count.

use crate::attack::counts::ThreatBand;
use crate::attack::Severity;
use crossterm::event::KeyCode;
use crossterm::style::Color;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Palette {
    Dark,
    Light,
}

impl Palette {
    /// Handle the palette toggle key. Returns true if the key was consumed.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        if code == KeyCode::Char('t') {
            *self = match self {
                Palette::Dark => Palette::Light,
                Palette::Light => Palette::Dark,
            };
            return true;
        }
        false
    }
}

/// Country fill/outline color for a threat band.
pub fn band_color(palette: Palette, band: ThreatBand) -> Color {
    match palette {
        Palette::Dark => match band {
            ThreatBand::None => Color::DarkGrey,
            ThreatBand::Minimal => Color::DarkGreen,
            ThreatBand::Low => Color::DarkYellow,
            ThreatBand::Moderate => Color::Yellow,
            ThreatBand::High => Color::Red,
            ThreatBand::Severe => Color::AnsiValue(9), // bright red
        },
        Palette::Light => match band {
            ThreatBand::None => Color::Grey,
            ThreatBand::Minimal => Color::Green,
            ThreatBand::Low => Color::Yellow,
            ThreatBand::Moderate => Color::DarkYellow,
            ThreatBand::High => Color::DarkRed,
            ThreatBand::Severe => Color::Magenta,
        },
    }
}

/// Arc color for an attack line; critical is also drawn bold.
pub fn severity_color(palette: Palette, severity: Severity) -> (Color, bool) {
    match palette {
        Palette::Dark => match severity {
            Severity::Low => (Color::DarkCyan, false),
            Severity::Medium => (Color::Cyan, false),
            Severity::High => (Color::Yellow, true),
            Severity::Critical => (Color::AnsiValue(9), true),
        },
        Palette::Light => match severity {
            Severity::Low => (Color::Blue, false),
            Severity::Medium => (Color::DarkCyan, false),
            Severity::High => (Color::DarkYellow, true),
            Severity::Critical => (Color::DarkRed, true),
        },
    }
}

/// Endpoint marker color.
pub fn marker_color(palette: Palette) -> Color {
    match palette {
        Palette::Dark => Color::White,
        Palette::Light => Color::Black,
    }
}

/// Status-line text color.
pub fn status_color(palette: Palette) -> Color {
    match palette {
        Palette::Dark => Color::Grey,
        Palette::Light => Color::DarkGrey,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_toggle_round_trips() {
        let mut palette = Palette::Dark;
        assert!(palette.handle_key(KeyCode::Char('t')));
        assert_eq!(palette, Palette::Light);
        assert!(palette.handle_key(KeyCode::Char('t')));
        assert_eq!(palette, Palette::Dark);
        assert!(!palette.handle_key(KeyCode::Char('x')));
    }

    #[test]
    fn bands_map_to_distinct_colors_per_palette() {
        let bands = [
            ThreatBand::None,
            ThreatBand::Minimal,
            ThreatBand::Low,
            ThreatBand::Moderate,
            ThreatBand::High,
            ThreatBand::Severe,
        ];
        for palette in [Palette::Dark, Palette::Light] {
            let colors: Vec<Color> = bands.iter().map(|&b| band_color(palette, b)).collect();
            for i in 0..colors.len() {
                for j in i + 1..colors.len() {
                    assert_ne!(colors[i], colors[j], "{palette:?} {i} vs {j}");
                }
            }
        }
    }

    #[test]
    fn critical_severity_is_bold() {
        assert!(severity_color(Palette::Dark, Severity::Critical).1);
        assert!(!severity_color(Palette::Dark, Severity::Low).1);
    }
}
