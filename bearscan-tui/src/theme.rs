//! Parrot/neon theme tokens.
//!
//! # Color Palette
//! - **Accent**: Electric cyan (focus, headers)
//! - **Positive**: Neon green (candidates, passing checks)
//! - **Negative**: Hot pink (failures, exclusions)
//! - **Warning**: Neon orange (notices, stretched deviation)
//! - **Neutral**: Cool purple (secondary info)
//! - **Muted**: Steel blue (hints, disabled)

use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub background: Color,
    pub accent: Color,
    pub positive: Color,
    pub negative: Color,
    pub warning: Color,
    pub neutral: Color,
    pub muted: Color,
    pub text_primary: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::parrot_neon()
    }
}

impl Theme {
    pub const fn parrot_neon() -> Self {
        Self {
            background: Color::Rgb(18, 18, 20),
            accent: Color::Rgb(0, 255, 255),
            positive: Color::Rgb(0, 255, 128),
            negative: Color::Rgb(255, 20, 147),
            warning: Color::Rgb(255, 140, 0),
            neutral: Color::Rgb(147, 112, 219),
            muted: Color::Rgb(100, 149, 237),
            text_primary: Color::White,
        }
    }

    /// Deviation above MA20: the further price is stretched, the hotter.
    pub fn deviation_color(&self, deviation: f64) -> Color {
        match deviation {
            d if d > 0.10 => self.negative,
            d if d > 0.07 => self.warning,
            d if d > 0.05 => self.accent,
            _ => self.muted,
        }
    }

    /// Bear score 0..=5.
    pub fn score_color(&self, score: u8) -> Color {
        match score {
            4..=5 => self.negative,
            3 => self.warning,
            1..=2 => self.neutral,
            _ => self.muted,
        }
    }
}

const THEME: Theme = Theme::parrot_neon();

/// Frame background and default text.
pub fn base() -> Style {
    Style::default().bg(THEME.background).fg(THEME.text_primary)
}

pub fn accent() -> Style {
    Style::default().fg(THEME.accent)
}

pub fn accent_bold() -> Style {
    accent().add_modifier(Modifier::BOLD)
}

pub fn muted() -> Style {
    Style::default().fg(THEME.muted)
}

pub fn positive() -> Style {
    Style::default().fg(THEME.positive)
}

pub fn negative() -> Style {
    Style::default().fg(THEME.negative)
}

pub fn warning() -> Style {
    Style::default().fg(THEME.warning)
}

pub fn neutral() -> Style {
    Style::default().fg(THEME.neutral)
}

pub fn text() -> Style {
    Style::default().fg(THEME.text_primary)
}

pub fn deviation_style(deviation: f64) -> Style {
    Style::default().fg(THEME.deviation_color(deviation))
}

pub fn score_style(score: u8) -> Style {
    Style::default().fg(THEME.score_color(score))
}

pub fn panel_border(active: bool) -> Style {
    if active {
        accent()
    } else {
        muted()
    }
}

pub fn panel_title(active: bool) -> Style {
    if active {
        accent_bold()
    } else {
        muted()
    }
}
