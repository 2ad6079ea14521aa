//! Visual styling
//!
//! One place maps highlight tiers and chrome elements to terminal styles so
//! the styled surface, the sidebar, and the popover agree on what an error
//! or a suggestion looks like. Highlights use dark background tints plus an
//! underline in the tier color, which stays readable under the live text.

use ratatui::style::{Color, Modifier, Style};

use crate::annotation::HighlightTier;

#[derive(Debug, Clone)]
pub struct Theme {
    pub text_fg: Color,
    pub text_bg: Color,

    // Highlight tint per tier (background behind the live text)
    pub error_bg: Color,
    pub warning_bg: Color,
    pub info_bg: Color,
    pub neutral_bg: Color,
    pub suggestion_bg: Color,

    // Underline accent per tier
    pub error_accent: Color,
    pub warning_accent: Color,
    pub info_accent: Color,
    pub neutral_accent: Color,
    pub suggestion_accent: Color,

    pub selection_bg: Color,

    pub status_bar_fg: Color,
    pub status_bar_bg: Color,

    pub sidebar_fg: Color,
    pub sidebar_bg: Color,
    pub sidebar_selected_fg: Color,
    pub sidebar_selected_bg: Color,

    pub popup_fg: Color,
    pub popup_bg: Color,
    pub popup_border: Color,
    pub popup_old_bg: Color,
    pub popup_new_bg: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            text_fg: Color::Gray,
            text_bg: Color::Reset,

            error_bg: Color::Rgb(60, 20, 20),
            warning_bg: Color::Rgb(60, 50, 0),
            info_bg: Color::Rgb(0, 30, 60),
            neutral_bg: Color::Rgb(30, 30, 30),
            suggestion_bg: Color::Rgb(15, 45, 20),

            error_accent: Color::Red,
            warning_accent: Color::Yellow,
            info_accent: Color::Blue,
            neutral_accent: Color::DarkGray,
            suggestion_accent: Color::Green,

            selection_bg: Color::Rgb(38, 79, 120),

            status_bar_fg: Color::Black,
            status_bar_bg: Color::Gray,

            sidebar_fg: Color::Gray,
            sidebar_bg: Color::Rgb(20, 20, 20),
            sidebar_selected_fg: Color::White,
            sidebar_selected_bg: Color::Rgb(50, 50, 70),

            popup_fg: Color::White,
            popup_bg: Color::Rgb(25, 25, 35),
            popup_border: Color::Gray,
            popup_old_bg: Color::Rgb(60, 25, 25),
            popup_new_bg: Color::Rgb(25, 55, 25),
        }
    }

    /// Style for a highlighted segment of the styled surface.
    pub fn tier_style(&self, tier: HighlightTier) -> Style {
        let (bg, accent) = match tier {
            HighlightTier::Error => (self.error_bg, self.error_accent),
            HighlightTier::Warning => (self.warning_bg, self.warning_accent),
            HighlightTier::Info => (self.info_bg, self.info_accent),
            HighlightTier::Neutral => (self.neutral_bg, self.neutral_accent),
            HighlightTier::Suggestion => (self.suggestion_bg, self.suggestion_accent),
        };
        Style::default()
            .fg(self.text_fg)
            .bg(bg)
            .underline_color(accent)
            .add_modifier(Modifier::UNDERLINED)
    }

    /// Accent color for a tier (sidebar bullets, popup badges).
    pub fn tier_accent(&self, tier: HighlightTier) -> Color {
        match tier {
            HighlightTier::Error => self.error_accent,
            HighlightTier::Warning => self.warning_accent,
            HighlightTier::Info => self.info_accent,
            HighlightTier::Neutral => self.neutral_accent,
            HighlightTier::Suggestion => self.suggestion_accent,
        }
    }

    pub fn base_style(&self) -> Style {
        Style::default().fg(self.text_fg).bg(self.text_bg)
    }

    pub fn selection_style(&self) -> Style {
        Style::default().bg(self.selection_bg)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}
