//! Colors and styles for the terminal client

use greengarden_core::{Sentiment, Tier};
use ratatui::style::{Color, Modifier, Style};

/// UI color theme
#[derive(Debug, Clone)]
pub struct Theme {
    pub foreground: Color,
    pub border: Color,
    pub border_focused: Color,
    pub accent: Color,

    // Chat entries
    pub user_text: Color,
    pub assistant_text: Color,
    pub system_text: Color,

    // Affection tiers
    pub danger: Color,
    pub warning: Color,
    pub info: Color,
    pub success: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            foreground: Color::White,
            border: Color::DarkGray,
            border_focused: Color::Green,
            accent: Color::LightGreen,

            user_text: Color::Cyan,
            assistant_text: Color::LightMagenta,
            system_text: Color::Gray,

            danger: Color::Red,
            warning: Color::Yellow,
            info: Color::LightBlue,
            success: Color::Green,
        }
    }
}

impl Theme {
    pub fn user_style(&self) -> Style {
        Style::default().fg(self.user_text)
    }

    pub fn assistant_style(&self) -> Style {
        Style::default().fg(self.assistant_text)
    }

    pub fn system_style(&self) -> Style {
        Style::default()
            .fg(self.system_text)
            .add_modifier(Modifier::ITALIC)
    }

    pub fn speaker_style(&self, color: Color) -> Style {
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }

    /// Bar and label color for a tier.
    pub fn tier_color(&self, tier: Tier) -> Color {
        match tier {
            Tier::Danger => self.danger,
            Tier::Warning => self.warning,
            Tier::Info => self.info,
            Tier::Success => self.success,
        }
    }

    pub fn sentiment_color(&self, sentiment: Sentiment) -> Color {
        match sentiment {
            Sentiment::Success => self.success,
            Sentiment::Danger => self.danger,
        }
    }

    /// Approximate an opacity in [0, 1] with terminal modifiers.
    pub fn faded(&self, style: Style, opacity: f64) -> Style {
        if opacity >= 0.95 {
            style.add_modifier(Modifier::BOLD)
        } else if opacity >= 0.5 {
            style
        } else {
            style.add_modifier(Modifier::DIM)
        }
    }

    pub fn border_style(&self, focused: bool) -> Style {
        Style::default().fg(if focused {
            self.border_focused
        } else {
            self.border
        })
    }

    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn hint_style(&self) -> Style {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::DIM)
    }
}
