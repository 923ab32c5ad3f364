//! Character card: name, portrait source and current scene

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::ui::theme::Theme;
use crate::ui::{CHARACTER_NAME, CHARACTER_TAGLINE};

pub struct ProfileWidget<'a> {
    theme: &'a Theme,
    portrait: Option<&'a str>,
    scene: &'a str,
}

impl<'a> ProfileWidget<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self {
            theme,
            portrait: None,
            scene: "",
        }
    }

    pub fn portrait(mut self, portrait: Option<&'a str>) -> Self {
        self.portrait = portrait;
        self
    }

    pub fn scene(mut self, scene: &'a str) -> Self {
        self.scene = scene;
        self
    }
}

impl Widget for ProfileWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(format!(" {CHARACTER_NAME} "))
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(false));

        let mut lines = vec![
            Line::from(Span::styled(
                CHARACTER_TAGLINE,
                self.theme.speaker_style(self.theme.assistant_text),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled("Scene: ", Style::default().add_modifier(Modifier::DIM)),
                Span::raw(self.scene),
            ]),
        ];
        if let Some(portrait) = self.portrait {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(portrait, self.theme.hint_style())));
        }

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: true })
            .render(area, buf);
    }
}
