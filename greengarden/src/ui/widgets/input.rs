//! Message entry field

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::ui::theme::Theme;

/// Single-line text entry with a block cursor.
pub struct InputWidget<'a> {
    content: &'a str,
    cursor: usize,
    theme: &'a Theme,
    placeholder: &'a str,
    focused: bool,
    command: bool,
}

impl<'a> InputWidget<'a> {
    pub fn new(content: &'a str, theme: &'a Theme) -> Self {
        Self {
            content,
            cursor: content.chars().count(),
            theme,
            placeholder: "",
            focused: false,
            command: false,
        }
    }

    /// Cursor position in characters.
    pub fn cursor(mut self, cursor: usize) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = placeholder;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    /// Content is a `:` command line.
    pub fn command(mut self, command: bool) -> Self {
        self.command = command;
        self
    }

    fn line(&self) -> Line<'a> {
        let prompt = Span::styled(if self.command { "" } else { "> " }, self.theme.user_style());

        if self.content.is_empty() {
            let hint = Span::styled(
                self.placeholder,
                Style::default().add_modifier(Modifier::DIM),
            );
            return Line::from(vec![prompt, hint]);
        }

        if !self.focused {
            return Line::from(vec![prompt, Span::raw(self.content)]);
        }

        let content = self.content;
        let split = |n: usize| {
            content
                .char_indices()
                .nth(n)
                .map_or(content.len(), |(i, _)| i)
        };
        let at = split(self.cursor);
        let after = split(self.cursor + 1);

        let under_cursor = match &content[at..after] {
            "" => " ",
            s => s,
        };

        Line::from(vec![
            prompt,
            Span::raw(&content[..at]),
            Span::styled(
                under_cursor,
                Style::default()
                    .fg(self.theme.user_text)
                    .add_modifier(Modifier::REVERSED),
            ),
            Span::raw(&content[after..]),
        ])
    }
}

impl Widget for InputWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(self.focused));

        let inner = block.inner(area);
        block.render(area, buf);
        Paragraph::new(self.line()).render(inner, buf);
    }
}
