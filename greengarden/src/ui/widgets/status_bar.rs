//! Bottom status line: input mode, last status message and key hints

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::app::InputMode;
use crate::ui::theme::Theme;

pub struct StatusBarWidget<'a> {
    mode: InputMode,
    theme: &'a Theme,
    message: Option<&'a str>,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(mode: InputMode, theme: &'a Theme) -> Self {
        Self {
            mode,
            theme,
            message: None,
        }
    }

    pub fn message(mut self, message: Option<&'a str>) -> Self {
        self.message = message;
        self
    }

    fn hints(&self) -> &'static str {
        match self.mode {
            InputMode::Normal => "i:talk  ::command  j/k:scroll  ?:help  q:quit",
            InputMode::Insert => "Enter:send  Esc:normal  ↑/↓:history",
            InputMode::Command => "Enter:run  Esc:cancel",
        }
    }
}

impl Widget for StatusBarWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (name, color) = match self.mode {
            InputMode::Normal => ("NORMAL", Color::Blue),
            InputMode::Insert => ("INSERT", Color::Green),
            InputMode::Command => ("COMMAND", Color::Yellow),
        };

        let mut spans = vec![
            Span::styled(
                format!(" {name} "),
                Style::default()
                    .fg(Color::Black)
                    .bg(color)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
        ];
        match self.message {
            Some(message) => spans.push(Span::styled(
                message,
                Style::default().fg(self.theme.foreground),
            )),
            None => spans.push(Span::styled(self.hints(), self.theme.hint_style())),
        }

        Paragraph::new(Line::from(spans)).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn render_line(widget: StatusBarWidget<'_>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 1)).unwrap();
        terminal
            .draw(|f| f.render_widget(widget, f.area()))
            .unwrap();
        let buffer = terminal.backend().buffer();
        (0..60).map(|x| buffer[(x, 0)].symbol()).collect()
    }

    #[test]
    fn test_message_replaces_hints() {
        let theme = Theme::default();
        let line = render_line(StatusBarWidget::new(InputMode::Normal, &theme));
        assert!(line.starts_with(" NORMAL "));
        assert!(line.contains("?:help"));

        let line = render_line(
            StatusBarWidget::new(InputMode::Insert, &theme).message(Some("Saved to slot 1")),
        );
        assert!(line.starts_with(" INSERT "));
        assert!(line.contains("Saved to slot 1"));
        assert!(!line.contains("Enter:send"));
    }
}
