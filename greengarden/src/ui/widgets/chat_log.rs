//! Scrolling chat log

use greengarden_core::view::{ChatEntry, EntryKind, TypingView};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    symbols::scrollbar,
    text::{Line, Span},
    widgets::{
        Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
        StatefulWidget, Widget,
    },
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::ui::theme::Theme;
use crate::ui::CHARACTER_NAME;

const INDENT: &str = "  ";
const REVEAL_CURSOR: &str = "▌";
const TYPING_DOTS: &str = "• • •";

/// Chat history plus the typing placeholder.
pub struct ChatLogWidget<'a> {
    entries: &'a [ChatEntry],
    theme: &'a Theme,
    scroll: usize,
    typing: Option<TypingView>,
    revealing: bool,
    focused: bool,
}

impl<'a> ChatLogWidget<'a> {
    pub fn new(entries: &'a [ChatEntry], theme: &'a Theme) -> Self {
        Self {
            entries,
            theme,
            scroll: 0,
            typing: None,
            revealing: false,
            focused: false,
        }
    }

    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    pub fn typing(mut self, typing: Option<TypingView>) -> Self {
        self.typing = typing;
        self
    }

    /// Mark the last entry as still being revealed.
    pub fn revealing(mut self, revealing: bool) -> Self {
        self.revealing = revealing;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    /// Rows needed to show everything in a log `area_width` columns wide.
    pub fn row_count(&self, area_width: u16) -> usize {
        self.rows(text_width(area_width)).len()
    }

    /// One `Line` per screen row, wrapped to `width` columns.
    fn rows(&self, width: usize) -> Vec<Line<'a>> {
        let mut rows = Vec::new();
        let last = self.entries.len().saturating_sub(1);
        let body_width = width.saturating_sub(INDENT.len()).max(1);

        for (i, entry) in self.entries.iter().enumerate() {
            match entry.kind {
                EntryKind::System => {
                    for text in entry.lines() {
                        for row in wrap_text(text, width) {
                            rows.push(Line::from(Span::styled(row, self.theme.system_style())));
                        }
                    }
                }
                EntryKind::User | EntryKind::Assistant => {
                    let (speaker, color, style) = if entry.kind == EntryKind::User {
                        ("You", self.theme.user_text, self.theme.user_style())
                    } else {
                        (
                            CHARACTER_NAME,
                            self.theme.assistant_text,
                            self.theme.assistant_style(),
                        )
                    };
                    rows.push(Line::from(Span::styled(
                        speaker,
                        self.theme.speaker_style(color),
                    )));

                    let mut body: Vec<String> = entry
                        .lines()
                        .into_iter()
                        .flat_map(|text| wrap_text(text, body_width))
                        .collect();

                    let cursor = self.revealing && i == last && entry.kind == EntryKind::Assistant;
                    if cursor {
                        let fits = body
                            .last()
                            .is_some_and(|row| row.width() + REVEAL_CURSOR.width() <= body_width);
                        match body.last_mut() {
                            Some(row) if fits => row.push_str(REVEAL_CURSOR),
                            _ => body.push(REVEAL_CURSOR.to_string()),
                        }
                    }

                    for row in body {
                        rows.push(Line::from(vec![
                            Span::raw(INDENT),
                            Span::styled(row, style),
                        ]));
                    }
                }
            }
            rows.push(Line::from(""));
        }

        if let Some(typing) = self.typing {
            let dots = self
                .theme
                .faded(self.theme.assistant_style(), f64::from(typing.opacity));
            rows.push(Line::from(Span::styled(
                CHARACTER_NAME,
                self.theme.speaker_style(self.theme.assistant_text),
            )));
            rows.push(Line::from(vec![Span::raw(INDENT), Span::styled(TYPING_DOTS, dots)]));
        }

        rows
    }
}

/// Text columns inside the border, less the scrollbar column.
fn text_width(area_width: u16) -> usize {
    usize::from(area_width.saturating_sub(3))
}

/// Break `text` into rows at most `width` columns wide, at spaces where
/// possible. Wide characters count double.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut rows = Vec::new();
    let mut row = String::new();
    let mut row_width = 0;

    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if row_width + w > width {
            if c == ' ' {
                rows.push(std::mem::take(&mut row));
                row_width = 0;
                continue;
            }
            match row.rfind(' ') {
                Some(at) if at > 0 => {
                    let rest = row.split_off(at + 1);
                    row.truncate(at);
                    rows.push(std::mem::replace(&mut row, rest));
                    row_width = row.width();
                }
                _ if row.is_empty() => {}
                _ => {
                    rows.push(std::mem::take(&mut row));
                    row_width = 0;
                }
            }
        }
        row.push(c);
        row_width += w;
    }
    rows.push(row);
    rows
}

impl Widget for ChatLogWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = if self.focused {
            " Chat [j/k scroll] "
        } else {
            " Chat "
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(self.focused));

        let inner = block.inner(area);
        block.render(area, buf);

        let lines = self.rows(text_width(area.width));
        let visible_height = inner.height as usize;
        let total_lines = lines.len();
        let max_scroll = total_lines.saturating_sub(visible_height);
        let scroll = self.scroll.min(max_scroll);

        Paragraph::new(lines)
            .scroll((scroll as u16, 0))
            .render(inner, buf);

        if total_lines <= visible_height {
            return;
        }

        let scrollbar_area = Rect {
            x: inner.x + inner.width.saturating_sub(1),
            y: inner.y,
            width: 1,
            height: inner.height,
        };
        let mut scrollbar_state = ScrollbarState::new(max_scroll).position(scroll);
        Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .symbols(scrollbar::VERTICAL)
            .thumb_style(Style::default().fg(Color::DarkGray))
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"))
            .render(scrollbar_area, buf, &mut scrollbar_state);

        // Unread lines below the viewport.
        if scroll < max_scroll && inner.height > 0 {
            let hint = format!(" ↓{} more ", max_scroll - scroll);
            let y = inner.y + inner.height - 1;
            let width = inner.width.saturating_sub(2) as usize;
            buf.set_stringn(inner.x, y, hint, width, self.theme.hint_style());
        }
    }
}
