//! Screen regions

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Regions of the game screen.
///
/// The chat row gets exactly the height computed on the last resize; the
/// navbar and input keep their fixed sizes and whatever is left at the
/// bottom holds the status line.
#[derive(Debug, Clone, Copy)]
pub struct AppLayout {
    pub navbar: Rect,
    pub chat_area: Rect,
    pub sidebar_area: Rect,
    pub input_area: Rect,
    pub status_bar: Rect,
}

impl AppLayout {
    pub fn calculate(area: Rect, navbar_height: u16, chat_height: u16, input_height: u16) -> Self {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(navbar_height),
                Constraint::Length(chat_height),
                Constraint::Length(input_height),
                Constraint::Min(0),
            ])
            .split(area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(68), Constraint::Percentage(32)])
            .split(rows[1]);

        Self {
            navbar: rows[0],
            chat_area: columns[0],
            sidebar_area: columns[1],
            input_area: rows[2],
            status_bar: rows[3],
        }
    }
}

/// A `width` x `height` rectangle centered in `area`, shrunk to fit.
pub fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
