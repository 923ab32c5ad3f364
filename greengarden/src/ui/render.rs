//! Render orchestration for the terminal client

use greengarden_core::{GameBackend, ScreenView, ViewSnapshot};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use tokio::time::Instant;

use crate::app::{App, InputMode};
use crate::ui::layout::{centered_rect_fixed, AppLayout};
use crate::ui::theme::Theme;
use crate::ui::widgets::{
    AffectionMeterWidget, ChatLogWidget, InputWidget, ProfileWidget, StatusBarWidget,
    METER_HEIGHT,
};
use crate::ui::{CHARACTER_NAME, GAME_TITLE};

/// Overlay types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    Help,
}

/// Draw one frame from the controller's current snapshot.
pub fn render<B: GameBackend>(frame: &mut Frame, app: &App<B>, now: Instant) {
    let area = frame.area();
    let view = app.controller.snapshot(now);

    match view.screen {
        ScreenView::Welcome => render_welcome(frame, app, &view, area),
        ScreenView::FadingOut { progress } => {
            render_welcome(frame, app, &view, area);
            fade(frame, area, 1.0 - progress);
        }
        ScreenView::FadingIn { progress } => {
            render_game(frame, app, &view, area);
            fade(frame, area, progress);
        }
        ScreenView::Game => render_game(frame, app, &view, area),
    }

    if let Some(Overlay::Help) = app.overlay() {
        render_help_overlay(frame, &app.theme, area);
    }

    if let Some(message) = view.notification {
        render_notification(frame, &app.theme, message, area);
    }
}

/// Terminals have no alpha; a half-faded screen is drawn dim, a nearly
/// invisible one blank.
fn fade(frame: &mut Frame, area: Rect, opacity: f64) {
    if opacity < 0.1 {
        frame.render_widget(Clear, area);
    } else if opacity < 0.5 {
        frame
            .buffer_mut()
            .set_style(area, Style::default().add_modifier(Modifier::DIM));
    }
}

fn render_welcome<B: GameBackend>(frame: &mut Frame, app: &App<B>, view: &ViewSnapshot<'_>, area: Rect) {
    let theme = &app.theme;
    let card = centered_rect_fixed(60, 12, area);

    let prompt = match view.loading {
        Some(loading) => Span::styled(loading, Style::default().add_modifier(Modifier::ITALIC)),
        None => Span::styled(
            "Press Enter to begin",
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
    };

    let text = vec![
        Line::from(Span::styled(GAME_TITLE, theme.title_style())),
        Line::from(Span::styled("绿园中学物语", theme.title_style())),
        Line::from(""),
        Line::from("A new term begins. At the club fair, a girl is busy"),
        Line::from(format!("at the Bakery Club booth: {CHARACTER_NAME}.")),
        Line::from(""),
        Line::from(prompt),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style(true));
    frame.render_widget(
        Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        card,
    );

    let bottom = Rect {
        y: area.y + area.height.saturating_sub(3),
        height: area.height.min(3),
        ..area
    };
    if app.input_mode == InputMode::Command {
        render_input(frame, app, view, bottom);
    } else {
        let hint = Line::from(Span::styled("Enter:start  ?:help  q:quit", theme.hint_style()));
        let last_row = Rect {
            y: area.y + area.height.saturating_sub(1),
            height: area.height.min(1),
            ..area
        };
        frame.render_widget(Paragraph::new(hint), last_row);
    }
}

fn render_game<B: GameBackend>(frame: &mut Frame, app: &App<B>, view: &ViewSnapshot<'_>, area: Rect) {
    let metrics = app.controller.layout();
    let layout = AppLayout::calculate(
        area,
        metrics.navbar_height,
        view.chat_height,
        metrics.input_height,
    );

    render_navbar(frame, &app.theme, view, layout.navbar);

    let chat = ChatLogWidget::new(view.entries, &app.theme)
        .scroll(app.chat_scroll)
        .typing(view.typing)
        .revealing(app.controller.is_revealing())
        .focused(app.input_mode == InputMode::Normal);
    frame.render_widget(chat, layout.chat_area);

    let sidebar = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(METER_HEIGHT), Constraint::Min(0)])
        .split(layout.sidebar_area);
    frame.render_widget(
        AffectionMeterWidget::new(&view.meter, &view.indicators, &app.theme),
        sidebar[0],
    );
    frame.render_widget(
        ProfileWidget::new(&app.theme)
            .portrait(view.portrait)
            .scene(view.meter.scene),
        sidebar[1],
    );

    render_input(frame, app, view, layout.input_area);

    frame.render_widget(
        StatusBarWidget::new(app.input_mode, &app.theme).message(view.status),
        layout.status_bar,
    );
}

fn render_navbar(frame: &mut Frame, theme: &Theme, view: &ViewSnapshot<'_>, area: Rect) {
    let line = Line::from(vec![
        Span::styled(format!(" {GAME_TITLE} "), theme.title_style()),
        Span::styled("│ ", theme.hint_style()),
        Span::raw(view.time_info),
        Span::styled(" │ ", theme.hint_style()),
        Span::raw(view.meter.scene),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_input<B: GameBackend>(frame: &mut Frame, app: &App<B>, view: &ViewSnapshot<'_>, area: Rect) {
    let placeholder = if view.typing.is_some() {
        "Su Tang is typing..."
    } else {
        "Say something to Su Tang..."
    };

    let input = InputWidget::new(app.input_buffer(), &app.theme)
        .cursor(app.cursor_position())
        .focused(app.input_mode != InputMode::Normal)
        .command(app.input_mode == InputMode::Command)
        .placeholder(placeholder);
    frame.render_widget(input, area);
}

/// Blocking message box; any key closes it.
fn render_notification(frame: &mut Frame, theme: &Theme, message: &str, area: Rect) {
    let popup = centered_rect_fixed(54, 7, area);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .title(" Notice ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.danger));
    let text = vec![
        Line::from(message),
        Line::from(""),
        Line::from(Span::styled("Press any key to continue", theme.hint_style())),
    ];
    frame.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
        popup,
    );
}

fn render_help_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = centered_rect_fixed(52, 22, area);
    frame.render_widget(Clear, popup);

    let heading = |text: &'static str| {
        Line::from(Span::styled(
            text,
            Style::default().add_modifier(Modifier::UNDERLINED),
        ))
    };

    let help_text = vec![
        Line::from(Span::styled(
            format!(" {GAME_TITLE} - Help "),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        heading("Modes:"),
        Line::from("  i / a     Talk (INSERT mode)"),
        Line::from("  :         Command mode"),
        Line::from("  Esc       Back to NORMAL mode"),
        Line::from(""),
        heading("Chat log (NORMAL mode):"),
        Line::from("  j/k ↑/↓   Scroll"),
        Line::from("  Ctrl+u/d  Scroll by half a page"),
        Line::from("  g / G     Top / follow newest"),
        Line::from(""),
        heading("Commands:"),
        Line::from("  :start        Begin the story"),
        Line::from("  :w [slot]     Save (default slot 1)"),
        Line::from("  :load [slot]  Load a save"),
        Line::from("  :wq / :q      Save and quit / quit"),
        Line::from(""),
        Line::from(Span::styled("Press Esc or ? to close", theme.hint_style())),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(theme.border_style(true));
    frame.render_widget(
        Paragraph::new(help_text)
            .block(block)
            .wrap(Wrap { trim: false }),
        popup,
    );
}
