//! Event handling for the terminal client

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind,
};
use greengarden_core::GameBackend;
use tokio::time::Instant;

use crate::app::{App, InputMode};

/// Result of handling an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    Continue,
    Quit,
    NeedsRedraw,
}

/// Handle a terminal event
pub fn handle_event<B: GameBackend>(app: &mut App<B>, event: Event, now: Instant) -> EventResult {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => handle_key_event(app, key, now),
        Event::Mouse(mouse) => handle_mouse_event(app, mouse),
        Event::Resize(width, height) => {
            app.resize(width, height);
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

fn handle_mouse_event<B: GameBackend>(app: &mut App<B>, mouse: MouseEvent) -> EventResult {
    match mouse.kind {
        MouseEventKind::ScrollUp => {
            app.scroll_up(3);
            EventResult::NeedsRedraw
        }
        MouseEventKind::ScrollDown => {
            app.scroll_down(3);
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

fn handle_key_event<B: GameBackend>(app: &mut App<B>, key: KeyEvent, now: Instant) -> EventResult {
    if let (KeyCode::Char('c'), KeyModifiers::CONTROL) = (key.code, key.modifiers) {
        return EventResult::Quit;
    }

    // A notification swallows the key that dismisses it.
    if app.controller.notification().is_some() {
        app.controller.dismiss_notification();
        return EventResult::NeedsRedraw;
    }

    if app.has_overlay() {
        return handle_overlay_key(app, key);
    }

    match app.input_mode {
        InputMode::Command => handle_command_mode(app, key),
        _ if !app.controller.on_game_screen() => handle_welcome_key(app, key),
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Insert => handle_insert_mode(app, key, now),
    }
}

/// Keys on the title screen
fn handle_welcome_key<B: GameBackend>(app: &mut App<B>, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Enter | KeyCode::Char('s') => {
            app.start_game();
            EventResult::NeedsRedraw
        }
        KeyCode::Char(':') => {
            app.enter_command_mode();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('?') | KeyCode::F(1) => {
            app.toggle_help();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('q') | KeyCode::Esc => EventResult::Quit,
        _ => EventResult::Continue,
    }
}

/// Keys in NORMAL mode
fn handle_normal_mode<B: GameBackend>(app: &mut App<B>, key: KeyEvent) -> EventResult {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('i') => app.input_mode = InputMode::Insert,
        KeyCode::Char('a') => {
            app.input_mode = InputMode::Insert;
            app.cursor_end();
        }
        KeyCode::Char(':') => app.enter_command_mode(),
        KeyCode::Char('?') | KeyCode::F(1) => app.toggle_help(),
        KeyCode::Char('q') => return EventResult::Quit,

        KeyCode::Char('u') if ctrl => app.scroll_up(10),
        KeyCode::Char('d') if ctrl => app.scroll_down(10),
        KeyCode::PageUp => app.scroll_up(10),
        KeyCode::PageDown => app.scroll_down(10),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(1),
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(1),
        KeyCode::Char('g') => app.scroll_to_top(),
        KeyCode::Char('G') => app.scroll_to_bottom(),

        _ => return EventResult::Continue,
    }
    EventResult::NeedsRedraw
}

/// Keys in INSERT mode
fn handle_insert_mode<B: GameBackend>(app: &mut App<B>, key: KeyEvent, now: Instant) -> EventResult {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => app.submit_message(now),

        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Up => app.history_prev(),
        KeyCode::Down => app.history_next(),
        KeyCode::Char(c) => app.type_char(c),

        _ => return EventResult::Continue,
    }
    EventResult::NeedsRedraw
}

/// Keys in COMMAND mode
fn handle_command_mode<B: GameBackend>(app: &mut App<B>, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Esc => app.enter_normal_mode(),
        KeyCode::Enter => {
            let command = app.input_buffer().to_string();
            app.enter_normal_mode();
            if command.len() > 1 {
                app.process_command(&command);
            }
            if app.should_quit {
                return EventResult::Quit;
            }
        }

        // The leading ':' is not editable.
        KeyCode::Left => {
            if app.cursor_position() > 1 {
                app.cursor_left();
            }
        }
        KeyCode::Right => app.cursor_right(),
        KeyCode::Backspace => {
            if app.cursor_position() > 1 {
                app.backspace();
            } else {
                app.enter_normal_mode();
            }
        }
        KeyCode::Char(c) => app.type_char(c),

        _ => return EventResult::Continue,
    }
    EventResult::NeedsRedraw
}

fn handle_overlay_key<B: GameBackend>(app: &mut App<B>, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') | KeyCode::Enter => {
            app.close_overlay();
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}
