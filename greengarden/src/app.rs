//! Main application state and logic

use std::collections::VecDeque;

use greengarden_core::view::TypingView;
use greengarden_core::{Controller, GameBackend, Update};
use ratatui::layout::Rect;
use tokio::time::Instant;
use tracing::debug;

use crate::ui::layout::AppLayout;
use crate::ui::theme::Theme;
use crate::ui::widgets::ChatLogWidget;
use crate::ui::Overlay;

const HISTORY_LIMIT: usize = 100;

/// Save slot used when a command names none.
pub const DEFAULT_SLOT: u32 = 1;

/// Vim-style input modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Navigation and hotkeys
    #[default]
    Normal,
    /// Typing a message
    Insert,
    /// Typing a `:` command
    Command,
}

/// Terminal front end around a [`Controller`].
pub struct App<B: GameBackend> {
    pub controller: Controller<B>,
    pub theme: Theme,
    overlay: Option<Overlay>,

    // Chat log scrolling
    pub chat_scroll: usize,
    pub scroll_locked_to_bottom: bool,
    seen_tail: u64,
    chat_height: u16,
    chat_width: u16,

    // Input line
    pub input_mode: InputMode,
    input_buffer: String,
    cursor_position: usize,
    input_history: VecDeque<String>,
    history_index: Option<usize>,
    saved_input: Option<String>,

    pub should_quit: bool,
    quit_after_save: bool,
}

impl<B: GameBackend> App<B> {
    pub fn new(controller: Controller<B>) -> Self {
        Self {
            controller,
            theme: Theme::default(),
            overlay: None,
            chat_scroll: 0,
            scroll_locked_to_bottom: true,
            seen_tail: 0,
            chat_height: 0,
            chat_width: 0,
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            cursor_position: 0,
            input_history: VecDeque::with_capacity(HISTORY_LIMIT),
            history_index: None,
            saved_input: None,
            should_quit: false,
            quit_after_save: false,
        }
    }

    /// Recompute the chat log size for a new terminal size.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.chat_height = self.controller.resize(height);

        let metrics = self.controller.layout();
        let layout = AppLayout::calculate(
            Rect::new(0, 0, width, height),
            metrics.navbar_height,
            self.chat_height,
            metrics.input_height,
        );
        self.chat_width = layout.chat_area.width;
        debug!(
            width,
            height,
            chat_height = self.chat_height,
            chat_width = self.chat_width,
            "resized"
        );
    }

    /// Apply finished background work and advance animations to `now`.
    pub fn tick(&mut self, now: Instant) {
        while let Some(update) = self.controller.try_next_update() {
            self.observe(&update);
            self.controller.handle_update(update, now);
        }
        self.controller.on_frame(now);

        let tail = self.controller.follow_tail();
        if tail != self.seen_tail {
            self.seen_tail = tail;
            self.scroll_to_bottom();
        }

        if self.controller.take_focus_request() {
            self.input_mode = InputMode::Insert;
        }
    }

    fn observe(&mut self, update: &Update) {
        if let Update::Saved { result, .. } = update {
            if self.quit_after_save {
                self.quit_after_save = false;
                self.should_quit = matches!(result, Ok(response) if response.success);
            }
        }
    }

    pub fn start_game(&mut self) {
        if !self.controller.start_game() && self.controller.session().game_started {
            self.set_status("The story has already begun");
        }
    }

    /// Send the input line as a chat message.
    pub fn submit_message(&mut self, now: Instant) {
        let Some(message) = self.submit_input() else {
            return;
        };
        if !self.controller.session().game_started {
            self.set_status("Start the game first");
            return;
        }
        self.controller.send_message(&message, now);
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Enter command mode (starts with :)
    pub fn enter_command_mode(&mut self) {
        self.input_mode = InputMode::Command;
        self.set_input(":");
    }

    pub fn enter_normal_mode(&mut self) {
        if self.input_mode == InputMode::Command {
            self.clear_input();
        }
        self.input_mode = InputMode::Normal;
    }

    /// Run a `:` command. Returns whether it was recognized.
    pub fn process_command(&mut self, command: &str) -> bool {
        let parts: Vec<&str> = command.trim_start_matches(':').split_whitespace().collect();
        let Some(&name) = parts.first() else {
            return false;
        };

        match name {
            "q" | "quit" | "exit" => {
                self.should_quit = true;
            }
            "w" | "save" => {
                if let Some(slot) = self.slot_arg(parts.get(1).copied()) {
                    self.controller.save_game(slot);
                }
            }
            "wq" => {
                if let Some(slot) = self.slot_arg(parts.get(1).copied()) {
                    if self.controller.save_game(slot) {
                        self.quit_after_save = true;
                    } else {
                        self.should_quit = true;
                    }
                }
            }
            "load" => {
                if let Some(slot) = self.slot_arg(parts.get(1).copied()) {
                    self.controller.load_game(slot);
                }
            }
            "start" => self.start_game(),
            "help" | "h" => self.toggle_help(),
            _ => {
                self.set_status(format!("Unknown command: {name}"));
                return false;
            }
        }
        true
    }

    fn slot_arg(&mut self, arg: Option<&str>) -> Option<u32> {
        let Some(raw) = arg else {
            return Some(DEFAULT_SLOT);
        };
        match raw.parse() {
            Ok(slot) => Some(slot),
            Err(_) => {
                self.set_status(format!("Invalid slot: {raw}"));
                None
            }
        }
    }

    // =========================================================================
    // Scrolling
    // =========================================================================

    /// Follow the newest line. The widget caps the offset.
    pub fn scroll_to_bottom(&mut self) {
        self.chat_scroll = usize::MAX / 2;
        self.scroll_locked_to_bottom = true;
    }

    pub fn scroll_to_top(&mut self) {
        self.chat_scroll = 0;
        self.scroll_locked_to_bottom = false;
    }

    /// Largest useful offset, in the chat log's wrapped rows.
    fn max_scroll(&self) -> usize {
        let typing = self
            .controller
            .is_typing()
            .then_some(TypingView { opacity: 1.0 });
        let rows = ChatLogWidget::new(self.controller.entries(), &self.theme)
            .typing(typing)
            .revealing(self.controller.is_revealing())
            .row_count(self.chat_width);
        let visible = usize::from(self.chat_height.saturating_sub(2));
        rows.saturating_sub(visible)
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.chat_scroll = self.chat_scroll.min(self.max_scroll()).saturating_sub(lines);
        self.scroll_locked_to_bottom = false;
    }

    pub fn scroll_down(&mut self, lines: usize) {
        let max = self.max_scroll();
        self.chat_scroll = self.chat_scroll.min(max).saturating_add(lines);
        if self.chat_scroll >= max {
            self.scroll_to_bottom();
        }
    }

    // =========================================================================
    // Input editing
    // =========================================================================

    /// Take the input line. Blank input stays where it is.
    pub fn submit_input(&mut self) -> Option<String> {
        if self.input_buffer.trim().is_empty() {
            return None;
        }

        let input = std::mem::take(&mut self.input_buffer);
        self.cursor_position = 0;
        self.history_index = None;
        self.saved_input = None;

        if !input.starts_with(':') {
            self.input_history.push_front(input.clone());
            self.input_history.truncate(HISTORY_LIMIT);
        }
        Some(input)
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.input_buffer
            .char_indices()
            .nth(char_index)
            .map_or(self.input_buffer.len(), |(i, _)| i)
    }

    fn char_count(&self) -> usize {
        self.input_buffer.chars().count()
    }

    pub fn type_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor_position);
        self.input_buffer.insert(at, c);
        self.cursor_position += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor_position == 0 {
            return;
        }
        self.cursor_position -= 1;
        let at = self.byte_index(self.cursor_position);
        self.input_buffer.remove(at);
    }

    pub fn delete(&mut self) {
        if self.cursor_position < self.char_count() {
            let at = self.byte_index(self.cursor_position);
            self.input_buffer.remove(at);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor_position = (self.cursor_position + 1).min(self.char_count());
    }

    pub fn cursor_home(&mut self) {
        self.cursor_position = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor_position = self.char_count();
    }

    /// Step back through sent messages.
    pub fn history_prev(&mut self) {
        let next = self.history_index.map_or(0, |i| i + 1);
        let Some(entry) = self.input_history.get(next).cloned() else {
            return;
        };
        if self.history_index.is_none() {
            self.saved_input = Some(std::mem::take(&mut self.input_buffer));
        }
        self.history_index = Some(next);
        self.set_input(entry);
    }

    /// Step forward again; past the newest entry restores the draft.
    pub fn history_next(&mut self) {
        match self.history_index {
            None => {}
            Some(0) => {
                self.history_index = None;
                let draft = self.saved_input.take().unwrap_or_default();
                self.set_input(draft);
            }
            Some(i) => {
                if let Some(entry) = self.input_history.get(i - 1).cloned() {
                    self.history_index = Some(i - 1);
                    self.set_input(entry);
                }
            }
        }
    }

    /// Replace the input line and put the cursor at its end.
    pub fn set_input(&mut self, content: impl Into<String>) {
        self.input_buffer = content.into();
        self.cursor_position = self.char_count();
    }

    pub fn clear_input(&mut self) {
        self.input_buffer.clear();
        self.cursor_position = 0;
    }

    // =========================================================================
    // Overlays and status
    // =========================================================================

    pub fn toggle_help(&mut self) {
        self.overlay = match self.overlay {
            Some(Overlay::Help) => None,
            None => Some(Overlay::Help),
        };
    }

    pub fn close_overlay(&mut self) {
        self.overlay = None;
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    pub fn has_overlay(&self) -> bool {
        self.overlay.is_some()
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.controller.set_status(message);
    }

    pub fn status_message(&self) -> Option<&str> {
        self.controller.status()
    }

    pub fn input_buffer(&self) -> &str {
        &self.input_buffer
    }

    pub fn cursor_position(&self) -> usize {
        self.cursor_position
    }

    pub fn chat_height(&self) -> u16 {
        self.chat_height
    }
}
