//! Vertical sizing of the chat log.

/// Gap kept below the chat log when nothing else is configured.
pub const DEFAULT_BUFFER: u16 = 1;

/// Fixed chrome around the chat log, in the host's vertical units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutMetrics {
    pub navbar_height: u16,
    pub input_height: u16,
    pub buffer: u16,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            navbar_height: 1,
            input_height: 3,
            buffer: DEFAULT_BUFFER,
        }
    }
}

impl LayoutMetrics {
    /// Height left for the chat log in a viewport of `viewport_height`.
    pub fn chat_height(&self, viewport_height: u16) -> u16 {
        chat_log_height(
            viewport_height,
            self.navbar_height,
            self.input_height,
            self.buffer,
        )
    }
}

/// `viewport - navbar - input area - buffer`, never below zero.
pub fn chat_log_height(viewport: u16, navbar: u16, input_area: u16, buffer: u16) -> u16 {
    viewport
        .saturating_sub(navbar)
        .saturating_sub(input_area)
        .saturating_sub(buffer)
}
