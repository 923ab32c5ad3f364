//! Character-by-character reveal of a finished reply.

use std::time::Duration;

/// Time between two revealed characters.
pub const REVEAL_INTERVAL: Duration = Duration::from_millis(50);

/// Split message text into display lines.
///
/// Every line break becomes a visual break; blank lines are kept so the
/// author's spacing survives. `\r\n` counts as one break.
pub fn visual_lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

/// Progress through one reply. Counts Unicode scalar values, so multi-byte
/// characters are revealed whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reveal {
    text: String,
    /// Byte offset just past each character.
    ends: Vec<usize>,
    revealed: usize,
}

impl Reveal {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let ends = text
            .char_indices()
            .map(|(i, c)| i + c.len_utf8())
            .collect();
        Self {
            text,
            ends,
            revealed: 0,
        }
    }

    /// Number of characters in the full reply.
    pub fn len(&self) -> usize {
        self.ends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    /// Characters shown so far.
    pub fn revealed(&self) -> usize {
        self.revealed
    }

    pub fn is_complete(&self) -> bool {
        self.revealed >= self.ends.len()
    }

    pub fn full_text(&self) -> &str {
        &self.text
    }

    /// The prefix shown so far.
    pub fn visible(&self) -> &str {
        match self.revealed {
            0 => "",
            n => &self.text[..self.ends[n - 1]],
        }
    }

    /// Reveal one more character. Returns `false` once nothing is left.
    pub fn advance(&mut self) -> bool {
        if self.is_complete() {
            return false;
        }
        self.revealed += 1;
        true
    }

    /// Jump straight to the full text.
    pub fn finish(&mut self) {
        self.revealed = self.ends.len();
    }
}
