//! Immutable view snapshot handed to the renderer.
//!
//! The controller owns the state; each frame it produces a [`ViewSnapshot`]
//! and the front end regenerates its whole picture from it.

use crate::affection::{Sentiment, Tier};
use crate::reveal::visual_lines;

/// Who a chat entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    System,
    User,
    Assistant,
}

/// One bubble in the chat log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub kind: EntryKind,
    pub text: String,
}

impl ChatEntry {
    pub fn new(kind: EntryKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(EntryKind::System, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(EntryKind::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(EntryKind::Assistant, text)
    }

    /// Text split at line breaks.
    pub fn lines(&self) -> Vec<&str> {
        visual_lines(&self.text)
    }
}

/// Which screen is up, with fade progress in [0, 1] while switching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScreenView {
    Welcome,
    FadingOut { progress: f64 },
    FadingIn { progress: f64 },
    Game,
}

/// The "..." placeholder shown while waiting for a reply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypingView {
    pub opacity: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeterView<'a> {
    pub label: i32,
    /// Bar width in percent.
    pub bar_width: f64,
    pub tier: Tier,
    pub relationship: &'a str,
    pub scene: &'a str,
}

/// A floating delta marker at some point of its rise-and-fade.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorView {
    pub text: String,
    pub sentiment: Sentiment,
    /// 0 at spawn, 1 when it is about to disappear.
    pub progress: f64,
    pub opacity: f64,
}

/// Everything needed to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot<'a> {
    pub screen: ScreenView,
    pub entries: &'a [ChatEntry],
    pub typing: Option<TypingView>,
    pub meter: MeterView<'a>,
    pub indicators: Vec<IndicatorView>,
    pub portrait: Option<&'a str>,
    pub loading: Option<&'a str>,
    pub notification: Option<&'a str>,
    pub status: Option<&'a str>,
    pub time_info: &'a str,
    /// Height assigned to the chat log by the last resize.
    pub chat_height: u16,
    /// Bumped every time the log should jump to its newest line.
    pub follow_tail: u64,
}
