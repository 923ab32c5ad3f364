//! Chat controller: request flows, reveal and state sync.
//!
//! The controller is owned by a single loop. Requests and timers run as
//! scheduled tasks and report back as [`Update`]s; the loop feeds them to
//! [`Controller::handle_update`] and calls [`Controller::on_frame`] before
//! drawing each frame.
//!
//! Chat flow: `Idle -> UserSent -> AwaitingResponse -> Revealing ->
//! StateApplied -> Idle`. A send that arrives while a reveal is still
//! running cancels that reveal's timer and completes it on the spot, so
//! each reply's state is applied exactly once.

use std::sync::Arc;
use std::time::Duration;

use greengarden_api::{
    ChatResponse, Error, GameState, LoadResponse, SaveResponse, StartGameResponse, PORTRAIT_PATH,
};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::affection::Meter;
use crate::backend::GameBackend;
use crate::layout::LayoutMetrics;
use crate::reveal::{Reveal, REVEAL_INTERVAL};
use crate::scheduler::{Scheduler, TaskHandle};
use crate::session::{ResolvedState, SessionState};
use crate::view::{ChatEntry, IndicatorView, MeterView, ScreenView, TypingView, ViewSnapshot};

/// Length of each half of the welcome-to-game transition.
pub const FADE_DURATION: Duration = Duration::from_millis(500);

/// Period of the typing-dot pulse.
pub const TYPING_PULSE_INTERVAL: Duration = Duration::from_millis(100);

/// Portrait for a closeness value. A single portrait is shipped, so the
/// value is not consulted.
pub fn portrait_path(_closeness: i32) -> &'static str {
    PORTRAIT_PATH
}

/// Messages delivered by background tasks.
#[derive(Debug)]
pub enum Update {
    Started(Result<StartGameResponse, Error>),
    Replied(Result<ChatResponse, Error>),
    Saved {
        slot: u32,
        result: Result<SaveResponse, Error>,
    },
    Loaded {
        slot: u32,
        result: Result<LoadResponse, Error>,
    },
    RevealTick {
        reveal: u64,
    },
    TypingPulse,
}

/// Where the chat exchange currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatPhase {
    #[default]
    Idle,
    UserSent,
    AwaitingResponse,
    Revealing,
    StateApplied,
}

/// Pulsing "..." placeholder. Opacity is kept in tenths.
struct TypingIndicator {
    shown: u8,
    next: u8,
    rising: bool,
    pulse: TaskHandle,
}

impl TypingIndicator {
    fn new(pulse: TaskHandle) -> Self {
        Self {
            shown: 10,
            next: 3,
            rising: true,
            pulse,
        }
    }

    /// Bounce between 0.3 and 1.0 in steps of 0.1.
    fn step(&mut self) {
        self.shown = self.next;
        if self.rising {
            self.next += 1;
            if self.next >= 10 {
                self.rising = false;
            }
        } else {
            self.next -= 1;
            if self.next <= 3 {
                self.rising = true;
            }
        }
    }

    fn opacity(&self) -> f32 {
        f32::from(self.shown) / 10.0
    }
}

struct ActiveReveal {
    id: u64,
    entry: usize,
    reveal: Reveal,
    state: Option<GameState>,
    task: TaskHandle,
}

enum Screen {
    Welcome,
    FadingOut {
        since: Instant,
        pending: StartGameResponse,
    },
    FadingIn {
        since: Instant,
    },
    Game,
}

fn fade_progress(since: Instant, now: Instant) -> f64 {
    let elapsed = now.saturating_duration_since(since).as_secs_f64();
    (elapsed / FADE_DURATION.as_secs_f64()).min(1.0)
}

/// Client-side game controller.
pub struct Controller<B> {
    backend: Arc<B>,
    scheduler: Scheduler<Update>,
    updates: mpsc::UnboundedReceiver<Update>,

    session: SessionState,
    phase: ChatPhase,
    screen: Screen,

    entries: Vec<ChatEntry>,
    typing: Option<TypingIndicator>,
    reveal: Option<ActiveReveal>,
    next_reveal_id: u64,
    outstanding_chats: usize,

    meter: Meter,
    state_syncs: usize,
    portrait_base: String,
    portrait: Option<String>,

    start_in_flight: bool,
    loading: Option<String>,
    notification: Option<String>,
    status: Option<String>,
    focus_requested: bool,

    layout: LayoutMetrics,
    chat_height: u16,
    follow_tail: u64,
}

impl<B: GameBackend> Controller<B> {
    pub fn new(backend: Arc<B>) -> Self {
        let (scheduler, updates) = Scheduler::channel();
        let session = SessionState::default();
        let portrait = Some(portrait_path(session.closeness).to_string());

        Self {
            backend,
            scheduler,
            updates,
            session,
            phase: ChatPhase::Idle,
            screen: Screen::Welcome,
            entries: Vec::new(),
            typing: None,
            reveal: None,
            next_reveal_id: 0,
            outstanding_chats: 0,
            meter: Meter::new(),
            state_syncs: 0,
            portrait_base: String::new(),
            portrait,
            start_in_flight: false,
            loading: None,
            notification: None,
            status: None,
            focus_requested: false,
            layout: LayoutMetrics::default(),
            chat_height: 0,
            follow_tail: 0,
        }
    }

    /// Prefix portrait paths with the server root.
    pub fn with_portrait_base(mut self, base: impl Into<String>) -> Self {
        self.portrait_base = base.into();
        self.refresh_portrait();
        self
    }

    pub fn with_layout(mut self, layout: LayoutMetrics) -> Self {
        self.layout = layout;
        self
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Ask the server for a new game.
    ///
    /// Returns `false` without issuing a request if the game already started,
    /// a start request is still pending, or the welcome screen is fading out.
    pub fn start_game(&mut self) -> bool {
        let on_welcome = matches!(self.screen, Screen::Welcome);
        if self.session.game_started || self.start_in_flight || !on_welcome {
            debug!("start ignored: game already started or starting");
            return false;
        }

        info!("starting game");
        self.start_in_flight = true;
        self.loading = Some("Starting game...".to_string());

        let backend = Arc::clone(&self.backend);
        self.scheduler
            .spawn(async move { Update::Started(backend.start_game().await) });
        true
    }

    /// Send a line of dialogue.
    ///
    /// Blank input is ignored. Otherwise the user entry and typing indicator
    /// appear immediately and the request goes out in the background.
    pub fn send_message(&mut self, input: &str, now: Instant) -> bool {
        let text = input.trim();
        if text.is_empty() {
            return false;
        }

        if let Some(active) = self.reveal.take() {
            debug!(reveal = active.id, "new message interrupts reveal");
            self.complete_reveal(active, now);
        }

        self.entries.push(ChatEntry::user(text));
        self.set_phase(ChatPhase::UserSent);
        self.scroll_to_bottom();
        self.show_typing();

        self.outstanding_chats += 1;
        let backend = Arc::clone(&self.backend);
        let message = text.to_string();
        self.scheduler
            .spawn(async move { Update::Replied(backend.chat(&message).await) });
        self.set_phase(ChatPhase::AwaitingResponse);
        true
    }

    /// Save the server-side game into `slot`.
    pub fn save_game(&mut self, slot: u32) -> bool {
        if !self.session.game_started {
            self.status = Some("Start a game before saving".to_string());
            return false;
        }

        self.status = Some(format!("Saving to slot {slot}..."));
        let backend = Arc::clone(&self.backend);
        self.scheduler.spawn(async move {
            Update::Saved {
                slot,
                result: backend.save(slot).await,
            }
        });
        true
    }

    /// Restore the server-side game from `slot`.
    pub fn load_game(&mut self, slot: u32) -> bool {
        if !self.session.game_started {
            self.status = Some("Start a game before loading".to_string());
            return false;
        }

        self.status = Some(format!("Loading slot {slot}..."));
        let backend = Arc::clone(&self.backend);
        self.scheduler.spawn(async move {
            Update::Loaded {
                slot,
                result: backend.load(slot).await,
            }
        });
        true
    }

    /// Recompute the chat log height for a new viewport.
    pub fn resize(&mut self, viewport_height: u16) -> u16 {
        self.chat_height = self.layout.chat_height(viewport_height);
        self.chat_height
    }

    pub fn dismiss_notification(&mut self) {
        self.notification = None;
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    /// Whether the text entry should take focus. Cleared by reading.
    pub fn take_focus_request(&mut self) -> bool {
        std::mem::take(&mut self.focus_requested)
    }

    // =========================================================================
    // Event loop plumbing
    // =========================================================================

    /// Wait for the next background update.
    pub async fn next_update(&mut self) -> Option<Update> {
        self.updates.recv().await
    }

    /// Take a background update if one is ready.
    pub fn try_next_update(&mut self) -> Option<Update> {
        self.updates.try_recv().ok()
    }

    pub fn handle_update(&mut self, update: Update, now: Instant) {
        match update {
            Update::Started(result) => self.on_started(result, now),
            Update::Replied(result) => self.on_replied(result, now),
            Update::Saved { slot, result } => self.on_saved(slot, result),
            Update::Loaded { slot, result } => self.on_loaded(slot, result, now),
            Update::RevealTick { reveal } => self.on_reveal_tick(reveal, now),
            Update::TypingPulse => {
                if let Some(typing) = self.typing.as_mut() {
                    typing.step();
                }
            }
        }
    }

    /// Advance frame-driven animations to `now`.
    pub fn on_frame(&mut self, now: Instant) {
        self.meter.on_frame(now);

        self.screen = match std::mem::replace(&mut self.screen, Screen::Welcome) {
            Screen::FadingOut { since, pending } if fade_progress(since, now) >= 1.0 => {
                self.finish_start(pending, now);
                Screen::FadingIn { since: now }
            }
            Screen::FadingIn { since } if fade_progress(since, now) >= 1.0 => Screen::Game,
            other => other,
        };
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn phase(&self) -> ChatPhase {
        self.phase
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn meter(&self) -> &Meter {
        &self.meter
    }

    /// Number of server states applied so far.
    pub fn state_syncs(&self) -> usize {
        self.state_syncs
    }

    pub fn is_typing(&self) -> bool {
        self.typing.is_some()
    }

    pub fn is_revealing(&self) -> bool {
        self.reveal.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    pub fn on_game_screen(&self) -> bool {
        matches!(self.screen, Screen::FadingIn { .. } | Screen::Game)
    }

    pub fn notification(&self) -> Option<&str> {
        self.notification.as_deref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn portrait(&self) -> Option<&str> {
        self.portrait.as_deref()
    }

    pub fn layout(&self) -> LayoutMetrics {
        self.layout
    }

    /// Bumped every time the log should jump to its newest line.
    pub fn follow_tail(&self) -> u64 {
        self.follow_tail
    }

    pub fn snapshot(&self, now: Instant) -> ViewSnapshot<'_> {
        let screen = match &self.screen {
            Screen::Welcome => ScreenView::Welcome,
            Screen::FadingOut { since, .. } => ScreenView::FadingOut {
                progress: fade_progress(*since, now),
            },
            Screen::FadingIn { since } => ScreenView::FadingIn {
                progress: fade_progress(*since, now),
            },
            Screen::Game => ScreenView::Game,
        };

        let indicators = self
            .meter
            .indicators()
            .iter()
            .map(|i| IndicatorView {
                text: i.text(),
                sentiment: i.sentiment(),
                progress: i.progress(now),
                opacity: i.opacity(now),
            })
            .collect();

        ViewSnapshot {
            screen,
            entries: &self.entries,
            typing: self.typing.as_ref().map(|t| TypingView {
                opacity: t.opacity(),
            }),
            meter: MeterView {
                label: self.meter.displayed_closeness(),
                bar_width: self.meter.bar_width(),
                tier: self.meter.tier(),
                relationship: self.meter.relationship(),
                scene: self.meter.scene(),
            },
            indicators,
            portrait: self.portrait.as_deref(),
            loading: self.loading.as_deref(),
            notification: self.notification.as_deref(),
            status: self.status.as_deref(),
            time_info: &self.session.time_info,
            chat_height: self.chat_height,
            follow_tail: self.follow_tail,
        }
    }

    // =========================================================================
    // Update handlers
    // =========================================================================

    fn on_started(&mut self, result: Result<StartGameResponse, Error>, now: Instant) {
        self.start_in_flight = false;
        self.loading = None;

        match result {
            Ok(response) => {
                debug!("start accepted, fading out welcome screen");
                self.screen = Screen::FadingOut {
                    since: now,
                    pending: response,
                };
            }
            Err(e) => {
                warn!("start_game failed: {e}");
                self.notify(format!("Unable to start game: {e}"));
            }
        }
    }

    fn finish_start(&mut self, response: StartGameResponse, now: Instant) {
        self.apply_state(response.game_state.as_ref(), now);
        self.entries.push(ChatEntry::system(response.intro_text));
        self.scroll_to_bottom();
        self.session = self.session.started();
        self.focus_requested = true;
        info!(closeness = self.session.closeness, "game started");
    }

    fn on_replied(&mut self, result: Result<ChatResponse, Error>, now: Instant) {
        self.outstanding_chats = self.outstanding_chats.saturating_sub(1);
        self.hide_typing();

        match result {
            Ok(response) => self.begin_reveal(response.response, response.game_state, now),
            Err(e) => {
                warn!("chat failed: {e}");
                self.notify(format!("Failed to send message: {e}"));
                if self.reveal.is_none() {
                    self.settle_phase();
                }
            }
        }
    }

    fn on_saved(&mut self, slot: u32, result: Result<SaveResponse, Error>) {
        match result {
            Ok(SaveResponse { success: true }) => {
                info!(slot, "game saved");
                self.status = Some(format!("Saved to slot {slot}"));
            }
            Ok(SaveResponse { success: false }) => {
                warn!(slot, "server refused to save");
                self.status = Some(format!("Save to slot {slot} failed"));
            }
            Err(e) => {
                warn!(slot, "save failed: {e}");
                self.status = None;
                self.notify(format!("Failed to save game: {e}"));
            }
        }
    }

    fn on_loaded(&mut self, slot: u32, result: Result<LoadResponse, Error>, now: Instant) {
        match result {
            Ok(LoadResponse {
                success: true,
                game_state,
            }) => {
                info!(slot, "game loaded");
                self.apply_state(game_state.as_ref(), now);
                self.refresh_portrait();
                self.entries
                    .push(ChatEntry::system(format!("Loaded save slot {slot}.")));
                self.scroll_to_bottom();
                self.status = Some(format!("Loaded slot {slot}"));
            }
            Ok(LoadResponse { success: false, .. }) => {
                self.status = Some(format!("No save in slot {slot}"));
            }
            Err(e) => {
                warn!(slot, "load failed: {e}");
                self.status = None;
                self.notify(format!("Failed to load game: {e}"));
            }
        }
    }

    fn on_reveal_tick(&mut self, id: u64, now: Instant) {
        let Some(active) = self.reveal.as_mut() else {
            return;
        };
        if active.id != id {
            return;
        }

        if active.reveal.advance() {
            let visible = active.reveal.visible().to_string();
            let entry = active.entry;
            self.entries[entry].text = visible;
            self.scroll_to_bottom();
        }

        let done = self
            .reveal
            .as_ref()
            .is_some_and(|active| active.reveal.is_complete());
        if done {
            if let Some(active) = self.reveal.take() {
                active.task.cancel();
                self.finish_reveal(active, now);
            }
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn begin_reveal(&mut self, text: String, state: Option<GameState>, now: Instant) {
        if let Some(active) = self.reveal.take() {
            debug!(reveal = active.id, "reply arrived during reveal");
            self.complete_reveal(active, now);
        }

        self.next_reveal_id += 1;
        let id = self.next_reveal_id;

        self.entries.push(ChatEntry::assistant(String::new()));
        let entry = self.entries.len() - 1;

        let task = self
            .scheduler
            .every(REVEAL_INTERVAL, move || Update::RevealTick { reveal: id });

        debug!(reveal = id, chars = text.chars().count(), "revealing reply");
        self.reveal = Some(ActiveReveal {
            id,
            entry,
            reveal: Reveal::new(text),
            state,
            task,
        });
        self.set_phase(ChatPhase::Revealing);
    }

    /// Cancel a reveal's timer and show the rest of it at once.
    fn complete_reveal(&mut self, mut active: ActiveReveal, now: Instant) {
        active.task.cancel();
        active.reveal.finish();
        self.entries[active.entry].text = active.reveal.full_text().to_string();
        self.finish_reveal(active, now);
    }

    fn finish_reveal(&mut self, active: ActiveReveal, now: Instant) {
        self.set_phase(ChatPhase::StateApplied);
        self.apply_state(active.state.as_ref(), now);
        self.refresh_portrait();
        self.scroll_to_bottom();
        self.settle_phase();
    }

    /// Back to waiting if another reply is due, otherwise idle.
    fn settle_phase(&mut self) {
        if self.outstanding_chats > 0 {
            self.set_phase(ChatPhase::AwaitingResponse);
            self.show_typing();
        } else {
            self.set_phase(ChatPhase::Idle);
        }
    }

    fn apply_state(&mut self, state: Option<&GameState>, now: Instant) {
        let Some(state) = state else {
            return;
        };

        let resolved = ResolvedState::from_game_state(state);
        let outcome = self.meter.sync(&resolved, now);
        self.session = self.session.synced(&resolved);
        self.state_syncs += 1;

        debug!(
            old = outcome.old,
            new = outcome.new,
            tier = outcome.tier.name(),
            "state synced"
        );
    }

    fn refresh_portrait(&mut self) {
        self.portrait = Some(format!(
            "{}{}",
            self.portrait_base,
            portrait_path(self.session.closeness)
        ));
    }

    fn show_typing(&mut self) {
        if self.typing.is_some() {
            return;
        }
        let pulse = self
            .scheduler
            .every(TYPING_PULSE_INTERVAL, || Update::TypingPulse);
        self.typing = Some(TypingIndicator::new(pulse));
        self.scroll_to_bottom();
    }

    fn hide_typing(&mut self) {
        if let Some(typing) = self.typing.take() {
            typing.pulse.cancel();
        }
    }

    fn notify(&mut self, message: String) {
        self.notification = Some(message);
    }

    fn scroll_to_bottom(&mut self) {
        self.follow_tail = self.follow_tail.wrapping_add(1);
    }

    fn set_phase(&mut self, phase: ChatPhase) {
        if self.phase != phase {
            debug!(from = ?self.phase, to = ?phase, "chat phase");
            self.phase = phase;
        }
    }
}
