//! Headless mode.
//!
//! A line-oriented client for scripts and automated testing. Replies are
//! printed whole instead of revealed, and affection changes are reported
//! as text.

use std::error::Error;
use std::io::{BufRead, Write};
use std::sync::Arc;

use greengarden_api::GameState;
use greengarden_core::affection::{DeltaIndicator, SyncOutcome, INDICATOR_DURATION};
use greengarden_core::{GameBackend, Meter, ResolvedState, SessionState};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::app::DEFAULT_SLOT;
use crate::ui::{CHARACTER_NAME, GAME_TITLE};

/// Session record plus the meter, kept in step with the server.
struct Tracker {
    session: SessionState,
    meter: Meter,
}

impl Tracker {
    fn new() -> Self {
        Self {
            session: SessionState::default(),
            meter: Meter::new(),
        }
    }

    /// Sync to a server state. There are no frames here, so the meter's
    /// animations are run to completion right away.
    fn apply(&mut self, state: Option<&GameState>) -> Option<SyncOutcome> {
        let resolved = ResolvedState::from_game_state(state?);
        self.session = self.session.synced(&resolved);

        let now = Instant::now();
        let outcome = self.meter.sync(&resolved, now);
        self.meter.on_frame(now + INDICATOR_DURATION);
        Some(outcome)
    }

    fn status_line(&self) -> String {
        format!(
            "[STATUS] Closeness {} ({}) | {} | {} | {}",
            self.session.closeness,
            self.meter.tier().name(),
            self.session.relationship,
            self.session.scene,
            self.session.time_info,
        )
    }

    /// `[AFFECTION] 30 -> 45 (+15, warning)` for a change, nothing otherwise.
    fn change_line(outcome: &SyncOutcome) -> Option<String> {
        if !outcome.changed() {
            return None;
        }
        let delta = DeltaIndicator::new(outcome.new - outcome.old, Instant::now()).text();
        Some(format!(
            "[AFFECTION] {} -> {} ({delta}, {})",
            outcome.old,
            outcome.new,
            outcome.tier.name()
        ))
    }
}

fn print_help<W: Write>(out: &mut W) -> std::io::Result<()> {
    writeln!(out, "Commands:")?;
    writeln!(out, "  #quit          - Exit the game")?;
    writeln!(out, "  #save [slot]   - Save the game (default slot {DEFAULT_SLOT})")?;
    writeln!(out, "  #load [slot]   - Load a saved game")?;
    writeln!(out, "  #status        - Show closeness, relationship and scene")?;
    writeln!(out, "  #help          - Show this help")?;
    writeln!(out, "  (anything else is said to {CHARACTER_NAME})")
}

fn parse_slot(arg: Option<&str>) -> Result<u32, String> {
    match arg {
        None => Ok(DEFAULT_SLOT),
        Some(raw) => raw.parse().map_err(|_| format!("Invalid slot: {raw}")),
    }
}

/// Run the game over a line protocol.
///
/// - Lines starting with `#` are commands (save, load, status, help, quit)
/// - Any other non-empty line is sent as dialogue
/// - Output lines are tagged: `[SYSTEM]`, `[SU TANG]`, `[AFFECTION]`,
///   `[STATUS]`, `[ERROR]`
pub async fn run_headless<B, R, W>(backend: Arc<B>, input: R, out: &mut W) -> Result<(), Box<dyn Error>>
where
    B: GameBackend,
    R: BufRead,
    W: Write,
{
    let mut tracker = Tracker::new();

    writeln!(out, "=== {GAME_TITLE} (headless) ===")?;
    let start = backend
        .start_game()
        .await
        .map_err(|e| format!("Unable to start game: {e}"))?;
    tracker.apply(start.game_state.as_ref());
    tracker.session = tracker.session.started();
    info!("headless game started");

    writeln!(out, "[SYSTEM]")?;
    writeln!(out, "{}", start.intro_text)?;
    writeln!(out, "{}", tracker.status_line())?;
    writeln!(out)?;
    print_help(out)?;
    writeln!(out)?;
    out.flush()?;

    let speaker_tag = format!("[{}]", CHARACTER_NAME.to_uppercase());

    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('#') {
            let parts: Vec<&str> = command.split_whitespace().collect();
            match parts.first().copied() {
                Some("quit") | Some("exit") => {
                    writeln!(out, "Goodbye!")?;
                    break;
                }
                Some("save") => match parse_slot(parts.get(1).copied()) {
                    Err(e) => writeln!(out, "[ERROR] {e}")?,
                    Ok(slot) => match backend.save(slot).await {
                        Ok(response) if response.success => writeln!(out, "[SAVED] slot {slot}")?,
                        Ok(_) => writeln!(out, "[ERROR] Save to slot {slot} failed")?,
                        Err(e) => writeln!(out, "[ERROR] Failed to save game: {e}")?,
                    },
                },
                Some("load") => match parse_slot(parts.get(1).copied()) {
                    Err(e) => writeln!(out, "[ERROR] {e}")?,
                    Ok(slot) => match backend.load(slot).await {
                        Ok(response) if response.success => {
                            tracker.apply(response.game_state.as_ref());
                            writeln!(out, "[LOADED] slot {slot}")?;
                            writeln!(out, "{}", tracker.status_line())?;
                        }
                        Ok(_) => writeln!(out, "[ERROR] No save in slot {slot}")?,
                        Err(e) => writeln!(out, "[ERROR] Failed to load game: {e}")?,
                    },
                },
                Some("status") => writeln!(out, "{}", tracker.status_line())?,
                Some("help") => print_help(out)?,
                _ => writeln!(out, "[ERROR] Unknown command. Type #help for help.")?,
            }
            out.flush()?;
            continue;
        }

        match backend.chat(line).await {
            Ok(reply) => {
                writeln!(out, "{speaker_tag}")?;
                writeln!(out, "{}", reply.response)?;
                if let Some(outcome) = tracker.apply(reply.game_state.as_ref()) {
                    if let Some(change) = Tracker::change_line(&outcome) {
                        writeln!(out, "{change}")?;
                    }
                }
                writeln!(out)?;
            }
            Err(e) => {
                warn!("chat failed: {e}");
                writeln!(out, "[ERROR] Failed to send message: {e}")?;
            }
        }
        out.flush()?;
    }

    Ok(())
}
