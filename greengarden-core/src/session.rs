//! Session record for one play-through.
//!
//! `SessionState` is immutable from the outside: every server response
//! produces a new record through [`SessionState::synced`] instead of
//! mutating a shared object.

use greengarden_api::GameState;

use crate::affection::{clamp_closeness, DEFAULT_CLOSENESS};

/// Relationship label used when the server does not send one.
pub const DEFAULT_RELATIONSHIP: &str = "Initial stage";

/// Scene label used when the server does not send one.
pub const DEFAULT_SCENE: &str = "School - Club Fair";

/// In-game clock shown before the server reports anything else.
pub const DEFAULT_TIME_INFO: &str = "September 1, 2023 - Morning";

/// A server game state with every default filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedState {
    pub closeness: i32,
    pub relationship: String,
    pub scene: String,
}

impl ResolvedState {
    /// Resolve optional server fields.
    ///
    /// `relationship_state` wins over `relationship` when both are present.
    /// Blank labels count as missing.
    pub fn from_game_state(state: &GameState) -> Self {
        let closeness = state
            .closeness
            .map(clamp_closeness)
            .unwrap_or(DEFAULT_CLOSENESS);

        let relationship = non_blank(state.relationship_state.as_deref())
            .or_else(|| non_blank(state.relationship.as_deref()))
            .unwrap_or(DEFAULT_RELATIONSHIP)
            .to_string();

        let scene = non_blank(state.scene.as_deref())
            .unwrap_or(DEFAULT_SCENE)
            .to_string();

        Self {
            closeness,
            relationship,
            scene,
        }
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

/// Everything the client remembers about the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub initialized: bool,
    pub game_started: bool,
    pub closeness: i32,
    pub relationship: String,
    pub scene: String,
    pub time_info: String,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            initialized: false,
            game_started: false,
            closeness: DEFAULT_CLOSENESS,
            relationship: DEFAULT_RELATIONSHIP.to_string(),
            scene: DEFAULT_SCENE.to_string(),
            time_info: DEFAULT_TIME_INFO.to_string(),
        }
    }
}

impl SessionState {
    /// The record after applying a synced server state.
    pub fn synced(&self, resolved: &ResolvedState) -> Self {
        Self {
            closeness: resolved.closeness,
            relationship: resolved.relationship.clone(),
            scene: resolved.scene.clone(),
            ..self.clone()
        }
    }

    /// The record once the opening scene has been shown.
    pub fn started(&self) -> Self {
        Self {
            initialized: true,
            game_started: true,
            ..self.clone()
        }
    }
}
