//! UI module for the terminal client

pub mod layout;
pub mod render;
pub mod theme;
pub mod widgets;

pub use render::Overlay;

/// The character the player talks to.
pub const CHARACTER_NAME: &str = "Su Tang";

pub const CHARACTER_TAGLINE: &str = "Bakery Club";

pub const GAME_TITLE: &str = "Green Garden High Story";
