//! Client core for Green Garden High Story.
//!
//! This crate provides:
//! - The chat controller (start game, send message, save, load)
//! - Character-by-character reveal of replies
//! - The affection meter with tiers, tweens and delta indicators
//! - An immutable view snapshot for any front end to draw
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use greengarden_api::GameClient;
//! use greengarden_core::Controller;
//! use tokio::time::Instant;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Arc::new(GameClient::from_env()?);
//!     let mut controller = Controller::new(client);
//!     controller.start_game();
//!
//!     while let Some(update) = controller.next_update().await {
//!         controller.handle_update(update, Instant::now());
//!         controller.on_frame(Instant::now());
//!     }
//!     Ok(())
//! }
//! ```

pub mod affection;
pub mod backend;
pub mod controller;
pub mod layout;
pub mod reveal;
pub mod scheduler;
pub mod session;
pub mod testing;
pub mod view;

pub use affection::{Meter, Sentiment, Tier};
pub use backend::GameBackend;
pub use controller::{ChatPhase, Controller, Update};
pub use layout::LayoutMetrics;
pub use session::{ResolvedState, SessionState};
pub use testing::MockBackend;
pub use view::{ChatEntry, EntryKind, ScreenView, ViewSnapshot};
