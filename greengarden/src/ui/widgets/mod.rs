//! TUI widgets

pub mod affection_meter;
pub mod chat_log;
pub mod input;
pub mod profile;
pub mod status_bar;

pub use affection_meter::{AffectionMeterWidget, METER_HEIGHT};
pub use chat_log::ChatLogWidget;
pub use input::InputWidget;
pub use profile::ProfileWidget;
pub use status_bar::StatusBarWidget;
