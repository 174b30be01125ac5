//! cui-tui: Terminal UI components
//!
//! Widgets for browsing the conversation feed, built on ratatui and crossterm.

pub mod app;
pub mod input;
pub mod theme;
pub mod widgets;

pub use app::{App, AppState};
pub use input::Action;
pub use theme::Theme;
