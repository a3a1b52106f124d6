//! Presentation layer handling terminal UI and user input.
//!
//! This module renders the grid with ratatui and dispatches keyboard
//! events to the application state.

pub mod input;
pub mod ui;

pub use input::*;
pub use ui::*;
