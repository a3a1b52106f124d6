//! Application layer managing state and user-facing workflows.
//!
//! This module coordinates between the domain engine and the presentation
//! layer: selection, dialogs, and the editing lifecycle.

pub mod state;

pub use state::*;
