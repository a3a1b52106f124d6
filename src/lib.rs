//! etab - Terminal Spreadsheet Library
//!
//! A terminal spreadsheet with a small logical expression language:
//! arithmetic, comparisons, boolean logic, `max`/`min`, and cell references
//! with whole-grid recalculation and cycle detection.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use application::*;
pub use domain::*;
