//! Infrastructure layer providing external service integrations.
//!
//! This module contains file I/O: JSON persistence of sheet documents and
//! CSV export/import.

pub mod export;
pub mod persistence;

pub use export::*;
pub use persistence::*;
