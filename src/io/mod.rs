//! Output helpers.
//!
//! - view-state JSON export and visible-window CSV export (`export`)

pub mod export;

pub use export::*;
