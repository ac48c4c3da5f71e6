//! Plain-text rendering of the dashboard (KPIs, event log, impact analysis).

pub mod format;

pub use format::*;
