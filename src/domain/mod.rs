//! Domain types used throughout the dashboard.
//!
//! This module defines:
//!
//! - dataset records (`PricePoint`, `Event`, `CorrelationRecord`, `ChangePointSummary`)
//! - interaction state (`DateRange`, `CategoryFilter`)
//! - the snapshot handed to the view layer (`Datasets`) and its `DataWarning`s

pub mod dates;
pub mod types;

pub use dates::*;
pub use types::*;
