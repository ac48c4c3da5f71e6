//! `brent-dash` library crate.
//!
//! The binary (`brent-dash`) is a thin wrapper around this library so that:
//!
//! - the filtering/aggregation core is testable without spawning processes
//! - the core is reusable by other front-ends (web, notebooks, etc.)
//! - presentation stays separate from data handling

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod report;
pub mod tui;
pub mod view;
