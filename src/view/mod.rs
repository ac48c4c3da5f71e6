//! The data-join and filtering core.
//!
//! - date-window filtering (`window`)
//! - category filtering (`category`)
//! - event-to-correlation join (`resolver`)
//! - view-state aggregation and KPIs (`state`)
//! - the session that owns interaction state (`session`)

pub mod category;
pub mod resolver;
pub mod session;
pub mod state;
pub mod window;

pub use category::filter_by_category;
pub use resolver::resolve;
pub use session::Dashboard;
pub use state::{KpiSummary, Selection, ViewState, compute};
pub use window::{Dated, filter_by_window};
