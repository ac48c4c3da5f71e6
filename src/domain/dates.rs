//! Calendar-date parsing.
//!
//! The service speaks ISO dates (`2020-03-01`). The Brent CSV export mixes
//! day-first formats (`20-May-87`, `Apr 22, 2020`), so local files go through
//! the same parser with a wider format list.

use chrono::{Duration, NaiveDate};

const ISO_FORMAT: &str = "%Y-%m-%d";

const CSV_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d-%b-%y", "%b %d, %Y", "%d/%m/%Y"];

/// Parse a strict ISO calendar date.
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), ISO_FORMAT).ok()
}

/// Parse any of the date layouts found in local CSV files.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    CSV_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

/// `date` moved by `days`, saturating at the ends of the calendar.
///
/// Parsed dates may sit anywhere in chrono's range (`+262142-12-31` is a
/// valid ISO date), so window and band arithmetic never overflows.
pub fn shift_days(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(Duration::days(days))
        .unwrap_or(if days < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}
