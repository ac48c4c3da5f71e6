//! Inclusive date-window filtering for prices and events.

use chrono::NaiveDate;

use crate::domain::{DateRange, Event, PricePoint};

/// Anything positioned on the calendar.
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

impl Dated for PricePoint {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for Event {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Keep items with `range.start <= date <= range.end`, in input order.
///
/// An inverted range matches nothing.
pub fn filter_by_window<T: Dated + Clone>(items: &[T], range: &DateRange) -> Vec<T> {
    if range.is_inverted() {
        return Vec::new();
    }
    items
        .iter()
        .filter(|item| range.contains(item.date()))
        .cloned()
        .collect()
}
