//! Category filtering for the event list.

use crate::domain::{CategoryFilter, Event};

/// `All` passes the input through unchanged; `Only(c)` keeps events of type `c`.
///
/// Independent of the window filter, so the two commute.
pub fn filter_by_category(events: &[Event], filter: CategoryFilter) -> Vec<Event> {
    match filter {
        CategoryFilter::All => events.to_vec(),
        CategoryFilter::Only(_) => events
            .iter()
            .filter(|e| filter.matches(e.category))
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, DateRange};
    use crate::view::window::filter_by_window;
    use chrono::NaiveDate;

    fn event(title: &str, month: u32, category: Category) -> Event {
        Event {
            title: title.to_string(),
            date: NaiveDate::from_ymd_opt(2020, month, 1).unwrap(),
            category,
            notes: String::new(),
        }
    }

    fn sample() -> Vec<Event> {
        vec![
            event("A", 3, Category::Conflict),
            event("B", 4, Category::Macro),
            event("C", 9, Category::Conflict),
            event("D", 11, Category::Sanctions),
        ]
    }

    #[test]
    fn conflict_filter_keeps_only_conflicts() {
        let out = filter_by_category(&sample()[..2], CategoryFilter::Only(Category::Conflict));
        assert_eq!(out, vec![sample()[0].clone()]);
    }

    #[test]
    fn all_is_identity() {
        assert_eq!(filter_by_category(&sample(), CategoryFilter::All), sample());
        assert!(filter_by_category(&[], CategoryFilter::All).is_empty());
    }

    #[test]
    fn category_without_members_is_empty() {
        assert!(filter_by_category(&sample(), CategoryFilter::Only(Category::Policy)).is_empty());
    }

    #[test]
    fn commutes_with_window_filter() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2020, 6, 30).unwrap(),
        );
        let filter = CategoryFilter::Only(Category::Conflict);
        let a = filter_by_category(&filter_by_window(&sample(), &range), filter);
        let b = filter_by_window(&filter_by_category(&sample(), filter), &range);
        assert_eq!(a, b);
        assert_eq!(a.len(), 1);
    }
}
