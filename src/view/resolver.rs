//! Join a selected event to its precomputed impact statistics.
//!
//! The join key is the event title, matched exactly (case-sensitive). The
//! source data offers no stronger identifier, so two events sharing a title
//! resolve to the same record; duplicates are reported at ingest time.

use crate::domain::{CorrelationRecord, Event};

/// First record whose title equals the selected event's title.
///
/// `None` for no selection or no match; a missing record is an expected state.
pub fn resolve<'a>(
    selected: Option<&Event>,
    records: &'a [CorrelationRecord],
) -> Option<&'a CorrelationRecord> {
    let selected = selected?;
    records.iter().find(|r| r.title == selected.title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Category;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn event(title: &str) -> Event {
        Event {
            title: title.to_string(),
            date: NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(),
            category: Category::Conflict,
            notes: String::new(),
        }
    }

    fn record(title: &str, pct: rust_decimal::Decimal) -> CorrelationRecord {
        CorrelationRecord {
            title: title.to_string(),
            date: None,
            category: None,
            price_change_pct: pct,
            vol_change_pct: dec!(12.5),
            avg_price_before: None,
            avg_price_after: dec!(48.1),
        }
    }

    #[test]
    fn returns_matching_record() {
        let records = vec![record("A", dec!(-5.2))];
        let hit = resolve(Some(&event("A")), &records).unwrap();
        assert_eq!(hit.price_change_pct, dec!(-5.2));
    }

    #[test]
    fn unmatched_and_unselected_are_none() {
        let records = vec![record("A", dec!(-5.2))];
        assert!(resolve(Some(&event("B")), &records).is_none());
        assert!(resolve(None, &records).is_none());
        assert!(resolve(Some(&event("A")), &[]).is_none());
    }

    #[test]
    fn match_is_case_sensitive() {
        let records = vec![record("Gulf War", dec!(1))];
        assert!(resolve(Some(&event("gulf war")), &records).is_none());
    }

    #[test]
    fn first_duplicate_wins() {
        let records = vec![record("A", dec!(1)), record("A", dec!(2))];
        assert_eq!(resolve(Some(&event("A")), &records).unwrap().price_change_pct, dec!(1));
    }
}
