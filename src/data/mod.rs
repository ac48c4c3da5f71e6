//! Dataset retrieval.
//!
//! Two sources produce the same four datasets:
//!
//! - `ApiClient`: the remote analytics service (`/prices`, `/events`, `/metrics`, `/correlations`)
//! - `LocalSource`: CSV/JSON files on disk, with the service's analytics computed locally
//!
//! The view layer only ever sees the resulting `Datasets` snapshot.

use std::collections::HashSet;

use tracing::{info, warn};

use crate::domain::{CorrelationRecord, DataWarning, Datasets, Event, Metrics, PricePoint};
use crate::error::DataError;

pub mod analytics;
pub mod api;
pub mod local;
pub mod wire;

pub use api::{ApiClient, DEFAULT_BASE_URL};
pub use local::LocalSource;

/// A provider of the four datasets.
///
/// Implementations push per-record problems into `warnings` and only return
/// `Err` when a dataset as a whole cannot be retrieved or understood.
pub trait DataSource {
    /// Human-readable origin for status lines and logs.
    fn describe(&self) -> String;

    fn fetch_prices(&self, warnings: &mut Vec<DataWarning>) -> Result<Vec<PricePoint>, DataError>;

    fn fetch_events(&self, warnings: &mut Vec<DataWarning>) -> Result<Vec<Event>, DataError>;

    fn fetch_metrics(&self, warnings: &mut Vec<DataWarning>) -> Result<Option<Metrics>, DataError>;

    fn fetch_correlations(
        &self,
        warnings: &mut Vec<DataWarning>,
    ) -> Result<Vec<CorrelationRecord>, DataError>;

    /// Retrieve all four datasets into one snapshot.
    fn fetch_all(&self) -> Result<Datasets, DataError> {
        let mut warnings = Vec::new();
        let prices = self.fetch_prices(&mut warnings)?;
        let events = self.fetch_events(&mut warnings)?;
        let metrics = self.fetch_metrics(&mut warnings)?;
        let correlations = self.fetch_correlations(&mut warnings)?;
        Ok(finish_snapshot(
            &self.describe(),
            Datasets {
                prices,
                events,
                metrics,
                correlations,
                warnings,
            },
        ))
    }
}

/// Final checks shared by every source, plus logging of what was loaded.
pub fn finish_snapshot(origin: &str, mut data: Datasets) -> Datasets {
    warn_duplicate_titles("events", data.events.iter().map(|e| e.title.as_str()), &mut data.warnings);
    warn_duplicate_titles(
        "correlations",
        data.correlations.iter().map(|c| c.title.as_str()),
        &mut data.warnings,
    );

    for w in &data.warnings {
        warn!(dataset = w.dataset, position = w.position, "{}", w.message);
    }
    info!(
        origin,
        prices = data.prices.len(),
        events = data.events.len(),
        correlations = data.correlations.len(),
        metrics = data.metrics.is_some(),
        warnings = data.warnings.len(),
        "snapshot loaded"
    );
    data
}

/// Sort ascending by date and keep the first row of any repeated date.
///
/// Each point is paired with its source position (record index or file line),
/// which is what a duplicate-date warning reports.
pub fn normalize_prices(
    mut points: Vec<(usize, PricePoint)>,
    warnings: &mut Vec<DataWarning>,
) -> Vec<PricePoint> {
    // Stable sort keeps the first-seen row ahead of later duplicates.
    points.sort_by_key(|(_, p)| p.date);
    let mut out: Vec<PricePoint> = Vec::with_capacity(points.len());
    for (position, p) in points {
        if out.last().is_some_and(|prev| prev.date == p.date) {
            warnings.push(DataWarning::new(
                "prices",
                position,
                format!("duplicate date {}; keeping the first row", p.date),
            ));
            continue;
        }
        out.push(p);
    }
    out
}

/// Title is the join key between events and correlations; repeated titles
/// silently merge in the resolver, so flag them here.
fn warn_duplicate_titles<'a>(
    dataset: &'static str,
    titles: impl Iterator<Item = &'a str>,
    warnings: &mut Vec<DataWarning>,
) {
    let mut seen = HashSet::new();
    for (idx, title) in titles.enumerate() {
        if !seen.insert(title) {
            warnings.push(DataWarning::new(
                dataset,
                idx,
                format!("duplicate title '{title}'; lookups use the first occurrence"),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Category;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn normalize_sorts_and_dedups() {
        let mut warnings = Vec::new();
        let points = vec![
            (2, PricePoint { date: d(2020, 1, 3), price: dec!(3), volatility: None }),
            (3, PricePoint { date: d(2020, 1, 1), price: dec!(1), volatility: None }),
            (4, PricePoint { date: d(2020, 1, 2), price: dec!(2), volatility: None }),
            (5, PricePoint { date: d(2020, 1, 3), price: dec!(99), volatility: None }),
        ];
        let out = normalize_prices(points, &mut warnings);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].date, d(2020, 1, 1));
        assert_eq!(out[2].price, dec!(3));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].dataset, "prices");
        // Source position of the dropped row, not its sorted index.
        assert_eq!(warnings[0].position, 5);
    }

    #[test]
    fn snapshot_flags_duplicate_titles() {
        let ev = Event {
            title: "Gulf War".to_string(),
            date: d(1990, 8, 2),
            category: Category::Conflict,
            notes: String::new(),
        };
        let data = finish_snapshot(
            "test",
            Datasets {
                events: vec![ev.clone(), ev],
                ..Datasets::default()
            },
        );
        assert_eq!(data.warnings.len(), 1);
        assert!(data.warnings[0].message.contains("Gulf War"));
    }
}
