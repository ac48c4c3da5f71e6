//! File-backed data source.
//!
//! Reads the raw inputs the analytics service is built from and computes the
//! same four datasets locally:
//!
//! - `brent_daily.csv`            (`Date,Price`, day-first dates)
//! - `events.csv`                 (`title,date,type,notes`)
//! - `change_point_summary.json`  (output of the change-point model, optional)
//!
//! Missing columns are fatal (`DataError::Malformed`); bad rows are skipped and
//! reported as warnings with their 1-based file line.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;
use csv::StringRecord;
use rust_decimal::Decimal;
use tracing::debug;

use crate::data::analytics::{event_correlations, summary_metrics, with_rolling_volatility};
use crate::data::wire::decode_change_point;
use crate::data::{DataSource, finish_snapshot, normalize_prices};
use crate::domain::{
    Category, ChangePointSummary, CorrelationRecord, DataWarning, Datasets, Event, Metrics,
    PricePoint, parse_calendar_date,
};
use crate::error::DataError;

pub const PRICES_FILE: &str = "brent_daily.csv";
pub const EVENTS_FILE: &str = "events.csv";
pub const CHANGE_POINT_FILE: &str = "change_point_summary.json";

pub struct LocalSource {
    dir: PathBuf,
}

impl LocalSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn load_prices(&self, warnings: &mut Vec<DataWarning>) -> Result<Vec<PricePoint>, DataError> {
        let path = self.path(PRICES_FILE);
        let (headers, records) = read_csv(&path, "prices")?;
        require_columns(&headers, "prices", &["date", "price"])?;

        let mut points: Vec<(usize, PricePoint)> = Vec::with_capacity(records.len());
        for (line, record) in records {
            let raw_date = get_field(&record, &headers, "date");
            let Some(date) = parse_calendar_date(raw_date) else {
                warnings.push(DataWarning::new("prices", line, format!("malformed date '{raw_date}'")));
                continue;
            };
            let raw_price = get_field(&record, &headers, "price");
            let Ok(price) = Decimal::from_str(raw_price) else {
                warnings.push(DataWarning::new("prices", line, format!("non-numeric price '{raw_price}'")));
                continue;
            };
            points.push((line, PricePoint { date, price, volatility: None }));
        }

        // Sort/dedup before computing returns so volatility sees calendar order.
        let sorted: Vec<(NaiveDate, Decimal)> = normalize_prices(points, warnings)
            .into_iter()
            .map(|p| (p.date, p.price))
            .collect();
        Ok(with_rolling_volatility(&sorted))
    }

    fn load_events(&self, warnings: &mut Vec<DataWarning>) -> Result<Vec<Event>, DataError> {
        let path = self.path(EVENTS_FILE);
        let (headers, records) = read_csv(&path, "events")?;
        require_columns(&headers, "events", &["title", "date", "type"])?;

        let mut out = Vec::with_capacity(records.len());
        for (line, record) in records {
            let title = get_field(&record, &headers, "title").to_string();
            if title.is_empty() {
                warnings.push(DataWarning::new("events", line, "missing title"));
                continue;
            }
            let raw_date = get_field(&record, &headers, "date");
            let Some(date) = parse_calendar_date(raw_date) else {
                warnings.push(DataWarning::new(
                    "events",
                    line,
                    format!("'{title}': malformed date '{raw_date}'"),
                ));
                continue;
            };
            let raw_type = get_field(&record, &headers, "type");
            let Some(category) = Category::parse(raw_type) else {
                warnings.push(DataWarning::new(
                    "events",
                    line,
                    format!("'{title}': unknown category '{raw_type}'"),
                ));
                continue;
            };
            out.push(Event {
                title,
                date,
                category,
                notes: get_field(&record, &headers, "notes").to_string(),
            });
        }
        Ok(out)
    }

    fn load_change_point(
        &self,
        warnings: &mut Vec<DataWarning>,
    ) -> Result<Option<ChangePointSummary>, DataError> {
        let path = self.path(CHANGE_POINT_FILE);
        if !path.exists() {
            debug!(path = %path.display(), "no change-point summary on disk");
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path).map_err(|e| io_error(&path, e))?;
        let body: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| DataError::malformed("change_point", e))?;
        decode_change_point(body, warnings)
    }
}

impl DataSource for LocalSource {
    fn describe(&self) -> String {
        format!("files in {}", self.dir.display())
    }

    fn fetch_prices(&self, warnings: &mut Vec<DataWarning>) -> Result<Vec<PricePoint>, DataError> {
        self.load_prices(warnings)
    }

    fn fetch_events(&self, warnings: &mut Vec<DataWarning>) -> Result<Vec<Event>, DataError> {
        self.load_events(warnings)
    }

    /// Price and event rows are re-read here; their warnings belong to
    /// `fetch_prices`/`fetch_events` and are not repeated.
    fn fetch_metrics(&self, warnings: &mut Vec<DataWarning>) -> Result<Option<Metrics>, DataError> {
        let prices = self.load_prices(&mut Vec::new())?;
        let cp = self.load_change_point(warnings)?;
        Ok(summary_metrics(&prices, cp))
    }

    fn fetch_correlations(
        &self,
        _warnings: &mut Vec<DataWarning>,
    ) -> Result<Vec<CorrelationRecord>, DataError> {
        let mut inputs = Vec::new();
        let prices = self.load_prices(&mut inputs)?;
        let events = self.load_events(&mut inputs)?;
        Ok(event_correlations(&prices, &events))
    }

    /// Reads each file once and derives metrics and correlations from it.
    fn fetch_all(&self) -> Result<Datasets, DataError> {
        let mut warnings = Vec::new();
        let prices = self.load_prices(&mut warnings)?;
        let events = self.load_events(&mut warnings)?;
        let cp = self.load_change_point(&mut warnings)?;
        let metrics = summary_metrics(&prices, cp);
        let correlations = event_correlations(&prices, &events);
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

type Headers = HashMap<String, usize>;

/// Read a whole CSV file; records are paired with their 1-based line number.
fn read_csv(
    path: &Path,
    dataset: &'static str,
) -> Result<(Headers, Vec<(usize, StringRecord)>), DataError> {
    let file = File::open(path).map_err(|e| io_error(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| DataError::malformed(dataset, format!("unreadable header: {e}")))?
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect();

    let mut records = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2: header is line 1 and lines are 1-based.
        let line = idx + 2;
        let record = result
            .map_err(|e| DataError::malformed(dataset, format!("line {line}: {e}")))?;
        records.push((line, record));
    }
    Ok((headers, records))
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a BOM.
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}

fn require_columns(headers: &Headers, dataset: &'static str, names: &[&str]) -> Result<(), DataError> {
    for name in names {
        if !headers.contains_key(*name) {
            return Err(DataError::malformed(dataset, format!("missing column `{name}`")));
        }
    }
    Ok(())
}

/// Trimmed field value; empty when the column or cell is absent.
fn get_field<'a>(record: &'a StringRecord, headers: &Headers, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|idx| record.get(*idx))
        .map(str::trim)
        .unwrap_or("")
}

fn io_error(path: &Path, err: std::io::Error) -> DataError {
    DataError::Io {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::fs;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn loads_full_snapshot_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            PRICES_FILE,
            "\u{feff}Date,Price\n03-Mar-20,51.9\n02-Mar-20,51.7\n04-Mar-20,bad\nnot-a-date,10\n\"Mar 10, 2020\",37.2\n",
        );
        write(
            dir.path(),
            EVENTS_FILE,
            "title,date,type,notes\nOPEC+ talks collapse,2020-03-06,policy,Saudi price war\nStorm,2020-03-07,weather,\n",
        );
        write(
            dir.path(),
            CHANGE_POINT_FILE,
            r#"{"cp_median_date": "2020-03-09", "confidence": 0.87, "pct_change": -212.5}"#,
        );

        let data = LocalSource::new(dir.path()).fetch_all().unwrap();

        let dates: Vec<NaiveDate> = data.prices.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![d(2020, 3, 2), d(2020, 3, 3), d(2020, 3, 10)]);
        assert_eq!(data.events.len(), 1);
        assert_eq!(data.events[0].category, Category::Policy);

        let metrics = data.metrics.unwrap();
        assert_eq!(metrics.latest_price, Some(dec!(37.2)));
        assert_eq!(metrics.cp_summary.unwrap().cp_median_date, d(2020, 3, 9));

        assert_eq!(data.correlations.len(), 1);
        assert_eq!(data.correlations[0].title, "OPEC+ talks collapse");
        assert_eq!(data.correlations[0].avg_price_after, dec!(37.2));

        // bad price, bad date, unknown category
        assert_eq!(data.warnings.len(), 3);
        let lines: Vec<usize> = data.warnings.iter().map(|w| w.position).collect();
        assert!(lines.contains(&4));
        assert!(lines.contains(&5));
    }

    #[test]
    fn per_dataset_fetches_report_each_warning_once() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            PRICES_FILE,
            "Date,Price\n2020-03-01,50\n2020-03-02,bad\n2020-03-10,40\n2020-03-01,77\n",
        );
        write(
            dir.path(),
            EVENTS_FILE,
            "title,date,type,notes\nCut,2020-03-05,Policy,\nStorm,2020-03-06,weather,\n",
        );
        let source = LocalSource::new(dir.path());

        let mut warnings = Vec::new();
        let prices = source.fetch_prices(&mut warnings).unwrap();
        let events = source.fetch_events(&mut warnings).unwrap();
        let metrics = source.fetch_metrics(&mut warnings).unwrap();
        let correlations = source.fetch_correlations(&mut warnings).unwrap();

        assert_eq!(prices.len(), 2);
        assert_eq!(prices[0].price, dec!(50));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].category, Category::Policy);
        assert_eq!(metrics.unwrap().latest_price, Some(dec!(40)));
        assert_eq!(correlations.len(), 1);

        // bad price (line 3), duplicate date (line 5), unknown category (line 3)
        let found: Vec<(&str, usize)> = warnings.iter().map(|w| (w.dataset, w.position)).collect();
        assert_eq!(found, vec![("prices", 3), ("prices", 5), ("events", 3)]);
    }

    #[test]
    fn missing_change_point_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), PRICES_FILE, "Date,Price\n2020-01-02,66.25\n");
        write(dir.path(), EVENTS_FILE, "title,date,type,notes\n");
        let data = LocalSource::new(dir.path()).fetch_all().unwrap();
        assert_eq!(data.prices.len(), 1);
        assert!(data.events.is_empty());
        assert!(data.metrics.unwrap().cp_summary.is_none());
    }

    #[test]
    fn missing_column_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), PRICES_FILE, "Day,Close\n2020-01-02,66.25\n");
        write(dir.path(), EVENTS_FILE, "title,date,type,notes\n");
        let err = LocalSource::new(dir.path()).fetch_all().unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = LocalSource::new(dir.path()).fetch_all().unwrap_err();
        assert!(matches!(err, DataError::Io { .. }));
    }
}
