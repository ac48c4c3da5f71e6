//! JSON wire format of the analytics service.
//!
//! Each decoder takes the already-parsed response body. The shape of the body
//! is strict (a wrong shape or a missing required field is `DataError::Malformed`);
//! individual records with bad values are dropped with a `DataWarning`.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::{
    Category, ChangePointSummary, CorrelationRecord, DataWarning, Event, Metrics, PricePoint,
    parse_iso_date,
};
use crate::data::normalize_prices;
use crate::error::DataError;

#[derive(Debug, Deserialize)]
struct RawPrice {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Price")]
    price: Decimal,
    #[serde(rename = "Volatility", default)]
    volatility: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    title: String,
    date: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCorrelation {
    title: String,
    #[serde(default)]
    date: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    price_change_pct: Decimal,
    vol_change_pct: Decimal,
    #[serde(default)]
    avg_price_before: Option<Decimal>,
    avg_price_after: Decimal,
}

#[derive(Debug, Default, Deserialize)]
struct RawMetrics {
    #[serde(default)]
    latest_price: Option<Decimal>,
    #[serde(default)]
    avg_price: Option<Decimal>,
    #[serde(default)]
    min_price: Option<Decimal>,
    #[serde(default)]
    max_price: Option<Decimal>,
    #[serde(default)]
    current_volatility: Option<f64>,
    #[serde(default)]
    cp_summary: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawChangePoint {
    #[serde(default)]
    cp_median_date: Option<String>,
    #[serde(default, alias = "cp_hdi")]
    cp_credible_interval: Option<Vec<String>>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default, alias = "mu1_mean")]
    mean_before: Option<Decimal>,
    #[serde(default, alias = "mu2_mean")]
    mean_after: Option<Decimal>,
    #[serde(default)]
    pct_change: Option<Decimal>,
}

fn decode_rows<T: serde::de::DeserializeOwned>(
    dataset: &'static str,
    body: Value,
) -> Result<Vec<T>, DataError> {
    let Value::Array(items) = body else {
        return Err(DataError::malformed(dataset, "expected a JSON array"));
    };
    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            serde_json::from_value(item)
                .map_err(|e| DataError::malformed(dataset, format!("record {idx}: {e}")))
        })
        .collect()
}

/// `GET /prices`, sorted by date with repeated dates dropped.
pub fn decode_prices(
    body: Value,
    warnings: &mut Vec<DataWarning>,
) -> Result<Vec<PricePoint>, DataError> {
    let rows: Vec<RawPrice> = decode_rows("prices", body)?;
    let mut out = Vec::with_capacity(rows.len());
    for (idx, row) in rows.into_iter().enumerate() {
        let Some(date) = parse_iso_date(&row.date) else {
            warnings.push(DataWarning::new("prices", idx, format!("malformed date '{}'", row.date)));
            continue;
        };
        out.push((
            idx,
            PricePoint {
                date,
                price: row.price,
                volatility: row.volatility.filter(|v| v.is_finite()),
            },
        ));
    }
    Ok(normalize_prices(out, warnings))
}

/// `GET /events`.
pub fn decode_events(body: Value, warnings: &mut Vec<DataWarning>) -> Result<Vec<Event>, DataError> {
    let rows: Vec<RawEvent> = decode_rows("events", body)?;
    let mut out = Vec::with_capacity(rows.len());
    for (idx, row) in rows.into_iter().enumerate() {
        let Some(date) = parse_iso_date(&row.date) else {
            warnings.push(DataWarning::new(
                "events",
                idx,
                format!("'{}': malformed date '{}'", row.title, row.date),
            ));
            continue;
        };
        let Some(category) = Category::parse(&row.kind) else {
            warnings.push(DataWarning::new(
                "events",
                idx,
                format!("'{}': unknown category '{}'", row.title, row.kind),
            ));
            continue;
        };
        out.push(Event {
            title: row.title,
            date,
            category,
            notes: row.notes.unwrap_or_default(),
        });
    }
    Ok(out)
}

/// `GET /correlations`.
pub fn decode_correlations(
    body: Value,
    warnings: &mut Vec<DataWarning>,
) -> Result<Vec<CorrelationRecord>, DataError> {
    let rows: Vec<RawCorrelation> = decode_rows("correlations", body)?;
    let mut out = Vec::with_capacity(rows.len());
    for (idx, row) in rows.into_iter().enumerate() {
        let date = match row.date.as_deref() {
            None => None,
            Some(raw) => match parse_iso_date(raw) {
                Some(date) => Some(date),
                None => {
                    warnings.push(DataWarning::new(
                        "correlations",
                        idx,
                        format!("'{}': malformed date '{raw}'", row.title),
                    ));
                    continue;
                }
            },
        };
        // An unrecognized category does not affect the join; keep the record.
        let category = row.kind.as_deref().and_then(Category::parse);
        out.push(CorrelationRecord {
            title: row.title,
            date,
            category,
            price_change_pct: row.price_change_pct,
            vol_change_pct: row.vol_change_pct,
            avg_price_before: row.avg_price_before,
            avg_price_after: row.avg_price_after,
        });
    }
    Ok(out)
}

/// `GET /metrics`. An empty object means "no data" and decodes to `None`.
pub fn decode_metrics(
    body: Value,
    warnings: &mut Vec<DataWarning>,
) -> Result<Option<Metrics>, DataError> {
    let Value::Object(map) = &body else {
        return Err(DataError::malformed("metrics", "expected a JSON object"));
    };
    if map.is_empty() {
        return Ok(None);
    }
    let raw: RawMetrics =
        serde_json::from_value(body).map_err(|e| DataError::malformed("metrics", e))?;
    let cp_summary = match raw.cp_summary {
        Some(value) => decode_change_point(value, warnings)?,
        None => None,
    };
    Ok(Some(Metrics {
        latest_price: raw.latest_price,
        avg_price: raw.avg_price,
        min_price: raw.min_price,
        max_price: raw.max_price,
        current_volatility: raw.current_volatility.filter(|v| v.is_finite()),
        cp_summary,
    }))
}

/// Change-point summary as written by the estimation service.
///
/// `{}` and `{"error": ...}` both mean "no estimate" and decode to `None`.
pub fn decode_change_point(
    body: Value,
    warnings: &mut Vec<DataWarning>,
) -> Result<Option<ChangePointSummary>, DataError> {
    let Value::Object(map) = &body else {
        if body.is_null() {
            return Ok(None);
        }
        return Err(DataError::malformed("change_point", "expected a JSON object"));
    };
    if map.is_empty() {
        return Ok(None);
    }
    if let Some(err) = map.get("error") {
        warnings.push(DataWarning::new(
            "change_point",
            0,
            format!("estimate unavailable: {}", err.as_str().unwrap_or("unknown error")),
        ));
        return Ok(None);
    }

    let raw: RawChangePoint =
        serde_json::from_value(body).map_err(|e| DataError::malformed("change_point", e))?;

    let Some(median_raw) = raw.cp_median_date else {
        warnings.push(DataWarning::new("change_point", 0, "missing cp_median_date"));
        return Ok(None);
    };
    let Some(cp_median_date) = parse_iso_date(&median_raw) else {
        warnings.push(DataWarning::new(
            "change_point",
            0,
            format!("malformed cp_median_date '{median_raw}'"),
        ));
        return Ok(None);
    };

    let cp_credible_interval = match raw.cp_credible_interval.as_deref() {
        None => None,
        Some([lo, hi]) => match (parse_iso_date(lo), parse_iso_date(hi)) {
            (Some(lo), Some(hi)) if lo <= hi => Some((lo, hi)),
            _ => {
                warnings.push(DataWarning::new(
                    "change_point",
                    0,
                    format!("ignoring credible interval [{lo}, {hi}]"),
                ));
                None
            }
        },
        Some(other) => {
            warnings.push(DataWarning::new(
                "change_point",
                0,
                format!("credible interval needs 2 bounds, got {}", other.len()),
            ));
            None
        }
    };

    let confidence = raw
        .confidence
        .filter(|c| c.is_finite())
        .map(|c| c.clamp(0.0, 1.0))
        .unwrap_or(0.0);

    Ok(Some(ChangePointSummary {
        cp_median_date,
        cp_credible_interval,
        confidence,
        mean_before: raw.mean_before,
        mean_after: raw.mean_after,
        pct_change: raw.pct_change.unwrap_or_default(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn prices_drop_malformed_dates_with_warning() {
        let body = json!([
            {"Date": "2020-01-01", "Price": 50.0, "Returns": 0.0, "Volatility": 0.0},
            {"Date": "01/06/2020", "Price": 40.0, "Returns": 0.0, "Volatility": 0.0},
            {"Date": "2021-01-01", "Price": 60.25, "Returns": 0.01, "Volatility": 0.41}
        ]);
        let mut warnings = Vec::new();
        let prices = decode_prices(body, &mut warnings).unwrap();
        assert_eq!(prices.len(), 2);
        assert_eq!(prices[1].date, d(2021, 1, 1));
        assert_eq!(prices[1].price, dec!(60.25));
        assert_eq!(prices[1].volatility, Some(0.41));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].position, 1);
    }

    #[test]
    fn duplicate_price_dates_report_record_index() {
        let body = json!([
            {"Date": "2020-01-03", "Price": 3.0},
            {"Date": "2020-01-01", "Price": 1.0},
            {"Date": "2020-01-02", "Price": 2.0},
            {"Date": "2020-01-03", "Price": 99.0}
        ]);
        let mut warnings = Vec::new();
        let prices = decode_prices(body, &mut warnings).unwrap();
        let dates: Vec<NaiveDate> = prices.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![d(2020, 1, 1), d(2020, 1, 2), d(2020, 1, 3)]);
        assert_eq!(prices[2].price, dec!(3));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].position, 3);
    }

    #[test]
    fn wrong_shape_is_malformed_not_empty() {
        let mut warnings = Vec::new();
        assert!(decode_prices(json!([]), &mut warnings).unwrap().is_empty());

        let err = decode_prices(json!({"rows": []}), &mut warnings).unwrap_err();
        assert!(err.is_malformed());

        let err = decode_prices(json!([{"Date": "2020-01-01"}]), &mut warnings).unwrap_err();
        assert!(err.is_malformed());

        let err = decode_events(json!([{"title": "A", "date": "2020-03-01"}]), &mut warnings)
            .unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn events_skip_unknown_categories() {
        let body = json!([
            {"title": "A", "date": "2020-03-01", "type": "conflict", "notes": "n"},
            {"title": "B", "date": "2020-04-01", "type": "weather"},
            {"title": "C", "date": "2020-04-02", "type": "Macro"}
        ]);
        let mut warnings = Vec::new();
        let events = decode_events(body, &mut warnings).unwrap();
        let titles: Vec<&str> = events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "C"]);
        assert_eq!(events[1].notes, "");
        assert_eq!(events[1].category, Category::Macro);
        assert!(warnings[0].message.contains("weather"));
    }

    #[test]
    fn correlations_decode_service_records() {
        let body = json!([{
            "title": "A", "date": "2020-03-01", "type": "conflict",
            "price_change_pct": -5.2, "vol_change_pct": 12.4,
            "avg_price_before": 55.1, "avg_price_after": 52.23
        }]);
        let mut warnings = Vec::new();
        let records = decode_correlations(body, &mut warnings).unwrap();
        assert_eq!(records[0].price_change_pct, dec!(-5.2));
        assert_eq!(records[0].category, Some(Category::Conflict));
        assert_eq!(records[0].date, Some(d(2020, 3, 1)));
        assert!(warnings.is_empty());
    }

    #[test]
    fn empty_metrics_object_is_absent() {
        let mut warnings = Vec::new();
        assert_eq!(decode_metrics(json!({}), &mut warnings).unwrap(), None);
        assert!(decode_metrics(json!([]), &mut warnings).unwrap_err().is_malformed());
    }

    #[test]
    fn metrics_with_change_point() {
        let body = json!({
            "latest_price": 82.5, "avg_price": 48.4, "max_price": 143.95, "min_price": 9.1,
            "current_volatility": 0.34,
            "cp_summary": {
                "cp_median_date": "2008-07-14",
                "cp_credible_interval": ["2008-06-30", "2008-08-01"],
                "confidence": 1.2,
                "mu1_mean": 0.0009, "mu2_mean": -0.0004,
                "pct_change": -144.4
            }
        });
        let mut warnings = Vec::new();
        let metrics = decode_metrics(body, &mut warnings).unwrap().unwrap();
        assert_eq!(metrics.max_price, Some(dec!(143.95)));
        let cp = metrics.cp_summary.unwrap();
        assert_eq!(cp.cp_median_date, d(2008, 7, 14));
        assert_eq!(cp.cp_credible_interval, Some((d(2008, 6, 30), d(2008, 8, 1))));
        assert_eq!(cp.confidence, 1.0);
        assert_eq!(cp.mean_before, Some(dec!(0.0009)));
        assert_eq!(cp.pct_change, dec!(-144.4));
    }

    #[test]
    fn change_point_error_payload_is_absent_with_warning() {
        let mut warnings = Vec::new();
        let cp = decode_change_point(json!({"error": "file not found"}), &mut warnings).unwrap();
        assert!(cp.is_none());
        assert!(warnings[0].message.contains("file not found"));

        let cp = decode_change_point(json!({"cp_median_date": "14/07/2008"}), &mut warnings).unwrap();
        assert!(cp.is_none());
        assert_eq!(warnings.len(), 2);
    }
}
