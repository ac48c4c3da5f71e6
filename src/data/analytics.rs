//! Price analytics computed when reading local files.
//!
//! These reproduce what the analytics service publishes:
//! - simple returns and 30-day rolling annualized volatility per trading day
//! - before/after impact statistics around each event
//! - dataset-level summary metrics

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use crate::domain::{
    ChangePointSummary, CorrelationRecord, Event, Metrics, PricePoint, shift_days,
};

/// Rolling window (trading days) for volatility.
pub const VOL_WINDOW: usize = 30;
/// Annualization factor for daily volatility.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
/// Calendar days either side of an event used for impact statistics.
pub const IMPACT_WINDOW_DAYS: i64 = 30;

/// Attach rolling volatility to a date-ascending series of `(date, price)`.
///
/// Volatility at row `i` is the sample std dev of the last `VOL_WINDOW`
/// returns ending at `i`, times `sqrt(252)`. The first row has no return,
/// so the first value appears at row `VOL_WINDOW`.
pub fn with_rolling_volatility(series: &[(NaiveDate, Decimal)]) -> Vec<PricePoint> {
    let returns = simple_returns(series);
    series
        .iter()
        .enumerate()
        .map(|(i, &(date, price))| PricePoint {
            date,
            price,
            volatility: rolling_volatility(&returns, i),
        })
        .collect()
}

fn simple_returns(series: &[(NaiveDate, Decimal)]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(series.len());
    out.push(None);
    for pair in series.windows(2) {
        let prev = pair[0].1.to_f64();
        let curr = pair[1].1.to_f64();
        let r = match (prev, curr) {
            (Some(prev), Some(curr)) if prev != 0.0 => Some(curr / prev - 1.0),
            _ => None,
        };
        out.push(r);
    }
    out.truncate(series.len());
    out
}

fn rolling_volatility(returns: &[Option<f64>], end: usize) -> Option<f64> {
    if end < VOL_WINDOW {
        return None;
    }
    let window: Option<Vec<f64>> = returns[end + 1 - VOL_WINDOW..=end].iter().copied().collect();
    let window = window?;
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let variance = window.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt() * TRADING_DAYS_PER_YEAR.sqrt())
}

/// Impact statistics for every event with prices on both sides.
///
/// Before window: `[date - 30d, date)`. After window: `[date, date + 30d]`.
/// Events lacking prices in either window produce no record.
pub fn event_correlations(prices: &[PricePoint], events: &[Event]) -> Vec<CorrelationRecord> {
    events
        .iter()
        .filter_map(|event| event_impact(prices, event))
        .collect()
}

fn event_impact(prices: &[PricePoint], event: &Event) -> Option<CorrelationRecord> {
    let window_start = shift_days(event.date, -IMPACT_WINDOW_DAYS);
    let window_end = shift_days(event.date, IMPACT_WINDOW_DAYS);
    let before: Vec<&PricePoint> = prices
        .iter()
        .filter(|p| p.date >= window_start && p.date < event.date)
        .collect();
    let after: Vec<&PricePoint> = prices
        .iter()
        .filter(|p| p.date >= event.date && p.date <= window_end)
        .collect();
    if before.is_empty() || after.is_empty() {
        return None;
    }

    let avg_before = mean_price(&before);
    let avg_after = mean_price(&after);
    if avg_before.is_zero() {
        return None;
    }
    let price_change_pct = (avg_after - avg_before) / avg_before * Decimal::ONE_HUNDRED;

    let vol_change_pct = match (mean_volatility(&before), mean_volatility(&after)) {
        (Some(vb), Some(va)) if vb != 0.0 => (va - vb) / vb * 100.0,
        _ => 0.0,
    };

    Some(CorrelationRecord {
        title: event.title.clone(),
        date: Some(event.date),
        category: Some(event.category),
        price_change_pct: price_change_pct.round_dp(2),
        vol_change_pct: Decimal::from_f64(vol_change_pct).unwrap_or_default().round_dp(2),
        avg_price_before: Some(avg_before.round_dp(2)),
        avg_price_after: avg_after.round_dp(2),
    })
}

fn mean_price(points: &[&PricePoint]) -> Decimal {
    let total: Decimal = points.iter().map(|p| p.price).sum();
    total / Decimal::from(points.len())
}

/// Mean over the rows that have a volatility value.
fn mean_volatility(points: &[&PricePoint]) -> Option<f64> {
    let values: Vec<f64> = points.iter().filter_map(|p| p.volatility).collect();
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Dataset-level metrics; `None` for an empty series.
pub fn summary_metrics(
    prices: &[PricePoint],
    cp_summary: Option<ChangePointSummary>,
) -> Option<Metrics> {
    let last = prices.last()?;
    let total: Decimal = prices.iter().map(|p| p.price).sum();
    Some(Metrics {
        latest_price: Some(last.price),
        avg_price: Some(total / Decimal::from(prices.len())),
        min_price: prices.iter().map(|p| p.price).min(),
        max_price: prices.iter().map(|p| p.price).max(),
        current_volatility: Some(last.volatility.unwrap_or(0.0)),
        cp_summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Category;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn daily(start: NaiveDate, prices: &[Decimal]) -> Vec<(NaiveDate, Decimal)> {
        prices
            .iter()
            .enumerate()
            .map(|(i, p)| (start + Duration::days(i as i64), *p))
            .collect()
    }

    #[test]
    fn volatility_warms_up_after_window() {
        let prices: Vec<Decimal> = (0..40).map(|i| Decimal::from(100 + (i % 2))).collect();
        let points = with_rolling_volatility(&daily(d(2020, 1, 1), &prices));
        assert_eq!(points.len(), 40);
        assert!(points[..VOL_WINDOW].iter().all(|p| p.volatility.is_none()));
        assert!(points[VOL_WINDOW..].iter().all(|p| p.volatility.is_some_and(|v| v > 0.0)));
    }

    #[test]
    fn constant_series_has_zero_volatility() {
        let prices = vec![dec!(70); 35];
        let points = with_rolling_volatility(&daily(d(2020, 1, 1), &prices));
        let vol = points.last().unwrap().volatility.unwrap();
        assert!(vol.abs() < 1e-12);
    }

    #[test]
    fn impact_uses_half_open_before_window() {
        let event = Event {
            title: "Cut".to_string(),
            date: d(2020, 3, 10),
            category: Category::Policy,
            notes: String::new(),
        };
        let prices = vec![
            PricePoint { date: d(2020, 2, 1), price: dec!(1000), volatility: None }, // too early
            PricePoint { date: d(2020, 3, 1), price: dec!(50), volatility: Some(0.2) },
            PricePoint { date: d(2020, 3, 10), price: dec!(40), volatility: Some(0.4) },
            PricePoint { date: d(2020, 4, 9), price: dec!(44), volatility: Some(0.4) },
            PricePoint { date: d(2020, 4, 10), price: dec!(1000), volatility: None }, // too late
        ];
        let records = event_correlations(&prices, &[event]);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.avg_price_before, Some(dec!(50)));
        assert_eq!(r.avg_price_after, dec!(42));
        assert_eq!(r.price_change_pct, dec!(-16));
        assert_eq!(r.vol_change_pct, dec!(100));
    }

    #[test]
    fn events_without_both_windows_are_skipped() {
        let event = Event {
            title: "Early".to_string(),
            date: d(2020, 1, 1),
            category: Category::Macro,
            notes: String::new(),
        };
        let prices = vec![PricePoint { date: d(2020, 1, 2), price: dec!(60), volatility: None }];
        assert!(event_correlations(&prices, &[event]).is_empty());
    }

    #[test]
    fn events_at_calendar_edges_do_not_overflow() {
        let edge = |title: &str, date| Event {
            title: title.to_string(),
            date,
            category: Category::Macro,
            notes: String::new(),
        };
        let prices = vec![
            PricePoint { date: NaiveDate::MIN, price: dec!(10), volatility: None },
            PricePoint { date: NaiveDate::MAX - Duration::days(1), price: dec!(20), volatility: None },
            PricePoint { date: NaiveDate::MAX, price: dec!(30), volatility: None },
        ];
        let events = [edge("first", NaiveDate::MIN), edge("last", NaiveDate::MAX)];
        let records = event_correlations(&prices, &events);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "last");
        assert_eq!(records[0].price_change_pct, dec!(50));
    }

    #[test]
    fn summary_metrics_over_full_series() {
        let prices = vec![
            PricePoint { date: d(2020, 1, 1), price: dec!(50), volatility: None },
            PricePoint { date: d(2020, 1, 2), price: dec!(40), volatility: None },
            PricePoint { date: d(2020, 1, 3), price: dec!(60), volatility: None },
        ];
        let m = summary_metrics(&prices, None).unwrap();
        assert_eq!(m.latest_price, Some(dec!(60)));
        assert_eq!(m.min_price, Some(dec!(40)));
        assert_eq!(m.avg_price, Some(dec!(50)));
        assert_eq!(m.current_volatility, Some(0.0));
        assert!(summary_metrics(&[], None).is_none());
    }
}
