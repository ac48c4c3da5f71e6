//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the filtering/aggregation code stays clean and testable
//! - the CLI report and the TUI panels render values identically

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::{CorrelationRecord, DataWarning, Event};
use crate::view::{KpiSummary, ViewState};

/// `$82.50`, or `N/A` when unknown.
pub fn fmt_money(value: Option<Decimal>, dp: u32) -> String {
    match value {
        Some(v) => format!("${:.prec$}", round_half_up(v, dp), prec = dp as usize),
        None => "N/A".to_string(),
    }
}

/// Display rounding (half away from zero), as a spreadsheet would show it.
pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Fraction as a percentage: `0.342 -> 34.2%`.
pub fn fmt_fraction_pct(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.1}%", v * 100.0),
        _ => "N/A".to_string(),
    }
}

/// `Mar 8, 2020`
pub fn fmt_event_date(event: &Event) -> String {
    event.date.format("%b %-d, %Y").to_string()
}

/// Signed percentage change with an arrow: `▲ 2.17%` / `▼ 5.2%`.
pub fn fmt_price_reaction(pct: Decimal) -> String {
    let arrow = if pct.is_sign_negative() && !pct.is_zero() { '▼' } else { '▲' };
    format!("{arrow} {}%", pct.abs().normalize())
}

/// `+41.02%` / `-3.1%`
pub fn fmt_signed_pct(pct: Decimal) -> String {
    let sign = if pct.is_sign_negative() && !pct.is_zero() { "" } else { "+" };
    format!("{sign}{}%", pct.normalize())
}

/// KPI lines shared by the report and the TUI header.
pub fn kpi_lines(kpi: &KpiSummary) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!(
        "Current price: {}  (range {} - {})",
        fmt_money(kpi.latest_price, 2),
        fmt_money(kpi.min_price, 0),
        fmt_money(kpi.max_price, 0),
    ));

    match &kpi.change_point {
        Some(cp) => {
            let mut line = format!(
                "Change point: {}  confidence {:.1}%",
                cp.cp_median_date,
                cp.confidence * 100.0
            );
            if let Some((lo, hi)) = cp.cp_credible_interval {
                line.push_str(&format!("  interval {lo} .. {hi}"));
            }
            lines.push(line);
        }
        None => lines.push("Change point: N/A".to_string()),
    }

    lines.push(format!(
        "Annualized volatility: {}  (30-day rolling)",
        fmt_fraction_pct(kpi.current_volatility)
    ));

    let shift = kpi
        .change_point
        .as_ref()
        .map(|cp| cp.pct_change)
        .unwrap_or_default();
    lines.push(format!("Mean returns shift: {:.2}%", round_half_up(shift, 2)));
    lines
}

/// Impact-analysis lines for the selected event.
pub fn detail_lines(event: &Event, stats: Option<&CorrelationRecord>) -> Vec<String> {
    let mut lines = vec![
        format!("{} [{}]", event.title, event.category),
        format!("Date: {}", fmt_event_date(event)),
    ];
    if !event.notes.is_empty() {
        lines.push(event.notes.clone());
    }
    match stats {
        Some(s) => {
            lines.push(format!("Price reaction: {}", fmt_price_reaction(s.price_change_pct)));
            lines.push(format!("Volatility shift: {}", fmt_signed_pct(s.vol_change_pct)));
            lines.push(format!("Avg price after: {}", fmt_money(Some(s.avg_price_after), 2)));
        }
        None => lines.push("No impact statistics for this event.".to_string()),
    }
    lines
}

/// One row of the event log.
pub fn event_line(event: &Event, selected: bool) -> String {
    let marker = if selected { '*' } else { ' ' };
    format!(
        "{marker} {:<13} {:<10} {}",
        fmt_event_date(event),
        event.category.as_str(),
        event.title
    )
}

/// Full report printed by `brent-dash report`.
pub fn format_report(
    kpi: &KpiSummary,
    view: &ViewState,
    warnings: Option<&[DataWarning]>,
) -> String {
    let mut out = String::new();

    out.push_str("=== Brent Oil Analysis Dashboard ===\n");
    for line in kpi_lines(kpi) {
        out.push_str(&line);
        out.push('\n');
    }

    out.push_str(&format!(
        "\nWindow: {} .. {} | Category: {}\n",
        view.range.start,
        view.range.end,
        view.category.display_name()
    ));
    if view.range.is_inverted() {
        out.push_str("(window start is after its end; nothing to show)\n");
    }
    out.push_str(&format!("Prices in window: {}", view.visible_prices.len()));
    if let (Some(first), Some(last)) = (view.visible_prices.first(), view.visible_prices.last()) {
        let low = view.visible_prices.iter().map(|p| p.price).min();
        let high = view.visible_prices.iter().map(|p| p.price).max();
        out.push_str(&format!(
            " ({} {} -> {} {}, low {}, high {})",
            first.date,
            fmt_money(Some(first.price), 2),
            last.date,
            fmt_money(Some(last.price), 2),
            fmt_money(low, 2),
            fmt_money(high, 2),
        ));
    }
    out.push('\n');
    if view.change_point_visible {
        if let Some(cp) = &kpi.change_point {
            out.push_str(&format!("Structural break inside window: {}\n", cp.cp_median_date));
        }
    }

    out.push_str(&format!("\nCorrelation log ({} items):\n", view.visible_events.len()));
    if view.visible_events.is_empty() {
        out.push_str("  No events in this timeframe/filter.\n");
    }
    let selected_title = view.selected_event.as_ref().map(|e| e.title.as_str());
    for event in &view.visible_events {
        out.push_str(&event_line(event, selected_title == Some(event.title.as_str())));
        out.push('\n');
    }

    out.push_str("\nImpact analysis:\n");
    match &view.selected_event {
        Some(event) => {
            for line in detail_lines(event, view.selected_event_stats.as_ref()) {
                out.push_str("  ");
                out.push_str(&line);
                out.push('\n');
            }
        }
        None => out.push_str("  Select an event (--select TITLE) to see impact analysis.\n"),
    }

    if let Some(warnings) = warnings {
        out.push_str(&format!("\nData warnings ({}):\n", warnings.len()));
        for w in warnings {
            out.push_str(&format!("  {w}\n"));
        }
    }

    out
}

/// Price as `f64` for charting; non-representable values become NaN.
pub fn price_f64(price: Decimal) -> f64 {
    price.to_f64().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, CategoryFilter, ChangePointSummary, DateRange};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn event() -> Event {
        Event {
            title: "Russia invades Ukraine".to_string(),
            date: d(2022, 2, 24),
            category: Category::Conflict,
            notes: "Supply shock fears".to_string(),
        }
    }

    #[test]
    fn formats_signed_values() {
        assert_eq!(fmt_price_reaction(dec!(-5.20)), "▼ 5.2%");
        assert_eq!(fmt_price_reaction(dec!(2.17)), "▲ 2.17%");
        assert_eq!(fmt_signed_pct(dec!(41.02)), "+41.02%");
        assert_eq!(fmt_signed_pct(dec!(-3.1)), "-3.1%");
        assert_eq!(fmt_money(Some(dec!(82.456)), 2), "$82.46");
        assert_eq!(fmt_money(None, 2), "N/A");
        assert_eq!(fmt_fraction_pct(Some(0.342)), "34.2%");
        assert_eq!(fmt_event_date(&event()), "Feb 24, 2022");
    }

    #[test]
    fn report_lists_events_and_selection() {
        let kpi = KpiSummary {
            latest_price: Some(dec!(93.5)),
            min_price: Some(dec!(9.1)),
            max_price: Some(dec!(143.95)),
            current_volatility: Some(0.52),
            change_point: Some(ChangePointSummary {
                cp_median_date: d(2022, 2, 28),
                cp_credible_interval: None,
                confidence: 0.912,
                mean_before: None,
                mean_after: None,
                pct_change: dec!(-12.345),
            }),
            ..KpiSummary::default()
        };
        let view = ViewState {
            range: DateRange::new(d(2022, 1, 1), d(2022, 12, 31)),
            category: CategoryFilter::All,
            visible_prices: Vec::new(),
            visible_events: vec![event()],
            selected_event: Some(event()),
            selected_event_stats: Some(CorrelationRecord {
                title: "Russia invades Ukraine".to_string(),
                date: None,
                category: None,
                price_change_pct: dec!(14.62),
                vol_change_pct: dec!(88.1),
                avg_price_before: None,
                avg_price_after: dec!(109.07),
            }),
            change_point_visible: true,
            highlight: None,
        };

        let text = format_report(&kpi, &view, None);
        assert!(text.contains("Current price: $93.50"));
        assert!(text.contains("confidence 91.2%"));
        assert!(text.contains("Mean returns shift: -12.35%"));
        assert!(text.contains("Correlation log (1 items)"));
        assert!(text.contains("* Feb 24, 2022"));
        assert!(text.contains("Price reaction: ▲ 14.62%"));
        assert!(text.contains("Avg price after: $109.07"));
        assert!(text.contains("Structural break inside window: 2022-02-28"));
        assert!(!text.contains("Data warnings"));
    }

    #[test]
    fn empty_report_is_well_formed() {
        let view = ViewState::empty(DateRange::default(), CategoryFilter::All);
        let text = format_report(&KpiSummary::default(), &view, Some(&[]));
        assert!(text.contains("Current price: N/A"));
        assert!(text.contains("Change point: N/A"));
        assert!(text.contains("No events in this timeframe/filter."));
        assert!(text.contains("Data warnings (0)"));
    }
}
