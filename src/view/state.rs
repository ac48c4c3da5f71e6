//! View-state aggregation.
//!
//! `compute` is the single place where the snapshot, the date window, the
//! category filter and the selection are reconciled into what a renderer draws.
//! It is a pure function of its inputs: the same inputs always produce the same
//! `ViewState`, and no input is mutated.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{
    CategoryFilter, ChangePointSummary, CorrelationRecord, DateRange, Datasets, Event, PricePoint,
    shift_days,
};
use crate::view::category::filter_by_category;
use crate::view::resolver::resolve;
use crate::view::window::filter_by_window;

/// Half-width of the highlight band drawn around a selected event.
pub const HIGHLIGHT_HALF_WIDTH_DAYS: i64 = 15;

/// Selection lifecycle: `NoSelection -> EventSelected -> NoSelection`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    NoSelection,
    EventSelected(Event),
}

impl Selection {
    pub fn event(&self) -> Option<&Event> {
        match self {
            Selection::NoSelection => None,
            Selection::EventSelected(event) => Some(event),
        }
    }
}

/// Render-ready view of the current snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState {
    pub range: DateRange,
    pub category: CategoryFilter,
    pub visible_prices: Vec<PricePoint>,
    pub visible_events: Vec<Event>,
    pub selected_event: Option<Event>,
    pub selected_event_stats: Option<CorrelationRecord>,
    /// Change-point median date falls inside the window.
    pub change_point_visible: bool,
    /// ±15 day band around the selected event.
    pub highlight: Option<DateRange>,
}

impl ViewState {
    /// Well-formed state for "no data yet".
    pub fn empty(range: DateRange, category: CategoryFilter) -> Self {
        Self {
            range,
            category,
            visible_prices: Vec::new(),
            visible_events: Vec::new(),
            selected_event: None,
            selected_event_stats: None,
            change_point_visible: false,
            highlight: None,
        }
    }
}

/// Dataset-wide KPI values.
///
/// Computed once per snapshot from the *unfiltered* series; never depends on
/// the date window or category filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KpiSummary {
    pub latest_date: Option<NaiveDate>,
    pub latest_price: Option<Decimal>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub avg_price: Option<Decimal>,
    pub current_volatility: Option<f64>,
    pub change_point: Option<ChangePointSummary>,
    pub price_count: usize,
    pub event_count: usize,
}

impl KpiSummary {
    pub fn from_datasets(data: &Datasets) -> Self {
        let metrics = data.metrics.as_ref();
        let prices = &data.prices;

        let latest = prices.last();
        let min_price = prices.iter().map(|p| p.price).min();
        let max_price = prices.iter().map(|p| p.price).max();
        let avg_price = if prices.is_empty() {
            None
        } else {
            let total: Decimal = prices.iter().map(|p| p.price).sum();
            Some(total / Decimal::from(prices.len()))
        };

        let current_volatility = metrics
            .and_then(|m| m.current_volatility)
            .or_else(|| latest.and_then(|p| p.volatility));

        Self {
            latest_date: latest.map(|p| p.date),
            latest_price: latest.map(|p| p.price).or_else(|| metrics.and_then(|m| m.latest_price)),
            min_price: min_price.or_else(|| metrics.and_then(|m| m.min_price)),
            max_price: max_price.or_else(|| metrics.and_then(|m| m.max_price)),
            avg_price: avg_price.or_else(|| metrics.and_then(|m| m.avg_price)),
            current_volatility,
            change_point: metrics.and_then(|m| m.cp_summary.clone()),
            price_count: prices.len(),
            event_count: data.events.len(),
        }
    }
}

/// Reconcile the snapshot with the window, filter and selection.
///
/// A selection survives window and category changes so the detail panel stays
/// showable; it is dropped only when the event no longer exists in the
/// unfiltered event set.
pub fn compute(
    data: &Datasets,
    range: DateRange,
    category: CategoryFilter,
    selected: Option<&Event>,
) -> ViewState {
    let visible_prices = filter_by_window(&data.prices, &range);
    let windowed_events = filter_by_window(&data.events, &range);
    let visible_events = filter_by_category(&windowed_events, category);

    let selected_event = selected.and_then(|sel| current_member(&data.events, sel)).cloned();
    let selected_event_stats = resolve(selected_event.as_ref(), &data.correlations).cloned();

    let change_point_visible = !range.is_inverted()
        && data
            .metrics
            .as_ref()
            .and_then(|m| m.cp_summary.as_ref())
            .is_some_and(|cp| range.contains(cp.cp_median_date));

    let highlight = selected_event.as_ref().map(|e| {
        DateRange::new(
            shift_days(e.date, -HIGHLIGHT_HALF_WIDTH_DAYS),
            shift_days(e.date, HIGHLIGHT_HALF_WIDTH_DAYS),
        )
    });

    ViewState {
        range,
        category,
        visible_prices,
        visible_events,
        selected_event,
        selected_event_stats,
        change_point_visible,
        highlight,
    }
}

/// The snapshot's copy of `selected`: an identical event if present, else the
/// first event with the same title.
fn current_member<'a>(events: &'a [Event], selected: &Event) -> Option<&'a Event> {
    events
        .iter()
        .find(|e| *e == selected)
        .or_else(|| events.iter().find(|e| e.title == selected.title))
}
