//! Dashboard session: the single owner of snapshot and interaction state.
//!
//! Every mutator recomputes the full `ViewState`; there is no partial update
//! path. Callers read `view()` and `kpi()` after any change.

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::{CategoryFilter, DateRange, Datasets, Event};
use crate::view::state::{KpiSummary, Selection, ViewState, compute};

#[derive(Debug, Clone)]
pub struct Dashboard {
    data: Datasets,
    kpi: KpiSummary,
    range: DateRange,
    category: CategoryFilter,
    selection: Selection,
    view: ViewState,
}

impl Dashboard {
    /// New session over `data` with the default window and no filter.
    pub fn new(data: Datasets) -> Self {
        let range = DateRange::default_for(&data.prices);
        let kpi = KpiSummary::from_datasets(&data);
        let category = CategoryFilter::All;
        let view = ViewState::empty(range, category);
        let mut dashboard = Self {
            data,
            kpi,
            range,
            category,
            selection: Selection::NoSelection,
            view,
        };
        dashboard.recompute();
        dashboard
    }

    /// Session with nothing fetched yet.
    pub fn empty() -> Self {
        Self::new(Datasets::default())
    }

    pub fn data(&self) -> &Datasets {
        &self.data
    }

    pub fn kpi(&self) -> &KpiSummary {
        &self.kpi
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn category(&self) -> CategoryFilter {
        self.category
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Install a new snapshot.
    ///
    /// KPIs are rebuilt and the window resets to the default for the new
    /// series. The selection is kept; `compute` drops it if the event is gone.
    pub fn replace_datasets(&mut self, data: Datasets) {
        self.kpi = KpiSummary::from_datasets(&data);
        self.range = DateRange::default_for(&data.prices);
        self.data = data;
        self.recompute();
        if self.view.selected_event.is_none() {
            self.selection = Selection::NoSelection;
        }
    }

    pub fn set_date_range(&mut self, range: DateRange) {
        self.range = range;
        self.recompute();
    }

    pub fn set_start(&mut self, start: NaiveDate) {
        self.set_date_range(DateRange::new(start, self.range.end));
    }

    pub fn set_end(&mut self, end: NaiveDate) {
        self.set_date_range(DateRange::new(self.range.start, end));
    }

    pub fn set_category(&mut self, category: CategoryFilter) {
        self.category = category;
        self.recompute();
    }

    /// `None` is the explicit "close details" action.
    pub fn select_event(&mut self, event: Option<Event>) {
        self.selection = match event {
            Some(event) => Selection::EventSelected(event),
            None => Selection::NoSelection,
        };
        self.recompute();
    }

    /// Select the first event with this exact title; returns whether one exists.
    pub fn select_by_title(&mut self, title: &str) -> bool {
        match self.data.find_event(title).cloned() {
            Some(event) => {
                self.select_event(Some(event));
                true
            }
            None => false,
        }
    }

    pub fn deselect(&mut self) {
        self.select_event(None);
    }

    fn recompute(&mut self) {
        self.view = compute(&self.data, self.range, self.category, self.selection.event());
        debug!(
            start = %self.range.start,
            end = %self.range.end,
            category = %self.category,
            prices = self.view.visible_prices.len(),
            events = self.view.visible_events.len(),
            selected = self.view.selected_event.is_some(),
            "view recomputed"
        );
    }
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::empty()
    }
}
