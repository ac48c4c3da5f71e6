//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - decoded from the analytics service or built from local files
//! - filtered and joined by the view layer
//! - exported to JSON for downstream tooling

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::dates::shift_days;

/// Closed classification of an event's causal type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Macro,
    Policy,
    Conflict,
    Sanctions,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Macro,
        Category::Policy,
        Category::Conflict,
        Category::Sanctions,
    ];

    /// Wire/CSV spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Macro => "macro",
            Category::Policy => "policy",
            Category::Conflict => "conflict",
            Category::Sanctions => "sanctions",
        }
    }

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            Category::Macro => "Macroeconomic",
            Category::Policy => "Policy Change",
            Category::Conflict => "Regional Conflict",
            Category::Sanctions => "Economic Sanctions",
        }
    }

    /// Parse the wire spelling, ignoring ASCII case and surrounding whitespace.
    pub fn parse(raw: &str) -> Option<Category> {
        let raw = raw.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(raw))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category filter applied to the event list.
///
/// `All` is a filter value only; it never appears on an [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => wanted == category,
        }
    }

    /// Cycle `All -> macro -> policy -> conflict -> sanctions -> All`.
    pub fn next(self) -> Self {
        match self {
            CategoryFilter::All => CategoryFilter::Only(Category::Macro),
            CategoryFilter::Only(Category::Macro) => CategoryFilter::Only(Category::Policy),
            CategoryFilter::Only(Category::Policy) => CategoryFilter::Only(Category::Conflict),
            CategoryFilter::Only(Category::Conflict) => CategoryFilter::Only(Category::Sanctions),
            CategoryFilter::Only(Category::Sanctions) => CategoryFilter::All,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            CategoryFilter::All => CategoryFilter::Only(Category::Sanctions),
            CategoryFilter::Only(Category::Macro) => CategoryFilter::All,
            CategoryFilter::Only(Category::Policy) => CategoryFilter::Only(Category::Macro),
            CategoryFilter::Only(Category::Conflict) => CategoryFilter::Only(Category::Policy),
            CategoryFilter::Only(Category::Sanctions) => CategoryFilter::Only(Category::Conflict),
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            CategoryFilter::All => "All Factors",
            CategoryFilter::Only(c) => c.display_name(),
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("all"),
            CategoryFilter::Only(c) => f.write_str(c.as_str()),
        }
    }
}

impl Serialize for CategoryFilter {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(CategoryFilter::All);
        }
        Category::parse(s)
            .map(CategoryFilter::Only)
            .ok_or_else(|| {
                format!("unknown category '{s}' (expected all, macro, policy, conflict, sanctions)")
            })
    }
}

/// One trading day of the price series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    /// Price in USD per barrel.
    pub price: Decimal,
    /// 30-day rolling annualized volatility, when known.
    pub volatility: Option<f64>,
}

/// A dated geopolitical or economic event.
///
/// `title` is the join key against [`CorrelationRecord::title`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub title: String,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub category: Category,
    pub notes: String,
}

/// Output of the external change-point model, read as a single snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangePointSummary {
    pub cp_median_date: NaiveDate,
    pub cp_credible_interval: Option<(NaiveDate, NaiveDate)>,
    /// Posterior confidence, clamped to `[0, 1]`.
    pub confidence: f64,
    pub mean_before: Option<Decimal>,
    pub mean_after: Option<Decimal>,
    pub pct_change: Decimal,
}

/// Precomputed before/after impact statistics for one event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationRecord {
    pub title: String,
    pub date: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub category: Option<Category>,
    pub price_change_pct: Decimal,
    pub vol_change_pct: Decimal,
    pub avg_price_before: Option<Decimal>,
    pub avg_price_after: Decimal,
}

/// Summary metrics as reported by the analytics service.
///
/// Every field is optional: the service answers `{}` when it has no data.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metrics {
    pub latest_price: Option<Decimal>,
    pub avg_price: Option<Decimal>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub current_volatility: Option<f64>,
    pub cp_summary: Option<ChangePointSummary>,
}

/// Length of the default window ending at the latest price date.
pub const DEFAULT_WINDOW_DAYS: i64 = 365 * 10;

/// Inclusive calendar-date interval.
///
/// An inverted range (`start > end`) is representable on purpose: it shows up
/// transiently while a user edits the two bounds independently, and filters
/// treat it as matching nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Default window: the last ten years of the series, or the full Brent
    /// history window when there are no prices yet.
    pub fn default_for(prices: &[PricePoint]) -> Self {
        match prices.last() {
            Some(last) => Self::new(shift_days(last.date, -DEFAULT_WINDOW_DAYS), last.date),
            None => Self::fallback(),
        }
    }

    fn fallback() -> Self {
        // Both literals are valid calendar dates.
        Self::new(
            NaiveDate::from_ymd_opt(1987, 5, 20).unwrap_or(NaiveDate::MIN),
            NaiveDate::from_ymd_opt(2022, 12, 31).unwrap_or(NaiveDate::MAX),
        )
    }
}

impl Default for DateRange {
    fn default() -> Self {
        Self::fallback()
    }
}

/// A record excluded (or flagged) while building a dataset.
///
/// Warnings never abort a computation; they are surfaced to the caller so the
/// presentation layer can show data-quality problems.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataWarning {
    pub dataset: &'static str,
    /// Zero-based record index (or 1-based file line for CSV sources).
    pub position: usize,
    pub message: String,
}

impl DataWarning {
    pub fn new(dataset: &'static str, position: usize, message: impl Into<String>) -> Self {
        Self {
            dataset,
            position,
            message: message.into(),
        }
    }
}

impl fmt::Display for DataWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.dataset, self.position, self.message)
    }
}

/// One immutable snapshot of the four datasets.
#[derive(Debug, Clone, Default)]
pub struct Datasets {
    pub prices: Vec<PricePoint>,
    pub events: Vec<Event>,
    pub metrics: Option<Metrics>,
    pub correlations: Vec<CorrelationRecord>,
    pub warnings: Vec<DataWarning>,
}

impl Datasets {
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
            && self.events.is_empty()
            && self.metrics.is_none()
            && self.correlations.is_empty()
    }

    pub fn latest_price_date(&self) -> Option<NaiveDate> {
        self.prices.last().map(|p| p.date)
    }

    /// First event with this exact title.
    pub fn find_event(&self, title: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.title == title)
    }
}
