//! Command-line parsing for the Brent event dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the filtering/aggregation code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::data::DEFAULT_BASE_URL;
use crate::data::api::DEFAULT_TIMEOUT_SECS;
use crate::domain::CategoryFilter;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "brent-dash",
    version,
    about = "Brent oil prices, geopolitical events and structural breaks"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive terminal dashboard (default).
    Tui(ViewArgs),
    /// Print KPIs, the event log and the selected event's impact analysis.
    Report(ReportArgs),
    /// Write the computed view state to JSON (and optionally the visible prices to CSV).
    Export(ExportArgs),
}

/// Where the four datasets come from.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// Base URL of the analytics service.
    #[arg(long = "api", env = "BRENT_API_URL", default_value = DEFAULT_BASE_URL)]
    pub api_url: String,

    /// Read local files (brent_daily.csv, events.csv, change_point_summary.json)
    /// from this directory instead of calling the service.
    #[arg(long, env = "BRENT_DATA_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// HTTP timeout in seconds.
    #[arg(long, env = "BRENT_API_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,
}

/// Interaction state applied on top of the fetched snapshot.
#[derive(Debug, Args, Clone)]
pub struct ViewArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Window start (YYYY-MM-DD). Defaults to ten years before the latest price.
    #[arg(long, value_name = "DATE")]
    pub start: Option<NaiveDate>,

    /// Window end (YYYY-MM-DD). Defaults to the latest price date.
    #[arg(long, value_name = "DATE")]
    pub end: Option<NaiveDate>,

    /// Event category: all, macro, policy, conflict, sanctions.
    #[arg(short = 'c', long, default_value_t = CategoryFilter::All)]
    pub category: CategoryFilter,

    /// Select an event by its exact title.
    #[arg(short = 's', long, value_name = "TITLE")]
    pub select: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct ReportArgs {
    #[command(flatten)]
    pub view: ViewArgs,

    /// Also list data-quality warnings raised while loading.
    #[arg(long)]
    pub warnings: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub view: ViewArgs,

    /// Output JSON file.
    #[arg(long, value_name = "JSON")]
    pub out: PathBuf,

    /// Also write the visible price window as CSV.
    #[arg(long = "prices-csv", value_name = "CSV")]
    pub prices_csv: Option<PathBuf>,
}
