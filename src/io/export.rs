//! Export the computed dashboard state.
//!
//! The JSON document is meant for downstream scripts and notebooks; the CSV is
//! the visible price window, easy to open in a spreadsheet.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::domain::{DataWarning, PricePoint};
use crate::error::{AppError, EXIT_RUNTIME};
use crate::view::{KpiSummary, ViewState};

/// Schema of the exported JSON document.
#[derive(Debug, Serialize)]
pub struct ViewExport<'a> {
    pub tool: &'static str,
    pub source: &'a str,
    pub kpi: &'a KpiSummary,
    pub view: &'a ViewState,
    pub warnings: &'a [DataWarning],
}

/// Write `{tool, source, kpi, view, warnings}` as pretty JSON.
pub fn write_view_json(path: &Path, export: &ViewExport<'_>) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(
            EXIT_RUNTIME,
            format!("Failed to create export JSON '{}': {e}", path.display()),
        )
    })?;
    serde_json::to_writer_pretty(BufWriter::new(file), export)
        .map_err(|e| AppError::new(EXIT_RUNTIME, format!("Failed to write export JSON: {e}")))?;
    Ok(())
}

/// Write `date,price,volatility` rows for the visible window.
pub fn write_prices_csv(path: &Path, prices: &[PricePoint]) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(
            EXIT_RUNTIME,
            format!("Failed to create export CSV '{}': {e}", path.display()),
        )
    })?;
    let mut out = BufWriter::new(file);

    writeln!(out, "date,price,volatility")
        .map_err(|e| AppError::new(EXIT_RUNTIME, format!("Failed to write export CSV header: {e}")))?;
    for p in prices {
        writeln!(
            out,
            "{},{},{}",
            p.date,
            p.price,
            p.volatility.map(|v| format!("{v:.6}")).unwrap_or_default(),
        )
        .map_err(|e| AppError::new(EXIT_RUNTIME, format!("Failed to write export CSV row: {e}")))?;
    }
    out.flush()
        .map_err(|e| AppError::new(EXIT_RUNTIME, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}
