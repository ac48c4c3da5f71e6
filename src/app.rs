//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - installs logging
//! - fetches the four datasets and builds the dashboard session
//! - prints, exports or runs the terminal dashboard

use std::path::Path;

use clap::Parser;

use crate::cli::{Command, ExportArgs, ReportArgs, ViewArgs};
use crate::error::AppError;
use crate::io::export::{ViewExport, write_prices_csv, write_view_json};
use crate::logging::{LogTarget, TUI_LOG_FILE};

pub mod pipeline;

/// Entry point for the `brent-dash` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    // `brent-dash` and `brent-dash --data-dir x` behave like `brent-dash tui ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Tui(args) => handle_tui(args),
        Command::Report(args) => handle_report(args),
        Command::Export(args) => handle_export(args),
    }
}

fn handle_tui(args: ViewArgs) -> Result<(), AppError> {
    crate::logging::init(LogTarget::File(Path::new(TUI_LOG_FILE)))?;
    crate::tui::run(args)
}

fn handle_report(args: ReportArgs) -> Result<(), AppError> {
    crate::logging::init(LogTarget::Stderr)?;
    let session = pipeline::load_session(&args.view)?;
    let dash = &session.dashboard;
    let warnings = args.warnings.then_some(dash.data().warnings.as_slice());
    println!("{}", crate::report::format_report(dash.kpi(), dash.view(), warnings));
    Ok(())
}

fn handle_export(args: ExportArgs) -> Result<(), AppError> {
    crate::logging::init(LogTarget::Stderr)?;
    let session = pipeline::load_session(&args.view)?;
    let dash = &session.dashboard;

    write_view_json(
        &args.out,
        &ViewExport {
            tool: "brent-dash",
            source: &session.origin,
            kpi: dash.kpi(),
            view: dash.view(),
            warnings: &dash.data().warnings,
        },
    )?;
    println!("Wrote {}", args.out.display());

    if let Some(path) = &args.prices_csv {
        write_prices_csv(path, &dash.view().visible_prices)?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

/// Rewrite argv so `brent-dash` defaults to `brent-dash tui`.
///
/// Rules:
/// - `brent-dash`                      -> `brent-dash tui`
/// - `brent-dash --data-dir d ...`     -> `brent-dash tui --data-dir d ...`
/// - `brent-dash --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "tui" | "report" | "export");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    argv
}
