//! Shared "load pipeline" used by the CLI commands and the TUI.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! pick source -> fetch snapshot -> build session -> apply CLI view flags
//!
//! The front-ends can then focus on presentation (printing vs widgets).

use std::time::Duration;

use tracing::info;

use crate::cli::{SourceArgs, ViewArgs};
use crate::data::{ApiClient, DataSource, LocalSource};
use crate::domain::DateRange;
use crate::error::{AppError, EXIT_USAGE};
use crate::view::Dashboard;

/// A loaded dashboard plus where its data came from.
#[derive(Debug, Clone)]
pub struct Session {
    pub dashboard: Dashboard,
    pub origin: String,
}

/// Build the configured data source: local files win over the service URL.
pub fn open_source(args: &SourceArgs) -> Result<Box<dyn DataSource>, AppError> {
    if let Some(dir) = &args.data_dir {
        if !dir.is_dir() {
            return Err(AppError::new(
                EXIT_USAGE,
                format!("Data directory '{}' does not exist.", dir.display()),
            ));
        }
        return Ok(Box::new(LocalSource::new(dir.clone())));
    }
    if args.timeout == 0 {
        return Err(AppError::new(EXIT_USAGE, "Timeout must be at least 1 second."));
    }
    let client = ApiClient::new(args.api_url.clone(), Duration::from_secs(args.timeout))?;
    Ok(Box::new(client))
}

/// Fetch a snapshot and apply the CLI's window, category and selection.
pub fn load_session(args: &ViewArgs) -> Result<Session, AppError> {
    let source = open_source(&args.source)?;
    let origin = source.describe();
    info!(%origin, "loading datasets");
    let data = source.fetch_all()?;

    let mut dashboard = Dashboard::new(data);
    apply_view_args(&mut dashboard, args)?;
    Ok(Session { dashboard, origin })
}

/// Apply `--start/--end/--category/--select` to a session.
pub fn apply_view_args(dashboard: &mut Dashboard, args: &ViewArgs) -> Result<(), AppError> {
    let default = dashboard.range();
    dashboard.set_date_range(DateRange::new(
        args.start.unwrap_or(default.start),
        args.end.unwrap_or(default.end),
    ));
    dashboard.set_category(args.category);

    if let Some(title) = &args.select {
        if !dashboard.select_by_title(title) {
            return Err(AppError::new(
                EXIT_USAGE,
                format!("No event titled '{title}' in the loaded dataset."),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Command};
    use clap::Parser;
    use std::fs;

    fn view_args(extra: &[&str], dir: &std::path::Path) -> ViewArgs {
        let mut argv = vec!["brent-dash", "report", "--data-dir", dir.to_str().unwrap()];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Report(args) => args.view,
            _ => unreachable!(),
        }
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("brent_daily.csv"),
            "Date,Price\n01-Jan-20,50.0\n01-Jun-20,40.0\n01-Jan-21,60.0\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("events.csv"),
            "title,date,type,notes\nA,2020-03-01,conflict,\nB,2020-04-01,macro,\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn loads_local_session_with_flags() {
        let dir = fixture();
        let args = view_args(
            &["--start", "2020-01-01", "--end", "2020-12-31", "-c", "conflict", "-s", "B"],
            dir.path(),
        );
        let session = load_session(&args).unwrap();
        let view = session.dashboard.view();
        assert_eq!(view.visible_prices.len(), 2);
        assert_eq!(view.visible_events.len(), 1);
        assert_eq!(view.visible_events[0].title, "A");
        assert_eq!(view.selected_event.as_ref().unwrap().title, "B");
        assert!(session.origin.contains("files in"));
    }

    #[test]
    fn unknown_selection_is_usage_error() {
        let dir = fixture();
        let args = view_args(&["-s", "Nope"], dir.path());
        let err = load_session(&args).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_USAGE);
    }

    #[test]
    fn missing_data_dir_is_usage_error() {
        let dir = fixture();
        let args = view_args(&[], &dir.path().join("missing"));
        assert_eq!(open_source(&args.source).err().unwrap().exit_code(), EXIT_USAGE);
    }
}
