//! Ratatui-based terminal dashboard.
//!
//! The screen mirrors the web dashboard's panels: KPI header, price (or
//! volatility) chart with event markers, the event log, and a detail panel
//! for the selected event. All state changes go through [`Dashboard`].

use std::io;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use crossterm::{
    event::{self, Event as TermEvent, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use plotters::style::RGBColor;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use tracing::{info, warn};

use crate::app::pipeline::{apply_view_args, open_source};
use crate::cli::ViewArgs;
use crate::data::DataSource;
use crate::domain::{DateRange, parse_iso_date};
use crate::error::{AppError, EXIT_RUNTIME};
use crate::report::{detail_lines, event_line, kpi_lines, price_f64};
use crate::view::{Dashboard, ViewState};

mod plotters_chart;

use plotters_chart::DashChart;

/// Start the TUI.
pub fn run(args: ViewArgs) -> Result<(), AppError> {
    let source = open_source(&args.source)?;

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(EXIT_RUNTIME, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(source, args);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode()
            .map_err(|e| AppError::new(EXIT_RUNTIME, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(
                EXIT_RUNTIME,
                format!("Failed to enter alternate screen: {e}"),
            ));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateField {
    Start,
    End,
}

impl DateField {
    fn label(self) -> &'static str {
        match self {
            DateField::Start => "start",
            DateField::End => "end",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChartKind {
    Price,
    Volatility,
}

struct App {
    source: Box<dyn DataSource>,
    args: ViewArgs,
    dashboard: Dashboard,
    cursor: usize,
    editing: Option<DateField>,
    date_input: String,
    chart: ChartKind,
    status: String,
}

impl App {
    fn new(source: Box<dyn DataSource>, args: ViewArgs) -> Self {
        let mut app = Self {
            source,
            args,
            dashboard: Dashboard::empty(),
            cursor: 0,
            editing: None,
            date_input: String::new(),
            chart: ChartKind::Price,
            status: "Loading data...".to_string(),
        };
        app.refresh();
        if let Err(err) = apply_view_args(&mut app.dashboard, &app.args) {
            app.status = err.to_string();
        }
        app.sync_cursor_to_selection();
        app
    }

    fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(EXIT_RUNTIME, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(EXIT_RUNTIME, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read()
                .map_err(|e| AppError::new(EXIT_RUNTIME, format!("Event read error: {e}")))?
            {
                TermEvent::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                TermEvent::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.editing.is_some() {
            self.handle_date_edit(code);
            return false;
        }

        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Up => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down => {
                let len = self.dashboard.view().visible_events.len();
                if self.cursor + 1 < len {
                    self.cursor += 1;
                }
            }
            KeyCode::Enter => self.select_at_cursor(),
            KeyCode::Esc | KeyCode::Char('x') => {
                self.dashboard.deselect();
                self.status = "Details closed.".to_string();
            }
            KeyCode::Char('c') | KeyCode::Right => {
                self.dashboard.set_category(self.dashboard.category().next());
                self.after_filter_change();
            }
            KeyCode::Char('C') | KeyCode::Left => {
                self.dashboard.set_category(self.dashboard.category().prev());
                self.after_filter_change();
            }
            KeyCode::Char('[') => self.begin_edit(DateField::Start),
            KeyCode::Char(']') => self.begin_edit(DateField::End),
            KeyCode::Char('v') => {
                self.chart = match self.chart {
                    ChartKind::Price => ChartKind::Volatility,
                    ChartKind::Volatility => ChartKind::Price,
                };
            }
            KeyCode::Char('r') => self.refresh(),
            _ => {}
        }

        false
    }

    fn handle_date_edit(&mut self, code: KeyCode) {
        let Some(field) = self.editing else {
            return;
        };
        match code {
            KeyCode::Esc => {
                self.editing = None;
                self.status = "Date edit canceled.".to_string();
            }
            KeyCode::Enter => {
                self.editing = None;
                self.apply_date_input(field);
            }
            KeyCode::Backspace => {
                self.date_input.pop();
            }
            KeyCode::Char(c) => {
                if c.is_ascii_digit() || c == '-' {
                    self.date_input.push(c);
                }
            }
            _ => {}
        }
    }

    fn begin_edit(&mut self, field: DateField) {
        let range = self.dashboard.range();
        let current = match field {
            DateField::Start => range.start,
            DateField::End => range.end,
        };
        self.date_input = current.to_string();
        self.editing = Some(field);
        self.status = format!(
            "Editing {} date (YYYY-MM-DD). Enter to apply, Esc to cancel.",
            field.label()
        );
    }

    fn apply_date_input(&mut self, field: DateField) {
        let trimmed = self.date_input.trim();
        let Some(date) = parse_iso_date(trimmed) else {
            self.status = format!("Invalid date '{trimmed}'.");
            return;
        };
        match field {
            DateField::Start => self.dashboard.set_start(date),
            DateField::End => self.dashboard.set_end(date),
        }
        self.after_filter_change();
        self.status = if self.dashboard.range().is_inverted() {
            "Start is after end: nothing to show until the range is fixed.".to_string()
        } else {
            format!("{} date set to {date}.", field.label())
        };
    }

    fn select_at_cursor(&mut self) {
        let event = self.dashboard.view().visible_events.get(self.cursor).cloned();
        match event {
            Some(event) => {
                self.status = format!("Selected '{}'.", event.title);
                self.dashboard.select_event(Some(event));
            }
            None => self.status = "No event to select.".to_string(),
        }
    }

    fn after_filter_change(&mut self) {
        let len = self.dashboard.view().visible_events.len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
        self.status = format!("Filter: {}", self.dashboard.category().display_name());
    }

    fn sync_cursor_to_selection(&mut self) {
        let view = self.dashboard.view();
        if let Some(selected) = &view.selected_event {
            if let Some(pos) = view.visible_events.iter().position(|e| e == selected) {
                self.cursor = pos;
            }
        }
    }

    /// Refetch every dataset. A failed fetch keeps the previous snapshot.
    ///
    /// The first load uses the default window; later reloads keep the window
    /// the user is looking at.
    fn refresh(&mut self) {
        let kept_range = (!self.dashboard.data().is_empty()).then(|| self.dashboard.range());
        match self.source.fetch_all() {
            Ok(data) => {
                let warnings = data.warnings.len();
                self.dashboard.replace_datasets(data);
                if let Some(range) = kept_range {
                    self.dashboard.set_date_range(range);
                }
                let len = self.dashboard.view().visible_events.len();
                self.cursor = self.cursor.min(len.saturating_sub(1));
                info!(origin = %self.source.describe(), warnings, "datasets refreshed");
                self.status = if warnings == 0 {
                    format!("Loaded from {}.", self.source.describe())
                } else {
                    format!(
                        "Loaded from {} ({warnings} records skipped, see log).",
                        self.source.describe()
                    )
                };
            }
            Err(err) => {
                warn!(error = %err, "refresh failed");
                self.status = format!("Load failed: {err}");
            }
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(7),
                Constraint::Min(10),
                Constraint::Length(12),
                Constraint::Length(3),
            ])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_chart(frame, chunks[1]);

        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[2]);
        self.draw_events(frame, bottom[0]);
        self.draw_details(frame, bottom[1]);

        self.draw_footer(frame, chunks[3]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("brent-dash", Style::default().fg(Color::Cyan)),
            Span::raw(" | Brent oil price analysis"),
        ]));

        let range = self.dashboard.range();
        lines.push(Line::from(Span::styled(
            format!(
                "window: {} .. {} | filter: {} | chart: {}",
                range.start,
                range.end,
                self.dashboard.category().display_name(),
                match self.chart {
                    ChartKind::Price => "price",
                    ChartKind::Volatility => "volatility",
                },
            ),
            Style::default().fg(Color::Gray),
        )));

        for line in kpi_lines(self.dashboard.kpi()) {
            lines.push(Line::from(line));
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let title = match self.chart {
            ChartKind::Price => "Brent price (USD/bbl)",
            ChartKind::Volatility => "30-day volatility",
        };
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let cp_date = self
            .dashboard
            .kpi()
            .change_point
            .as_ref()
            .map(|cp| cp.cp_median_date);
        let Some(series) = chart_series(self.dashboard.view(), self.chart, cp_date) else {
            let msg = if self.dashboard.range().is_inverted() {
                "Start date is after end date."
            } else {
                "No prices in this window."
            };
            frame.render_widget(
                Paragraph::new(msg).style(Style::default().fg(Color::Yellow)),
                inner,
            );
            return;
        };

        let (line_color, y_label, fmt_y): (RGBColor, &str, fn(f64) -> String) = match self.chart {
            ChartKind::Price => (RGBColor(0, 255, 255), "USD", fmt_axis_price),
            ChartKind::Volatility => (RGBColor(167, 139, 250), "vol", fmt_axis_vol),
        };

        let widget = DashChart {
            series: &series.points,
            markers: &series.markers,
            band: series.band,
            change_point: series.change_point,
            x_bounds: series.x_bounds,
            y_bounds: series.y_bounds,
            y_label,
            line_color,
            fmt_x: fmt_axis_date,
            fmt_y,
        };
        frame.render_widget(widget, inner);
    }

    fn draw_events(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let view = self.dashboard.view();
        let selected = view.selected_event.as_ref();

        let items: Vec<ListItem> = view
            .visible_events
            .iter()
            .map(|e| ListItem::new(event_line(e, selected == Some(e))))
            .collect();

        let title = format!("Event log ({})", view.visible_events.len());
        let list = List::new(items)
            .block(Block::default().title(title).borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        if !view.visible_events.is_empty() {
            state.select(Some(self.cursor));
        }
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_details(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let view = self.dashboard.view();
        let block = Block::default().title("Event details").borders(Borders::ALL);

        let Some(event) = &view.selected_event else {
            let hint = Paragraph::new("Press Enter on an event to see its impact.")
                .style(Style::default().fg(Color::Gray))
                .block(block);
            frame.render_widget(hint, area);
            return;
        };

        let mut lines: Vec<Line> = Vec::new();
        for (i, line) in detail_lines(event, view.selected_event_stats.as_ref())
            .into_iter()
            .enumerate()
        {
            if i == 0 {
                lines.push(Line::from(Span::styled(
                    line,
                    Style::default().add_modifier(Modifier::BOLD),
                )));
            } else {
                lines.push(Line::from(line));
            }
        }

        let p = Paragraph::new(Text::from(lines))
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = match self.editing {
            Some(field) => format!("{} date: {}_", field.label(), self.date_input),
            None => "↑/↓ move  Enter select  x close  c/C filter  [/] dates  v chart  r reload  q quit"
                .to_string(),
        };
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Chart inputs derived from a [`ViewState`].
#[derive(Debug, Clone, PartialEq)]
struct ChartSeries {
    points: Vec<(f64, f64)>,
    markers: Vec<f64>,
    band: Option<(f64, f64)>,
    change_point: Option<f64>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

fn day_number(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce())
}

/// Build the chart for the visible window, or `None` when there is nothing to draw.
fn chart_series(view: &ViewState, kind: ChartKind, cp_date: Option<NaiveDate>) -> Option<ChartSeries> {
    if view.range.is_inverted() {
        return None;
    }

    let points: Vec<(f64, f64)> = view
        .visible_prices
        .iter()
        .filter_map(|p| {
            let y = match kind {
                ChartKind::Price => Some(price_f64(p.price)),
                ChartKind::Volatility => p.volatility,
            };
            y.map(|y| (day_number(p.date), y))
        })
        .collect();
    if points.is_empty() {
        return None;
    }

    let x_bounds = [day_number(view.range.start), day_number(view.range.end) + 1.0];

    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(_, y) in &points {
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    if !y_min.is_finite() || !y_max.is_finite() {
        return None;
    }
    if y_max <= y_min {
        y_min -= 1.0;
        y_max += 1.0;
    }
    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);
    let y_bounds = [y_min - pad, y_max + pad];

    let markers = view.visible_events.iter().map(|e| day_number(e.date)).collect();
    let band = view
        .highlight
        .map(|h: DateRange| (day_number(h.start), day_number(h.end)));
    let change_point = cp_date
        .filter(|_| view.change_point_visible)
        .map(day_number);

    Some(ChartSeries {
        points,
        markers,
        band,
        change_point,
        x_bounds,
        y_bounds,
    })
}

fn fmt_axis_date(v: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(v.round() as i32)
        .map(|d| d.format("%b %Y").to_string())
        .unwrap_or_default()
}

fn fmt_axis_price(v: f64) -> String {
    format!("{v:.0}")
}

fn fmt_axis_vol(v: f64) -> String {
    format!("{v:.2}")
}
