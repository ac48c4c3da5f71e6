//! Plotters-powered price chart widget for Ratatui.
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.
//! X values are calendar days (`NaiveDate::num_days_from_ce`), so event and
//! change-point markers share the price series' axis.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// A lightweight, render-only chart description.
///
/// All series and bounds are computed outside the render call.
pub struct DashChart<'a> {
    /// Line series (price or volatility) over the visible window.
    pub series: &'a [(f64, f64)],
    /// X positions of visible event markers.
    pub markers: &'a [f64],
    /// Edges of the highlight band around the selected event.
    pub band: Option<(f64, f64)>,
    /// X position of the change-point median, when inside the window.
    pub change_point: Option<f64>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub y_label: &'a str,
    pub line_color: RGBColor,
    pub fmt_x: fn(f64) -> String,
    pub fmt_y: fn(f64) -> String,
}

impl<'a> Widget for DashChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a chart.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let x0 = self.x_bounds[0];
        let x1 = self.x_bounds[1];
        let y0 = self.y_bounds[0];
        let y1 = self.y_bounds[1];

        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .y_desc(self.y_label)
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| (self.fmt_x)(*v))
                .y_label_formatter(&|v| (self.fmt_y)(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            let marker_color = RGBColor(251, 191, 36); // amber
            let band_color = RGBColor(0, 255, 255); // cyan
            let break_color = RGBColor(239, 68, 68); // red

            // Event markers first so the series draws over them.
            for &x in self.markers {
                chart.draw_series(LineSeries::new([(x, y0), (x, y1)], &marker_color))?;
            }

            if let Some((lo, hi)) = self.band {
                for x in [lo, hi] {
                    if x > x0 && x < x1 {
                        chart.draw_series(LineSeries::new([(x, y0), (x, y1)], &band_color))?;
                    }
                }
            }

            chart.draw_series(LineSeries::new(self.series.iter().copied(), &self.line_color))?;

            if let Some(x) = self.change_point {
                chart.draw_series(LineSeries::new([(x, y0), (x, y1)], &break_color))?;
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}
