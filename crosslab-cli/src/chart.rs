//! Equity chart: portfolio value over time, drawn inline on stdout.

use std::io;

use anyhow::Result;
use crossterm::tty::IsTty;
use ratatui::{
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Widget},
    Terminal, TerminalOptions, Viewport,
};
use tracing::debug;

use crosslab_core::engine::PerformanceRecord;

/// Rows taken by the inline chart.
const CHART_HEIGHT: u16 = 20;

/// Line chart of portfolio value, one point per simulated bar.
///
/// The x axis is the bar index; labels show the first, middle, and last
/// timestamps so gaps between sessions don't stretch the curve.
pub struct EquityChart<'a> {
    symbol: &'a str,
    records: &'a [PerformanceRecord],
}

impl<'a> EquityChart<'a> {
    pub fn new(symbol: &'a str, records: &'a [PerformanceRecord]) -> Self {
        Self { symbol, records }
    }

    pub fn title(&self) -> String {
        format!(" Trading Strategy Performance for {} ", self.symbol)
    }
}

impl Widget for EquityChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let data: Vec<(f64, f64)> = self
            .records
            .iter()
            .enumerate()
            .map(|(i, r)| (i as f64, r.portfolio_value))
            .collect();

        let x_max = data.len().saturating_sub(1).max(1) as f64;
        let (y_min, y_max) = data
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, v)| {
                (lo.min(v), hi.max(v))
            });
        let (y_min, y_max) = if y_min.is_finite() {
            (y_min, y_max)
        } else {
            (0.0, 1.0)
        };

        // Pad the y axis; a flat curve still needs a non-empty range.
        let y_range = y_max - y_min;
        let y_pad = if y_range > 0.0 {
            y_range * 0.05
        } else {
            y_max.abs().max(1.0) * 0.01
        };
        let y_lower = y_min - y_pad;
        let y_upper = y_max + y_pad;

        let stamp = |idx: usize| {
            self.records
                .get(idx)
                .map(|r| r.timestamp.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default()
        };
        let last = self.records.len().saturating_sub(1);
        let x_labels = vec![
            Span::raw(stamp(0)),
            Span::raw(stamp(last / 2)),
            Span::raw(stamp(last)),
        ];
        let y_labels = vec![
            Span::raw(format!("{y_lower:.0}")),
            Span::raw(format!("{:.0}", (y_lower + y_upper) / 2.0)),
            Span::raw(format!("{y_upper:.0}")),
        ];

        let datasets = vec![Dataset::default()
            .name("Strategy Portfolio Value")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Cyan))
            .data(&data)];

        Chart::new(datasets)
            .block(Block::default().title(self.title()).borders(Borders::ALL))
            .x_axis(
                Axis::default()
                    .title("Date")
                    .style(Style::default().fg(Color::Gray))
                    .bounds([0.0, x_max])
                    .labels(x_labels),
            )
            .y_axis(
                Axis::default()
                    .title("Portfolio Value")
                    .style(Style::default().fg(Color::Gray))
                    .bounds([y_lower, y_upper])
                    .labels(y_labels),
            )
            .render(area, buf);
    }
}

/// Draw the chart into an inline viewport below the cursor. Skipped when
/// stdout is not a terminal.
pub fn draw_inline(symbol: &str, records: &[PerformanceRecord]) -> Result<()> {
    if !io::stdout().is_tty() {
        debug!("stdout is not a terminal, skipping chart");
        return Ok(());
    }
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::with_options(
        backend,
        TerminalOptions {
            viewport: Viewport::Inline(CHART_HEIGHT),
        },
    )?;
    terminal.draw(|frame| {
        frame.render_widget(EquityChart::new(symbol, records), frame.area());
    })?;
    println!();
    Ok(())
}
