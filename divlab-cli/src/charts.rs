//! Inline terminal charts for manual-mode reports.
//!
//! Drawn below the printed tables with an inline ratatui viewport, so the
//! scrollback keeps them after the process exits.

use std::io;

use anyhow::Result;
use crossterm::tty::IsTty;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::symbols;
use ratatui::text::Span;
use ratatui::widgets::{Axis, Block, Chart, Dataset, GraphType};
use ratatui::{Frame, Terminal, TerminalOptions, Viewport};

use divlab_runner::ManualReport;

const CHART_HEIGHT: u16 = 14;

pub fn stdout_is_terminal() -> bool {
    io::stdout().is_tty()
}

/// Portfolio value and drawdown charts, one above the other.
pub fn draw_manual(report: &ManualReport) -> Result<()> {
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::with_options(
        backend,
        TerminalOptions {
            viewport: Viewport::Inline(CHART_HEIGHT * 2),
        },
    )?;

    let drawdown_pct: Vec<f64> = report.drawdown_series.iter().map(|d| d * 100.0).collect();
    let span = time_span(report);

    terminal.draw(|f| {
        let [top, bottom] =
            Layout::vertical([Constraint::Length(CHART_HEIGHT), Constraint::Length(CHART_HEIGHT)])
                .areas(f.area());
        render_line(
            f,
            top,
            &format!(" {} portfolio value ", report.symbol),
            &report.values,
            Color::Cyan,
            &span,
        );
        render_line(f, bottom, " drawdown (%) ", &drawdown_pct, Color::Red, &span);
    })?;
    println!();
    Ok(())
}

fn time_span(report: &ManualReport) -> (String, String) {
    let fmt = |t: Option<&chrono::DateTime<chrono::Utc>>| {
        t.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default()
    };
    (fmt(report.timestamps.first()), fmt(report.timestamps.last()))
}

fn render_line(
    f: &mut Frame,
    area: Rect,
    title: &str,
    series: &[f64],
    color: Color,
    span: &(String, String),
) {
    let data: Vec<(f64, f64)> = series
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .map(|(i, &v)| (i as f64, v))
        .collect();

    let (min_y, max_y) = data
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, v)| {
            (lo.min(v), hi.max(v))
        });
    let (y_min, y_max) = if data.is_empty() {
        (0.0, 1.0)
    } else {
        let padding = ((max_y - min_y).abs() * 0.05).max(1e-6);
        (min_y - padding, max_y + padding)
    };
    let x_max = series.len().saturating_sub(1) as f64;

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .style(Style::default().fg(color))
        .graph_type(GraphType::Line)
        .data(&data);

    let muted = Style::default().fg(Color::DarkGray);
    let chart = Chart::new(vec![dataset])
        .block(Block::bordered().title(title.to_string()))
        .x_axis(
            Axis::default()
                .style(muted)
                .bounds([0.0, x_max.max(1.0)])
                .labels(vec![
                    Span::styled(span.0.clone(), muted),
                    Span::styled(span.1.clone(), muted),
                ]),
        )
        .y_axis(
            Axis::default()
                .style(muted)
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::styled(format!("{y_min:.2}"), muted),
                    Span::styled(format!("{y_max:.2}"), muted),
                ]),
        );

    f.render_widget(chart, area);
}
