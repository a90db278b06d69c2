//! Export of run results as JSON summaries and CSV tables.
//!
//! Manual runs write `summary.json`, `positions.csv`, `drawdowns.csv` and
//! `equity.csv`; sweeps write `summary.json`, `sweep.csv` and `top.csv`.
//! Each run lands in its own directory named after the mode and run id.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::portfolio::{DrawdownEpisode, Trade};
use crate::runner::ManualReport;
use crate::sweep::{PerformanceRecord, SweepReport};

const RUN_ID_PREFIX: usize = 12;

// ─── JSON ───────────────────────────────────────────────────────────

pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("failed to serialize report to JSON")
}

/// Manual summary without the per-bar series (those go to `equity.csv`).
#[derive(Serialize)]
struct ManualSummary<'a> {
    run_id: &'a str,
    symbol: &'a str,
    interval: String,
    period: String,
    tp_ratio: f64,
    sl_ratio: f64,
    synthetic: bool,
    dataset_hash: &'a str,
    long_signals: usize,
    short_signals: usize,
    stats: &'a crate::metrics::PortfolioStats,
    trade_stats: &'a crate::metrics::TradeStats,
}

#[derive(Serialize)]
struct SweepSummary<'a> {
    run_id: &'a str,
    interval: String,
    period: String,
    synthetic: bool,
    dataset_hash: &'a str,
    symbols: &'a [String],
    take_profits: &'a [f64],
    stop_losses: &'a [f64],
    simulations: usize,
    top: &'a [PerformanceRecord],
}

pub fn manual_summary_json(report: &ManualReport) -> Result<String> {
    to_json(&ManualSummary {
        run_id: &report.run_id,
        symbol: &report.symbol,
        interval: report.interval.to_string(),
        period: report.period.to_string(),
        tp_ratio: report.tp_ratio,
        sl_ratio: report.sl_ratio,
        synthetic: report.synthetic,
        dataset_hash: &report.dataset_hash,
        long_signals: report.long_signals,
        short_signals: report.short_signals,
        stats: &report.stats,
        trade_stats: &report.trade_stats,
    })
}

pub fn sweep_summary_json(report: &SweepReport) -> Result<String> {
    to_json(&SweepSummary {
        run_id: &report.run_id,
        interval: report.interval.to_string(),
        period: report.period.to_string(),
        synthetic: report.synthetic,
        dataset_hash: &report.dataset_hash,
        symbols: &report.symbols,
        take_profits: &report.grid.take_profits,
        stop_losses: &report.grid.stop_losses,
        simulations: report.records.len(),
        top: &report.top,
    })
}

// ─── CSV ────────────────────────────────────────────────────────────

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Trade ledger, one row per position.
pub fn positions_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "direction",
        "status",
        "entry_idx",
        "entry_time",
        "entry_price",
        "exit_idx",
        "exit_time",
        "exit_price",
        "size",
        "pnl",
        "return",
        "exit_reason",
    ])?;

    for t in trades {
        wtr.write_record([
            &format!("{:?}", t.direction),
            &format!("{:?}", t.status),
            &t.entry_idx.to_string(),
            &t.entry_time.to_rfc3339(),
            &format!("{:.6}", t.entry_price),
            &t.exit_idx.to_string(),
            &t.exit_time.to_rfc3339(),
            &format!("{:.6}", t.exit_price),
            &format!("{:.6}", t.size),
            &format!("{:.6}", t.pnl),
            &format!("{:.6}", t.return_pct),
            &format!("{:?}", t.exit_reason),
        ])?;
    }
    finish(wtr)
}

pub fn drawdowns_csv(episodes: &[DrawdownEpisode]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "peak_time",
        "valley_time",
        "end_time",
        "peak_value",
        "valley_value",
        "end_value",
        "drawdown",
        "status",
    ])?;
    for d in episodes {
        wtr.write_record([
            &d.peak_time.to_rfc3339(),
            &d.valley_time.to_rfc3339(),
            &d.end_time.to_rfc3339(),
            &format!("{:.4}", d.peak_value),
            &format!("{:.4}", d.valley_value),
            &format!("{:.4}", d.end_value),
            &format!("{:.6}", d.drawdown),
            &format!("{:?}", d.status),
        ])?;
    }
    finish(wtr)
}

/// Per-bar value and drawdown.
pub fn equity_csv(report: &ManualReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "value", "drawdown"])?;
    for ((ts, value), dd) in report
        .timestamps
        .iter()
        .zip(&report.values)
        .zip(&report.drawdown_series)
    {
        wtr.write_record([
            &ts.to_rfc3339(),
            &format!("{:.4}", value),
            &format!("{:.6}", dd),
        ])?;
    }
    finish(wtr)
}

pub fn records_csv(records: &[PerformanceRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for r in records {
        wtr.serialize(r)?;
    }
    if records.is_empty() {
        wtr.write_record([
            "symbol",
            "tp_ratio",
            "sl_ratio",
            "total_return",
            "sharpe_ratio",
            "max_drawdown",
        ])?;
    }
    finish(wtr)
}

// ─── Artifact bundles ───────────────────────────────────────────────

fn run_dir(output_dir: &Path, mode: &str, run_id: &str) -> Result<PathBuf> {
    let short = &run_id[..run_id.len().min(RUN_ID_PREFIX)];
    let dir = output_dir.join(format!("{mode}_{short}"));
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create output dir: {}", dir.display()))?;
    Ok(dir)
}

/// Symbol as a single path component: anything outside `[A-Za-z0-9._^-]`
/// becomes `_`.
fn path_component(symbol: &str) -> String {
    symbol
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '^' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn write(dir: &Path, name: &str, contents: &str) -> Result<()> {
    let path = dir.join(name);
    std::fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))
}

/// Write the manual-mode artifacts and return their directory.
pub fn save_manual(report: &ManualReport, output_dir: &Path) -> Result<PathBuf> {
    let mode = format!("manual_{}", path_component(&report.symbol));
    let dir = run_dir(output_dir, &mode, &report.run_id)?;
    write(&dir, "summary.json", &manual_summary_json(report)?)?;
    write(&dir, "positions.csv", &positions_csv(&report.positions)?)?;
    write(&dir, "drawdowns.csv", &drawdowns_csv(&report.drawdowns)?)?;
    write(&dir, "equity.csv", &equity_csv(report)?)?;
    Ok(dir)
}

/// Write the sweep artifacts and return their directory.
pub fn save_sweep(report: &SweepReport, output_dir: &Path) -> Result<PathBuf> {
    let dir = run_dir(output_dir, "sweep", &report.run_id)?;
    write(&dir, "summary.json", &sweep_summary_json(report)?)?;
    write(&dir, "sweep.csv", &records_csv(&report.records)?)?;
    write(&dir, "top.csv", &records_csv(&report.top)?)?;
    Ok(dir)
}
