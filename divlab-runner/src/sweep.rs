//! Take-profit × stop-loss grid sweep over many symbols.
//!
//! Signals are computed once per symbol; every (symbol, tp, sl) point is an
//! independent simulation. Points may run on rayon's pool but are collected
//! in grid order, so ranking never depends on scheduling.

use std::cmp::Ordering;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use divlab_core::data::{DataProvider, DownloadProgress};
use divlab_core::domain::{Interval, Period, PriceSeries};
use divlab_core::signals::{generate_signals, SignalSet};

use crate::config::{DivLabConfig, RatioGrid, RunId};
use crate::data_loader::{load_series, LoadOptions};
use crate::portfolio::simulate;
use crate::runner::RunError;

/// Outcome of one grid point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub symbol: String,
    pub tp_ratio: f64,
    pub sl_ratio: f64,
    pub total_return: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    pub run_id: RunId,
    pub interval: Interval,
    pub period: Period,
    pub synthetic: bool,
    pub dataset_hash: String,
    pub symbols: Vec<String>,
    pub grid: RatioGrid,
    /// Every grid point, symbol-major then TP then SL.
    pub records: Vec<PerformanceRecord>,
    /// Best records by total return.
    pub top: Vec<PerformanceRecord>,
}

/// Per-symbol inputs shared by all of that symbol's grid points.
struct SymbolInputs<'a> {
    series: &'a PriceSeries,
    closes: Vec<f64>,
    timestamps: Vec<chrono::DateTime<chrono::Utc>>,
    signals: SignalSet,
}

fn prepare<'a>(series: &'a PriceSeries, config: &DivLabConfig) -> Result<SymbolInputs<'a>, RunError> {
    let signals = generate_signals(series, &config.strategy)?;
    let (longs, shorts) = signals.signal_count();
    info!(symbol = %series.symbol, bars = series.len(), longs, shorts, "signals ready");
    Ok(SymbolInputs {
        series,
        closes: series.closes(),
        timestamps: series.timestamps(),
        signals,
    })
}

/// Descending by total return; NaN sorts last.
fn by_return_desc(a: &PerformanceRecord, b: &PerformanceRecord) -> Ordering {
    match (a.total_return.is_nan(), b.total_return.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b
            .total_return
            .partial_cmp(&a.total_return)
            .unwrap_or(Ordering::Equal),
    }
}

/// Stable ranking by total return, keeping at most `top_n`.
pub fn rank_records(records: &[PerformanceRecord], top_n: usize) -> Vec<PerformanceRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(by_return_desc);
    sorted.truncate(top_n);
    sorted
}

/// Run every grid point for already-loaded series.
///
/// Returns exactly `series.len() * grid.len()` records in grid order, or the
/// first error encountered.
pub fn sweep_series(
    series: &[PriceSeries],
    grid: &RatioGrid,
    config: &DivLabConfig,
) -> Result<Vec<PerformanceRecord>, RunError> {
    let inputs = series
        .iter()
        .map(|s| prepare(s, config))
        .collect::<Result<Vec<_>, _>>()?;

    let points: Vec<(usize, f64, f64)> = (0..inputs.len())
        .flat_map(|i| grid.pairs().map(move |(tp, sl)| (i, tp, sl)))
        .collect();

    let run_point = |&(i, tp, sl): &(usize, f64, f64)| -> Result<PerformanceRecord, RunError> {
        let input = &inputs[i];
        let params = config.simulation_params(tp, sl);
        let pf = simulate(&input.closes, &input.timestamps, &input.signals, &params).map_err(
            |source| RunError::Simulation {
                symbol: input.series.symbol.clone(),
                source,
            },
        )?;
        let record = PerformanceRecord {
            symbol: input.series.symbol.clone(),
            tp_ratio: tp,
            sl_ratio: sl,
            total_return: pf.total_return(),
            sharpe_ratio: pf.sharpe_ratio(),
            max_drawdown: pf.max_drawdown(),
        };
        debug!(symbol = %record.symbol, tp, sl, total_return = record.total_return, "grid point");
        Ok(record)
    };

    if config.sweep.parallel {
        points.par_iter().map(run_point).collect()
    } else {
        points.iter().map(run_point).collect()
    }
}

/// Load symbols, sweep the configured grid and rank the results.
pub fn run_sweep<S: AsRef<str>>(
    config: &DivLabConfig,
    provider: &dyn DataProvider,
    symbols: &[S],
    progress: Option<&dyn DownloadProgress>,
) -> Result<SweepReport, RunError> {
    config.validate()?;
    let opts = LoadOptions {
        interval: config.interval,
        period: config.period,
        max_symbols: config.max_symbols,
    };
    let data = load_series(provider, symbols, &opts, progress)?;
    let grid = config.sweep.grid();
    let symbols = data.symbols();

    info!(
        symbols = symbols.len(),
        grid_points = grid.len(),
        simulations = symbols.len() * grid.len(),
        parallel = config.sweep.parallel,
        "starting sweep"
    );

    let records = sweep_series(&data.series, &grid, config)?;
    let top = rank_records(&records, config.sweep.top_n);

    Ok(SweepReport {
        run_id: config.run_id(&symbols)?,
        interval: config.interval,
        period: config.period,
        synthetic: data.is_synthetic(),
        dataset_hash: data.dataset_hash,
        symbols,
        grid,
        records,
        top,
    })
}
