//! Performance metrics as pure functions that compute strategy statistics.
//!
//! Every metric is a pure function: value curve, return series or trade list
//! in, scalar out. Annualisation uses the bar interval's periods per year.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::portfolio::Trade;

/// Headline statistics for one simulated portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioStats {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub bars: usize,
    pub init_cash: f64,
    pub end_value: f64,
    pub total_return: f64,
    /// Buy-and-hold return of the underlying over the same bars.
    pub benchmark_return: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub total_trades: usize,
    pub closed_trades: usize,
    pub open_trades: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub expectancy: f64,
}

/// Trade-level statistics over closed trades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeStats {
    pub total_trades: usize,
    pub closed_trades: usize,
    pub open_trades: usize,
    pub winners: usize,
    pub losers: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub expectancy: f64,
    pub avg_winning_return: f64,
    pub avg_losing_return: f64,
    pub best_return: f64,
    pub worst_return: f64,
    pub avg_bars_held: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
}

impl TradeStats {
    pub fn compute(trades: &[Trade]) -> Self {
        let closed: Vec<Trade> = trades.iter().filter(|t| t.is_closed()).cloned().collect();
        let winners: Vec<&Trade> = closed.iter().filter(|t| t.is_winner()).collect();
        let losers: Vec<&Trade> = closed.iter().filter(|t| t.pnl < 0.0).collect();

        let avg_return = |ts: &[&Trade]| mean_f64(&ts.iter().map(|t| t.return_pct).collect::<Vec<_>>());
        let returns: Vec<f64> = closed.iter().map(|t| t.return_pct).collect();

        Self {
            total_trades: trades.len(),
            closed_trades: closed.len(),
            open_trades: trades.len() - closed.len(),
            winners: winners.len(),
            losers: losers.len(),
            win_rate: win_rate(&closed),
            profit_factor: profit_factor(&closed),
            expectancy: expectancy(&closed),
            avg_winning_return: avg_return(&winners[..]),
            avg_losing_return: avg_return(&losers[..]),
            best_return: returns.iter().copied().reduce(f64::max).unwrap_or(0.0),
            worst_return: returns.iter().copied().reduce(f64::min).unwrap_or(0.0),
            avg_bars_held: mean_f64(&closed.iter().map(|t| t.bars_held() as f64).collect::<Vec<_>>()),
            max_consecutive_wins: max_consecutive_wins(&closed),
            max_consecutive_losses: max_consecutive_losses(&closed),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction of the starting cash.
pub fn total_return(values: &[f64], init_cash: f64) -> f64 {
    match values.last() {
        Some(&last) if init_cash > 0.0 && last.is_finite() => (last - init_cash) / init_cash,
        _ => 0.0,
    }
}

/// Per-bar simple returns; the first bar is measured against `init_cash`.
pub fn bar_returns(values: &[f64], init_cash: f64) -> Vec<f64> {
    let mut prev = init_cash;
    values
        .iter()
        .map(|&v| {
            let r = if prev > 0.0 { (v - prev) / prev } else { 0.0 };
            prev = v;
            r
        })
        .collect()
}

/// Annualized Sharpe ratio (zero risk-free rate).
///
/// Sharpe = mean(returns) / std(returns) * sqrt(periods_per_year).
/// Returns 0.0 if variance is zero or fewer than 2 returns.
pub fn sharpe_ratio(returns: &[f64], periods_per_year: f64) -> f64 {
    let finite: Vec<f64> = returns.iter().copied().filter(|r| r.is_finite()).collect();
    if finite.len() < 2 {
        return 0.0;
    }
    let std = std_dev(&finite);
    if std < 1e-15 {
        return 0.0;
    }
    mean_f64(&finite) / std * periods_per_year.sqrt()
}

/// Annualized Sortino ratio (downside deviation only).
///
/// Returns 0.0 if there is no downside or fewer than 2 returns.
pub fn sortino_ratio(returns: &[f64], periods_per_year: f64) -> f64 {
    let finite: Vec<f64> = returns.iter().copied().filter(|r| r.is_finite()).collect();
    if finite.len() < 2 {
        return 0.0;
    }
    let downside_sq: f64 = finite.iter().filter(|&&r| r < 0.0).map(|r| r * r).sum();
    if downside_sq == 0.0 {
        return 0.0;
    }
    let downside_std = (downside_sq / finite.len() as f64).sqrt();
    if downside_std < 1e-15 {
        return 0.0;
    }
    mean_f64(&finite) / downside_std * periods_per_year.sqrt()
}

/// Maximum drawdown as a negative fraction (e.g., -0.15 = 15% drawdown).
///
/// Returns 0.0 if value is constant or monotonically increasing.
pub fn max_drawdown(values: &[f64]) -> f64 {
    drawdown_series(values).into_iter().fold(0.0, f64::min)
}

/// Drawdown from the running peak at every bar (0.0 at new highs).
pub fn drawdown_series(values: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    values
        .iter()
        .map(|&v| {
            if v > peak {
                peak = v;
            }
            if peak > 0.0 && v.is_finite() {
                (v - peak) / peak
            } else {
                0.0
            }
        })
        .collect()
}

/// Fraction of trades with positive PnL.
pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().filter(|t| t.is_winner()).count() as f64 / trades.len() as f64
}

/// Profit factor: gross profits / gross losses.
///
/// Capped at 100.0 for edge cases (all winners, zero losses).
pub fn profit_factor(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let gross_profit: f64 = trades.iter().filter(|t| t.pnl > 0.0).map(|t| t.pnl).sum();
    let gross_loss: f64 = trades.iter().filter(|t| t.pnl < 0.0).map(|t| t.pnl.abs()).sum();

    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { 100.0 } else { 0.0 };
    }
    (gross_profit / gross_loss).min(100.0)
}

/// Mean PnL per trade.
pub fn expectancy(trades: &[Trade]) -> f64 {
    mean_f64(&trades.iter().map(|t| t.pnl).collect::<Vec<_>>())
}

pub fn max_consecutive_wins(trades: &[Trade]) -> usize {
    max_consecutive(trades, true)
}

pub fn max_consecutive_losses(trades: &[Trade]) -> usize {
    max_consecutive(trades, false)
}

// ─── Helpers ────────────────────────────────────────────────────────

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

fn max_consecutive(trades: &[Trade], winners: bool) -> usize {
    let mut max_streak = 0;
    let mut current = 0;

    for trade in trades {
        if trade.is_winner() == winners {
            current += 1;
            max_streak = max_streak.max(current);
        } else {
            current = 0;
        }
    }
    max_streak
}
