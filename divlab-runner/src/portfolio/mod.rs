//! Signal-driven portfolio simulation.
//!
//! One symbol, one position at a time, long or short. Every fill happens at
//! the bar's close with no fees or slippage. Per bar:
//!
//! 1. Bars without a finite close are skipped; value carries forward.
//! 2. An open position (entered on an earlier bar) is checked against its
//!    stop-loss and take-profit levels at the close. A hit closes it and
//!    consumes the bar.
//! 3. Otherwise the bar's signals apply: simultaneous long and short entries
//!    cancel out, an opposite entry reverses, a same-side entry is ignored,
//!    and an exit for the held side closes it.

pub mod drawdown;
pub mod trade;

pub use drawdown::{drawdown_episodes, DrawdownEpisode, DrawdownStatus};
pub use trade::{Direction, ExitReason, Trade, TradeStatus};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use divlab_core::signals::SignalSet;

use crate::metrics::{self, PortfolioStats, TradeStats};
use trade::pnl_of;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("{what} has {actual} entries, expected {expected}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("cannot simulate an empty series")]
    EmptySeries,

    #[error("invalid simulation parameters: {0}")]
    InvalidParams(String),
}

/// Money management and stop levels for one simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    pub init_cash: f64,
    /// Units per entry, capped by available cash.
    pub size: f64,
    /// Take-profit distance as a fraction of entry price; 0 disables.
    pub tp_stop: f64,
    /// Stop-loss distance as a fraction of entry price; 0 disables.
    pub sl_stop: f64,
    pub periods_per_year: f64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            init_cash: 1000.0,
            size: 0.1,
            tp_stop: 0.0,
            sl_stop: 0.0,
            periods_per_year: 35_040.0,
        }
    }
}

impl SimulationParams {
    pub fn with_stops(mut self, tp_stop: f64, sl_stop: f64) -> Self {
        self.tp_stop = tp_stop;
        self.sl_stop = sl_stop;
        self
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        let invalid = |msg: String| Err(SimulationError::InvalidParams(msg));
        if !(self.init_cash.is_finite() && self.init_cash > 0.0) {
            return invalid(format!("init_cash must be positive, got {}", self.init_cash));
        }
        if !(self.size.is_finite() && self.size > 0.0) {
            return invalid(format!("size must be positive, got {}", self.size));
        }
        if !(self.tp_stop.is_finite() && self.tp_stop >= 0.0) {
            return invalid(format!("tp_stop must be >= 0, got {}", self.tp_stop));
        }
        if !(self.sl_stop.is_finite() && (0.0..1.0).contains(&self.sl_stop)) {
            return invalid(format!("sl_stop must be in [0, 1), got {}", self.sl_stop));
        }
        if !(self.periods_per_year.is_finite() && self.periods_per_year > 0.0) {
            return invalid(format!(
                "periods_per_year must be positive, got {}",
                self.periods_per_year
            ));
        }
        Ok(())
    }
}

/// An open position during simulation.
#[derive(Debug, Clone, Copy)]
struct OpenPosition {
    direction: Direction,
    size: f64,
    entry_idx: usize,
    entry_price: f64,
}

impl OpenPosition {
    fn stop_hit(&self, close: f64, params: &SimulationParams) -> Option<ExitReason> {
        let (sl, tp) = (params.sl_stop, params.tp_stop);
        let entry = self.entry_price;
        match self.direction {
            Direction::Long => {
                if sl > 0.0 && close <= entry * (1.0 - sl) {
                    Some(ExitReason::StopLoss)
                } else if tp > 0.0 && close >= entry * (1.0 + tp) {
                    Some(ExitReason::TakeProfit)
                } else {
                    None
                }
            }
            Direction::Short => {
                if sl > 0.0 && close >= entry * (1.0 + sl) {
                    Some(ExitReason::StopLoss)
                } else if tp > 0.0 && close <= entry * (1.0 - tp) {
                    Some(ExitReason::TakeProfit)
                } else {
                    None
                }
            }
        }
    }
}

/// Bar-by-bar state of one simulation run.
struct Simulator<'a> {
    params: &'a SimulationParams,
    timestamps: &'a [DateTime<Utc>],
    cash: f64,
    position: Option<OpenPosition>,
    trades: Vec<Trade>,
}

impl<'a> Simulator<'a> {
    fn open(&mut self, direction: Direction, idx: usize, price: f64) {
        let size = self.params.size.min(self.cash / price);
        if size.is_nan() || size <= 0.0 {
            return;
        }
        self.cash -= direction.sign() * size * price;
        self.position = Some(OpenPosition {
            direction,
            size,
            entry_idx: idx,
            entry_price: price,
        });
    }

    fn close(&mut self, idx: usize, price: f64, reason: ExitReason) {
        let Some(pos) = self.position.take() else {
            return;
        };
        self.cash += pos.direction.sign() * pos.size * price;
        let trade = self.trade(&pos, idx, price, reason, TradeStatus::Closed);
        self.trades.push(trade);
    }

    fn trade(
        &self,
        pos: &OpenPosition,
        idx: usize,
        price: f64,
        reason: ExitReason,
        status: TradeStatus,
    ) -> Trade {
        let pnl = pnl_of(pos.direction, pos.entry_price, price, pos.size);
        Trade {
            direction: pos.direction,
            entry_idx: pos.entry_idx,
            entry_time: self.timestamps[pos.entry_idx],
            entry_price: pos.entry_price,
            exit_idx: idx,
            exit_time: self.timestamps[idx],
            exit_price: price,
            size: pos.size,
            pnl,
            return_pct: pnl / (pos.entry_price * pos.size),
            exit_reason: reason,
            status,
        }
    }

    fn apply_signals(&mut self, signals: &SignalSet, t: usize, price: f64) {
        let long_entry = signals.long_entries[t];
        let short_entry = signals.short_entries[t];
        let held = self.position.map(|p| p.direction);

        match (long_entry, short_entry) {
            (true, true) => {}
            (true, false) => self.enter(Direction::Long, held, t, price),
            (false, true) => self.enter(Direction::Short, held, t, price),
            (false, false) => {
                let exit = match held {
                    Some(Direction::Long) => signals.long_exits[t],
                    Some(Direction::Short) => signals.short_exits[t],
                    None => false,
                };
                if exit {
                    self.close(t, price, ExitReason::Signal);
                }
            }
        }
    }

    fn enter(&mut self, direction: Direction, held: Option<Direction>, t: usize, price: f64) {
        match held {
            Some(side) if side == direction.opposite() => {
                self.close(t, price, ExitReason::Reverse);
                self.open(direction, t, price);
            }
            Some(_) => {}
            None => self.open(direction, t, price),
        }
    }

    fn value(&self, price: f64) -> f64 {
        let exposure = self
            .position
            .map_or(0.0, |p| p.direction.sign() * p.size * price);
        self.cash + exposure
    }
}

/// Result of a simulation: value curve, trade ledger and analytics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    params: SimulationParams,
    timestamps: Vec<DateTime<Utc>>,
    closes: Vec<f64>,
    values: Vec<f64>,
    returns: Vec<f64>,
    trades: Vec<Trade>,
}

/// Run one simulation over aligned closes, timestamps and signals.
pub fn simulate(
    closes: &[f64],
    timestamps: &[DateTime<Utc>],
    signals: &SignalSet,
    params: &SimulationParams,
) -> Result<Portfolio, SimulationError> {
    params.validate()?;
    let n = closes.len();
    if n == 0 {
        return Err(SimulationError::EmptySeries);
    }
    let check = |what: &'static str, actual: usize| {
        if actual == n {
            Ok(())
        } else {
            Err(SimulationError::LengthMismatch {
                what,
                expected: n,
                actual,
            })
        }
    };
    check("timestamps", timestamps.len())?;
    check("long_entries", signals.long_entries.len())?;
    check("long_exits", signals.long_exits.len())?;
    check("short_entries", signals.short_entries.len())?;
    check("short_exits", signals.short_exits.len())?;

    let mut sim = Simulator {
        params,
        timestamps,
        cash: params.init_cash,
        position: None,
        trades: Vec::new(),
    };
    let mut values = Vec::with_capacity(n);
    let mut last_value = params.init_cash;
    let mut last_priced: Option<(usize, f64)> = None;

    for (t, &price) in closes.iter().enumerate() {
        if !(price.is_finite() && price > 0.0) {
            values.push(last_value);
            continue;
        }

        let stop = sim
            .position
            .filter(|p| t > p.entry_idx)
            .and_then(|p| p.stop_hit(price, params));

        match stop {
            Some(reason) => sim.close(t, price, reason),
            None => sim.apply_signals(signals, t, price),
        }

        last_value = sim.value(price);
        last_priced = Some((t, price));
        values.push(last_value);
    }

    if let (Some(pos), Some((idx, price))) = (sim.position, last_priced) {
        let open = sim.trade(&pos, idx, price, ExitReason::Open, TradeStatus::Open);
        sim.trades.push(open);
    }

    let returns = metrics::bar_returns(&values, params.init_cash);
    Ok(Portfolio {
        params: *params,
        timestamps: timestamps.to_vec(),
        closes: closes.to_vec(),
        values,
        returns,
        trades: sim.trades,
    })
}

impl Portfolio {
    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Portfolio value (cash + marked position) at every bar.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn final_value(&self) -> f64 {
        self.values.last().copied().unwrap_or(self.params.init_cash)
    }

    /// All trades, closed first in exit order, then the open one (if any).
    pub fn positions(&self) -> &[Trade] {
        &self.trades
    }

    pub fn closed_trades(&self) -> impl Iterator<Item = &Trade> {
        self.trades.iter().filter(|t| t.is_closed())
    }

    pub fn total_return(&self) -> f64 {
        metrics::total_return(&self.values, self.params.init_cash)
    }

    pub fn sharpe_ratio(&self) -> f64 {
        metrics::sharpe_ratio(&self.returns, self.params.periods_per_year)
    }

    pub fn sortino_ratio(&self) -> f64 {
        metrics::sortino_ratio(&self.returns, self.params.periods_per_year)
    }

    pub fn max_drawdown(&self) -> f64 {
        metrics::max_drawdown(&self.values)
    }

    pub fn drawdown_series(&self) -> Vec<f64> {
        metrics::drawdown_series(&self.values)
    }

    pub fn drawdowns(&self) -> Vec<DrawdownEpisode> {
        drawdown_episodes(&self.values, &self.timestamps)
    }

    /// Buy-and-hold return between the first and last finite closes.
    pub fn benchmark_return(&self) -> f64 {
        let mut finite = self.closes.iter().copied().filter(|c| c.is_finite() && *c > 0.0);
        match (finite.next(), finite.last()) {
            (Some(first), Some(last)) => (last - first) / first,
            _ => 0.0,
        }
    }

    pub fn trade_stats(&self) -> TradeStats {
        TradeStats::compute(&self.trades)
    }

    pub fn stats(&self) -> PortfolioStats {
        let trades = self.trade_stats();
        PortfolioStats {
            start: self.timestamps.first().copied(),
            end: self.timestamps.last().copied(),
            bars: self.values.len(),
            init_cash: self.params.init_cash,
            end_value: self.final_value(),
            total_return: self.total_return(),
            benchmark_return: self.benchmark_return(),
            max_drawdown: self.max_drawdown(),
            sharpe_ratio: self.sharpe_ratio(),
            sortino_ratio: self.sortino_ratio(),
            total_trades: trades.total_trades,
            closed_trades: trades.closed_trades,
            open_trades: trades.open_trades,
            win_rate: trades.win_rate,
            profit_factor: trades.profit_factor,
            expectancy: trades.expectancy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stamps(n: usize) -> Vec<DateTime<Utc>> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| base + chrono::Duration::minutes(15 * i as i64)).collect()
    }

    fn flags(n: usize, on: &[usize]) -> Vec<bool> {
        (0..n).map(|i| on.contains(&i)).collect()
    }

    /// Signals with exits mirroring the opposite entries.
    fn mirrored(n: usize, longs: &[usize], shorts: &[usize]) -> SignalSet {
        SignalSet {
            long_entries: flags(n, longs),
            long_exits: flags(n, shorts),
            short_entries: flags(n, shorts),
            short_exits: flags(n, longs),
        }
    }

    fn run(closes: &[f64], signals: &SignalSet, tp: f64, sl: f64) -> Portfolio {
        let params = SimulationParams::default().with_stops(tp, sl);
        simulate(closes, &stamps(closes.len()), signals, &params).unwrap()
    }

    #[test]
    fn no_signals_keeps_cash() {
        let closes = [100.0, 101.0, 99.0];
        let pf = run(&closes, &mirrored(3, &[], &[]), 0.0, 0.0);
        assert_eq!(pf.values(), &[1000.0, 1000.0, 1000.0]);
        assert_eq!(pf.total_return(), 0.0);
        assert!(pf.positions().is_empty());
        assert_eq!(pf.sharpe_ratio(), 0.0);
    }

    #[test]
    fn long_round_trip_on_signals() {
        let closes = [100.0, 100.0, 110.0, 120.0];
        let pf = run(&closes, &mirrored(4, &[1], &[3]), 0.0, 0.0);
        // long 0.1 @100, reversed at 120 into a short that stays open
        let trades = pf.positions();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].direction, Direction::Long);
        assert_eq!(trades[0].exit_reason, ExitReason::Reverse);
        assert!((trades[0].pnl - 2.0).abs() < 1e-9);
        assert_eq!(trades[1].direction, Direction::Short);
        assert_eq!(trades[1].status, TradeStatus::Open);
        assert!((pf.values()[2] - 1001.0).abs() < 1e-9);
        assert!((pf.final_value() - 1002.0).abs() < 1e-9);
        assert!((pf.total_return() - 0.002).abs() < 1e-12);
    }

    #[test]
    fn exit_signal_closes_held_side() {
        let closes = [100.0, 100.0, 105.0, 103.0];
        let signals = SignalSet {
            long_entries: flags(4, &[1]),
            long_exits: flags(4, &[2]),
            short_entries: vec![false; 4],
            short_exits: vec![false; 4],
        };
        let pf = run(&closes, &signals, 0.0, 0.0);
        assert_eq!(pf.positions().len(), 1);
        assert_eq!(pf.positions()[0].exit_reason, ExitReason::Signal);
        assert_eq!(pf.positions()[0].exit_idx, 2);
        // flat after exit: value stays at 1000.5
        assert!((pf.values()[3] - 1000.5).abs() < 1e-9);
    }

    #[test]
    fn take_profit_checked_at_close() {
        let closes = [100.0, 100.0, 102.0, 103.5, 90.0];
        let pf = run(&closes, &mirrored(5, &[1], &[]), 0.03, 0.01);
        let t = &pf.positions()[0];
        assert_eq!(t.exit_reason, ExitReason::TakeProfit);
        assert_eq!(t.exit_idx, 3);
        assert!((t.exit_price - 103.5).abs() < 1e-12);
        assert!((pf.final_value() - 1000.35).abs() < 1e-9);
    }

    #[test]
    fn stop_loss_for_short() {
        let closes = [100.0, 100.0, 100.5, 101.5];
        let pf = run(&closes, &mirrored(4, &[], &[1]), 0.03, 0.01);
        let t = &pf.positions()[0];
        assert_eq!(t.direction, Direction::Short);
        assert_eq!(t.exit_reason, ExitReason::StopLoss);
        assert_eq!(t.exit_idx, 3);
        assert!((t.pnl + 0.15).abs() < 1e-9);
    }

    #[test]
    fn stop_not_checked_on_entry_bar() {
        // sl of 1% but entry bar itself can never trigger
        let closes = [100.0, 100.0];
        let pf = run(&closes, &mirrored(2, &[1], &[]), 0.0, 0.01);
        assert_eq!(pf.positions()[0].status, TradeStatus::Open);
    }

    #[test]
    fn stop_hit_consumes_the_bar() {
        // bar 3 hits SL and also carries a short entry: the entry is ignored
        let closes = [100.0, 100.0, 100.0, 98.0, 97.0];
        let pf = run(&closes, &mirrored(5, &[1], &[3]), 0.0, 0.01);
        assert_eq!(pf.positions().len(), 1);
        assert_eq!(pf.positions()[0].exit_reason, ExitReason::StopLoss);
        assert!((pf.values()[4] - pf.values()[3]).abs() < 1e-12);
    }

    #[test]
    fn conflicting_entries_are_ignored() {
        let closes = [100.0, 100.0, 101.0];
        let pf = run(&closes, &mirrored(3, &[1], &[1]), 0.0, 0.0);
        assert!(pf.positions().is_empty());
    }

    #[test]
    fn same_side_entry_does_not_pyramid() {
        let closes = [100.0, 100.0, 101.0, 102.0];
        let pf = run(&closes, &mirrored(4, &[1, 2], &[]), 0.0, 0.0);
        assert_eq!(pf.positions().len(), 1);
        assert!((pf.positions()[0].size - 0.1).abs() < 1e-12);
    }

    #[test]
    fn size_capped_by_cash() {
        let closes = [50_000.0, 50_000.0, 51_000.0];
        let pf = run(&closes, &mirrored(3, &[1], &[]), 0.0, 0.0);
        let t = &pf.positions()[0];
        assert!((t.size - 0.02).abs() < 1e-12);
        assert!((pf.final_value() - 1020.0).abs() < 1e-9);
    }

    #[test]
    fn nan_close_carries_value() {
        let closes = [100.0, 100.0, f64::NAN, 110.0];
        let pf = run(&closes, &mirrored(4, &[1], &[]), 0.0, 0.0);
        assert_eq!(pf.values()[2], pf.values()[1]);
        assert!((pf.values()[3] - 1001.0).abs() < 1e-9);
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let params = SimulationParams::default();
        let err = simulate(&[1.0, 2.0], &stamps(2), &mirrored(3, &[], &[]), &params).unwrap_err();
        assert!(matches!(err, SimulationError::LengthMismatch { what: "long_entries", .. }));
    }

    #[test]
    fn empty_series_is_rejected() {
        let err = simulate(&[], &[], &SignalSet::default(), &SimulationParams::default());
        assert_eq!(err.unwrap_err(), SimulationError::EmptySeries);
    }

    #[test]
    fn invalid_params_are_rejected() {
        let params = SimulationParams {
            init_cash: 0.0,
            ..SimulationParams::default()
        };
        let err = simulate(&[1.0], &stamps(1), &mirrored(1, &[], &[]), &params);
        assert!(matches!(err, Err(SimulationError::InvalidParams(_))));
    }

    #[test]
    fn stats_reflect_ledger() {
        let closes = [100.0, 100.0, 110.0, 105.0, 100.0, 95.0];
        let pf = run(&closes, &mirrored(6, &[1], &[3]), 0.0, 0.0);
        let stats = pf.stats();
        assert_eq!(stats.bars, 6);
        assert_eq!(stats.total_trades, 2);
        assert_eq!(stats.closed_trades, 1);
        assert_eq!(stats.open_trades, 1);
        assert!((stats.benchmark_return + 0.05).abs() < 1e-12);
        assert!(stats.max_drawdown < 0.0);
        assert_eq!(pf.drawdown_series().len(), 6);
    }
}
