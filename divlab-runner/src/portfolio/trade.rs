//! Trade: one position from entry to exit (or still open at the last bar).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1 for long, -1 for short.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExitReason {
    /// Exit signal for the held side.
    Signal,
    /// Closed by an entry on the opposite side.
    Reverse,
    StopLoss,
    TakeProfit,
    /// Still open at the end of the series; marked to the last close.
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub direction: Direction,

    pub entry_idx: usize,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,

    pub exit_idx: usize,
    pub exit_time: DateTime<Utc>,
    pub exit_price: f64,

    pub size: f64,
    pub pnl: f64,
    /// PnL as a fraction of the entry notional.
    pub return_pct: f64,

    pub exit_reason: ExitReason,
    pub status: TradeStatus,
}

impl Trade {
    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }

    pub fn is_closed(&self) -> bool {
        self.status == TradeStatus::Closed
    }

    pub fn bars_held(&self) -> usize {
        self.exit_idx.saturating_sub(self.entry_idx)
    }
}

/// Profit of `size` units moved from `entry` to `exit` in `direction`.
pub(crate) fn pnl_of(direction: Direction, entry: f64, exit: f64, size: f64) -> f64 {
    direction.sign() * (exit - entry) * size
}
