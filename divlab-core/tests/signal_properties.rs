//! Property tests for the divergence signal generator.
//!
//! Uses proptest to verify:
//! 1. Bar 0 never carries a signal
//! 2. Entries are the raw divergence delayed by exactly one bar
//! 3. Exits are the opposite side's entries
//! 4. Signals at bar t do not change when later bars are appended

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use divlab_core::domain::{Bar, Interval, PriceSeries};
use divlab_core::indicators::Oscillators;
use divlab_core::signals::{
    detect_divergence, generate_signals, signals_from_oscillators, StrategyParams,
};

// ── Helpers ──────────────────────────────────────────────────────────

fn series_from_closes(closes: &[f64]) -> PriceSeries {
    let base = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: base + chrono::Duration::minutes(15 * i as i64),
                open,
                high: open.max(close) * 1.002,
                low: open.min(close) * 0.998,
                close,
                volume: 100.0,
            }
        })
        .collect();
    PriceSeries::new("PROP-USD", Interval::M15, bars)
}

fn arb_closes() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-3.0..3.0_f64, 2..250).prop_map(|steps| {
        let mut price = 100.0;
        steps
            .into_iter()
            .map(|s| {
                price = (price * (1.0 + s / 100.0)).max(1.0);
                price
            })
            .collect()
    })
}

fn arb_oscillators(n: usize) -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    (
        prop::collection::vec(-100.0..100.0_f64, n),
        prop::collection::vec(0.0..100.0_f64, n),
    )
}

fn arb_case() -> impl Strategy<Value = (Vec<f64>, Vec<f64>, Vec<f64>)> {
    arb_closes().prop_flat_map(|closes| {
        let n = closes.len();
        (Just(closes), arb_oscillators(n)).prop_map(|(c, (wt2, rsi))| (c, wt2, rsi))
    })
}

// ── Properties ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn first_bar_never_signals(closes in arb_closes()) {
        let s = generate_signals(&series_from_closes(&closes), &StrategyParams::default()).unwrap();
        prop_assert_eq!(s.len(), closes.len());
        prop_assert!(!s.long_entries[0]);
        prop_assert!(!s.long_exits[0]);
        prop_assert!(!s.short_entries[0]);
        prop_assert!(!s.short_exits[0]);
    }

    #[test]
    fn entries_are_raw_divergence_shifted_one_bar((closes, wt2, rsi) in arb_case()) {
        let params = StrategyParams::default();
        let osc = Oscillators { wt1: wt2.clone(), wt2: wt2.clone(), rsi: rsi.clone() };
        let s = signals_from_oscillators(&closes, &osc, &params).unwrap();

        let wt = detect_divergence(&closes, &wt2, params.wavetrend_levels).unwrap();
        let r = detect_divergence(&closes, &rsi, params.rsi_levels).unwrap();
        for t in 1..closes.len() {
            prop_assert_eq!(s.long_entries[t], wt.bullish[t - 1] || r.bullish[t - 1]);
            prop_assert_eq!(s.short_entries[t], wt.bearish[t - 1] || r.bearish[t - 1]);
        }
    }

    #[test]
    fn exits_mirror_opposite_entries((closes, wt2, rsi) in arb_case()) {
        let osc = Oscillators { wt1: wt2.clone(), wt2, rsi };
        let s = signals_from_oscillators(&closes, &osc, &StrategyParams::default()).unwrap();
        prop_assert_eq!(&s.long_exits, &s.short_entries);
        prop_assert_eq!(&s.short_exits, &s.long_entries);
    }

    #[test]
    fn appending_bars_does_not_rewrite_history(closes in arb_closes(), cut in 0.2..0.9_f64) {
        let split = ((closes.len() as f64 * cut) as usize).max(1);
        let params = StrategyParams::default();
        let full = generate_signals(&series_from_closes(&closes), &params).unwrap();
        let head = generate_signals(&series_from_closes(&closes[..split]), &params).unwrap();
        prop_assert_eq!(&full.long_entries[..split], &head.long_entries[..]);
        prop_assert_eq!(&full.short_entries[..split], &head.short_entries[..]);
    }
}

// ── Worked examples ──────────────────────────────────────────────────

#[test]
fn rsi_zone_example_fires_then_shifts() {
    let closes = [100.0, 99.0, 98.0, 97.0];
    let osc = Oscillators {
        wt1: vec![0.0; 4],
        wt2: vec![0.0; 4],
        rsi: vec![10.0, 20.0, 25.0, 25.0],
    };
    let s = signals_from_oscillators(&closes, &osc, &StrategyParams::default()).unwrap();
    assert_eq!(s.long_entries, vec![false, false, true, true]);
    assert_eq!(s.short_exits, s.long_entries);
}

#[test]
fn flat_market_never_signals() {
    let s = generate_signals(&series_from_closes(&[100.0; 60]), &StrategyParams::default()).unwrap();
    assert_eq!(s.signal_count(), (0, 0));
}
