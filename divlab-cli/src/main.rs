//! DivLab CLI: manual backtest and TP/SL sweep commands.
//!
//! Commands:
//! - `manual`: backtest one symbol with one take-profit / stop-loss pair
//! - `sweep`: run the TP x SL grid over a symbol list and rank by total return

mod charts;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use divlab_core::data::{CircuitBreaker, DataProvider, LogProgress, SyntheticProvider, YahooProvider};
use divlab_core::domain::{Interval, Period};
use divlab_runner::export::{save_manual, save_sweep};
use divlab_runner::{run_manual, run_sweep, DivLabConfig, ManualReport, SweepReport};

const DEFAULT_SYMBOLS: &str = "BTC-USD,ETH-USD,LTC-USD,SOL-USD,BNB-USD";
const LABEL_WIDTH: usize = 17;

#[derive(Parser)]
#[command(
    name = "divlab",
    about = "DivLab CLI: WaveTrend + RSI divergence backtester"
)]
struct Cli {
    /// Path to a TOML config file. Flags override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Bar interval (1m, 5m, 15m, 1h, 1d, ...).
    #[arg(long, global = true)]
    interval: Option<Interval>,

    /// Lookback period (1d, 5d, 1mo, 3mo, ...).
    #[arg(long, global = true)]
    period: Option<Period>,

    /// Use deterministic synthetic bars instead of Yahoo Finance.
    #[arg(long, global = true, default_value_t = false)]
    synthetic: bool,

    /// Write JSON and CSV artifacts under this directory.
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Verbose logging (debug level unless RUST_LOG is set).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest one symbol with a single take-profit / stop-loss pair.
    Manual {
        /// Symbol to backtest (e.g., BTC-USD).
        #[arg(default_value = "BTC-USD")]
        symbol: String,

        /// Take-profit ratio, e.g. 0.03 for 3%.
        #[arg(long)]
        tp: Option<f64>,

        /// Stop-loss ratio, e.g. 0.01 for 1%.
        #[arg(long)]
        sl: Option<f64>,

        /// Skip the inline value and drawdown charts.
        #[arg(long, default_value_t = false)]
        no_charts: bool,
    },
    /// Sweep the TP x SL grid over many symbols and rank by total return.
    Sweep {
        /// Comma-separated symbols (at most 50 are used).
        #[arg(long, value_delimiter = ',', default_value = DEFAULT_SYMBOLS)]
        symbols: Vec<String>,

        /// Number of top records to report.
        #[arg(long)]
        top: Option<usize>,

        /// Run grid points on the calling thread only.
        #[arg(long, default_value_t = false)]
        sequential: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => DivLabConfig::load(path)?,
        None => DivLabConfig::default(),
    };
    if let Some(interval) = cli.interval {
        config.interval = interval;
    }
    if let Some(period) = cli.period {
        config.period = period;
    }

    let provider = build_provider(cli.synthetic)?;

    match cli.command {
        Commands::Manual {
            symbol,
            tp,
            sl,
            no_charts,
        } => {
            if let Some(tp) = tp {
                config.manual.take_profit = tp;
            }
            if let Some(sl) = sl {
                config.manual.stop_loss = sl;
            }
            run_manual_cmd(&config, provider.as_ref(), &symbol, cli.output_dir, !no_charts)
        }
        Commands::Sweep {
            symbols,
            top,
            sequential,
        } => {
            if let Some(top) = top {
                config.sweep.top_n = top;
            }
            if sequential {
                config.sweep.parallel = false;
            }
            run_sweep_cmd(&config, provider.as_ref(), &symbols, cli.output_dir)
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn build_provider(synthetic: bool) -> Result<Box<dyn DataProvider>> {
    let provider: Box<dyn DataProvider> = if synthetic {
        Box::new(SyntheticProvider::new())
    } else {
        let circuit_breaker = Arc::new(CircuitBreaker::default_provider());
        Box::new(YahooProvider::new(circuit_breaker).context("failed to build HTTP client")?)
    };
    info!(provider = provider.name(), "data provider ready");
    Ok(provider)
}

fn run_manual_cmd(
    config: &DivLabConfig,
    provider: &dyn DataProvider,
    symbol: &str,
    output_dir: Option<PathBuf>,
    charts: bool,
) -> Result<()> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        bail!("symbol must not be empty");
    }
    info!(
        symbol,
        tp = config.manual.take_profit,
        sl = config.manual.stop_loss,
        "manual command started"
    );

    let report = run_manual(
        config,
        provider,
        symbol,
        config.manual.take_profit,
        config.manual.stop_loss,
        Some(&LogProgress),
    )?;

    print_manual_summary(&report);
    print_positions(&report);
    print_drawdowns(&report);

    if charts && charts::stdout_is_terminal() && !report.values.is_empty() {
        charts::draw_manual(&report)?;
    }

    if let Some(dir) = output_dir {
        let run_dir = save_manual(&report, &dir)?;
        info!(dir = %run_dir.display(), "manual artifacts written");
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn run_sweep_cmd(
    config: &DivLabConfig,
    provider: &dyn DataProvider,
    symbols: &[String],
    output_dir: Option<PathBuf>,
) -> Result<()> {
    info!(
        requested = symbols.len(),
        parallel = config.sweep.parallel,
        top_n = config.sweep.top_n,
        "sweep command started"
    );
    let report = run_sweep(config, provider, symbols, Some(&LogProgress))?;

    print_sweep(&report);

    if let Some(dir) = output_dir {
        let run_dir = save_sweep(&report, &dir)?;
        info!(dir = %run_dir.display(), "sweep artifacts written");
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn pct(v: f64) -> String {
    format!("{:.2}%", v * 100.0)
}

/// `Label:` padded to a fixed column, then the value.
fn field(label: &str, value: impl std::fmt::Display) -> String {
    format!("{:<width$}{value}", format!("{label}:"), width = LABEL_WIDTH)
}

fn print_manual_summary(report: &ManualReport) {
    let s = &report.stats;
    let t = &report.trade_stats;
    println!();
    println!("=== Manual Backtest ===");
    println!("{}", field("Symbol", &report.symbol));
    println!(
        "{}",
        field("Interval", format!("{} over {}", report.interval, report.period))
    );
    if let (Some(start), Some(end)) = (s.start, s.end) {
        let range = format!(
            "{} to {}",
            start.format("%Y-%m-%d %H:%M"),
            end.format("%Y-%m-%d %H:%M")
        );
        println!("{}", field("Range", range));
    }
    println!("{}", field("Bars", s.bars));
    println!(
        "{}",
        field("TP / SL", format!("{} / {}", pct(report.tp_ratio), pct(report.sl_ratio)))
    );
    println!(
        "{}",
        field(
            "Signals",
            format!("{} long, {} short", report.long_signals, report.short_signals)
        )
    );
    println!();
    println!("--- Performance ---");
    println!("{}", field("Start Value", format!("{:.2}", s.init_cash)));
    println!("{}", field("End Value", format!("{:.2}", s.end_value)));
    println!("{}", field("Total Return", pct(s.total_return)));
    println!("{}", field("Benchmark", pct(s.benchmark_return)));
    println!("{}", field("Max Drawdown", pct(s.max_drawdown)));
    println!("{}", field("Sharpe", format!("{:.3}", s.sharpe_ratio)));
    println!("{}", field("Sortino", format!("{:.3}", s.sortino_ratio)));
    println!();
    println!("--- Trades ---");
    println!(
        "{}",
        field(
            "Total",
            format!(
                "{} ({} closed, {} open)",
                t.total_trades, t.closed_trades, t.open_trades
            )
        )
    );
    println!("{}", field("Win Rate", pct(t.win_rate)));
    println!("{}", field("Profit Factor", format!("{:.2}", t.profit_factor)));
    println!("{}", field("Expectancy", format!("{:.4}", t.expectancy)));
    println!(
        "{}",
        field("Best / Worst", format!("{} / {}", pct(t.best_return), pct(t.worst_return)))
    );
    println!("{}", field("Avg Bars Held", format!("{:.1}", t.avg_bars_held)));
    println!("{}", field("Max Consec Win", t.max_consecutive_wins));
    println!("{}", field("Max Consec Loss", t.max_consecutive_losses));
    if report.synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    println!();
}

fn print_positions(report: &ManualReport) {
    if report.positions.is_empty() {
        println!("No positions opened.");
        println!();
        return;
    }
    println!(
        "{:<6} {:<17} {:>12} {:<17} {:>12} {:>10} {:>8} {:<11}",
        "Side", "Entry", "Price", "Exit", "Price", "PnL", "Return", "Reason"
    );
    println!("{}", "-".repeat(100));
    for t in &report.positions {
        println!(
            "{:<6} {:<17} {:>12.4} {:<17} {:>12.4} {:>10.4} {:>8} {:<11}",
            format!("{:?}", t.direction),
            t.entry_time.format("%Y-%m-%d %H:%M").to_string(),
            t.entry_price,
            t.exit_time.format("%Y-%m-%d %H:%M").to_string(),
            t.exit_price,
            t.pnl,
            pct(t.return_pct),
            format!("{:?}", t.exit_reason),
        );
    }
    println!();
}

fn print_drawdowns(report: &ManualReport) {
    if report.drawdowns.is_empty() {
        return;
    }
    let mut worst: Vec<_> = report.drawdowns.iter().collect();
    worst.sort_by(|a, b| a.drawdown.total_cmp(&b.drawdown));

    println!("Worst drawdowns:");
    println!(
        "{:<17} {:<17} {:<17} {:>9} {:>6} {:<9}",
        "Peak", "Valley", "End", "Drawdown", "Bars", "Status"
    );
    println!("{}", "-".repeat(80));
    for d in worst.into_iter().take(5) {
        println!(
            "{:<17} {:<17} {:<17} {:>9} {:>6} {:<9}",
            d.peak_time.format("%Y-%m-%d %H:%M").to_string(),
            d.valley_time.format("%Y-%m-%d %H:%M").to_string(),
            d.end_time.format("%Y-%m-%d %H:%M").to_string(),
            pct(d.drawdown),
            d.duration_bars(),
            format!("{:?}", d.status),
        );
    }
    println!();
}

fn print_sweep(report: &SweepReport) {
    println!();
    println!("=== TP/SL Sweep ===");
    println!("{}", field("Symbols", report.symbols.join(", ")));
    println!(
        "{}",
        field("Interval", format!("{} over {}", report.interval, report.period))
    );
    let grid = format!(
        "{} TP x {} SL = {} points per symbol",
        report.grid.take_profits.len(),
        report.grid.stop_losses.len(),
        report.grid.len()
    );
    println!("{}", field("Grid", grid));
    println!("{}", field("Simulations", report.records.len()));
    if report.synthetic {
        println!("WARNING: Results based on SYNTHETIC data");
    }
    println!();
    println!("Top {} by total return:", report.top.len());
    println!(
        "{:>4} {:<12} {:>7} {:>7} {:>12} {:>8} {:>12}",
        "#", "Symbol", "TP", "SL", "Return", "Sharpe", "Max DD"
    );
    println!("{}", "-".repeat(68));
    for (rank, r) in report.top.iter().enumerate() {
        println!(
            "{:>4} {:<12} {:>7} {:>7} {:>12} {:>8.3} {:>12}",
            rank + 1,
            r.symbol,
            pct(r.tp_ratio),
            pct(r.sl_ratio),
            pct(r.total_return),
            r.sharpe_ratio,
            pct(r.max_drawdown),
        );
    }
    println!();
}
