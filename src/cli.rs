//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{BacktestConfig, BacktestEngine, BacktestResult, DateRange};
use crate::domain::config_validation::validate_backtest_config;
use crate::domain::error::BreakoutError;
use crate::domain::execution::FinalPendingSignal;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "breakout", about = "Daily breakout strategy simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest over a CSV bar file
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: PathBuf,
        /// Print every trade record to stdout
        #[arg(long)]
        trades: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the date range of a CSV bar file
    Info {
        #[arg(short, long)]
        data: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            data,
            trades,
        } => run_backtest(&config, &data, trades),
        Command::Validate { config } => run_validate(&config),
        Command::Info { data } => run_info(&data),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = BreakoutError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn run_backtest(config_path: &PathBuf, data_path: &PathBuf, show_trades: bool) -> ExitCode {
    info!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    info!("Loading bars from {}", data_path.display());
    let data_port = CsvAdapter::new(data_path.clone());
    run_backtest_pipeline(&data_port, &bt_config, show_trades)
}

fn get_period(
    adapter: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, BreakoutError> {
    let Some(value) = adapter.get_int(section, key)? else {
        return Ok(default);
    };
    usize::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| BreakoutError::ConfigInvalid {
            section: section.into(),
            key: key.into(),
            reason: format!("{key} must be positive"),
        })
}

fn get_double(
    adapter: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, BreakoutError> {
    Ok(adapter.get_double(section, key)?.unwrap_or(default))
}

fn get_date(adapter: &dyn ConfigPort, key: &str) -> Result<Option<NaiveDate>, BreakoutError> {
    match adapter.get_string("backtest", key) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| BreakoutError::ConfigInvalid {
                section: "backtest".into(),
                key: key.into(),
                reason: "invalid date format (expected YYYY-MM-DD)".into(),
            }),
    }
}

/// Read a `BacktestConfig` from INI sections, falling back to the reference
/// defaults, and validate it.
pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, BreakoutError> {
    let defaults = BacktestConfig::default();

    let date_range = match (get_date(adapter, "start_date")?, get_date(adapter, "end_date")?) {
        (None, None) => None,
        (Some(start), Some(end)) => Some(DateRange { start, end }),
        (Some(_), None) => {
            return Err(BreakoutError::ConfigMissing {
                section: "backtest".into(),
                key: "end_date".into(),
            });
        }
        (None, Some(_)) => {
            return Err(BreakoutError::ConfigMissing {
                section: "backtest".into(),
                key: "start_date".into(),
            });
        }
    };

    let final_pending_signal = match adapter.get_string("backtest", "final_pending_signal") {
        None => defaults.final_pending_signal,
        Some(s) => s
            .parse::<FinalPendingSignal>()
            .map_err(|reason| BreakoutError::ConfigInvalid {
                section: "backtest".into(),
                key: "final_pending_signal".into(),
                reason,
            })?,
    };

    let config = BacktestConfig {
        lookback_period: get_period(adapter, "strategy", "lookback_period", defaults.lookback_period)?,
        range_mult: get_double(adapter, "strategy", "range_mult", defaults.range_mult)?,
        stop_loss_mult: get_double(adapter, "strategy", "stop_loss_mult", defaults.stop_loss_mult)?,
        atr_period: get_period(adapter, "strategy", "atr_period", defaults.atr_period)?,
        initial_capital: get_double(adapter, "backtest", "initial_capital", defaults.initial_capital)?,
        commission_rate: get_double(adapter, "backtest", "commission_rate", defaults.commission_rate)?,
        position_pct_of_equity: get_double(
            adapter,
            "backtest",
            "position_pct_of_equity",
            defaults.position_pct_of_equity,
        )?,
        date_range,
        final_pending_signal,
    };

    validate_backtest_config(&config)?;
    Ok(config)
}

pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    bt_config: &BacktestConfig,
    show_trades: bool,
) -> ExitCode {
    let bars = match data_port.fetch_bars() {
        Ok(b) => b,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    if bars.is_empty() {
        eprintln!("error: no bars to backtest");
        return ExitCode::from(3);
    }

    let result = match BacktestEngine::new(bt_config.clone()).and_then(|engine| engine.run(&bars)) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if show_trades {
        print_trades(&result);
    }
    print_summary(&result, bt_config);
    ExitCode::SUCCESS
}

fn print_trades(result: &BacktestResult) {
    println!(
        "{:>5}  {:<10}  {:<11}  {:>12}  {:>14}  {:>12}  {:>10}  {:>14}  reason",
        "id", "date", "action", "price", "size", "pnl", "commission", "equity"
    );
    for t in &result.trades {
        println!(
            "{:>5}  {:<10}  {:<11}  {:>12.2}  {:>14.6}  {:>12.2}  {:>10.2}  {:>14.2}  {}",
            t.id,
            t.date,
            t.action.to_string(),
            t.execution_price,
            t.size,
            t.pnl,
            t.commission,
            t.equity_after,
            t.reason
        );
    }
}

fn print_summary(result: &BacktestResult, bt_config: &BacktestConfig) {
    let total_return = (result.final_equity / bt_config.initial_capital - 1.0) * 100.0;
    let (start, end) = match (result.equity_curve.first(), result.equity_curve.last()) {
        (Some(f), Some(l)) => (f.date.to_string(), l.date.to_string()),
        _ => ("-".to_string(), "-".to_string()),
    };

    eprintln!("\n=== Results ===");
    eprintln!("Period:           {} to {}", start, end);
    eprintln!("Bars:             {}", result.equity_curve.len());
    eprintln!("Initial Capital:  {:.2}", bt_config.initial_capital);
    eprintln!("Final Equity:     {:.2}", result.final_equity);
    eprintln!("Total Return:     {:.2}%", total_return);
    eprintln!("Trade Records:    {}", result.trades.len());
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!(
        "  lookback_period={} range_mult={} stop_loss_mult={} atr_period={}",
        config.lookback_period, config.range_mult, config.stop_loss_mult, config.atr_period
    );
    eprintln!(
        "  initial_capital={} commission_rate={} position_pct_of_equity={}",
        config.initial_capital, config.commission_rate, config.position_pct_of_equity
    );
    if let Some(range) = config.date_range {
        eprintln!("  date_range={} to {}", range.start, range.end);
    }
    eprintln!("  final_pending_signal={:?}", config.final_pending_signal);
    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_info(data_path: &PathBuf) -> ExitCode {
    let adapter = CsvAdapter::new(data_path.clone());
    match adapter.data_range() {
        Ok(Some((first, last, count))) => {
            println!("{}: {} bars, {} to {}", data_path.display(), count, first, last);
            ExitCode::SUCCESS
        }
        Ok(None) => {
            let err = BreakoutError::NoData {
                path: data_path.display().to_string(),
            };
            eprintln!("error: {err}");
            (&err).into()
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}
