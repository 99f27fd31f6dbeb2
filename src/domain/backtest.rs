//! Backtest engine and event loop.
//!
//! One `BacktestEngine` owns all mutable state of a run (ledger, queued signal,
//! logs), so independent runs can execute side by side on separate threads.

use chrono::NaiveDate;
use log::info;

use super::config_validation::validate_backtest_config;
use super::error::BreakoutError;
use super::execution::{ExecutionScheduler, FinalPendingSignal};
use super::indicator::{compute_indicators, IndicatorParams, IndicatorSet};
use super::ledger::{PositionLedger, TradeRecord};
use super::ohlcv::Bar;

/// Inclusive calendar window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub lookback_period: usize,
    pub range_mult: f64,
    pub stop_loss_mult: f64,
    pub atr_period: usize,
    pub initial_capital: f64,
    /// Fraction of notional, e.g. 0.001 for 0.1%.
    pub commission_rate: f64,
    /// Fraction of equity committed per entry, in (0, 1].
    pub position_pct_of_equity: f64,
    pub date_range: Option<DateRange>,
    pub final_pending_signal: FinalPendingSignal,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            lookback_period: 20,
            range_mult: 0.5,
            stop_loss_mult: 2.5,
            atr_period: 14,
            initial_capital: 100_000.0,
            commission_rate: 0.001,
            position_pct_of_equity: 0.99,
            date_range: None,
            final_pending_signal: FinalPendingSignal::Discard,
        }
    }
}

impl BacktestConfig {
    pub fn indicator_params(&self) -> IndicatorParams {
        IndicatorParams {
            lookback_period: self.lookback_period,
            range_mult: self.range_mult,
            atr_period: self.atr_period,
        }
    }
}

/// Equity marked at a bar's close.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EquityPoint {
    pub date: NaiveDate,
    /// Realized equity held by the ledger.
    pub equity: f64,
    pub unrealized_pnl: f64,
    pub total_equity: f64,
    /// Percent below the running peak of `total_equity`; zero or negative.
    pub drawdown_pct: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub trades: Vec<TradeRecord>,
    pub equity_curve: Vec<EquityPoint>,
    /// Per-bar indicator values, aligned with `equity_curve`.
    pub indicators: Vec<IndicatorSet>,
    pub final_equity: f64,
}

pub struct BacktestEngine {
    config: BacktestConfig,
    ledger: PositionLedger,
    scheduler: ExecutionScheduler,
    trades: Vec<TradeRecord>,
    equity_curve: Vec<EquityPoint>,
    peak_equity: Option<f64>,
}

impl BacktestEngine {
    /// Validates `config` up front; nothing is simulated on a bad config.
    pub fn new(config: BacktestConfig) -> Result<Self, BreakoutError> {
        validate_backtest_config(&config)?;
        Ok(BacktestEngine {
            ledger: PositionLedger::new(
                config.initial_capital,
                config.commission_rate,
                config.position_pct_of_equity,
            ),
            scheduler: ExecutionScheduler::new(config.stop_loss_mult),
            trades: Vec::new(),
            equity_curve: Vec::new(),
            peak_equity: None,
            config,
        })
    }

    /// Simulate over `bars` (ascending, unique dates) and hand back the logs.
    pub fn run(mut self, bars: &[Bar]) -> Result<BacktestResult, BreakoutError> {
        let bars = select_range(bars, self.config.date_range);
        let indicators = compute_indicators(bars, &self.config.indicator_params())?;

        if let (Some(first), Some(last)) = (bars.first(), bars.last()) {
            info!(
                "Running backtest: {} bars, {} to {}",
                bars.len(),
                first.date,
                last.date
            );
        } else {
            info!("Running backtest: no bars in range");
        }

        for (index, (bar, set)) in bars.iter().zip(&indicators).enumerate() {
            let fills = self.scheduler.on_bar(&mut self.ledger, bar, set, index)?;
            self.trades.extend(fills.records);
            self.mark_equity(bar);
        }

        if let Some(last) = bars.last() {
            let records = self.scheduler.finish(
                &mut self.ledger,
                last,
                bars.len() - 1,
                self.config.final_pending_signal,
            )?;
            self.trades.extend(records);
        }

        let final_equity = self.ledger.equity();
        info!(
            "Backtest complete: {} trades, final equity {:.2}",
            self.trades.len(),
            final_equity
        );

        Ok(BacktestResult {
            trades: self.trades,
            equity_curve: self.equity_curve,
            indicators,
            final_equity,
        })
    }

    fn mark_equity(&mut self, bar: &Bar) {
        let equity = self.ledger.equity();
        let unrealized_pnl = self.ledger.unrealized_pnl(bar.close);
        let total_equity = equity + unrealized_pnl;

        let peak = self.peak_equity.map_or(total_equity, |p| p.max(total_equity));
        self.peak_equity = Some(peak);
        let drawdown_pct = if peak > 0.0 {
            (total_equity - peak) / peak * 100.0
        } else {
            0.0
        };

        self.equity_curve.push(EquityPoint {
            date: bar.date,
            equity,
            unrealized_pnl,
            total_equity,
            drawdown_pct,
        });
    }
}

/// Convenience wrapper: validate, build a fresh engine, run.
pub fn run_backtest(bars: &[Bar], config: &BacktestConfig) -> Result<BacktestResult, BreakoutError> {
    BacktestEngine::new(config.clone())?.run(bars)
}

/// Bars are sorted, so the window is a contiguous sub-slice.
fn select_range(bars: &[Bar], range: Option<DateRange>) -> &[Bar] {
    match range {
        None => bars,
        Some(range) => {
            let start = bars.partition_point(|b| b.date < range.start);
            let end = bars.partition_point(|b| b.date <= range.end);
            &bars[start..end.max(start)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ledger::TradeAction;
    use approx::assert_relative_eq;

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(n)
    }

    fn flat_bars(n: usize, price: f64) -> Vec<Bar> {
        (0..n)
            .map(|i| Bar {
                date: day(i as i64),
                open: price,
                high: price,
                low: price,
                close: price,
                volume: 1.0,
            })
            .collect()
    }

    fn small_config() -> BacktestConfig {
        BacktestConfig {
            lookback_period: 3,
            atr_period: 2,
            ..BacktestConfig::default()
        }
    }

    #[test]
    fn default_matches_reference_strategy() {
        let c = BacktestConfig::default();
        assert_eq!(c.lookback_period, 20);
        assert_relative_eq!(c.range_mult, 0.5);
        assert_relative_eq!(c.stop_loss_mult, 2.5);
        assert_eq!(c.atr_period, 14);
        assert_relative_eq!(c.initial_capital, 100_000.0);
        assert_relative_eq!(c.commission_rate, 0.001);
        assert_relative_eq!(c.position_pct_of_equity, 0.99);
        assert_eq!(c.final_pending_signal, FinalPendingSignal::Discard);
    }

    #[test]
    fn invalid_config_fails_before_running() {
        let config = BacktestConfig {
            atr_period: 0,
            ..small_config()
        };
        assert!(matches!(
            BacktestEngine::new(config),
            Err(BreakoutError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn one_equity_point_per_bar() {
        let result = run_backtest(&flat_bars(10, 50.0), &small_config()).unwrap();
        assert_eq!(result.equity_curve.len(), 10);
        assert_eq!(result.indicators.len(), 10);
        assert!(result.trades.is_empty());
        assert_relative_eq!(result.final_equity, 100_000.0);
    }

    #[test]
    fn empty_series_returns_initial_capital() {
        let result = run_backtest(&[], &small_config()).unwrap();
        assert!(result.trades.is_empty());
        assert!(result.equity_curve.is_empty());
        assert_relative_eq!(result.final_equity, 100_000.0);
    }

    #[test]
    fn date_range_trims_series() {
        let config = BacktestConfig {
            date_range: Some(DateRange {
                start: day(2),
                end: day(5),
            }),
            ..small_config()
        };
        let result = run_backtest(&flat_bars(10, 50.0), &config).unwrap();
        assert_eq!(result.equity_curve.len(), 4);
        assert_eq!(result.equity_curve[0].date, day(2));
        assert_eq!(result.equity_curve[3].date, day(5));
    }

    #[test]
    fn date_range_outside_series_is_empty() {
        let config = BacktestConfig {
            date_range: Some(DateRange {
                start: day(100),
                end: day(200),
            }),
            ..small_config()
        };
        let result = run_backtest(&flat_bars(10, 50.0), &config).unwrap();
        assert!(result.equity_curve.is_empty());
    }

    #[test]
    fn equity_point_marks_open_position() {
        let mut bars = flat_bars(8, 100.0);
        bars[4].high = 120.0;
        bars[6].close = 110.0;
        let result = run_backtest(&bars, &small_config()).unwrap();

        assert_eq!(result.trades[0].action, TradeAction::Long);
        assert_eq!(result.trades[0].bar_index, 5);

        let entry = &result.trades[0];
        let point = &result.equity_curve[6];
        assert_relative_eq!(point.equity, entry.equity_after);
        assert_relative_eq!(point.unrealized_pnl, 10.0 * entry.size);
        assert_relative_eq!(point.total_equity, point.equity + point.unrealized_pnl);
    }

    #[test]
    fn drawdown_tracks_running_peak() {
        let mut bars = flat_bars(8, 100.0);
        bars[4].high = 120.0;
        bars[6].close = 110.0;
        bars[7].close = 105.0;
        let result = run_backtest(&bars, &small_config()).unwrap();

        let curve = &result.equity_curve;
        assert!(curve.iter().all(|p| p.drawdown_pct <= 0.0));
        assert_eq!(curve[6].drawdown_pct, 0.0);
        let expected = (curve[7].total_equity - curve[6].total_equity) / curve[6].total_equity * 100.0;
        assert_relative_eq!(curve[7].drawdown_pct, expected);
    }

    #[test]
    fn date_range_contains_is_inclusive() {
        let range = DateRange {
            start: day(0),
            end: day(2),
        };
        assert!(range.contains(day(0)));
        assert!(range.contains(day(2)));
        assert!(!range.contains(day(3)));
    }
}
