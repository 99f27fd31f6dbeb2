#![allow(dead_code)]

use breakout::domain::backtest::BacktestConfig;
use breakout::domain::error::BreakoutError;
pub use breakout::domain::ohlcv::Bar;
use breakout::ports::data_port::DataPort;
use chrono::NaiveDate;

pub struct MockDataPort {
    pub bars: Vec<Bar>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            bars: Vec::new(),
            error: None,
        }
    }

    pub fn with_bars(mut self, bars: Vec<Bar>) -> Self {
        self.bars = bars;
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self) -> Result<Vec<Bar>, BreakoutError> {
        if let Some(reason) = &self.error {
            return Err(BreakoutError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self.bars.clone())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn day(n: usize) -> NaiveDate {
    date(2024, 1, 1) + chrono::Duration::days(n as i64)
}

pub fn make_bar(n: usize, open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar {
        date: day(n),
        open,
        high,
        low,
        close,
        volume: 1000.0,
    }
}

/// `count` bars all trading exactly at `price`.
pub fn constant_bars(count: usize, price: f64) -> Vec<Bar> {
    (0..count)
        .map(|i| make_bar(i, price, price, price, price))
        .collect()
}

/// Gentle zig-zag around `base`, enough to give ATR something to chew on.
pub fn wavy_bars(count: usize, base: f64) -> Vec<Bar> {
    (0..count)
        .map(|i| {
            let drift = ((i % 7) as f64 - 3.0) * 0.5;
            let open = base + drift;
            make_bar(i, open, open + 1.0, open - 1.0, open + 0.25)
        })
        .collect()
}

pub fn config(lookback_period: usize) -> BacktestConfig {
    BacktestConfig {
        lookback_period,
        atr_period: 14,
        ..BacktestConfig::default()
    }
}
