//! Indicator pipeline: bar history → breakout boundaries and volatility.
//!
//! - `BreakoutChannel`: rolling high/low range and the open-anchored boundaries
//! - `IndicatorSet`: everything the scheduler needs for one bar
//! - `compute_indicators`: the whole series in one pass per indicator
//!
//! Channel values for bar `i` only ever look at bars `[i - lookback, i - 1]`.
//! ATR follows the running moving average recurrence and does include bar `i`.

pub mod atr;
pub mod channel;

use chrono::NaiveDate;

use crate::domain::error::BreakoutError;
use crate::domain::ohlcv::Bar;

pub use atr::{calc_atr, calc_true_range};
pub use channel::{calc_channel, BreakoutChannel};

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorParams {
    pub lookback_period: usize,
    pub range_mult: f64,
    pub atr_period: usize,
}

impl IndicatorParams {
    pub fn validate(&self) -> Result<(), BreakoutError> {
        if self.lookback_period == 0 {
            return Err(BreakoutError::invalid(
                "strategy",
                "lookback_period",
                "lookback_period must be positive",
            ));
        }
        if !(self.range_mult.is_finite() && self.range_mult > 0.0) {
            return Err(BreakoutError::invalid(
                "strategy",
                "range_mult",
                "range_mult must be positive",
            ));
        }
        if self.atr_period == 0 {
            return Err(BreakoutError::invalid(
                "strategy",
                "atr_period",
                "atr_period must be positive",
            ));
        }
        Ok(())
    }
}

/// Indicator values for a single bar. `None` means not enough history yet.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct IndicatorSet {
    pub date: NaiveDate,
    pub channel: Option<BreakoutChannel>,
    pub atr: Option<f64>,
}

impl IndicatorSet {
    pub fn upper_boundary(&self) -> Option<f64> {
        self.channel.as_ref().map(|c| c.upper_boundary)
    }

    pub fn lower_boundary(&self) -> Option<f64> {
        self.channel.as_ref().map(|c| c.lower_boundary)
    }
}

pub fn compute_indicators(
    bars: &[Bar],
    params: &IndicatorParams,
) -> Result<Vec<IndicatorSet>, BreakoutError> {
    params.validate()?;

    let channels = calc_channel(bars, params.lookback_period, params.range_mult);
    let atrs = calc_atr(bars, params.atr_period);

    Ok(bars
        .iter()
        .zip(channels)
        .zip(atrs)
        .map(|((bar, channel), atr)| IndicatorSet {
            date: bar.date,
            channel,
            atr,
        })
        .collect())
}
