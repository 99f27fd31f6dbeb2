//! Breakout channel: highest high / lowest low of the previous `lookback` bars.
//!
//! upper = open[i] + range * mult, lower = open[i] - range * mult.
//! Warmup: the first `lookback` bars have no channel.

use crate::domain::ohlcv::Bar;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BreakoutChannel {
    pub highest_high: f64,
    pub lowest_low: f64,
    pub breakout_range: f64,
    pub upper_boundary: f64,
    pub lower_boundary: f64,
}

pub fn calc_channel(bars: &[Bar], lookback: usize, range_mult: f64) -> Vec<Option<BreakoutChannel>> {
    if lookback == 0 {
        return vec![None; bars.len()];
    }

    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            if i < lookback {
                return None;
            }
            let window = &bars[i - lookback..i];
            let highest_high = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
            let lowest_low = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
            let breakout_range = highest_high - lowest_low;
            Some(BreakoutChannel {
                highest_high,
                lowest_low,
                breakout_range,
                upper_boundary: bar.open + breakout_range * range_mult,
                lower_boundary: bar.open - breakout_range * range_mult,
            })
        })
        .collect()
}
