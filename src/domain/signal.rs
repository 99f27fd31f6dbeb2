//! Breakout signal detection.
//!
//! A signal is an intent to trade at the next bar's open, never a fill. When a
//! single bar pierces both boundaries the side whose extreme sits further from
//! the bar's open wins; an exact tie goes to the long side.

use std::fmt;

use crate::domain::indicator::IndicatorSet;
use crate::domain::ohlcv::Bar;
use crate::domain::position::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SignalKind {
    LongBreakout,
    ShortBreakout,
}

impl SignalKind {
    pub fn direction(self) -> Direction {
        match self {
            SignalKind::LongBreakout => Direction::Long,
            SignalKind::ShortBreakout => Direction::Short,
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalKind::LongBreakout => write!(f, "LONG_BREAKOUT"),
            SignalKind::ShortBreakout => write!(f, "SHORT_BREAKOUT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Signal {
    pub kind: SignalKind,
    /// Index of the bar whose range breached the boundary.
    pub detected_at: usize,
}

/// Check one bar against its boundaries. Returns `None` during warmup.
pub fn detect(bar: &Bar, indicators: &IndicatorSet, index: usize) -> Option<Signal> {
    let channel = indicators.channel.as_ref()?;

    let long_breakout = bar.high > channel.upper_boundary;
    let short_breakout = bar.low < channel.lower_boundary;

    let kind = match (long_breakout, short_breakout) {
        (false, false) => return None,
        (true, false) => SignalKind::LongBreakout,
        (false, true) => SignalKind::ShortBreakout,
        (true, true) => {
            if bar.high - bar.open >= bar.open - bar.low {
                SignalKind::LongBreakout
            } else {
                SignalKind::ShortBreakout
            }
        }
    };

    Some(Signal {
        kind,
        detected_at: index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::BreakoutChannel;
    use chrono::NaiveDate;

    fn bar(open: f64, high: f64, low: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            open,
            high,
            low,
            close: open,
            volume: 0.0,
        }
    }

    fn indicators(upper: f64, lower: f64) -> IndicatorSet {
        IndicatorSet {
            date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            channel: Some(BreakoutChannel {
                highest_high: 0.0,
                lowest_low: 0.0,
                breakout_range: upper - lower,
                upper_boundary: upper,
                lower_boundary: lower,
            }),
            atr: None,
        }
    }

    #[test]
    fn no_signal_without_channel() {
        let set = IndicatorSet {
            date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            channel: None,
            atr: Some(1.0),
        };
        assert_eq!(detect(&bar(100.0, 1000.0, 1.0), &set, 3), None);
    }

    #[test]
    fn long_breakout_strictly_above_upper() {
        let set = indicators(105.0, 95.0);
        let signal = detect(&bar(100.0, 105.5, 99.0), &set, 7).unwrap();
        assert_eq!(signal.kind, SignalKind::LongBreakout);
        assert_eq!(signal.detected_at, 7);
    }

    #[test]
    fn touching_boundary_is_not_a_breakout() {
        let set = indicators(105.0, 95.0);
        assert_eq!(detect(&bar(100.0, 105.0, 95.0), &set, 1), None);
    }

    #[test]
    fn short_breakout_strictly_below_lower() {
        let set = indicators(105.0, 95.0);
        let signal = detect(&bar(100.0, 101.0, 94.0), &set, 2).unwrap();
        assert_eq!(signal.kind, SignalKind::ShortBreakout);
    }

    #[test]
    fn double_breach_prefers_larger_excursion() {
        let set = indicators(105.0, 95.0);
        let up = detect(&bar(100.0, 120.0, 94.0), &set, 0).unwrap();
        assert_eq!(up.kind, SignalKind::LongBreakout);
        let down = detect(&bar(100.0, 106.0, 80.0), &set, 0).unwrap();
        assert_eq!(down.kind, SignalKind::ShortBreakout);
    }

    #[test]
    fn double_breach_tie_goes_long() {
        let set = indicators(105.0, 95.0);
        let signal = detect(&bar(100.0, 110.0, 90.0), &set, 0).unwrap();
        assert_eq!(signal.kind, SignalKind::LongBreakout);
    }

    #[test]
    fn kind_maps_to_direction() {
        assert_eq!(SignalKind::LongBreakout.direction(), Direction::Long);
        assert_eq!(SignalKind::ShortBreakout.direction(), Direction::Short);
        assert_eq!(SignalKind::ShortBreakout.to_string(), "SHORT_BREAKOUT");
    }
}
