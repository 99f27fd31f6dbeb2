//! Position state for a single instrument.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Direction {
    #[default]
    Flat,
    Long,
    Short,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Flat => write!(f, "FLAT"),
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

/// `size` is always non-negative; the sign lives in `direction`.
/// `avg_entry_price` carries no meaning while flat.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Position {
    pub direction: Direction,
    pub size: f64,
    pub avg_entry_price: f64,
}

impl Position {
    pub fn flat() -> Self {
        Position::default()
    }

    pub fn is_flat(&self) -> bool {
        self.direction == Direction::Flat
    }

    pub fn is_long(&self) -> bool {
        self.direction == Direction::Long
    }

    pub fn is_short(&self) -> bool {
        self.direction == Direction::Short
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        match self.direction {
            Direction::Flat => 0.0,
            Direction::Long => (price - self.avg_entry_price) * self.size,
            Direction::Short => (self.avg_entry_price - price) * self.size,
        }
    }

    /// Stop level `mult` ATRs against the entry, `None` while flat.
    pub fn stop_price(&self, atr: f64, mult: f64) -> Option<f64> {
        match self.direction {
            Direction::Flat => None,
            Direction::Long => Some(self.avg_entry_price - atr * mult),
            Direction::Short => Some(self.avg_entry_price + atr * mult),
        }
    }

    /// Whether a bar spanning `[low, high]` reaches `stop`.
    pub fn stop_hit(&self, stop: f64, high: f64, low: f64) -> bool {
        match self.direction {
            Direction::Flat => false,
            Direction::Long => low <= stop,
            Direction::Short => high >= stop,
        }
    }
}
