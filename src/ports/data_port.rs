//! Bar source port trait.

use crate::domain::error::BreakoutError;
use crate::domain::ohlcv::Bar;
use chrono::NaiveDate;

/// Supplies a fully materialized daily series, ascending with unique dates.
pub trait DataPort {
    fn fetch_bars(&self) -> Result<Vec<Bar>, BreakoutError>;

    /// First date, last date and bar count, or `None` for an empty source.
    fn data_range(&self) -> Result<Option<(NaiveDate, NaiveDate, usize)>, BreakoutError> {
        let bars = self.fetch_bars()?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, bars.len())),
            _ => None,
        })
    }
}
