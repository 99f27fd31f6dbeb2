//! Position and equity bookkeeping.
//!
//! The ledger is the only place equity changes, and only on fills:
//! - open: size = equity * pct / price, entry commission debited at once
//! - close: equity += realized pnl - exit commission
//! - reverse: close then open at the same price, two records
//!
//! Unrealized PnL is derived on demand and never written back. Equity is not
//! floored; it may go negative on a bad enough run.

use chrono::NaiveDate;
use log::{debug, warn};
use std::fmt;

use super::error::BreakoutError;
use super::position::{Direction, Position};

/// Side of a new position. A ledger can only be opened long or short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Side {
    Long,
    Short,
}

impl From<Side> for Direction {
    fn from(side: Side) -> Self {
        match side {
            Side::Long => Direction::Long,
            Side::Short => Direction::Short,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TradeAction {
    Long,
    Short,
    CloseLong,
    CloseShort,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Long => write!(f, "LONG"),
            TradeAction::Short => write!(f, "SHORT"),
            TradeAction::CloseLong => write!(f, "CLOSE_LONG"),
            TradeAction::CloseShort => write!(f, "CLOSE_SHORT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TradeReason {
    LongEntry,
    ShortEntry,
    ReverseToLong,
    ReverseToShort,
    StopLossLong,
    StopLossShort,
    EndOfBacktest,
}

impl TradeReason {
    pub fn entry(side: Side) -> Self {
        match side {
            Side::Long => TradeReason::LongEntry,
            Side::Short => TradeReason::ShortEntry,
        }
    }

    pub fn reverse_to(side: Side) -> Self {
        match side {
            Side::Long => TradeReason::ReverseToLong,
            Side::Short => TradeReason::ReverseToShort,
        }
    }
}

impl fmt::Display for TradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TradeReason::LongEntry => "Long Entry",
            TradeReason::ShortEntry => "Short Entry",
            TradeReason::ReverseToLong => "Reverse to Long",
            TradeReason::ReverseToShort => "Reverse to Short",
            TradeReason::StopLossLong => "SL Long",
            TradeReason::StopLossShort => "SL Short",
            TradeReason::EndOfBacktest => "End of backtest",
        };
        f.write_str(s)
    }
}

/// One ledger mutation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TradeRecord {
    pub id: u32,
    pub bar_index: usize,
    pub date: NaiveDate,
    pub action: TradeAction,
    pub execution_price: f64,
    pub size: f64,
    /// Realized price PnL; zero for entries.
    pub pnl: f64,
    pub commission: f64,
    pub net_pnl: f64,
    pub equity_after: f64,
    pub reason: TradeReason,
}

/// Outcome of an entry attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered(TradeRecord),
    /// A position is already open; entries never stack.
    AlreadyPositioned,
    /// Equity is not positive, so no size can be computed.
    InsufficientEquity,
}

/// Commission on a notional at a flat rate.
pub fn calculate_commission(notional: f64, commission_rate: f64) -> f64 {
    notional * commission_rate
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionLedger {
    equity: f64,
    position: Position,
    commission_rate: f64,
    position_pct_of_equity: f64,
    next_trade_id: u32,
}

impl PositionLedger {
    pub fn new(initial_capital: f64, commission_rate: f64, position_pct_of_equity: f64) -> Self {
        PositionLedger {
            equity: initial_capital,
            position: Position::flat(),
            commission_rate,
            position_pct_of_equity,
            next_trade_id: 1,
        }
    }

    pub fn equity(&self) -> f64 {
        self.equity
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn direction(&self) -> Direction {
        self.position.direction
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.position.unrealized_pnl(price)
    }

    /// Equity marked to `price`; stored equity is left untouched.
    pub fn total_equity(&self, price: f64) -> f64 {
        self.equity + self.unrealized_pnl(price)
    }

    pub fn open(
        &mut self,
        side: Side,
        price: f64,
        date: NaiveDate,
        bar_index: usize,
        reason: TradeReason,
    ) -> Result<EntryResult, BreakoutError> {
        check_price(price, date)?;

        if !self.position.is_flat() {
            return Ok(EntryResult::AlreadyPositioned);
        }
        if self.equity <= 0.0 {
            warn!(
                "{}: skipping {} entry, equity {:.2} is not positive",
                date,
                Direction::from(side),
                self.equity
            );
            return Ok(EntryResult::InsufficientEquity);
        }

        let size = (self.equity * self.position_pct_of_equity) / price;
        let commission = calculate_commission(size * price, self.commission_rate);
        self.equity -= commission;
        self.position = Position {
            direction: side.into(),
            size,
            avg_entry_price: price,
        };

        let action = match side {
            Side::Long => TradeAction::Long,
            Side::Short => TradeAction::Short,
        };
        let record = self.record(bar_index, date, action, price, size, 0.0, commission, reason);
        debug!(
            "{}: {} {:.6} @ {:.2} (commission {:.2}, equity {:.2})",
            date, action, size, price, commission, self.equity
        );
        Ok(EntryResult::Entered(record))
    }

    /// Close the open position. Returns `Ok(None)` when already flat.
    pub fn close(
        &mut self,
        price: f64,
        date: NaiveDate,
        bar_index: usize,
        reason: TradeReason,
    ) -> Result<Option<TradeRecord>, BreakoutError> {
        check_price(price, date)?;

        let action = match self.position.direction {
            Direction::Flat => return Ok(None),
            Direction::Long => TradeAction::CloseLong,
            Direction::Short => TradeAction::CloseShort,
        };

        let size = self.position.size;
        let pnl = self.position.unrealized_pnl(price);
        let commission = calculate_commission(size * price, self.commission_rate);
        self.equity += pnl - commission;
        self.position = Position::flat();

        let record = self.record(bar_index, date, action, price, size, pnl, commission, reason);
        debug!(
            "{}: {} {:.6} @ {:.2} pnl {:.2} (commission {:.2}, equity {:.2}) [{}]",
            date, action, size, price, pnl, commission, self.equity, reason
        );
        Ok(Some(record))
    }

    /// Close whatever is open, then open `side` at the same price and date.
    pub fn reverse(
        &mut self,
        side: Side,
        price: f64,
        date: NaiveDate,
        bar_index: usize,
    ) -> Result<Vec<TradeRecord>, BreakoutError> {
        check_price(price, date)?;

        let mut records = Vec::with_capacity(2);
        if let Some(closed) = self.close(price, date, bar_index, TradeReason::reverse_to(side))? {
            records.push(closed);
        }
        if let EntryResult::Entered(opened) =
            self.open(side, price, date, bar_index, TradeReason::entry(side))?
        {
            records.push(opened);
        }
        Ok(records)
    }

    #[allow(clippy::too_many_arguments)]
    fn record(
        &mut self,
        bar_index: usize,
        date: NaiveDate,
        action: TradeAction,
        execution_price: f64,
        size: f64,
        pnl: f64,
        commission: f64,
        reason: TradeReason,
    ) -> TradeRecord {
        let id = self.next_trade_id;
        self.next_trade_id += 1;
        TradeRecord {
            id,
            bar_index,
            date,
            action,
            execution_price,
            size,
            pnl,
            commission,
            net_pnl: pnl - commission,
            equity_after: self.equity,
            reason,
        }
    }
}

fn check_price(price: f64, date: NaiveDate) -> Result<(), BreakoutError> {
    if price.is_finite() && price > 0.0 {
        Ok(())
    } else {
        Err(BreakoutError::InvalidPrice { price, date })
    }
}
