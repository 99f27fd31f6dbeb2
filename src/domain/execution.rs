//! Fill timing: when signals and stops turn into ledger mutations.
//!
//! Every bar is processed in this order, and the order is load-bearing:
//! 1. the signal queued on the previous bar fills at this bar's open
//! 2. the stop-loss is checked against this bar's high/low and fills intrabar
//!    at the stop price
//! 3. only if no stop fired, this bar is scanned for a new breakout, which is
//!    queued for the next bar's open (replacing anything still queued)
//!
//! Equity marking (step 4) belongs to the engine.

use log::debug;
use std::str::FromStr;

use super::error::BreakoutError;
use super::indicator::IndicatorSet;
use super::ledger::{EntryResult, PositionLedger, Side, TradeReason, TradeRecord};
use super::ohlcv::Bar;
use super::position::Direction;
use super::signal::{self, Signal, SignalKind};

/// What to do with a signal still queued after the last bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FinalPendingSignal {
    #[default]
    Discard,
    /// Fill it at the final close, before the forced close.
    ExecuteAtClose,
}

impl FromStr for FinalPendingSignal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "discard" => Ok(FinalPendingSignal::Discard),
            "execute_at_close" => Ok(FinalPendingSignal::ExecuteAtClose),
            other => Err(format!(
                "unknown value '{other}', expected discard or execute_at_close"
            )),
        }
    }
}

/// Everything that happened on one bar.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BarFills {
    pub records: Vec<TradeRecord>,
    pub stop_loss: bool,
    pub queued: Option<Signal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionScheduler {
    stop_loss_mult: f64,
    pending: Option<Signal>,
}

impl ExecutionScheduler {
    pub fn new(stop_loss_mult: f64) -> Self {
        ExecutionScheduler {
            stop_loss_mult,
            pending: None,
        }
    }

    pub fn pending(&self) -> Option<Signal> {
        self.pending
    }

    pub fn on_bar(
        &mut self,
        ledger: &mut PositionLedger,
        bar: &Bar,
        indicators: &IndicatorSet,
        index: usize,
    ) -> Result<BarFills, BreakoutError> {
        let mut fills = BarFills {
            records: self.execute_pending(ledger, bar, index)?,
            ..BarFills::default()
        };

        if let Some(record) = self.check_stop_loss(ledger, bar, indicators.atr, index)? {
            fills.records.push(record);
            fills.stop_loss = true;
        }

        if !fills.stop_loss {
            fills.queued = self.scan(ledger, bar, indicators, index);
        }

        Ok(fills)
    }

    /// Fill the queued signal at the bar's open.
    pub fn execute_pending(
        &mut self,
        ledger: &mut PositionLedger,
        bar: &Bar,
        index: usize,
    ) -> Result<Vec<TradeRecord>, BreakoutError> {
        match self.pending.take() {
            Some(signal) => fill_signal(ledger, signal, bar.open, bar, index),
            None => Ok(Vec::new()),
        }
    }

    pub fn check_stop_loss(
        &self,
        ledger: &mut PositionLedger,
        bar: &Bar,
        atr: Option<f64>,
        index: usize,
    ) -> Result<Option<TradeRecord>, BreakoutError> {
        let Some(atr) = atr else {
            return Ok(None);
        };
        let position = ledger.position();
        let Some(stop) = position.stop_price(atr, self.stop_loss_mult) else {
            return Ok(None);
        };
        if !position.stop_hit(stop, bar.high, bar.low) {
            return Ok(None);
        }

        let reason = if position.is_long() {
            TradeReason::StopLossLong
        } else {
            TradeReason::StopLossShort
        };
        debug!("{}: stop-loss at {:.2} (atr {:.2})", bar.date, stop, atr);
        ledger.close(stop, bar.date, index, reason)
    }

    /// Queue a breakout from this bar unless it points the way we already face.
    fn scan(
        &mut self,
        ledger: &PositionLedger,
        bar: &Bar,
        indicators: &IndicatorSet,
        index: usize,
    ) -> Option<Signal> {
        let signal = signal::detect(bar, indicators, index)?;
        if signal.kind.direction() == ledger.direction() {
            return None;
        }
        debug!("{}: {} queued for next open", bar.date, signal.kind);
        self.pending = Some(signal);
        Some(signal)
    }

    /// Settle the run after the last bar: handle the leftover signal, then
    /// close any open position at the final close.
    pub fn finish(
        &mut self,
        ledger: &mut PositionLedger,
        last_bar: &Bar,
        last_index: usize,
        policy: FinalPendingSignal,
    ) -> Result<Vec<TradeRecord>, BreakoutError> {
        let mut records = Vec::new();

        if let Some(signal) = self.pending.take() {
            match policy {
                FinalPendingSignal::Discard => {
                    debug!("{}: discarding unfilled {}", last_bar.date, signal.kind);
                }
                FinalPendingSignal::ExecuteAtClose => {
                    records.extend(fill_signal(ledger, signal, last_bar.close, last_bar, last_index)?);
                }
            }
        }

        if let Some(record) = ledger.close(
            last_bar.close,
            last_bar.date,
            last_index,
            TradeReason::EndOfBacktest,
        )? {
            records.push(record);
        }

        Ok(records)
    }
}

fn fill_signal(
    ledger: &mut PositionLedger,
    signal: Signal,
    price: f64,
    bar: &Bar,
    index: usize,
) -> Result<Vec<TradeRecord>, BreakoutError> {
    let side = match signal.kind {
        SignalKind::LongBreakout => Side::Long,
        SignalKind::ShortBreakout => Side::Short,
    };

    match ledger.direction() {
        Direction::Flat => {
            match ledger.open(side, price, bar.date, index, TradeReason::entry(side))? {
                EntryResult::Entered(record) => Ok(vec![record]),
                EntryResult::AlreadyPositioned | EntryResult::InsufficientEquity => Ok(Vec::new()),
            }
        }
        held if held == Direction::from(side) => {
            debug!("{}: already {}, ignoring {}", bar.date, held, signal.kind);
            Ok(Vec::new())
        }
        _ => ledger.reverse(side, price, bar.date, index),
    }
}
