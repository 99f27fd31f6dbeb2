//! Simulation core: indicators, signals, fill timing and bookkeeping.

pub mod ohlcv;
pub mod indicator;
pub mod signal;
pub mod position;
pub mod ledger;
pub mod execution;
pub mod backtest;
pub mod config_validation;
pub mod error;
