//! Configuration validation.
//!
//! Runs before any bar is simulated. Errors name the INI section and key the
//! value would have come from.

use super::backtest::BacktestConfig;
use super::error::BreakoutError;

pub fn validate_backtest_config(config: &BacktestConfig) -> Result<(), BreakoutError> {
    config.indicator_params().validate()?;
    validate_stop_loss_mult(config)?;
    validate_initial_capital(config)?;
    validate_commission(config)?;
    validate_position_pct(config)?;
    validate_date_range(config)?;
    Ok(())
}

fn validate_stop_loss_mult(config: &BacktestConfig) -> Result<(), BreakoutError> {
    if !(config.stop_loss_mult.is_finite() && config.stop_loss_mult > 0.0) {
        return Err(BreakoutError::invalid(
            "strategy",
            "stop_loss_mult",
            "stop_loss_mult must be positive",
        ));
    }
    Ok(())
}

fn validate_initial_capital(config: &BacktestConfig) -> Result<(), BreakoutError> {
    if !(config.initial_capital.is_finite() && config.initial_capital > 0.0) {
        return Err(BreakoutError::invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_commission(config: &BacktestConfig) -> Result<(), BreakoutError> {
    if !(config.commission_rate.is_finite() && config.commission_rate >= 0.0) {
        return Err(BreakoutError::invalid(
            "backtest",
            "commission_rate",
            "commission_rate must be non-negative",
        ));
    }
    Ok(())
}

fn validate_position_pct(config: &BacktestConfig) -> Result<(), BreakoutError> {
    let value = config.position_pct_of_equity;
    if !(value > 0.0 && value <= 1.0) {
        return Err(BreakoutError::invalid(
            "backtest",
            "position_pct_of_equity",
            "position_pct_of_equity must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_date_range(config: &BacktestConfig) -> Result<(), BreakoutError> {
    if let Some(range) = config.date_range {
        if range.start > range.end {
            return Err(BreakoutError::invalid(
                "backtest",
                "start_date",
                "start_date must not be after end_date",
            ));
        }
    }
    Ok(())
}
