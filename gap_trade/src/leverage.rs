//! Monthly leverage switch
//!
//! The benchmark's latest close is compared with its trailing mean close. A
//! positive difference selects the bullish leverage pair, anything else the
//! bearish pair. There is no hysteresis band.

use crate::utils::validate_period;
use crate::{Result, Symbol, TradeError};
use serde::{Deserialize, Serialize};
use trade_math::trailing_mean;

/// Signed leverage applied to each side of the book
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeverageState {
    pub long_leverage: f64,
    /// Zero or negative
    pub short_leverage: f64,
}

impl LeverageState {
    pub fn new(long_leverage: f64, short_leverage: f64) -> Self {
        Self {
            long_leverage,
            short_leverage,
        }
    }
}

/// Leverage before the first monthly update
impl Default for LeverageState {
    fn default() -> Self {
        Self::new(0.9, -0.9)
    }
}

/// Benchmark momentum leverage controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeverageController {
    /// Instrument whose closes drive the switch
    pub benchmark: Symbol,
    /// Daily bars requested from the host
    pub history_bars: usize,
    /// Closes averaged for the trailing mean
    pub trailing_window: usize,
    /// Selected when the latest close is above the trailing mean
    pub bullish: LeverageState,
    /// Selected otherwise
    pub bearish: LeverageState,
}

impl Default for LeverageController {
    fn default() -> Self {
        Self {
            benchmark: Symbol::from("SPY"),
            history_bars: 200,
            trailing_window: 75,
            bullish: LeverageState::new(1.8, 0.0),
            bearish: LeverageState::new(1.1, -0.7),
        }
    }
}

impl LeverageController {
    pub fn validate(&self) -> Result<()> {
        validate_period(self.trailing_window, 1).map_err(TradeError::InvalidParameter)?;
        if self.history_bars < self.trailing_window {
            return Err(TradeError::InvalidParameter(
                "Benchmark history must cover the trailing window".to_string(),
            ));
        }
        for state in [self.bullish, self.bearish] {
            if state.short_leverage > 0.0 {
                return Err(TradeError::InvalidParameter(
                    "Short leverage must be zero or negative".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// `(latest close - trailing mean close) / 100`
    pub fn velocity(&self, closes: &[f64]) -> Result<f64> {
        let latest = closes.last().copied().ok_or_else(|| {
            TradeError::InsufficientData("Benchmark history is empty".to_string())
        })?;
        let trailing = trailing_mean(closes, self.trailing_window)?;
        Ok((latest - trailing) / 100.0)
    }

    /// Leverage pair for the given benchmark closes
    pub fn update(&self, closes: &[f64]) -> Result<LeverageState> {
        if self.velocity(closes)? > 0.0 {
            Ok(self.bullish)
        } else {
            Ok(self.bearish)
        }
    }
}
