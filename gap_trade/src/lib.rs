//! # Gap Trade
//!
//! `gap_trade` holds the decision logic of a monthly-universe, daily-rebalance
//! equity long/short strategy. A host platform owns scheduling, market data,
//! order execution and portfolio accounting; this crate owns what happens
//! inside each scheduled callback.
//!
//! ## Pipeline
//!
//! - **Universe selection**: a coarse liquidity/price screen followed by a fine
//!   fundamental screen, refreshed at the start of every month
//! - **Signal classification**: each security is classified long, short or
//!   neither, either by comparing its opening gap against its own return
//!   distribution or by bucketing short-window returns and volatility across
//!   the universe
//! - **Leverage control**: the benchmark's momentum picks one of two
//!   long/short leverage pairs each month
//! - **Sizing and liquidation**: candidates receive equal shares of the side's
//!   leverage, and positions that no longer qualify are flattened
//!
//! ## Usage Example
//!
//! ```no_run
//! use gap_trade::{GapStrategy, RecordingPlatform, StrategyConfig, StrategyState};
//! use gap_trade::utils::load_daily_history;
//!
//! let history = load_daily_history("history.csv").unwrap();
//! let mut platform = RecordingPlatform::new(history);
//!
//! let strategy = GapStrategy::new(StrategyConfig::default()).unwrap();
//! let mut state = StrategyState::default();
//! for registration in strategy.registrations() {
//!     state = strategy.dispatch(state, registration.action, &mut platform);
//! }
//! println!("{:?}", platform.instructions());
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub mod config;
pub mod history;
pub mod leverage;
pub mod liquidation;
pub mod platform;
pub mod schedule;
pub mod signals;
pub mod sizing;
pub mod strategy;
pub mod universe;
pub mod utils;

pub use config::StrategyConfig;
pub use history::{History, PriceHistory};
pub use leverage::{LeverageController, LeverageState};
pub use liquidation::{Holdings, LiquidationPlan, LiquidationPolicy};
pub use platform::{Instruction, Platform, RecordingPlatform};
pub use schedule::{Registration, ScheduledAction, TriggerRule};
pub use signals::{
    Candidate, CandidateSet, Classification, ClassificationReport, GapReference,
    QuantileClassifier, ReturnStatistic, SignalClassifier, ThresholdClassifier,
};
pub use sizing::{ExistingPositions, PositionSizer, PositionTarget};
pub use strategy::{GapStrategy, StrategyState, StrategyVariant};
pub use universe::{CoarseFundamental, FineFundamental, Universe, UniverseSelector};

/// Errors that can occur while computing signals and allocations
#[derive(Error, Debug)]
pub enum TradeError {
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Insufficient data for strategy: {0}")]
    InsufficientData(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Data loading error: {0}")]
    DataLoad(String),

    #[error("Math error: {0}")]
    Math(#[from] trade_math::MathError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for gap_trade operations
pub type Result<T> = std::result::Result<T, TradeError>;

/// Ticker identifier of a tradable security
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(pub String);

impl Symbol {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self(ticker.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(ticker: &str) -> Self {
        Self::new(ticker)
    }
}

/// Represents OHLCV (Open, High, Low, Close, Volume) data for a specific time period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvData {
    /// Open price
    pub open: f64,
    /// High price
    pub high: f64,
    /// Low price
    pub low: f64,
    /// Close price
    pub close: f64,
    /// Volume
    pub volume: u64,
}

/// Daily OHLCV data with a date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyOhlcv {
    /// Date of the data point
    pub date: NaiveDate,
    /// OHLCV data
    pub data: OhlcvData,
}

/// Direction of a position or candidate list
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn sign(self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "Long"),
            Side::Short => write!(f, "Short"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_display_and_order() {
        let mut symbols = vec![Symbol::from("MSFT"), Symbol::from("AAPL")];
        symbols.sort();
        assert_eq!(symbols[0].to_string(), "AAPL");
        assert_eq!(symbols[1].as_str(), "MSFT");
    }

    #[test]
    fn test_side_sign() {
        assert_eq!(Side::Long.sign(), 1.0);
        assert_eq!(Side::Short.sign(), -1.0);
    }

    #[test]
    fn test_math_error_conversion() {
        let err: TradeError = trade_math::MathError::InvalidInput("bad".to_string()).into();
        assert!(err.to_string().contains("Math error"));
    }
}
