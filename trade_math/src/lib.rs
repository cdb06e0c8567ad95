//! # Trade Math
//!
//! Numeric building blocks for cross-sectional equity signals.
//! This crate turns price series into the statistics the `gap_trade`
//! classifiers compare against: log and simple returns, sample moments,
//! trailing means, realised volatility and quantile buckets.

use thiserror::Error;

pub mod moving_averages;
pub mod quantiles;
pub mod returns;
pub mod statistics;
pub mod volatility;

/// Errors that can occur in trading-related calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for trading math operations
pub type Result<T> = std::result::Result<T, MathError>;

pub use moving_averages::{trailing_mean, SimpleMovingAverage};
pub use quantiles::{qcut, quantile, quantile_edges};
pub use returns::{cumulative_return, log_ratio, log_returns, simple_returns};
pub use statistics::{mean, sample_std_dev, ReturnMoments};
pub use volatility::realized_volatility;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MathError::InsufficientData("need 3 values, have 1".to_string());
        assert_eq!(
            err.to_string(),
            "Insufficient data for calculation: need 3 values, have 1"
        );
    }
}
