//! Realised volatility over short price windows

use crate::returns::simple_returns;
use crate::statistics::sample_std_dev;
use crate::{MathError, Result};

/// Sample standard deviation of the simple returns of `prices`
///
/// Needs at least three prices so that two returns feed the estimate.
pub fn realized_volatility(prices: &[f64]) -> Result<f64> {
    if prices.len() < 3 {
        return Err(MathError::InsufficientData(format!(
            "Need at least 3 prices for realised volatility, have {}",
            prices.len()
        )));
    }

    let returns = simple_returns(prices)?;
    sample_std_dev(&returns)
}
