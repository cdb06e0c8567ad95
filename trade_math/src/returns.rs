//! Return series calculations
//!
//! All functions take prices in chronological order (oldest first).

use crate::{MathError, Result};

fn check_prices(prices: &[f64]) -> Result<()> {
    if let Some(bad) = prices.iter().find(|p| !(p.is_finite() && **p > 0.0)) {
        return Err(MathError::InvalidInput(format!(
            "Prices must be positive and finite, got {}",
            bad
        )));
    }
    Ok(())
}

/// Natural log of `numerator / denominator`.
pub fn log_ratio(numerator: f64, denominator: f64) -> Result<f64> {
    check_prices(&[numerator, denominator])?;
    Ok((numerator / denominator).ln())
}

/// Daily log returns `ln(p[t] / p[t-1])`, one shorter than the input.
pub fn log_returns(prices: &[f64]) -> Result<Vec<f64>> {
    if prices.len() < 2 {
        return Err(MathError::InsufficientData(format!(
            "Need at least 2 prices for log returns, have {}",
            prices.len()
        )));
    }
    check_prices(prices)?;

    Ok(prices.windows(2).map(|w| (w[1] / w[0]).ln()).collect())
}

/// Daily simple returns `p[t] / p[t-1] - 1`, one shorter than the input.
pub fn simple_returns(prices: &[f64]) -> Result<Vec<f64>> {
    if prices.len() < 2 {
        return Err(MathError::InsufficientData(format!(
            "Need at least 2 prices for simple returns, have {}",
            prices.len()
        )));
    }
    check_prices(prices)?;

    Ok(prices.windows(2).map(|w| w[1] / w[0] - 1.0).collect())
}

/// Return over the whole series, `last / first - 1`.
pub fn cumulative_return(prices: &[f64]) -> Result<f64> {
    match (prices.first(), prices.last()) {
        (Some(first), Some(last)) if prices.len() >= 2 => {
            check_prices(&[*first, *last])?;
            Ok(last / first - 1.0)
        }
        _ => Err(MathError::InsufficientData(format!(
            "Need at least 2 prices for a cumulative return, have {}",
            prices.len()
        ))),
    }
}
