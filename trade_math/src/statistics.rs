//! Sample moments of return series
//!
//! Standard deviations use the `n - 1` denominator so that thresholds line up
//! with the values a research notebook reports for the same window.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Arithmetic mean of a non-empty slice
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot take the mean of an empty series".to_string(),
        ));
    }
    Ok(values.iter().mean())
}

/// Sample standard deviation (`n - 1` denominator)
pub fn sample_std_dev(values: &[f64]) -> Result<f64> {
    if values.len() < 2 {
        return Err(MathError::InsufficientData(format!(
            "Need at least 2 values for a sample standard deviation, have {}",
            values.len()
        )));
    }

    let std_dev = values.iter().std_dev();
    if !std_dev.is_finite() {
        return Err(MathError::CalculationError(
            "Standard deviation is not finite".to_string(),
        ));
    }
    Ok(std_dev)
}

/// Mean and standard deviation of a return window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnMoments {
    /// Mean return over the window
    pub mean: f64,
    /// Sample standard deviation over the window
    pub std_dev: f64,
}

impl ReturnMoments {
    /// Compute the moments of a return series
    pub fn from_returns(returns: &[f64]) -> Result<Self> {
        Ok(Self {
            mean: mean(returns)?,
            std_dev: sample_std_dev(returns)?,
        })
    }

    /// `mean - std_dev`
    pub fn lower_band(&self) -> f64 {
        self.mean - self.std_dev
    }

    /// `mean + std_dev`
    pub fn upper_band(&self) -> f64 {
        self.mean + self.std_dev
    }
}
