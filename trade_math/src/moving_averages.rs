//! Simple moving averages over closing prices
//!
//! The gap classifier compares today's open with a 20-bar average and the
//! leverage controller compares the benchmark's last close with a 75-bar
//! average; both go through [`trailing_mean`].

use crate::{MathError, Result};
use std::collections::VecDeque;

/// Rolling simple moving average over a fixed window
#[derive(Debug, Clone)]
pub struct SimpleMovingAverage {
    window: usize,
    values: VecDeque<f64>,
    sum: f64,
}

impl SimpleMovingAverage {
    /// Create a moving average over `window` values
    pub fn new(window: usize) -> Result<Self> {
        if window == 0 {
            return Err(MathError::InvalidInput(
                "Window must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            window,
            values: VecDeque::with_capacity(window),
            sum: 0.0,
        })
    }

    /// Push the next value, evicting the oldest once the window is full
    pub fn update(&mut self, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(MathError::InvalidInput(format!(
                "Cannot average non-finite value {}",
                value
            )));
        }

        self.values.push_back(value);
        self.sum += value;

        if self.values.len() > self.window {
            if let Some(evicted) = self.values.pop_front() {
                self.sum -= evicted;
            }
        }

        Ok(())
    }

    /// Current average, available once the window is full
    pub fn value(&self) -> Result<f64> {
        if self.values.len() < self.window {
            return Err(MathError::InsufficientData(format!(
                "Need {} values for the moving average, have {}",
                self.window,
                self.values.len()
            )));
        }

        Ok(self.sum / self.window as f64)
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn is_ready(&self) -> bool {
        self.values.len() >= self.window
    }
}

/// Mean of the last `window` values of `values`
pub fn trailing_mean(values: &[f64], window: usize) -> Result<f64> {
    if values.len() < window {
        return Err(MathError::InsufficientData(format!(
            "Need {} values for a trailing mean, have {}",
            window,
            values.len()
        )));
    }

    let mut sma = SimpleMovingAverage::new(window)?;
    for value in &values[values.len() - window..] {
        sma.update(*value)?;
    }
    sma.value()
}
