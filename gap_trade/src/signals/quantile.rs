//! Cross-sectional quantile classifier
//!
//! Every symbol's cumulative return and realised volatility over a short
//! window are cut into quantile buckets across the universe. Long candidates
//! sit in the lowest return bucket, short candidates in the highest, and both
//! must come from the calmer volatility buckets.

use super::{Classification, ClassificationReport, ReturnStatistic, SignalClassifier, SymbolSignal};
use crate::history::History;
use crate::universe::Universe;
use crate::utils::validate_period;
use crate::{Result, Symbol, TradeError};
use trade_math::{cumulative_return, qcut, realized_volatility};
use tracing::debug;

/// Return-quintile / volatility-tercile classifier
#[derive(Debug, Clone)]
pub struct QuantileClassifier {
    window: usize,
    return_buckets: usize,
    volatility_buckets: usize,
    /// Volatility buckets below this index are eligible
    max_volatility_bucket: usize,
}

impl Default for QuantileClassifier {
    fn default() -> Self {
        Self {
            window: 6,
            return_buckets: 5,
            volatility_buckets: 3,
            max_volatility_bucket: 2,
        }
    }
}

impl QuantileClassifier {
    /// Create a classifier
    ///
    /// # Arguments
    ///
    /// * `window` - Number of daily returns in the window (minimum 2)
    /// * `return_buckets` - Quantile buckets for the window return (minimum 2)
    /// * `volatility_buckets` - Quantile buckets for volatility (minimum 1)
    /// * `max_volatility_bucket` - Eligible volatility buckets are `0..max_volatility_bucket`
    pub fn new(
        window: usize,
        return_buckets: usize,
        volatility_buckets: usize,
        max_volatility_bucket: usize,
    ) -> Result<Self> {
        validate_period(window, 2).map_err(TradeError::InvalidParameter)?;
        validate_period(return_buckets, 2).map_err(TradeError::InvalidParameter)?;
        validate_period(volatility_buckets, 1).map_err(TradeError::InvalidParameter)?;
        if max_volatility_bucket == 0 || max_volatility_bucket > volatility_buckets {
            return Err(TradeError::InvalidParameter(format!(
                "Eligible volatility buckets must be between 1 and {}",
                volatility_buckets
            )));
        }

        Ok(Self {
            window,
            return_buckets,
            volatility_buckets,
            max_volatility_bucket,
        })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn return_buckets(&self) -> usize {
        self.return_buckets
    }

    pub fn volatility_buckets(&self) -> usize {
        self.volatility_buckets
    }

    fn window_statistics(&self, history: &History, symbol: &Symbol) -> Option<(f64, f64)> {
        let series = history.get(symbol)?.tail(self.lookback());
        if series.len() < self.lookback() {
            return None;
        }

        let closes = series.closes();
        let window_return = cumulative_return(&closes).ok()?;
        let volatility = realized_volatility(&closes).ok()?;
        Some((window_return, volatility))
    }

    fn classify_buckets(&self, return_bucket: usize, volatility_bucket: usize) -> Classification {
        if volatility_bucket >= self.max_volatility_bucket {
            Classification::Neither
        } else if return_bucket == 0 {
            Classification::Long
        } else if return_bucket == self.return_buckets - 1 {
            Classification::Short
        } else {
            Classification::Neither
        }
    }
}

impl SignalClassifier for QuantileClassifier {
    fn name(&self) -> &str {
        "return_quantile"
    }

    /// One more bar than the return window
    fn lookback(&self) -> usize {
        self.window + 1
    }

    fn classify(&self, universe: &Universe, history: &History) -> Result<ClassificationReport> {
        let statistics: Vec<Option<(f64, f64)>> = universe
            .iter()
            .map(|symbol| self.window_statistics(history, symbol))
            .collect();

        let (returns, volatilities): (Vec<f64>, Vec<f64>) =
            statistics.iter().flatten().copied().unzip();
        // All-equal returns leave nothing to rank, so no symbol is extreme
        let collapsed = returns.windows(2).all(|pair| pair[0] == pair[1]);

        let (return_buckets, volatility_buckets) = if returns.is_empty() {
            (Vec::new(), Vec::new())
        } else {
            (
                qcut(&returns, self.return_buckets)?,
                qcut(&volatilities, self.volatility_buckets)?,
            )
        };

        let mut ranked = 0;
        let signals = universe
            .iter()
            .zip(&statistics)
            .map(|(symbol, statistic)| match statistic {
                Some((window_return, volatility)) => {
                    let return_bucket = return_buckets[ranked];
                    let volatility_bucket = volatility_buckets[ranked];
                    ranked += 1;
                    let classification = if collapsed {
                        Classification::Neither
                    } else {
                        self.classify_buckets(return_bucket, volatility_bucket)
                    };
                    SymbolSignal {
                        symbol: symbol.clone(),
                        classification,
                        statistic: Some(ReturnStatistic::Quantile {
                            window_return: *window_return,
                            volatility: *volatility,
                            return_bucket,
                            volatility_bucket,
                        }),
                    }
                }
                None => SymbolSignal::insufficient(symbol.clone()),
            })
            .collect();

        let report = ClassificationReport::from_signals(signals);
        debug!(
            classifier = self.name(),
            cross_section = returns.len(),
            longs = report.candidates.longs.len(),
            shorts = report.candidates.shorts.len(),
            skipped = report.insufficient().len(),
            "quantile classification complete"
        );
        Ok(report)
    }
}
