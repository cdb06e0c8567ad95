//! Opening-gap classifier
//!
//! For each symbol the daily log returns over the lookback give a mean `μ`
//! and sample standard deviation `σ`. Today's gap is the log return from a
//! reference price on the previous bar to today's open.
//!
//! - Long when the gap is below `μ - σ` and the open is above the moving average
//! - Short when the gap is above `μ + σ` and the open is below the moving average
//! - Neither otherwise
//!
//! # Example
//!
//! ```
//! use gap_trade::{ThresholdClassifier, GapReference, SignalClassifier};
//!
//! let classifier = ThresholdClassifier::new(90, 20, GapReference::PreviousLow).unwrap();
//! assert_eq!(classifier.lookback(), 90);
//! ```

use super::{Classification, ClassificationReport, ReturnStatistic, SignalClassifier, SymbolSignal};
use crate::history::{History, PriceHistory};
use crate::universe::Universe;
use crate::utils::validate_period;
use crate::{Result, TradeError};
use serde::{Deserialize, Serialize};
use trade_math::{log_ratio, log_returns, trailing_mean, ReturnMoments};
use tracing::debug;

/// Price on the previous bar that today's open is compared with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapReference {
    /// Previous bar's low
    PreviousLow,
    /// Previous bar's open
    PreviousOpen,
}

/// Gap-versus-distribution classifier
#[derive(Debug, Clone)]
pub struct ThresholdClassifier {
    lookback: usize,
    ma_window: usize,
    reference: GapReference,
}

impl Default for ThresholdClassifier {
    fn default() -> Self {
        Self {
            lookback: 90,
            ma_window: 20,
            reference: GapReference::PreviousLow,
        }
    }
}

impl ThresholdClassifier {
    /// Create a classifier
    ///
    /// # Arguments
    ///
    /// * `lookback` - Daily bars used for the return distribution (minimum 3)
    /// * `ma_window` - Closes averaged for the trend filter, no longer than `lookback`
    /// * `reference` - Previous-bar price the gap is measured from
    pub fn new(lookback: usize, ma_window: usize, reference: GapReference) -> Result<Self> {
        validate_period(lookback, 3).map_err(TradeError::InvalidParameter)?;
        validate_period(ma_window, 1).map_err(TradeError::InvalidParameter)?;
        if ma_window > lookback {
            return Err(TradeError::InvalidParameter(
                "Moving average window cannot exceed the lookback".to_string(),
            ));
        }

        Ok(Self {
            lookback,
            ma_window,
            reference,
        })
    }

    pub fn ma_window(&self) -> usize {
        self.ma_window
    }

    pub fn reference(&self) -> GapReference {
        self.reference
    }

    fn min_bars(&self) -> usize {
        self.ma_window.max(3)
    }

    fn gap_statistic(&self, history: &PriceHistory) -> Option<ReturnStatistic> {
        let window = history.tail(self.lookback);
        if window.len() < self.min_bars() {
            return None;
        }

        let today = window.last()?;
        let yesterday = window.previous()?;
        let reference = match self.reference {
            GapReference::PreviousLow => yesterday.data.low,
            GapReference::PreviousOpen => yesterday.data.open,
        };

        let closes = window.closes();
        let moments = ReturnMoments::from_returns(&log_returns(&closes).ok()?).ok()?;
        let gap = log_ratio(today.data.open, reference).ok()?;
        let moving_average = trailing_mean(&closes, self.ma_window).ok()?;

        Some(ReturnStatistic::Gap {
            gap,
            mean: moments.mean,
            std_dev: moments.std_dev,
            open: today.data.open,
            moving_average,
        })
    }

    /// Classify a single symbol's trailing history
    pub fn classify_history(
        &self,
        history: &PriceHistory,
    ) -> (Classification, Option<ReturnStatistic>) {
        let Some(statistic) = self.gap_statistic(history) else {
            return (Classification::InsufficientHistory, None);
        };

        let classification = match statistic {
            ReturnStatistic::Gap {
                gap,
                mean,
                std_dev,
                open,
                moving_average,
            } => {
                if gap < mean - std_dev {
                    if open > moving_average {
                        Classification::Long
                    } else {
                        Classification::Neither
                    }
                } else if gap > mean + std_dev {
                    if open < moving_average {
                        Classification::Short
                    } else {
                        Classification::Neither
                    }
                } else {
                    Classification::Neither
                }
            }
            ReturnStatistic::Quantile { .. } => Classification::Neither,
        };

        (classification, Some(statistic))
    }
}

impl SignalClassifier for ThresholdClassifier {
    fn name(&self) -> &str {
        "gap_threshold"
    }

    fn lookback(&self) -> usize {
        self.lookback
    }

    fn classify(&self, universe: &Universe, history: &History) -> Result<ClassificationReport> {
        let signals = universe
            .iter()
            .map(|symbol| match history.get(symbol) {
                Some(series) => {
                    let (classification, statistic) = self.classify_history(series);
                    SymbolSignal {
                        symbol: symbol.clone(),
                        classification,
                        statistic,
                    }
                }
                None => SymbolSignal::insufficient(symbol.clone()),
            })
            .collect();

        let report = ClassificationReport::from_signals(signals);
        debug!(
            classifier = self.name(),
            longs = report.candidates.longs.len(),
            shorts = report.candidates.shorts.len(),
            skipped = report.insufficient().len(),
            "gap classification complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DailyOhlcv, OhlcvData, Symbol};
    use chrono::{Days, NaiveDate};

    /// Closes oscillate around `level` so the return distribution is tight,
    /// then the last bar opens at `open` with a fixed previous low
    fn series(level: f64, previous_low: f64, open: f64, bars: usize) -> PriceHistory {
        let base = NaiveDate::from_ymd_opt(2021, 1, 4).unwrap();
        let mut out = Vec::with_capacity(bars);
        for i in 0..bars {
            let close = if i % 2 == 0 { level * 1.001 } else { level * 0.999 };
            let is_last = i + 1 == bars;
            let is_previous = i + 2 == bars;
            out.push(DailyOhlcv {
                date: base.checked_add_days(Days::new(i as u64)).unwrap(),
                data: OhlcvData {
                    open: if is_last { open } else { close },
                    high: close * 1.01,
                    low: if is_previous { previous_low } else { close * 0.99 },
                    close,
                    volume: 10_000,
                },
            });
        }
        PriceHistory::new(out)
    }

    #[test]
    fn test_parameters() {
        let low = GapReference::PreviousLow;
        assert!(ThresholdClassifier::new(90, 20, low).is_ok());
        assert!(ThresholdClassifier::new(2, 1, low).is_err());
        assert!(ThresholdClassifier::new(10, 20, low).is_err());
        let open = GapReference::PreviousOpen;
        assert!(ThresholdClassifier::new(10, 0, open).is_err());
    }

    #[test]
    fn test_gap_down_below_band_but_open_under_average_is_neither() {
        // Opening far below the previous low also puts the open under the average
        let history = series(100.0, 99.0, 90.0, 30);
        let (classification, statistic) = ThresholdClassifier::default().classify_history(&history);
        assert_eq!(classification, Classification::Neither);
        assert!(statistic.is_some());
    }

    #[test]
    fn test_gap_down_from_high_low_is_long() {
        // Previous low sits well above the average, so a gap down from it can
        // still open above the average
        let history = series(100.0, 110.0, 101.0, 30);
        let (classification, _) = ThresholdClassifier::default().classify_history(&history);
        assert_eq!(classification, Classification::Long);
    }

    #[test]
    fn test_gap_up_under_average_is_short() {
        // Previous low far below the average; open above it but under the average
        let history = series(100.0, 90.0, 99.0, 30);
        let (classification, _) = ThresholdClassifier::default().classify_history(&history);
        assert_eq!(classification, Classification::Short);
    }

    #[test]
    fn test_gap_up_over_average_is_neither() {
        let history = series(100.0, 90.0, 105.0, 30);
        let (classification, _) = ThresholdClassifier::default().classify_history(&history);
        assert_eq!(classification, Classification::Neither);
    }

    #[test]
    fn test_previous_open_reference() {
        // Previous open sits at the level, so opening 5% higher is a large gap up
        // but above the average: neither
        let classifier = ThresholdClassifier::new(30, 20, GapReference::PreviousOpen).unwrap();
        let history = series(100.0, 99.0, 105.0, 30);
        let (classification, statistic) = classifier.classify_history(&history);
        assert_eq!(classification, Classification::Neither);
        match statistic {
            Some(ReturnStatistic::Gap { gap, .. }) => assert!(gap > 0.04),
            other => panic!("unexpected statistic {:?}", other),
        }
    }

    #[test]
    fn test_missing_and_short_history_are_insufficient() {
        let symbols = ["HAS", "SHORT", "NONE"].map(Symbol::from).to_vec();
        let universe = Universe::new(symbols).unwrap();
        let mut history = History::new();
        history.insert(Symbol::from("HAS"), series(100.0, 110.0, 101.0, 30));
        history.insert(Symbol::from("SHORT"), series(100.0, 110.0, 101.0, 5));

        let report = ThresholdClassifier::default()
            .classify(&universe, &history)
            .unwrap();
        assert_eq!(report.signals.len(), 3);
        assert_eq!(
            report.classification_of(&Symbol::from("HAS")),
            Some(Classification::Long)
        );
        assert_eq!(
            report.insufficient(),
            vec![&Symbol::from("SHORT"), &Symbol::from("NONE")]
        );
    }
}
