//! Signal classifiers
//!
//! A classifier looks at the trailing history of every symbol in the universe
//! and sorts each one into long, short or neither. Symbols the host returned no
//! usable history for are reported as [`Classification::InsufficientHistory`]
//! rather than dropped silently.
//!
//! - [`ThresholdClassifier`]: opening gap against the symbol's own return
//!   distribution, confirmed by a moving-average filter
//! - [`QuantileClassifier`]: cross-sectional return quintiles and volatility
//!   terciles over a short window

mod quantile;
mod threshold;

pub use quantile::QuantileClassifier;
pub use threshold::{GapReference, ThresholdClassifier};

use crate::history::History;
use crate::universe::Universe;
use crate::{Result, Side, Symbol};
use serde::{Deserialize, Serialize};

/// Outcome of classifying one symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    Long,
    Short,
    Neither,
    /// Absent from the history or too few bars to compute the statistic
    InsufficientHistory,
}

impl Classification {
    pub fn side(self) -> Option<Side> {
        match self {
            Classification::Long => Some(Side::Long),
            Classification::Short => Some(Side::Short),
            Classification::Neither | Classification::InsufficientHistory => None,
        }
    }
}

/// Statistic a classification was derived from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ReturnStatistic {
    Gap {
        /// Log return from the reference price to today's open
        gap: f64,
        /// Mean of the daily log returns over the lookback
        mean: f64,
        /// Sample standard deviation of those returns
        std_dev: f64,
        /// Today's open
        open: f64,
        /// Mean close over the moving-average window
        moving_average: f64,
    },
    Quantile {
        /// Cumulative return over the window
        window_return: f64,
        /// Realised volatility of daily returns over the window
        volatility: f64,
        /// Return bucket, 0 = lowest
        return_bucket: usize,
        /// Volatility bucket, 0 = calmest
        volatility_bucket: usize,
    },
}

/// Per-symbol classification result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSignal {
    pub symbol: Symbol,
    pub classification: Classification,
    pub statistic: Option<ReturnStatistic>,
}

impl SymbolSignal {
    pub fn insufficient(symbol: Symbol) -> Self {
        Self {
            symbol,
            classification: Classification::InsufficientHistory,
            statistic: None,
        }
    }
}

/// A symbol selected for one side with the score it was ranked by
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub symbol: Symbol,
    pub score: f64,
}

/// Disjoint long and short candidate lists
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateSet {
    pub longs: Vec<Candidate>,
    pub shorts: Vec<Candidate>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.longs.is_empty() && self.shorts.is_empty()
    }

    pub fn side(&self, side: Side) -> &[Candidate] {
        match side {
            Side::Long => &self.longs,
            Side::Short => &self.shorts,
        }
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.side_of(symbol).is_some()
    }

    pub fn side_of(&self, symbol: &Symbol) -> Option<Side> {
        if self.longs.iter().any(|c| &c.symbol == symbol) {
            Some(Side::Long)
        } else if self.shorts.iter().any(|c| &c.symbol == symbol) {
            Some(Side::Short)
        } else {
            None
        }
    }

    pub fn symbols(&self, side: Side) -> Vec<Symbol> {
        self.side(side).iter().map(|c| c.symbol.clone()).collect()
    }

    pub fn clear(&mut self) {
        self.longs.clear();
        self.shorts.clear();
    }

    /// Longs ordered by ascending score, shorts by descending score, each side
    /// cut to `max_per_side`
    pub fn ranked(&self, max_per_side: usize) -> CandidateSet {
        self.ranked_with_slots(max_per_side, max_per_side)
    }

    /// Same ordering as [`CandidateSet::ranked`] with a separate cap per side
    pub fn ranked_with_slots(&self, long_slots: usize, short_slots: usize) -> CandidateSet {
        let mut longs = self.longs.clone();
        longs.sort_by(|a, b| a.score.total_cmp(&b.score));
        longs.truncate(long_slots);

        let mut shorts = self.shorts.clone();
        shorts.sort_by(|a, b| b.score.total_cmp(&a.score));
        shorts.truncate(short_slots);

        CandidateSet { longs, shorts }
    }
}

/// Everything a classification pass produced
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// One entry per universe symbol, in universe order
    pub signals: Vec<SymbolSignal>,
    pub candidates: CandidateSet,
}

impl ClassificationReport {
    /// Derive the candidate set from per-symbol signals
    pub fn from_signals(signals: Vec<SymbolSignal>) -> Self {
        let mut candidates = CandidateSet::new();
        for signal in &signals {
            let score = match signal.statistic {
                Some(ReturnStatistic::Gap { gap, .. }) => gap,
                Some(ReturnStatistic::Quantile { window_return, .. }) => window_return,
                None => continue,
            };
            let candidate = Candidate {
                symbol: signal.symbol.clone(),
                score,
            };
            match signal.classification {
                Classification::Long => candidates.longs.push(candidate),
                Classification::Short => candidates.shorts.push(candidate),
                Classification::Neither | Classification::InsufficientHistory => {}
            }
        }
        Self {
            signals,
            candidates,
        }
    }

    pub fn classification_of(&self, symbol: &Symbol) -> Option<Classification> {
        self.signals
            .iter()
            .find(|s| &s.symbol == symbol)
            .map(|s| s.classification)
    }

    /// Symbols skipped for lack of history
    pub fn insufficient(&self) -> Vec<&Symbol> {
        self.signals
            .iter()
            .filter(|s| s.classification == Classification::InsufficientHistory)
            .map(|s| &s.symbol)
            .collect()
    }
}

/// Trait implemented by every daily classifier
pub trait SignalClassifier {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Number of daily bars to request from the host
    fn lookback(&self) -> usize;

    /// Classify every symbol of the universe against its trailing history
    fn classify(&self, universe: &Universe, history: &History) -> Result<ClassificationReport>;
}
