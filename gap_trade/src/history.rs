//! Trailing daily bars returned by the host's history call
//!
//! A symbol that the host had no data for is simply absent from [`History`];
//! classifiers turn that absence into an explicit insufficient-history result.

use crate::{DailyOhlcv, Symbol};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Time-ordered daily bars for one security
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    bars: Vec<DailyOhlcv>,
}

impl PriceHistory {
    /// Build a history, sorting the bars by date
    pub fn new(mut bars: Vec<DailyOhlcv>) -> Self {
        bars.sort_by_key(|bar| bar.date);
        Self { bars }
    }

    pub fn push(&mut self, bar: DailyOhlcv) {
        let index = self.bars.partition_point(|b| b.date <= bar.date);
        self.bars.insert(index, bar);
    }

    pub fn bars(&self) -> &[DailyOhlcv] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Most recent bar
    pub fn last(&self) -> Option<&DailyOhlcv> {
        self.bars.last()
    }

    /// Bar before the most recent one
    pub fn previous(&self) -> Option<&DailyOhlcv> {
        self.bars.len().checked_sub(2).map(|i| &self.bars[i])
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.data.close).collect()
    }

    pub fn opens(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.data.open).collect()
    }

    /// The last `count` bars, or all of them when fewer exist
    pub fn tail(&self, count: usize) -> PriceHistory {
        let start = self.bars.len().saturating_sub(count);
        PriceHistory {
            bars: self.bars[start..].to_vec(),
        }
    }
}

/// Trailing bars keyed by symbol
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    series: BTreeMap<Symbol, PriceHistory>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: Symbol, history: PriceHistory) {
        self.series.insert(symbol, history);
    }

    /// Append one bar to a symbol's series, creating it if needed
    pub fn push_bar(&mut self, symbol: Symbol, bar: DailyOhlcv) {
        self.series.entry(symbol).or_default().push(bar);
    }

    pub fn get(&self, symbol: &Symbol) -> Option<&PriceHistory> {
        self.series.get(symbol)
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.series.contains_key(symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.series.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &PriceHistory)> {
        self.series.iter()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// The last `bars` bars of each requested symbol that has data
    pub fn select(&self, symbols: &[Symbol], bars: usize) -> History {
        let series = symbols
            .iter()
            .filter_map(|symbol| {
                self.series
                    .get(symbol)
                    .filter(|h| !h.is_empty())
                    .map(|h| (symbol.clone(), h.tail(bars)))
            })
            .collect();
        History { series }
    }
}

impl FromIterator<(Symbol, PriceHistory)> for History {
    fn from_iter<I: IntoIterator<Item = (Symbol, PriceHistory)>>(iter: I) -> Self {
        History {
            series: iter.into_iter().collect(),
        }
    }
}
