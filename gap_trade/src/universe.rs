//! Two-stage universe screen
//!
//! The coarse stage ranks the host's screening feed by dollar volume and keeps
//! liquid, priced-above-floor names with fundamental coverage. The fine stage
//! drops names whose EV/EBITDA is not positive.

use crate::utils::{validate_positive, validate_range};
use crate::{Result, Symbol, TradeError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One row of the coarse screening feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoarseFundamental {
    pub symbol: Symbol,
    pub dollar_volume: f64,
    pub price: f64,
    pub has_fundamental_data: bool,
}

/// One row of the fine screening feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FineFundamental {
    pub symbol: Symbol,
    pub ev_to_ebitda: f64,
}

/// Ordered, non-empty set of tradable symbols
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Universe {
    symbols: Vec<Symbol>,
}

impl Universe {
    /// Build a universe, dropping repeated symbols while keeping first-seen order
    pub fn new(symbols: Vec<Symbol>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(symbols.len());
        let symbols: Vec<Symbol> = symbols
            .into_iter()
            .filter(|s| seen.insert(s.clone()))
            .collect();

        if symbols.is_empty() {
            return Err(TradeError::InvalidData(
                "Universe must contain at least one symbol".to_string(),
            ));
        }

        Ok(Self { symbols })
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.symbols.contains(symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }
}

/// Coarse/fine screen parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniverseSelector {
    /// Prices at or below this floor are dropped
    pub min_price: f64,
    /// Number of names kept after ranking by dollar volume
    pub max_coarse: usize,
    /// EV/EBITDA must be strictly above this
    pub min_ev_to_ebitda: f64,
}

impl Default for UniverseSelector {
    fn default() -> Self {
        Self {
            min_price: 5.0,
            max_coarse: 200,
            min_ev_to_ebitda: 0.0,
        }
    }
}

impl UniverseSelector {
    pub fn new(min_price: f64, max_coarse: usize, min_ev_to_ebitda: f64) -> Result<Self> {
        let selector = Self {
            min_price,
            max_coarse,
            min_ev_to_ebitda,
        };
        selector.validate()?;
        Ok(selector)
    }

    pub fn validate(&self) -> Result<()> {
        validate_positive(self.min_price, "Minimum price").map_err(TradeError::InvalidParameter)?;
        let max_coarse = self.max_coarse as f64;
        validate_range(max_coarse, 1.0, f64::MAX, "Coarse universe size")
            .map_err(TradeError::InvalidParameter)?;
        if !self.min_ev_to_ebitda.is_finite() {
            return Err(TradeError::InvalidParameter(
                "Minimum EV/EBITDA must be finite".to_string(),
            ));
        }
        Ok(())
    }

    /// Most liquid names with fundamentals and a price above the floor
    pub fn coarse(&self, coarse: &[CoarseFundamental]) -> Vec<Symbol> {
        let mut ranked: Vec<&CoarseFundamental> = coarse.iter().collect();
        ranked.sort_by(|a, b| b.dollar_volume.total_cmp(&a.dollar_volume));

        ranked
            .into_iter()
            .filter(|c| c.has_fundamental_data && c.price > self.min_price)
            .take(self.max_coarse)
            .map(|c| c.symbol.clone())
            .collect()
    }

    /// Names with a positive valuation ratio, in feed order
    pub fn fine(&self, fine: &[FineFundamental]) -> Vec<Symbol> {
        let floor = self.min_ev_to_ebitda;
        fine.iter()
            .filter(|f| f.ev_to_ebitda.is_finite() && f.ev_to_ebitda > floor)
            .map(|f| f.symbol.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn coarse_row(
        symbol: &str,
        dollar_volume: f64,
        price: f64,
        fundamentals: bool,
    ) -> CoarseFundamental {
        CoarseFundamental {
            symbol: Symbol::from(symbol),
            dollar_volume,
            price,
            has_fundamental_data: fundamentals,
        }
    }

    fn fine_row(symbol: &str, ev_to_ebitda: f64) -> FineFundamental {
        FineFundamental {
            symbol: Symbol::from(symbol),
            ev_to_ebitda,
        }
    }

    fn symbols(names: &[&str]) -> Vec<Symbol> {
        names.iter().map(|n| Symbol::from(*n)).collect()
    }

    #[test]
    fn test_coarse_ranks_and_filters() {
        let feed = vec![
            coarse_row("LOW", 1.0e6, 20.0, true),
            coarse_row("PENNY", 9.0e9, 4.0, true),
            coarse_row("NOFUND", 8.0e9, 50.0, false),
            coarse_row("TOP", 5.0e9, 120.0, true),
            coarse_row("MID", 2.0e8, 30.0, true),
        ];

        let selector = UniverseSelector::default();
        assert_eq!(selector.coarse(&feed), symbols(&["TOP", "MID", "LOW"]));
    }

    #[test]
    fn test_coarse_truncates() {
        let feed: Vec<_> = (0..10)
            .map(|i| (format!("S{}", i), i as f64 * 1.0e6))
            .map(|(name, volume)| coarse_row(&name, volume, 10.0, true))
            .collect();
        let selector = UniverseSelector::new(5.0, 3, 0.0).unwrap();
        assert_eq!(selector.coarse(&feed), symbols(&["S9", "S8", "S7"]));
    }

    #[test]
    fn test_price_floor_is_exclusive() {
        let feed = vec![coarse_row("EDGE", 1.0e9, 5.0, true)];
        assert!(UniverseSelector::default().coarse(&feed).is_empty());
    }

    #[test]
    fn test_fine_requires_positive_ratio() {
        let fine = vec![
            fine_row("A", 12.5),
            fine_row("B", -3.0),
            fine_row("C", 0.0),
            fine_row("D", f64::NAN),
        ];
        assert_eq!(UniverseSelector::default().fine(&fine), symbols(&["A"]));
    }

    #[test]
    fn test_universe_rejects_empty_and_dedups() {
        assert!(Universe::new(vec![]).is_err());

        let universe = Universe::new(vec![
            Symbol::from("A"),
            Symbol::from("B"),
            Symbol::from("A"),
        ])
        .unwrap();
        assert_eq!(universe.symbols(), &[Symbol::from("A"), Symbol::from("B")]);
    }

    #[test]
    fn test_invalid_selector() {
        assert!(UniverseSelector::new(0.0, 200, 0.0).is_err());
        assert!(UniverseSelector::new(5.0, 0, 0.0).is_err());
    }
}
