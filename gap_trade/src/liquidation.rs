//! Exit rules for held positions
//!
//! - [`LiquidationPolicy::EndOfDay`]: before the close, flatten every held
//!   symbol that was a candidate today, then forget today's candidates
//! - [`LiquidationPolicy::BucketDrift`]: at the daily rebalance, keep holdings
//!   that still sit in their side's candidate list and flatten the rest

use crate::signals::CandidateSet;
use crate::sizing::ExistingPositions;
use crate::{Side, Symbol};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current portfolio, symbol to signed quantity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Holdings {
    positions: BTreeMap<Symbol, f64>,
}

impl Holdings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a position; a zero quantity removes it
    pub fn set(&mut self, symbol: Symbol, quantity: f64) {
        if quantity == 0.0 {
            self.positions.remove(&symbol);
        } else {
            self.positions.insert(symbol, quantity);
        }
    }

    pub fn quantity(&self, symbol: &Symbol) -> f64 {
        self.positions.get(symbol).copied().unwrap_or(0.0)
    }

    pub fn side_of(&self, symbol: &Symbol) -> Option<Side> {
        let quantity = self.quantity(symbol);
        if quantity > 0.0 {
            Some(Side::Long)
        } else if quantity < 0.0 {
            Some(Side::Short)
        } else {
            None
        }
    }

    pub fn is_invested(&self, symbol: &Symbol) -> bool {
        self.side_of(symbol).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, f64)> {
        self.positions.iter().map(|(s, q)| (s, *q))
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

impl FromIterator<(Symbol, f64)> for Holdings {
    fn from_iter<I: IntoIterator<Item = (Symbol, f64)>>(iter: I) -> Self {
        let mut holdings = Holdings::new();
        for (symbol, quantity) in iter {
            holdings.set(symbol, quantity);
        }
        holdings
    }
}

/// Which exit rule a strategy variant applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiquidationPolicy {
    EndOfDay,
    BucketDrift,
}

/// Outcome of applying a liquidation policy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiquidationPlan {
    /// Symbols to flatten, in symbol order
    pub liquidate: Vec<Symbol>,
    /// Holdings kept on the side they already qualify for
    pub existing: ExistingPositions,
    /// Candidates still to be entered
    pub entries: CandidateSet,
}

impl LiquidationPolicy {
    pub fn plan(&self, holdings: &Holdings, candidates: &CandidateSet) -> LiquidationPlan {
        match self {
            LiquidationPolicy::EndOfDay => LiquidationPlan {
                liquidate: holdings
                    .iter()
                    .filter(|(symbol, _)| candidates.contains(symbol))
                    .map(|(symbol, _)| symbol.clone())
                    .collect(),
                existing: ExistingPositions::default(),
                entries: CandidateSet::new(),
            },
            LiquidationPolicy::BucketDrift => {
                let mut plan = LiquidationPlan {
                    entries: candidates.clone(),
                    ..LiquidationPlan::default()
                };

                for (symbol, _) in holdings.iter() {
                    let held = holdings.side_of(symbol);
                    if held.is_some() && held == candidates.side_of(symbol) {
                        match held {
                            Some(Side::Long) => plan.existing.long += 1,
                            Some(Side::Short) => plan.existing.short += 1,
                            None => {}
                        }
                        plan.entries.longs.retain(|c| &c.symbol != symbol);
                        plan.entries.shorts.retain(|c| &c.symbol != symbol);
                    } else {
                        plan.liquidate.push(symbol.clone());
                    }
                }

                plan
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::Candidate;
    use pretty_assertions::assert_eq;

    fn set(longs: &[&str], shorts: &[&str]) -> CandidateSet {
        let make = |names: &[&str]| -> Vec<Candidate> {
            names
                .iter()
                .map(|n| Candidate {
                    symbol: Symbol::from(*n),
                    score: 0.0,
                })
                .collect()
        };
        CandidateSet {
            longs: make(longs),
            shorts: make(shorts),
        }
    }

    fn holdings(rows: &[(&str, f64)]) -> Holdings {
        rows.iter().map(|(s, q)| (Symbol::from(*s), *q)).collect()
    }

    #[test]
    fn test_holdings_side() {
        let h = holdings(&[("L", 10.0), ("S", -5.0), ("Z", 0.0)]);
        assert_eq!(h.len(), 2);
        assert_eq!(h.side_of(&Symbol::from("L")), Some(Side::Long));
        assert_eq!(h.side_of(&Symbol::from("S")), Some(Side::Short));
        assert!(!h.is_invested(&Symbol::from("Z")));
    }

    #[test]
    fn test_end_of_day_flattens_candidates_only() {
        let plan = LiquidationPolicy::EndOfDay.plan(
            &holdings(&[("A", 10.0), ("B", -3.0), ("OTHER", 4.0)]),
            &set(&["A"], &["B", "C"]),
        );

        assert_eq!(plan.liquidate, vec![Symbol::from("A"), Symbol::from("B")]);
        assert!(plan.entries.is_empty());
        assert_eq!(plan.existing, ExistingPositions::default());
    }

    #[test]
    fn test_bucket_drift_keeps_qualifying_positions() {
        let held = holdings(&[
            ("KEEP_L", 10.0),
            ("KEEP_S", -2.0),
            ("DRIFT", 7.0),
            ("FLIP", 3.0),
        ]);
        let candidates = set(&["KEEP_L", "NEW_L"], &["KEEP_S", "FLIP"]);
        let plan = LiquidationPolicy::BucketDrift.plan(&held, &candidates);

        assert_eq!(
            plan.liquidate,
            vec![Symbol::from("DRIFT"), Symbol::from("FLIP")]
        );
        assert_eq!(plan.existing, ExistingPositions { long: 1, short: 1 });
        let long_entries = plan.entries.symbols(Side::Long);
        let short_entries = plan.entries.symbols(Side::Short);
        assert_eq!(long_entries, vec![Symbol::from("NEW_L")]);
        assert_eq!(short_entries, vec![Symbol::from("FLIP")]);
    }

    #[test]
    fn test_bucket_drift_with_no_holdings() {
        let candidates = set(&["A"], &["B"]);
        let plan = LiquidationPolicy::BucketDrift.plan(&Holdings::new(), &candidates);
        assert!(plan.liquidate.is_empty());
        assert_eq!(plan.entries, candidates);
    }
}
