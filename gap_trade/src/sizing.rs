//! Equal-weight position sizing
//!
//! Each side's leverage is split evenly across its new candidates and the
//! positions already carried on that side. Carried positions are not resized;
//! they only enlarge the denominator. A side with nothing in the denominator
//! receives no allocation at all.

use crate::leverage::LeverageState;
use crate::signals::CandidateSet;
use crate::{Side, Symbol};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Positions already held on the correct side and kept as they are
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingPositions {
    pub long: usize,
    pub short: usize,
}

/// Target portfolio weights, signed fractions of equity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionTarget {
    weights: BTreeMap<Symbol, f64>,
}

impl PositionTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, symbol: Symbol, weight: f64) {
        self.weights.insert(symbol, weight);
    }

    pub fn weight(&self, symbol: &Symbol) -> Option<f64> {
        self.weights.get(symbol).copied()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, f64)> {
        self.weights.iter().map(|(s, w)| (s, *w))
    }

    /// Sum of positive weights
    pub fn long_exposure(&self) -> f64 {
        self.weights.values().filter(|w| **w > 0.0).sum()
    }

    /// Sum of negative weights
    pub fn short_exposure(&self) -> f64 {
        self.weights.values().filter(|w| **w < 0.0).sum()
    }

    pub fn gross_exposure(&self) -> f64 {
        self.weights.values().map(|w| w.abs()).sum()
    }
}

/// Splits side leverage evenly across candidates
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionSizer;

impl PositionSizer {
    pub fn new() -> Self {
        Self
    }

    /// Per-position weight for a side, `None` when the side has no members
    pub fn side_weight(leverage: f64, candidates: usize, existing: usize) -> Option<f64> {
        let denominator = candidates + existing;
        if denominator == 0 {
            return None;
        }
        Some(leverage / denominator as f64)
    }

    /// Target weights for every candidate on both sides
    pub fn size(
        &self,
        candidates: &CandidateSet,
        leverage: &LeverageState,
        existing: ExistingPositions,
    ) -> PositionTarget {
        let mut target = PositionTarget::new();

        for side in [Side::Long, Side::Short] {
            let members = candidates.side(side);
            let (side_leverage, carried) = match side {
                Side::Long => (leverage.long_leverage, existing.long),
                Side::Short => (leverage.short_leverage, existing.short),
            };

            let Some(weight) = Self::side_weight(side_leverage, members.len(), carried) else {
                continue;
            };
            for candidate in members {
                target.set(candidate.symbol.clone(), weight);
            }
        }

        target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::Candidate;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn candidates(longs: &[&str], shorts: &[&str]) -> CandidateSet {
        let to_candidates = |names: &[&str]| -> Vec<Candidate> {
            names
                .iter()
                .map(|n| Candidate {
                    symbol: Symbol::from(*n),
                    score: 0.0,
                })
                .collect()
        };
        CandidateSet {
            longs: to_candidates(longs),
            shorts: to_candidates(shorts),
        }
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(7)]
    fn test_long_weights_sum_to_leverage(#[case] count: usize) {
        let names: Vec<String> = (0..count).map(|i| format!("L{}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let leverage = LeverageState::new(1.8, 0.0);

        let longs = candidates(&refs, &[]);
        let target = PositionSizer::new().size(&longs, &leverage, ExistingPositions::default());

        assert_eq!(target.len(), count);
        assert_relative_eq!(target.long_exposure(), 1.8, epsilon = 1e-12);
    }

    #[test]
    fn test_short_sign_preserved() {
        let leverage = LeverageState::new(1.1, -0.7);
        let target = PositionSizer::new().size(
            &candidates(&["A"], &["X", "Y"]),
            &leverage,
            ExistingPositions::default(),
        );

        assert_relative_eq!(target.weight(&Symbol::from("A")).unwrap(), 1.1);
        assert_relative_eq!(target.weight(&Symbol::from("X")).unwrap(), -0.35);
        assert_relative_eq!(target.short_exposure(), -0.7, epsilon = 1e-12);
        assert_relative_eq!(target.gross_exposure(), 1.8, epsilon = 1e-12);
    }

    #[test]
    fn test_existing_positions_dilute_new_entries() {
        let leverage = LeverageState::new(1.2, -0.9);
        let existing = ExistingPositions { long: 2, short: 1 };
        let entries = candidates(&["A"], &["X", "Y"]);
        let target = PositionSizer::new().size(&entries, &leverage, existing);

        let long = target.weight(&Symbol::from("A")).unwrap();
        let short = target.weight(&Symbol::from("Y")).unwrap();
        assert_relative_eq!(long, 0.4, epsilon = 1e-12);
        assert_relative_eq!(short, -0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_side_is_skipped() {
        let leverage = LeverageState::new(1.8, 0.0);
        let sizer = PositionSizer::new();
        let none = ExistingPositions::default();

        let target = sizer.size(&candidates(&[], &["X"]), &leverage, none);
        assert_eq!(target.weight(&Symbol::from("X")), Some(0.0));
        assert_eq!(target.len(), 1);

        let target = sizer.size(&CandidateSet::new(), &leverage, none);
        assert!(target.is_empty());
    }

    #[test]
    fn test_side_weight_guards_zero_denominator() {
        assert_eq!(PositionSizer::side_weight(1.0, 0, 0), None);
        assert_eq!(PositionSizer::side_weight(1.0, 0, 2), Some(0.5));
    }
}
