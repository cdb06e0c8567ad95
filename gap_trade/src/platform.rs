//! Boundary to the hosting trading platform
//!
//! The host owns data, orders and portfolio state. Strategy handlers only ask
//! it for history and holdings and hand it target weights and subscriptions.

use crate::history::History;
use crate::liquidation::Holdings;
use crate::Symbol;
use serde::{Deserialize, Serialize};

/// Instruction handed to the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Instruction {
    /// Move the position in `symbol` to `weight` of equity
    SetHoldings { symbol: Symbol, weight: f64 },
    /// Subscribe to intraday data for `symbol` before trading it
    AddEquity { symbol: Symbol },
}

/// Services the host platform provides to scheduled handlers
pub trait Platform {
    /// Trailing daily bars; symbols without data are absent from the result
    fn history(&self, symbols: &[Symbol], bars: usize) -> History;

    /// Current signed position quantities
    fn holdings(&self) -> Holdings;

    fn set_holdings(&mut self, symbol: &Symbol, weight: f64);

    fn add_equity(&mut self, symbol: &Symbol);
}

/// In-memory host that serves a fixed history and records instructions
///
/// Weights are recorded, not filled: holdings only change through
/// [`RecordingPlatform::set_position`].
#[derive(Debug, Clone, Default)]
pub struct RecordingPlatform {
    history: History,
    holdings: Holdings,
    instructions: Vec<Instruction>,
}

impl RecordingPlatform {
    pub fn new(history: History) -> Self {
        Self {
            history,
            ..Self::default()
        }
    }

    pub fn with_holdings(mut self, holdings: Holdings) -> Self {
        self.holdings = holdings;
        self
    }

    pub fn set_position(&mut self, symbol: Symbol, quantity: f64) {
        self.holdings.set(symbol, quantity);
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Drain recorded instructions
    pub fn take_instructions(&mut self) -> Vec<Instruction> {
        std::mem::take(&mut self.instructions)
    }

    /// Last weight instructed for `symbol`, if any
    pub fn target_weight(&self, symbol: &Symbol) -> Option<f64> {
        self.instructions.iter().rev().find_map(|i| match i {
            Instruction::SetHoldings { symbol: s, weight } if s == symbol => Some(*weight),
            _ => None,
        })
    }
}

impl Platform for RecordingPlatform {
    fn history(&self, symbols: &[Symbol], bars: usize) -> History {
        self.history.select(symbols, bars)
    }

    fn holdings(&self) -> Holdings {
        self.holdings.clone()
    }

    fn set_holdings(&mut self, symbol: &Symbol, weight: f64) {
        self.instructions.push(Instruction::SetHoldings {
            symbol: symbol.clone(),
            weight,
        });
    }

    fn add_equity(&mut self, symbol: &Symbol) {
        self.instructions.push(Instruction::AddEquity {
            symbol: symbol.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_instructions_in_order() {
        let mut platform = RecordingPlatform::default();
        let symbol = Symbol::from("AAPL");
        platform.add_equity(&symbol);
        platform.set_holdings(&symbol, 0.25);
        platform.set_holdings(&symbol, 0.0);

        assert_eq!(platform.instructions().len(), 3);
        assert_eq!(platform.target_weight(&symbol), Some(0.0));

        let drained = platform.take_instructions();
        assert_eq!(drained[0], Instruction::AddEquity { symbol });
        assert!(platform.instructions().is_empty());
    }

    #[test]
    fn test_instruction_json_shape() {
        let json = serde_json::to_string(&Instruction::SetHoldings {
            symbol: Symbol::from("MSFT"),
            weight: -0.35,
        })
        .unwrap();
        assert_eq!(
            json,
            r#"{"type":"set_holdings","symbol":"MSFT","weight":-0.35}"#
        );
    }
}
