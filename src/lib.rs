//! # Gap Trade Workspace
//!
//! Facade over the workspace crates:
//!
//! - [`gap_trade`]: universe selection, signal classification, leverage,
//!   sizing and the scheduled strategy handlers
//! - [`trade_math`]: return, moment and quantile calculations
//!
//! ## Example
//!
//! ```
//! use gap_trade_workspace::gap_trade::{LeverageController, LeverageState};
//! use gap_trade_workspace::trade_math::qcut;
//!
//! let buckets = qcut(&[0.3, -0.1, 0.05, 0.2, -0.4], 5).unwrap();
//! assert_eq!(buckets, vec![4, 1, 2, 3, 0]);
//!
//! let rising: Vec<f64> = (0..100).map(|i| 400.0 + i as f64).collect();
//! let leverage = LeverageController::default().update(&rising).unwrap();
//! assert_eq!(leverage, LeverageState::new(1.8, 0.0));
//! ```

pub use gap_trade;
pub use trade_math;
