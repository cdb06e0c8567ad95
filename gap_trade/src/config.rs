//! Strategy configuration
//!
//! Every field has a default, so an empty TOML document describes the gap
//! strategy with its usual parameters:
//!
//! ```toml
//! variant = "gap_threshold"
//! max_positions = 10
//!
//! [universe]
//! min_price = 5.0
//! max_coarse = 200
//!
//! [threshold]
//! lookback = 90
//! ma_window = 20
//! reference = "previous_low"
//!
//! [leverage]
//! benchmark = "SPY"
//! trailing_window = 75
//!
//! [logging]
//! level = "info"
//! ```

use crate::leverage::LeverageController;
use crate::signals::{GapReference, QuantileClassifier, ThresholdClassifier};
use crate::strategy::StrategyVariant;
use crate::universe::UniverseSelector;
use crate::utils::validate_period;
use crate::{Result, TradeError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdSettings {
    pub lookback: usize,
    pub ma_window: usize,
    pub reference: GapReference,
}

impl Default for ThresholdSettings {
    fn default() -> Self {
        Self {
            lookback: 90,
            ma_window: 20,
            reference: GapReference::PreviousLow,
        }
    }
}

impl ThresholdSettings {
    pub fn classifier(&self) -> Result<ThresholdClassifier> {
        ThresholdClassifier::new(self.lookback, self.ma_window, self.reference)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantileSettings {
    pub window: usize,
    pub return_buckets: usize,
    pub volatility_buckets: usize,
    pub max_volatility_bucket: usize,
}

impl Default for QuantileSettings {
    fn default() -> Self {
        Self {
            window: 6,
            return_buckets: 5,
            volatility_buckets: 3,
            max_volatility_bucket: 2,
        }
    }
}

impl QuantileSettings {
    pub fn classifier(&self) -> Result<QuantileClassifier> {
        QuantileClassifier::new(
            self.window,
            self.return_buckets,
            self.volatility_buckets,
            self.max_volatility_bucket,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Complete strategy parameter set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub variant: StrategyVariant,
    /// Cap on candidates entered per side each day
    pub max_positions: usize,
    pub universe: UniverseSelector,
    pub threshold: ThresholdSettings,
    pub quantile: QuantileSettings,
    pub leverage: LeverageController,
    pub logging: LoggingConfig,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            variant: StrategyVariant::GapThreshold,
            max_positions: 10,
            universe: UniverseSelector::default(),
            threshold: ThresholdSettings::default(),
            quantile: QuantileSettings::default(),
            leverage: LeverageController::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl StrategyConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: StrategyConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|e| {
            TradeError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<()> {
        validate_period(self.max_positions, 1).map_err(TradeError::InvalidParameter)?;
        self.universe.validate()?;
        self.threshold.classifier()?;
        self.quantile.classifier()?;
        self.leverage.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Symbol;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = StrategyConfig::from_toml_str("").unwrap();
        assert_eq!(config, StrategyConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = StrategyConfig::from_toml_str(
            r#"
            variant = "quantile_rebalance"
            max_positions = 5

            [threshold]
            reference = "previous_open"

            [leverage]
            benchmark = "QQQ"
            bearish = { long_leverage = 1.0, short_leverage = -0.5 }
            "#,
        )
        .unwrap();

        assert_eq!(config.variant, StrategyVariant::QuantileRebalance);
        assert_eq!(config.max_positions, 5);
        assert_eq!(config.threshold.reference, GapReference::PreviousOpen);
        assert_eq!(config.threshold.lookback, 90);
        assert_eq!(config.leverage.benchmark, Symbol::from("QQQ"));
        assert_eq!(config.leverage.bearish.short_leverage, -0.5);
        assert_eq!(config.leverage.trailing_window, 75);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(StrategyConfig::from_toml_str("max_positions = 0").is_err());
        let long_average = "[threshold]\nma_window = 120";
        assert!(StrategyConfig::from_toml_str(long_average).is_err());
        let unknown_variant = "variant = \"momentum\"";
        assert!(StrategyConfig::from_toml_str(unknown_variant).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[universe]\nmax_coarse = 50").unwrap();

        let config = StrategyConfig::load(file.path()).unwrap();
        assert_eq!(config.universe.max_coarse, 50);

        assert!(StrategyConfig::load("/nonexistent/strategy.toml").is_err());
    }
}
