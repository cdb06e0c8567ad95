//! Schedule registrations handed to the host scheduler
//!
//! The host fires each registered action on its trigger; handlers for a given
//! day run in registration order and each finishes before the next starts.

use crate::strategy::StrategyVariant;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// When the host should fire an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum TriggerRule {
    /// First trading day of each month at a wall-clock time
    MonthStart { at: NaiveTime },
    /// Every trading day, `minutes` after the open
    AfterMarketOpen { minutes: u32 },
    /// Every trading day, `minutes` before the close
    BeforeMarketClose { minutes: u32 },
}

/// Handler the host invokes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduledAction {
    UniverseRebalance,
    SetLeverage,
    Alpha,
    EnterLongs,
    EnterShorts,
    Close,
    DailyRebalance,
}

impl fmt::Display for ScheduledAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScheduledAction::UniverseRebalance => "universe_rebalance",
            ScheduledAction::SetLeverage => "set_leverage",
            ScheduledAction::Alpha => "alpha",
            ScheduledAction::EnterLongs => "enter_longs",
            ScheduledAction::EnterShorts => "enter_shorts",
            ScheduledAction::Close => "close",
            ScheduledAction::DailyRebalance => "daily_rebalance",
        };
        f.write_str(name)
    }
}

/// One action bound to its trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub action: ScheduledAction,
    pub rule: TriggerRule,
}

impl Registration {
    pub fn new(action: ScheduledAction, rule: TriggerRule) -> Self {
        Self { action, rule }
    }

    pub fn is_monthly(&self) -> bool {
        matches!(self.rule, TriggerRule::MonthStart { .. })
    }
}

/// Registrations for a strategy variant, in firing order
pub fn registrations_for(variant: StrategyVariant) -> Vec<Registration> {
    let midnight = NaiveTime::MIN;
    let month_start = TriggerRule::MonthStart { at: midnight };
    let after_open = |minutes| TriggerRule::AfterMarketOpen { minutes };
    let mut registrations = vec![
        Registration::new(ScheduledAction::UniverseRebalance, month_start),
        Registration::new(ScheduledAction::SetLeverage, month_start),
    ];

    match variant {
        StrategyVariant::GapThreshold => registrations.extend([
            Registration::new(ScheduledAction::Alpha, after_open(6)),
            Registration::new(ScheduledAction::EnterLongs, after_open(7)),
            Registration::new(ScheduledAction::EnterShorts, after_open(8)),
            Registration::new(
                ScheduledAction::Close,
                TriggerRule::BeforeMarketClose { minutes: 5 },
            ),
        ]),
        StrategyVariant::QuantileRebalance => {
            let rebalance = Registration::new(ScheduledAction::DailyRebalance, after_open(30));
            registrations.push(rebalance);
        }
    }

    registrations
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_gap_schedule() {
        let actions: Vec<ScheduledAction> = registrations_for(StrategyVariant::GapThreshold)
            .iter()
            .map(|r| r.action)
            .collect();
        assert_eq!(
            actions,
            vec![
                ScheduledAction::UniverseRebalance,
                ScheduledAction::SetLeverage,
                ScheduledAction::Alpha,
                ScheduledAction::EnterLongs,
                ScheduledAction::EnterShorts,
                ScheduledAction::Close,
            ]
        );
    }

    #[test]
    fn test_quantile_schedule() {
        let registrations = registrations_for(StrategyVariant::QuantileRebalance);
        assert_eq!(registrations.len(), 3);
        assert!(registrations[0].is_monthly());
        assert_eq!(registrations[2].action, ScheduledAction::DailyRebalance);
        assert!(!registrations[2].is_monthly());
    }

    #[test]
    fn test_action_display() {
        assert_eq!(ScheduledAction::EnterShorts.to_string(), "enter_shorts");
    }
}
