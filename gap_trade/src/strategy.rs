//! Scheduled strategy handlers
//!
//! All mutable strategy state lives in [`StrategyState`]. Every handler takes
//! the state by value, talks to the host through [`Platform`] and returns the
//! updated state, so the host (or a test) decides where state is kept between
//! callbacks.
//!
//! # Example
//!
//! ```
//! use gap_trade::{GapStrategy, StrategyConfig, StrategyState, RecordingPlatform, History};
//!
//! let strategy = GapStrategy::new(StrategyConfig::default()).unwrap();
//! let mut platform = RecordingPlatform::new(History::new());
//!
//! // Without a universe every daily handler is a no-op
//! let state = strategy.compute_alpha(StrategyState::default(), &platform);
//! let state = strategy.enter_longs(state, &mut platform);
//! assert!(state.universe.is_none());
//! assert!(platform.instructions().is_empty());
//! ```

use crate::config::StrategyConfig;
use crate::leverage::LeverageState;
use crate::liquidation::LiquidationPolicy;
use crate::platform::Platform;
use crate::schedule::{registrations_for, Registration, ScheduledAction};
use crate::signals::{Candidate, CandidateSet, SignalClassifier};
use crate::sizing::{ExistingPositions, PositionSizer, PositionTarget};
use crate::universe::{CoarseFundamental, FineFundamental, Universe};
use crate::{Result, Side, Symbol};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Which classifier and schedule the strategy runs
///
/// The schedule decides the exit rule: the gap variant registers
/// [`ScheduledAction::Close`], the quantile variant
/// [`ScheduledAction::DailyRebalance`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyVariant {
    /// Opening-gap thresholds, entries after the open, flat by the close
    #[default]
    GapThreshold,
    /// Return/volatility quantiles, one daily rebalance with carry-over
    QuantileRebalance,
}

/// Strategy state carried between scheduled callbacks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyState {
    /// `None` until the first universe selection succeeds
    pub universe: Option<Universe>,
    /// Raised monthly; while down, selection keeps the current universe
    pub rebalance_universe: bool,
    /// Today's ranked candidates; after a daily rebalance, the ones held
    pub candidates: CandidateSet,
    pub leverage: LeverageState,
}

impl Default for StrategyState {
    fn default() -> Self {
        Self {
            universe: None,
            rebalance_universe: true,
            candidates: CandidateSet::new(),
            leverage: LeverageState::default(),
        }
    }
}

/// Long/short equity strategy built from a [`StrategyConfig`]
pub struct GapStrategy {
    config: StrategyConfig,
    classifier: Box<dyn SignalClassifier>,
    sizer: PositionSizer,
}

impl GapStrategy {
    pub fn new(config: StrategyConfig) -> Result<Self> {
        config.validate()?;

        let classifier: Box<dyn SignalClassifier> = match config.variant {
            StrategyVariant::GapThreshold => Box::new(config.threshold.classifier()?),
            StrategyVariant::QuantileRebalance => Box::new(config.quantile.classifier()?),
        };

        Ok(Self {
            sizer: PositionSizer::new(),
            classifier,
            config,
        })
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn variant(&self) -> StrategyVariant {
        self.config.variant
    }

    pub fn classifier(&self) -> &dyn SignalClassifier {
        self.classifier.as_ref()
    }

    /// Schedule for the configured variant
    pub fn registrations(&self) -> Vec<Registration> {
        registrations_for(self.config.variant)
    }

    /// Monthly trigger: let the next selection rebuild the universe
    pub fn request_universe_rebalance(&self, mut state: StrategyState) -> StrategyState {
        state.rebalance_universe = true;
        state
    }

    /// Coarse selection callback
    ///
    /// While no rebalance is pending the current universe is returned as is.
    pub fn select_coarse(
        &self,
        state: &StrategyState,
        coarse: &[CoarseFundamental],
    ) -> Vec<Symbol> {
        if !state.rebalance_universe {
            return current_symbols(state);
        }
        self.config.universe.coarse(coarse)
    }

    /// Fine selection callback, stores the new universe and lowers the flag
    pub fn select_fine(
        &self,
        mut state: StrategyState,
        fine: &[FineFundamental],
    ) -> (StrategyState, Vec<Symbol>) {
        if !state.rebalance_universe {
            let symbols = current_symbols(&state);
            return (state, symbols);
        }

        match Universe::new(self.config.universe.fine(fine)) {
            Ok(universe) => {
                info!(size = universe.len(), "universe rebuilt");
                state.universe = Some(universe);
                state.rebalance_universe = false;
            }
            Err(e) => {
                warn!(error = %e, "fine selection left no symbols, keeping previous universe");
            }
        }

        let symbols = current_symbols(&state);
        (state, symbols)
    }

    /// Run both selection stages, passing only coarse survivors to the fine stage
    pub fn select_universe(
        &self,
        state: StrategyState,
        coarse: &[CoarseFundamental],
        fine: &[FineFundamental],
    ) -> StrategyState {
        let survivors: HashSet<Symbol> = self.select_coarse(&state, coarse).into_iter().collect();
        let fine: Vec<FineFundamental> = fine
            .iter()
            .filter(|f| survivors.contains(&f.symbol))
            .cloned()
            .collect();
        self.select_fine(state, &fine).0
    }

    /// Monthly leverage update from the benchmark's closes
    pub fn set_leverage<P: Platform + ?Sized>(
        &self,
        mut state: StrategyState,
        platform: &P,
    ) -> StrategyState {
        let controller = &self.config.leverage;
        let history = platform.history(
            std::slice::from_ref(&controller.benchmark),
            controller.history_bars,
        );

        let closes = history
            .get(&controller.benchmark)
            .map(|h| h.closes())
            .unwrap_or_default();

        match controller.update(&closes) {
            Ok(leverage) => {
                if leverage != state.leverage {
                    info!(
                        benchmark = %controller.benchmark,
                        long = leverage.long_leverage,
                        short = leverage.short_leverage,
                        "leverage changed"
                    );
                }
                state.leverage = leverage;
            }
            Err(e) => {
                warn!(benchmark = %controller.benchmark, error = %e, "keeping previous leverage");
            }
        }

        state
    }

    /// Daily classification; replaces the candidate lists
    pub fn compute_alpha<P: Platform + ?Sized>(
        &self,
        mut state: StrategyState,
        platform: &P,
    ) -> StrategyState {
        let Some(universe) = &state.universe else {
            return state;
        };
        let candidates = self
            .qualifying_candidates(universe, platform)
            .ranked(self.config.max_positions);
        state.candidates = candidates;
        state
    }

    /// Every candidate the classifier accepts, before ranking or capping
    fn qualifying_candidates<P: Platform + ?Sized>(
        &self,
        universe: &Universe,
        platform: &P,
    ) -> CandidateSet {
        let history = platform.history(universe.symbols(), self.classifier.lookback());
        match self.classifier.classify(universe, &history) {
            Ok(report) => {
                let skipped = report.insufficient();
                if !skipped.is_empty() {
                    debug!(
                        count = skipped.len(),
                        "symbols skipped for insufficient history"
                    );
                }
                report.candidates
            }
            Err(e) => {
                warn!(classifier = self.classifier.name(), error = %e, "classification failed");
                CandidateSet::new()
            }
        }
    }

    /// Enter today's long candidates at equal weight
    pub fn enter_longs<P: Platform + ?Sized>(
        &self,
        state: StrategyState,
        platform: &mut P,
    ) -> StrategyState {
        self.enter_side(state, Side::Long, platform)
    }

    /// Enter today's short candidates at equal weight
    pub fn enter_shorts<P: Platform + ?Sized>(
        &self,
        state: StrategyState,
        platform: &mut P,
    ) -> StrategyState {
        self.enter_side(state, Side::Short, platform)
    }

    fn enter_side<P: Platform + ?Sized>(
        &self,
        state: StrategyState,
        side: Side,
        platform: &mut P,
    ) -> StrategyState {
        if state.universe.is_none() {
            return state;
        }

        let members = state.candidates.side(side).to_vec();
        if members.is_empty() {
            return state;
        }

        let single_side = match side {
            Side::Long => CandidateSet {
                longs: members.clone(),
                shorts: Vec::new(),
            },
            Side::Short => CandidateSet {
                longs: Vec::new(),
                shorts: members.clone(),
            },
        };
        let target = self
            .sizer
            .size(&single_side, &state.leverage, ExistingPositions::default());

        debug!(%side, count = members.len(), "entering positions");
        for candidate in &members {
            if let Some(weight) = target.weight(&candidate.symbol) {
                platform.add_equity(&candidate.symbol);
                platform.set_holdings(&candidate.symbol, weight);
            }
        }

        state
    }

    /// End-of-day close: flatten today's candidates that are held, then clear them
    pub fn close<P: Platform + ?Sized>(
        &self,
        mut state: StrategyState,
        platform: &mut P,
    ) -> StrategyState {
        if state.universe.is_none() {
            return state;
        }

        let plan = LiquidationPolicy::EndOfDay.plan(&platform.holdings(), &state.candidates);
        for symbol in &plan.liquidate {
            platform.set_holdings(symbol, 0.0);
        }
        if !plan.liquidate.is_empty() {
            debug!(
                count = plan.liquidate.len(),
                "flattened candidate positions"
            );
        }

        state.candidates.clear();
        state
    }

    /// Daily rebalance with carry-over of positions still in their bucket
    ///
    /// Held positions are checked against every qualifying candidate, not
    /// only the top-ranked ones. Kept positions use up slots of
    /// `max_positions`; new entries fill the rest of each side.
    pub fn daily_rebalance<P: Platform + ?Sized>(
        &self,
        mut state: StrategyState,
        platform: &mut P,
    ) -> StrategyState {
        let Some(universe) = &state.universe else {
            return state;
        };

        let qualifying = self.qualifying_candidates(universe, &*platform);
        let holdings = platform.holdings();
        let plan = LiquidationPolicy::BucketDrift.plan(&holdings, &qualifying);

        for symbol in &plan.liquidate {
            platform.set_holdings(symbol, 0.0);
        }

        let max_positions = self.config.max_positions;
        let entries = plan.entries.ranked_with_slots(
            max_positions.saturating_sub(plan.existing.long),
            max_positions.saturating_sub(plan.existing.short),
        );
        let target = self.sizer.size(&entries, &state.leverage, plan.existing);
        self.submit(&entries, &target, platform);

        debug!(
            liquidated = plan.liquidate.len(),
            kept_long = plan.existing.long,
            kept_short = plan.existing.short,
            entered = target.len(),
            "daily rebalance complete"
        );

        let held = |candidate: &Candidate, side: Side| {
            entries.contains(&candidate.symbol) || holdings.side_of(&candidate.symbol) == Some(side)
        };
        let ranked = qualifying.ranked(usize::MAX);
        let keep = |side: Side| -> Vec<Candidate> {
            ranked
                .side(side)
                .iter()
                .filter(|c| held(c, side))
                .cloned()
                .collect()
        };
        state.candidates = CandidateSet {
            longs: keep(Side::Long),
            shorts: keep(Side::Short),
        };
        state
    }

    fn submit<P: Platform + ?Sized>(
        &self,
        entries: &CandidateSet,
        target: &PositionTarget,
        platform: &mut P,
    ) {
        for candidate in entries.longs.iter().chain(&entries.shorts) {
            if let Some(weight) = target.weight(&candidate.symbol) {
                platform.add_equity(&candidate.symbol);
                platform.set_holdings(&candidate.symbol, weight);
            }
        }
    }

    /// Route a scheduled action to its handler
    pub fn dispatch<P: Platform + ?Sized>(
        &self,
        state: StrategyState,
        action: ScheduledAction,
        platform: &mut P,
    ) -> StrategyState {
        debug!(%action, "dispatching scheduled action");
        match action {
            ScheduledAction::UniverseRebalance => self.request_universe_rebalance(state),
            ScheduledAction::SetLeverage => self.set_leverage(state, &*platform),
            ScheduledAction::Alpha => self.compute_alpha(state, &*platform),
            ScheduledAction::EnterLongs => self.enter_longs(state, platform),
            ScheduledAction::EnterShorts => self.enter_shorts(state, platform),
            ScheduledAction::Close => self.close(state, platform),
            ScheduledAction::DailyRebalance => self.daily_rebalance(state, platform),
        }
    }
}

fn current_symbols(state: &StrategyState) -> Vec<Symbol> {
    state
        .universe
        .as_ref()
        .map(|u| u.symbols().to_vec())
        .unwrap_or_default()
}
