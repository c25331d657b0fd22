//! Pattern compiler — turns a validated strategy into pure decision functions.
//!
//! `compile_canonical_strategy` picks one [`PatternEvaluator`] per entry variant
//! and bundles it with the position sizer and session window. The result is
//! immutable and `Send + Sync`; one instance can serve any number of threads.

pub mod breakout;
pub mod ema_pullback;
pub mod levels;
pub mod orb;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};

use crate::domain::{ContractSpec, EvaluationContext};
use crate::error::CoreError;
use crate::fingerprint::StrategyFingerprint;
use crate::schema::{parse_canonical, CanonicalStrategy, Direction, EntryRules, Pattern, Side};
use crate::session::SessionWindow;
use crate::sizing::PositionSizer;

pub use breakout::{BreakoutEvaluator, Channel};
pub use ema_pullback::EmaPullbackEvaluator;
pub use orb::OrbEvaluator;

/// Per-pattern decision logic.
///
/// # Architecture invariant
/// Evaluators see only the evaluation context and their own configuration.
/// They hold no mutable state, so every method is a pure function of its inputs.
pub trait PatternEvaluator: Send + Sync + fmt::Debug {
    /// Pattern name (e.g., "orb").
    fn name(&self) -> &str;

    /// Whether the entry condition holds for `side`.
    fn signal(&self, side: Side, ctx: &EvaluationContext) -> bool;

    fn entry_price(&self, side: Side, ctx: &EvaluationContext) -> Option<f64>;

    fn stop_price(&self, side: Side, entry: f64, ctx: &EvaluationContext) -> Option<f64>;

    fn target_price(&self, side: Side, entry: f64, stop: f64, ctx: &EvaluationContext) -> Option<f64>;
}

/// Create the evaluator for an entry variant.
pub fn create_evaluator(entry: &EntryRules, spec: &'static ContractSpec) -> Box<dyn PatternEvaluator> {
    match entry {
        EntryRules::Orb(rules) => Box::new(OrbEvaluator::new(*rules, spec)),
        EntryRules::EmaPullback(rules) => Box::new(EmaPullbackEvaluator::new(*rules, spec)),
        EntryRules::Breakout(rules) => Box::new(BreakoutEvaluator::new(*rules, spec)),
    }
}

/// Every decision for one entry, computed from a single context.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradePlan {
    pub side: Side,
    pub entry: f64,
    pub stop: f64,
    pub target: f64,
    pub contracts: u32,
    /// Dollars lost if the stop is hit with `contracts` contracts.
    pub risk_dollars: f64,
    /// Target distance over stop distance.
    pub reward_risk: f64,
}

/// A compiled strategy: pure functions over an [`EvaluationContext`].
#[derive(Debug)]
pub struct CompiledStrategy {
    pattern: Pattern,
    instrument: &'static ContractSpec,
    direction: Direction,
    evaluator: Box<dyn PatternEvaluator>,
    sizer: PositionSizer,
    session: SessionWindow,
    fingerprint: StrategyFingerprint,
}

impl CompiledStrategy {
    pub fn pattern(&self) -> Pattern {
        self.pattern
    }

    pub fn instrument(&self) -> &'static ContractSpec {
        self.instrument
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn sizer(&self) -> &PositionSizer {
        &self.sizer
    }

    pub fn session(&self) -> &SessionWindow {
        &self.session
    }

    pub fn fingerprint(&self) -> &StrategyFingerprint {
        &self.fingerprint
    }

    /// Entry, stop and target for `side`, only when correctly ordered.
    fn levels(&self, side: Side, ctx: &EvaluationContext) -> Option<(f64, f64, f64)> {
        let entry = self.evaluator.entry_price(side, ctx)?;
        let stop = self.evaluator.stop_price(side, entry, ctx)?;
        let target = self.evaluator.target_price(side, entry, stop, ctx)?;
        levels::is_ordered(side, entry, stop, target).then_some((entry, stop, target))
    }

    /// Side an entry fires on, if any. Long is checked first when both are allowed.
    ///
    /// A side fires only when its signal holds and entry, stop and target are
    /// all computable and ordered `stop < entry < target` (reversed for short).
    pub fn entry_side(&self, ctx: &EvaluationContext) -> Option<Side> {
        let side = self
            .direction
            .sides()
            .iter()
            .copied()
            .find(|&side| self.evaluator.signal(side, ctx) && self.levels(side, ctx).is_some());
        trace!(pattern = %self.pattern, side = ?side, time = %ctx.time, "entry check");
        side
    }

    /// Session hours are checked separately by [`is_time_valid`](Self::is_time_valid).
    pub fn should_enter(&self, ctx: &EvaluationContext) -> bool {
        self.entry_side(ctx).is_some()
    }

    /// Side used by the price functions: fixed for one-sided strategies, the
    /// firing side for `both`, long when nothing fires.
    fn price_side(&self, ctx: &EvaluationContext) -> Side {
        match self.direction {
            Direction::Long => Side::Long,
            Direction::Short => Side::Short,
            Direction::Both => self.entry_side(ctx).unwrap_or(Side::Long),
        }
    }

    pub fn get_entry_price(&self, ctx: &EvaluationContext) -> Option<f64> {
        self.evaluator.entry_price(self.price_side(ctx), ctx)
    }

    pub fn get_stop_price(&self, entry: f64, ctx: &EvaluationContext) -> Option<f64> {
        if !entry.is_finite() {
            return None;
        }
        self.evaluator.stop_price(self.price_side(ctx), entry, ctx)
    }

    /// The side is inferred from where `stop` sits relative to `entry`.
    pub fn get_target_price(&self, entry: f64, stop: f64, ctx: &EvaluationContext) -> Option<f64> {
        if !entry.is_finite() || !stop.is_finite() {
            return None;
        }
        let side = if stop < entry {
            Side::Long
        } else if stop > entry {
            Side::Short
        } else {
            return None;
        };
        self.evaluator.target_price(side, entry, stop, ctx)
    }

    pub fn get_contract_quantity(&self, balance: f64, entry: f64, stop: f64) -> u32 {
        self.sizer.contract_quantity(balance, entry, stop)
    }

    pub fn is_time_valid(&self, time: DateTime<Utc>) -> bool {
        self.session.is_time_valid(time)
    }

    /// All entry decisions for `ctx`. `None` outside the session or without a signal.
    pub fn plan_entry(&self, ctx: &EvaluationContext, balance: f64) -> Option<TradePlan> {
        if !self.is_time_valid(ctx.time) {
            return None;
        }
        let side = self.entry_side(ctx)?;
        let (entry, stop, target) = self.levels(side, ctx)?;
        let contracts = self.get_contract_quantity(balance, entry, stop);
        Some(TradePlan {
            side,
            entry,
            stop,
            target,
            contracts,
            risk_dollars: f64::from(contracts) * self.sizer.risk_per_contract(entry, stop),
            reward_risk: (target - entry).abs() / (entry - stop).abs(),
        })
    }
}

/// Compile a validated strategy. Never fails: the validator has already
/// enforced every bound the evaluators rely on.
pub fn compile_canonical_strategy(strategy: &CanonicalStrategy) -> CompiledStrategy {
    debug_assert!(
        strategy.risk.risk_percent > 0.0
            && strategy.risk.risk_percent <= crate::schema::MAX_RISK_PERCENT
            && strategy.risk.max_contracts >= 1,
        "compiling a strategy that did not pass validation"
    );

    let instrument = strategy.contract();
    let fingerprint = strategy.fingerprint();
    debug!(
        pattern = %strategy.pattern(),
        symbol = instrument.symbol,
        direction = ?strategy.direction,
        fingerprint = fingerprint.short(),
        "compiled strategy"
    );

    CompiledStrategy {
        pattern: strategy.pattern(),
        instrument,
        direction: strategy.direction,
        evaluator: create_evaluator(&strategy.entry, instrument),
        sizer: PositionSizer::from_risk(instrument, &strategy.risk),
        session: SessionWindow::new(strategy.session),
        fingerprint,
    }
}

/// Validate then compile. The only failure is [`CoreError::SchemaInvalid`].
pub fn compile_from_unknown(raw: &Value) -> Result<CompiledStrategy, CoreError> {
    let strategy = parse_canonical(raw)?;
    Ok(compile_canonical_strategy(&strategy))
}
