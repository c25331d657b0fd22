//! EMA pullback — trend continuation after price retraces to a moving average.
//!
//! The last candle must approach the EMA from the trend side and touch it
//! within a tolerance band. `Bounce` confirmation also requires the candle to
//! close back on the trend side with a body in the trade direction.

use crate::domain::{ContractSpec, EvaluationContext};
use crate::schema::{EmaPullbackRules, EmaStop, EmaTarget, PullbackConfirmation, Side};

use super::levels::{adverse, atr_distance, fixed_distance, r_multiple_target};
use super::PatternEvaluator;

#[derive(Debug, Clone)]
pub struct EmaPullbackEvaluator {
    rules: EmaPullbackRules,
    spec: &'static ContractSpec,
}

impl EmaPullbackEvaluator {
    pub fn new(rules: EmaPullbackRules, spec: &'static ContractSpec) -> Self {
        Self { rules, spec }
    }

    /// RSI band check. With a filter configured, a missing RSI blocks entries.
    fn rsi_allows(&self, ctx: &EvaluationContext) -> bool {
        match self.rules.rsi_filter {
            None => true,
            Some(filter) => ctx.indicators.rsi().is_some_and(|rsi| filter.allows(rsi)),
        }
    }

    fn pullback(&self, side: Side, ctx: &EvaluationContext) -> Option<bool> {
        let ema = ctx.indicators.ema(self.rules.ema_period)?;
        let candle = ctx.last_candle().filter(|c| c.is_sane())?;
        let approach = ctx
            .previous_candle()
            .map(|c| c.close)
            .filter(|p| p.is_finite())
            .unwrap_or(candle.open);
        let tol = self.spec.ticks_to_price(self.rules.touch_tolerance_ticks);

        let touched = match side {
            Side::Long => approach > ema && candle.low <= ema + tol && candle.close >= ema - tol,
            Side::Short => approach < ema && candle.high >= ema - tol && candle.close <= ema + tol,
        };
        let confirmed = match self.rules.confirmation {
            PullbackConfirmation::Touch => touched,
            PullbackConfirmation::Bounce => {
                touched
                    && match side {
                        Side::Long => candle.close > ema && candle.is_bullish(),
                        Side::Short => candle.close < ema && candle.is_bearish(),
                    }
            }
        };
        Some(confirmed)
    }
}

impl PatternEvaluator for EmaPullbackEvaluator {
    fn name(&self) -> &str {
        "ema_pullback"
    }

    fn signal(&self, side: Side, ctx: &EvaluationContext) -> bool {
        self.rsi_allows(ctx) && self.pullback(side, ctx).unwrap_or(false)
    }

    fn entry_price(&self, _side: Side, ctx: &EvaluationContext) -> Option<f64> {
        ctx.current_price()
    }

    fn stop_price(&self, side: Side, entry: f64, ctx: &EvaluationContext) -> Option<f64> {
        match self.rules.stop {
            EmaStop::Structure { buffer_ticks } => {
                let swing = match side {
                    Side::Long => ctx.swing_low()?,
                    Side::Short => ctx.swing_high()?,
                };
                Some(adverse(swing, side, self.spec.ticks_to_price(buffer_ticks)))
            }
            EmaStop::AtrMultiple { value } => Some(adverse(entry, side, atr_distance(ctx, value)?)),
            EmaStop::FixedDistance { value, unit } => {
                Some(adverse(entry, side, fixed_distance(self.spec, value, unit)))
            }
        }
    }

    fn target_price(&self, side: Side, entry: f64, stop: f64, _ctx: &EvaluationContext) -> Option<f64> {
        match self.rules.target {
            EmaTarget::RMultiple { value } => r_multiple_target(side, entry, stop, value),
        }
    }
}
