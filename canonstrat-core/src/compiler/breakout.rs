//! Channel breakout — the last candle breaks the lookback high or low.
//!
//! The channel is built from the `lookback_periods` candles before the most
//! recent one, so the candle being tested never contributes to its own level.

use crate::domain::{Candle, ContractSpec, EvaluationContext};
use crate::schema::{BreakoutConfirmation, BreakoutRules, BreakoutStop, BreakoutTarget, Side};

use super::levels::{adverse, atr_distance, favorable, fixed_distance, r_multiple_target};
use super::PatternEvaluator;

/// Highest high and lowest low of the lookback window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Channel {
    pub high: f64,
    pub low: f64,
}

impl Channel {
    pub fn height(&self) -> f64 {
        self.high - self.low
    }

    /// Level a breakout on `side` must clear.
    pub fn level(&self, side: Side) -> f64 {
        match side {
            Side::Long => self.high,
            Side::Short => self.low,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BreakoutEvaluator {
    rules: BreakoutRules,
    spec: &'static ContractSpec,
}

impl BreakoutEvaluator {
    pub fn new(rules: BreakoutRules, spec: &'static ContractSpec) -> Self {
        Self { rules, spec }
    }

    /// Channel over the lookback window; `None` until enough candles exist or
    /// when any candle in the window is void or malformed.
    pub fn channel(&self, ctx: &EvaluationContext) -> Option<Channel> {
        let window = ctx.lookback_window(self.rules.lookback_periods as usize)?;
        if !window.iter().all(Candle::is_sane) {
            return None;
        }
        let high = window.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
        let low = window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
        Some(Channel { high, low })
    }
}

impl PatternEvaluator for BreakoutEvaluator {
    fn name(&self) -> &str {
        "breakout"
    }

    fn signal(&self, side: Side, ctx: &EvaluationContext) -> bool {
        let (Some(channel), Some(candle)) = (self.channel(ctx), ctx.last_candle()) else {
            return false;
        };
        if !candle.is_sane() {
            return false;
        }
        let probe = match (self.rules.confirmation, side) {
            (BreakoutConfirmation::Close, _) => candle.close,
            (BreakoutConfirmation::Wick, Side::Long) => candle.high,
            (BreakoutConfirmation::Wick, Side::Short) => candle.low,
        };
        match side {
            Side::Long => probe > channel.high,
            Side::Short => probe < channel.low,
        }
    }

    /// Current price, but never on the near side of the broken level.
    fn entry_price(&self, side: Side, ctx: &EvaluationContext) -> Option<f64> {
        let price = ctx.current_price()?;
        let Some(channel) = self.channel(ctx) else {
            return Some(price);
        };
        let level = channel.level(side);
        Some(match side {
            Side::Long => price.max(level),
            Side::Short => price.min(level),
        })
    }

    fn stop_price(&self, side: Side, entry: f64, ctx: &EvaluationContext) -> Option<f64> {
        match self.rules.stop {
            BreakoutStop::BreakoutLevel { buffer_ticks } => {
                let level = self.channel(ctx)?.level(side);
                Some(adverse(level, side, self.spec.ticks_to_price(buffer_ticks)))
            }
            BreakoutStop::AtrMultiple { value } => {
                Some(adverse(entry, side, atr_distance(ctx, value)?))
            }
            BreakoutStop::FixedDistance { value, unit } => {
                Some(adverse(entry, side, fixed_distance(self.spec, value, unit)))
            }
        }
    }

    fn target_price(&self, side: Side, entry: f64, stop: f64, ctx: &EvaluationContext) -> Option<f64> {
        match self.rules.target {
            BreakoutTarget::RMultiple { value } => r_multiple_target(side, entry, stop, value),
            BreakoutTarget::Extension { value } => {
                let height = self.channel(ctx)?.height();
                (height > 0.0).then(|| favorable(entry, side, height * value))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{get_contract_spec, Candle};
    use chrono::{Duration, TimeZone, Utc};

    fn evaluator(lookback: u32, confirmation: BreakoutConfirmation) -> BreakoutEvaluator {
        BreakoutEvaluator::new(
            BreakoutRules {
                lookback_periods: lookback,
                confirmation,
                stop: BreakoutStop::BreakoutLevel { buffer_ticks: 1.0 },
                target: BreakoutTarget::Extension { value: 1.0 },
            },
            get_contract_spec("ES").unwrap(),
        )
    }

    /// `(high, low, close)` per candle; open = close.
    fn ctx(bars: &[(f64, f64, f64)]) -> EvaluationContext {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 4, 15, 0, 0).unwrap();
        let mut c = EvaluationContext::new(t0 + Duration::minutes(5 * bars.len() as i64));
        c.candles = bars
            .iter()
            .enumerate()
            .map(|(i, &(high, low, close))| Candle {
                time: t0 + Duration::minutes(5 * i as i64),
                open: close,
                high,
                low,
                close,
                volume: 0.0,
            })
            .collect();
        c
    }

    fn channel_then(last: (f64, f64, f64)) -> EvaluationContext {
        ctx(&[(5010.0, 5000.0, 5005.0), (5008.0, 5002.0, 5006.0), (5009.0, 5001.0, 5004.0), last])
    }

    #[test]
    fn channel_excludes_last_candle() {
        let e = evaluator(3, BreakoutConfirmation::Close);
        let c = channel_then((5030.0, 4990.0, 5012.0));
        assert_eq!(e.channel(&c), Some(Channel { high: 5010.0, low: 5000.0 }));
        assert!(e.channel(&ctx(&[(1.0, 0.0, 0.5), (1.0, 0.0, 0.5)])).is_none());
    }

    #[test]
    fn malformed_candles_block_the_breakout() {
        let e = evaluator(3, BreakoutConfirmation::Close);
        // High below low inside the lookback window.
        let mut c = channel_then((5013.0, 5006.0, 5012.0));
        c.candles[1].high = 4990.0;
        assert_eq!(e.channel(&c), None);
        assert!(!e.signal(Side::Long, &c));

        // Breakout candle whose close sits above its high.
        let mut c = channel_then((5013.0, 5006.0, 5012.0));
        c.candles[3].close = 5020.0;
        assert!(!e.signal(Side::Long, &c));
    }

    #[test]
    fn close_confirmation_needs_close_beyond() {
        let e = evaluator(3, BreakoutConfirmation::Close);
        assert!(e.signal(Side::Long, &channel_then((5013.0, 5006.0, 5012.0))));
        // Wick above, close back inside.
        assert!(!e.signal(Side::Long, &channel_then((5013.0, 5006.0, 5009.0))));
        assert!(e.signal(Side::Short, &channel_then((5001.0, 4995.0, 4998.0))));
    }

    #[test]
    fn wick_confirmation_accepts_high_beyond() {
        let e = evaluator(3, BreakoutConfirmation::Wick);
        assert!(e.signal(Side::Long, &channel_then((5013.0, 5006.0, 5009.0))));
        assert!(!e.signal(Side::Short, &channel_then((5013.0, 5006.0, 5009.0))));
    }

    #[test]
    fn entry_never_below_broken_level() {
        let e = evaluator(3, BreakoutConfirmation::Wick);
        let c = channel_then((5013.0, 5006.0, 5009.0));
        assert_eq!(e.entry_price(Side::Long, &c), Some(5010.0));
        let c = channel_then((5013.0, 5006.0, 5012.0));
        assert_eq!(e.entry_price(Side::Long, &c), Some(5012.0));
    }

    #[test]
    fn stop_and_extension_target() {
        let e = evaluator(3, BreakoutConfirmation::Close);
        let c = channel_then((5013.0, 5006.0, 5012.0));
        assert_eq!(e.stop_price(Side::Long, 5012.0, &c), Some(5009.75));
        assert_eq!(e.target_price(Side::Long, 5012.0, 5009.75, &c), Some(5022.0));
        assert_eq!(e.stop_price(Side::Short, 4998.0, &c), Some(5000.25));
    }
}
