//! Opening range breakout — price leaves the session's opening range.
//!
//! Fires Long when the current price crosses above `range.high + buffer` and
//! Short when it crosses below `range.low - buffer`. The range must be complete
//! and wider than zero.

use crate::domain::{ContractSpec, EvaluationContext, OpeningRange};
use crate::schema::{OrbRules, OrbStop, OrbTarget, Side};

use super::levels::{adverse, atr_distance, crossed, favorable, fixed_distance, r_multiple_target};
use super::PatternEvaluator;

#[derive(Debug, Clone)]
pub struct OrbEvaluator {
    rules: OrbRules,
    spec: &'static ContractSpec,
}

impl OrbEvaluator {
    pub fn new(rules: OrbRules, spec: &'static ContractSpec) -> Self {
        Self { rules, spec }
    }

    fn range(ctx: &EvaluationContext) -> Option<OpeningRange> {
        ctx.opening_range.filter(OpeningRange::is_tradable)
    }

    /// Range side the breakout leaves through.
    fn breakout_side(range: &OpeningRange, side: Side) -> f64 {
        match side {
            Side::Long => range.high,
            Side::Short => range.low,
        }
    }

    fn opposite_side(range: &OpeningRange, side: Side) -> f64 {
        Self::breakout_side(range, side.opposite())
    }

    /// Price that must be crossed for an entry.
    pub fn trigger_level(&self, range: &OpeningRange, side: Side) -> f64 {
        let buffer = self.spec.ticks_to_price(self.rules.breakout_buffer_ticks);
        favorable(Self::breakout_side(range, side), side, buffer)
    }
}

impl PatternEvaluator for OrbEvaluator {
    fn name(&self) -> &str {
        "orb"
    }

    fn signal(&self, side: Side, ctx: &EvaluationContext) -> bool {
        let (Some(range), Some(price)) = (Self::range(ctx), ctx.current_price()) else {
            return false;
        };
        crossed(side, price, self.trigger_level(&range, side), ctx.reference_close())
    }

    fn entry_price(&self, _side: Side, ctx: &EvaluationContext) -> Option<f64> {
        ctx.current_price()
    }

    fn stop_price(&self, side: Side, entry: f64, ctx: &EvaluationContext) -> Option<f64> {
        match self.rules.stop {
            OrbStop::Percentage { value } => {
                let range = Self::range(ctx)?;
                let distance = range.size() * value / 100.0;
                Some(adverse(Self::breakout_side(&range, side), side, distance))
            }
            OrbStop::OppositeSide => {
                let range = Self::range(ctx)?;
                Some(adverse(Self::opposite_side(&range, side), side, self.spec.tick_size))
            }
            OrbStop::FixedDistance { value, unit } => {
                Some(adverse(entry, side, fixed_distance(self.spec, value, unit)))
            }
            OrbStop::AtrMultiple { value } => Some(adverse(entry, side, atr_distance(ctx, value)?)),
        }
    }

    fn target_price(&self, side: Side, entry: f64, stop: f64, ctx: &EvaluationContext) -> Option<f64> {
        match self.rules.target {
            OrbTarget::RMultiple { value } => r_multiple_target(side, entry, stop, value),
            OrbTarget::Extension { value } => {
                let range = Self::range(ctx)?;
                Some(favorable(entry, side, range.size() * value))
            }
            OrbTarget::FixedDistance { value, unit } => {
                Some(favorable(entry, side, fixed_distance(self.spec, value, unit)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{get_contract_spec, IndicatorSnapshot, Quote};
    use crate::schema::DistanceUnit;
    use chrono::{TimeZone, Utc};

    fn evaluator(stop: OrbStop, target: OrbTarget, buffer_ticks: f64) -> OrbEvaluator {
        OrbEvaluator::new(
            OrbRules {
                period_minutes: 15,
                breakout_buffer_ticks: buffer_ticks,
                stop,
                target,
            },
            get_contract_spec("ES").unwrap(),
        )
    }

    fn ctx(last: f64, prev_close: Option<f64>) -> EvaluationContext {
        let mut c = EvaluationContext::new(Utc.with_ymd_and_hms(2024, 3, 4, 15, 0, 0).unwrap());
        c.opening_range = Some(OpeningRange { high: 5010.0, low: 5000.0, is_complete: true });
        c.quote = Some(Quote { last, bid: None, ask: None });
        if let Some(close) = prev_close {
            c.candles.push(crate::domain::Candle {
                time: c.time,
                open: close,
                high: close,
                low: close,
                close,
                volume: 0.0,
            });
        }
        c
    }

    #[test]
    fn long_fires_on_cross_above_high() {
        let e = evaluator(OrbStop::OppositeSide, OrbTarget::RMultiple { value: 2.0 }, 0.0);
        assert!(e.signal(Side::Long, &ctx(5011.0, Some(5009.0))));
        assert!(!e.signal(Side::Long, &ctx(5011.0, Some(5010.5))));
        assert!(!e.signal(Side::Long, &ctx(5009.0, Some(5005.0))));
        assert!(!e.signal(Side::Short, &ctx(5011.0, Some(5009.0))));
    }

    #[test]
    fn short_fires_on_cross_below_low() {
        let e = evaluator(OrbStop::OppositeSide, OrbTarget::RMultiple { value: 2.0 }, 0.0);
        assert!(e.signal(Side::Short, &ctx(4999.0, Some(5001.0))));
    }

    #[test]
    fn buffer_moves_trigger_level() {
        let e = evaluator(OrbStop::OppositeSide, OrbTarget::RMultiple { value: 2.0 }, 4.0);
        // 4 ticks = 1 point above the high
        assert!(!e.signal(Side::Long, &ctx(5010.75, Some(5009.0))));
        assert!(e.signal(Side::Long, &ctx(5011.25, Some(5009.0))));
    }

    #[test]
    fn incomplete_or_flat_range_never_fires() {
        let e = evaluator(OrbStop::OppositeSide, OrbTarget::RMultiple { value: 2.0 }, 0.0);
        let mut c = ctx(5011.0, Some(5009.0));
        c.opening_range = Some(OpeningRange { high: 5010.0, low: 5000.0, is_complete: false });
        assert!(!e.signal(Side::Long, &c));
        c.opening_range = Some(OpeningRange { high: 5000.0, low: 5000.0, is_complete: true });
        assert!(!e.signal(Side::Long, &c));
        c.opening_range = None;
        assert!(!e.signal(Side::Long, &c));
    }

    #[test]
    fn opposite_side_stop_is_one_tick_beyond() {
        let e = evaluator(OrbStop::OppositeSide, OrbTarget::RMultiple { value: 2.0 }, 0.0);
        let c = ctx(5011.0, None);
        assert_eq!(e.stop_price(Side::Long, 5011.0, &c), Some(4999.75));
        assert_eq!(e.stop_price(Side::Short, 4999.0, &c), Some(5010.25));
    }

    #[test]
    fn percentage_stop_measures_from_breakout_side() {
        let e = evaluator(OrbStop::Percentage { value: 50.0 }, OrbTarget::RMultiple { value: 2.0 }, 0.0);
        let c = ctx(5011.0, None);
        assert_eq!(e.stop_price(Side::Long, 5011.0, &c), Some(5005.0));
        assert_eq!(e.stop_price(Side::Short, 4999.0, &c), Some(5005.0));
    }

    #[test]
    fn distance_and_atr_stops_measure_from_entry() {
        let fixed = evaluator(
            OrbStop::FixedDistance { value: 8.0, unit: DistanceUnit::Ticks },
            OrbTarget::RMultiple { value: 2.0 },
            0.0,
        );
        let mut c = ctx(5011.0, None);
        assert_eq!(fixed.stop_price(Side::Long, 5011.0, &c), Some(5009.0));

        let atr = evaluator(OrbStop::AtrMultiple { value: 1.5 }, OrbTarget::RMultiple { value: 2.0 }, 0.0);
        assert_eq!(atr.stop_price(Side::Long, 5011.0, &c), None);
        c.indicators = IndicatorSnapshot { atr: Some(4.0), ..Default::default() };
        assert_eq!(atr.stop_price(Side::Short, 4999.0, &c), Some(5005.0));
    }

    #[test]
    fn targets() {
        let c = ctx(5011.0, None);
        let r = evaluator(OrbStop::OppositeSide, OrbTarget::RMultiple { value: 2.0 }, 0.0);
        assert_eq!(r.target_price(Side::Long, 5011.0, 5009.0, &c), Some(5015.0));

        let ext = evaluator(OrbStop::OppositeSide, OrbTarget::Extension { value: 1.0 }, 0.0);
        assert_eq!(ext.target_price(Side::Long, 5011.0, 5009.0, &c), Some(5021.0));
        assert_eq!(ext.target_price(Side::Short, 4999.0, 5001.0, &c), Some(4989.0));

        let fixed = evaluator(
            OrbStop::OppositeSide,
            OrbTarget::FixedDistance { value: 3.0, unit: DistanceUnit::Points },
            0.0,
        );
        assert_eq!(fixed.target_price(Side::Short, 4999.0, 5001.0, &c), Some(4996.0));
    }
}
