//! Price-level arithmetic shared by the pattern evaluators.
//!
//! All helpers are side-aware: a positive distance moves a price in the
//! trade's favor via [`Side::sign`].

use crate::domain::{ContractSpec, EvaluationContext};
use crate::schema::{Distance, DistanceUnit, Side};

/// `price` moved `distance` in the trade's favor.
pub fn favorable(price: f64, side: Side, distance: f64) -> f64 {
    price + side.sign() * distance
}

/// `price` moved `distance` against the trade.
pub fn adverse(price: f64, side: Side, distance: f64) -> f64 {
    price - side.sign() * distance
}

/// Price distance of a fixed-distance stop or target.
pub fn fixed_distance(spec: &ContractSpec, value: f64, unit: DistanceUnit) -> f64 {
    Distance { value, unit }.to_price(spec)
}

/// `multiple` × ATR, when the context carries a positive ATR.
pub fn atr_distance(ctx: &EvaluationContext, multiple: f64) -> Option<f64> {
    ctx.indicators.atr().map(|atr| atr * multiple)
}

/// Target `r` times the entry-to-stop distance beyond the entry.
pub fn r_multiple_target(side: Side, entry: f64, stop: f64, r: f64) -> Option<f64> {
    let risk = (entry - stop).abs();
    (risk > 0.0 && risk.is_finite()).then(|| favorable(entry, side, r * risk))
}

/// Whether `price` has crossed `level` on this tick: beyond it now, and the
/// previous reference close (if any) was not.
pub fn crossed(side: Side, price: f64, level: f64, reference: Option<f64>) -> bool {
    let beyond = |p: f64| match side {
        Side::Long => p > level,
        Side::Short => p < level,
    };
    beyond(price) && !reference.is_some_and(beyond)
}

/// Stop and target on the correct sides of a finite entry:
/// `stop < entry < target` for long, reversed for short.
pub fn is_ordered(side: Side, entry: f64, stop: f64, target: f64) -> bool {
    if !(entry.is_finite() && stop.is_finite() && target.is_finite()) {
        return false;
    }
    match side {
        Side::Long => stop < entry && entry < target,
        Side::Short => target < entry && entry < stop,
    }
}
