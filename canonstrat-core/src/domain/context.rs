//! Evaluation context — everything a compiled strategy may read on one tick.
//!
//! The caller owns market data, indicator computation, and swing detection.
//! It assembles a fresh context per evaluation; compiled functions only read it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::candle::Candle;

/// Latest quote for the instrument.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub last: f64,
    #[serde(default)]
    pub bid: Option<f64>,
    #[serde(default)]
    pub ask: Option<f64>,
}

/// Externally computed indicator values as of the current tick.
///
/// EMA values are keyed by period; a strategy reads only the period it was
/// configured with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    #[serde(default)]
    pub ema: BTreeMap<u32, f64>,
    #[serde(default)]
    pub rsi: Option<f64>,
    #[serde(default)]
    pub atr: Option<f64>,
}

impl IndicatorSnapshot {
    pub fn ema(&self, period: u32) -> Option<f64> {
        self.ema.get(&period).copied().filter(|v| v.is_finite())
    }

    pub fn rsi(&self) -> Option<f64> {
        self.rsi.filter(|v| v.is_finite())
    }

    /// ATR, only when strictly positive.
    pub fn atr(&self) -> Option<f64> {
        self.atr.filter(|v| v.is_finite() && *v > 0.0)
    }
}

/// Opening range of the current session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpeningRange {
    pub high: f64,
    pub low: f64,
    pub is_complete: bool,
}

impl OpeningRange {
    /// high - low
    pub fn size(&self) -> f64 {
        self.high - self.low
    }

    /// Complete, finite, and strictly wider than zero.
    pub fn is_tradable(&self) -> bool {
        self.is_complete && self.high.is_finite() && self.low.is_finite() && self.high > self.low
    }
}

/// Most recent swing levels, detected by the caller's market-data layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwingLevels {
    #[serde(default)]
    pub swing_high: Option<f64>,
    #[serde(default)]
    pub swing_low: Option<f64>,
}

/// Per-tick input to every compiled strategy function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationContext {
    /// Chronological candles; the last one is the most recent.
    #[serde(default)]
    pub candles: Vec<Candle>,
    #[serde(default)]
    pub quote: Option<Quote>,
    #[serde(default)]
    pub indicators: IndicatorSnapshot,
    #[serde(default)]
    pub opening_range: Option<OpeningRange>,
    #[serde(default)]
    pub swing: Option<SwingLevels>,
    pub time: DateTime<Utc>,
}

impl EvaluationContext {
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            candles: Vec::new(),
            quote: None,
            indicators: IndicatorSnapshot::default(),
            opening_range: None,
            swing: None,
            time,
        }
    }

    pub fn last_candle(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn previous_candle(&self) -> Option<&Candle> {
        self.candles.len().checked_sub(2).map(|i| &self.candles[i])
    }

    /// Quote last price, falling back to the most recent candle close.
    pub fn current_price(&self) -> Option<f64> {
        self.quote
            .map(|q| q.last)
            .filter(|p| p.is_finite())
            .or_else(|| self.last_candle().map(|c| c.close).filter(|p| p.is_finite()))
    }

    /// The close that precedes `current_price`.
    ///
    /// With a quote, the current price is intra-candle and the reference is the
    /// last candle close. Without one, the current price is the last close and
    /// the reference is the close before it.
    pub fn reference_close(&self) -> Option<f64> {
        let candle = if self.quote.is_some() {
            self.last_candle()
        } else {
            self.previous_candle()
        };
        candle.map(|c| c.close).filter(|p| p.is_finite())
    }

    /// The `lookback` candles preceding the most recent one.
    pub fn lookback_window(&self, lookback: usize) -> Option<&[Candle]> {
        let len = self.candles.len();
        if lookback == 0 || len < lookback + 1 {
            return None;
        }
        Some(&self.candles[len - 1 - lookback..len - 1])
    }

    pub fn swing_low(&self) -> Option<f64> {
        self.swing.and_then(|s| s.swing_low).filter(|v| v.is_finite())
    }

    pub fn swing_high(&self) -> Option<f64> {
        self.swing.and_then(|s| s.swing_high).filter(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn candles(closes: &[f64]) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 14, 30, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                time: start + Duration::minutes(5 * i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 0.0,
            })
            .collect()
    }

    fn ctx(closes: &[f64]) -> EvaluationContext {
        let mut c = EvaluationContext::new(Utc.with_ymd_and_hms(2024, 3, 4, 15, 0, 0).unwrap());
        c.candles = candles(closes);
        c
    }

    #[test]
    fn current_price_prefers_quote() {
        let mut c = ctx(&[100.0, 101.0]);
        assert_eq!(c.current_price(), Some(101.0));
        assert_eq!(c.reference_close(), Some(100.0));

        c.quote = Some(Quote { last: 102.5, bid: None, ask: None });
        assert_eq!(c.current_price(), Some(102.5));
        assert_eq!(c.reference_close(), Some(101.0));
    }

    #[test]
    fn empty_context_has_no_price() {
        let c = ctx(&[]);
        assert_eq!(c.current_price(), None);
        assert_eq!(c.reference_close(), None);
        assert!(c.last_candle().is_none());
        assert!(c.previous_candle().is_none());
    }

    #[test]
    fn nan_quote_falls_back_to_candle() {
        let mut c = ctx(&[100.0]);
        c.quote = Some(Quote { last: f64::NAN, bid: None, ask: None });
        assert_eq!(c.current_price(), Some(100.0));
    }

    #[test]
    fn lookback_window_excludes_current_candle() {
        let c = ctx(&[1.0, 2.0, 3.0, 4.0]);
        let w = c.lookback_window(3).unwrap();
        assert_eq!(w.len(), 3);
        assert_eq!(w[0].close, 1.0);
        assert_eq!(w[2].close, 3.0);
        assert!(c.lookback_window(4).is_none());
        assert!(c.lookback_window(0).is_none());
    }

    #[test]
    fn indicator_accessors_filter_bad_values() {
        let mut snap = IndicatorSnapshot::default();
        snap.ema.insert(20, f64::NAN);
        snap.ema.insert(50, 4800.0);
        snap.atr = Some(0.0);
        snap.rsi = Some(55.0);
        assert_eq!(snap.ema(20), None);
        assert_eq!(snap.ema(50), Some(4800.0));
        assert_eq!(snap.ema(9), None);
        assert_eq!(snap.atr(), None);
        assert_eq!(snap.rsi(), Some(55.0));
    }

    #[test]
    fn opening_range_tradability() {
        let r = OpeningRange { high: 5010.0, low: 5000.0, is_complete: true };
        assert!(r.is_tradable());
        assert_eq!(r.size(), 10.0);
        assert!(!OpeningRange { is_complete: false, ..r }.is_tradable());
        assert!(!OpeningRange { high: 5000.0, ..r }.is_tradable());
    }

    #[test]
    fn context_deserializes_from_camel_case_json() {
        let json = r#"{
            "time": "2024-03-04T15:00:00Z",
            "candles": [{"time":"2024-03-04T14:30:00Z","open":1,"high":2,"low":0.5,"close":1.5}],
            "quote": {"last": 1.75},
            "indicators": {"ema": {"20": 1.4}, "atr": 0.3},
            "openingRange": {"high": 2.0, "low": 0.5, "isComplete": true},
            "swing": {"swingLow": 0.4}
        }"#;
        let c: EvaluationContext = serde_json::from_str(json).unwrap();
        assert_eq!(c.indicators.ema(20), Some(1.4));
        assert_eq!(c.current_price(), Some(1.75));
        assert!(c.opening_range.unwrap().is_complete);
        assert_eq!(c.swing_low(), Some(0.4));
        assert_eq!(c.swing_high(), None);
    }
}
