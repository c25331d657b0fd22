//! Candle — one OHLCV interval of market data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV candle for the strategy's instrument.
///
/// `time` is the candle open instant. Candles reach the compiler in
/// chronological order and are never mutated by it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Candle {
    /// Returns true if any OHLC field is NaN or infinite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite())
    }

    /// Basic OHLC sanity check: high is the maximum, low the minimum.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_candle() -> Candle {
        Candle {
            time: Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap(),
            open: 4800.0,
            high: 4805.0,
            low: 4798.0,
            close: 4803.0,
            volume: 12_000.0,
        }
    }

    #[test]
    fn candle_is_sane() {
        assert!(sample_candle().is_sane());
        assert!(!sample_candle().is_void());
    }

    #[test]
    fn nan_candle_is_void() {
        let mut c = sample_candle();
        c.close = f64::NAN;
        assert!(c.is_void());
        assert!(!c.is_sane());
    }

    #[test]
    fn inverted_high_low_is_not_sane() {
        let mut c = sample_candle();
        c.high = 4790.0;
        assert!(!c.is_sane());
    }

    #[test]
    fn body_direction() {
        let c = sample_candle();
        assert!(c.is_bullish());
        assert!(!c.is_bearish());
    }

    #[test]
    fn deserializes_without_volume() {
        let json = r#"{"time":"2024-01-02T14:30:00Z","open":1.0,"high":2.0,"low":0.5,"close":1.5}"#;
        let c: Candle = serde_json::from_str(json).unwrap();
        assert_eq!(c.volume, 0.0);
        assert_eq!(c.close, 1.5);
    }
}
