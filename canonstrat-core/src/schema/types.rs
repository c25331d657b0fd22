//! Typed canonical strategy.
//!
//! These types are produced only by the validator, so every value here already
//! satisfies the documented bounds. They serialize back to the camelCase wire
//! shape, which makes a validated document re-emittable in normalized form.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::domain::ContractSpec;
use crate::session::SessionSpec;

// ─── Discriminants ───────────────────────────────────────────────────

/// Supported entry patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    Orb,
    EmaPullback,
    Breakout,
}

impl Pattern {
    pub const ALL: [Pattern; 3] = [Pattern::Orb, Pattern::EmaPullback, Pattern::Breakout];

    /// Wire names accepted for `pattern`, in the order they are reported.
    pub const NAMES: [&'static str; 3] = ["orb", "ema_pullback", "breakout"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Pattern::Orb => "orb",
            Pattern::EmaPullback => "ema_pullback",
            Pattern::Breakout => "breakout",
        }
    }

    /// Parse a wire discriminant. `opening_range_breakout` is accepted for ORB.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "orb" | "opening_range_breakout" => Some(Pattern::Orb),
            "ema_pullback" => Some(Pattern::EmaPullback),
            "breakout" => Some(Pattern::Breakout),
            _ => None,
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Side of a single trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// +1.0 for long, -1.0 for short. Multiplying a favorable distance by the
    /// sign moves a price in the trade's direction.
    pub fn sign(&self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }

    pub fn opposite(&self) -> Side {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Long => "long",
            Side::Short => "short",
        })
    }
}

/// Which sides a strategy may trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
    Both,
}

impl Direction {
    pub fn allows(&self, side: Side) -> bool {
        matches!(
            (self, side),
            (Direction::Both, _) | (Direction::Long, Side::Long) | (Direction::Short, Side::Short)
        )
    }

    /// Sides in evaluation order; long is checked first for `Both`.
    pub fn sides(&self) -> &'static [Side] {
        match self {
            Direction::Long => &[Side::Long],
            Direction::Short => &[Side::Short],
            Direction::Both => &[Side::Long, Side::Short],
        }
    }
}

// ─── Distances ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    #[default]
    Ticks,
    Points,
}

/// A fixed price distance expressed in ticks or points of the instrument.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Distance {
    pub value: f64,
    pub unit: DistanceUnit,
}

impl Distance {
    pub fn ticks(value: f64) -> Self {
        Self { value, unit: DistanceUnit::Ticks }
    }

    pub fn points(value: f64) -> Self {
        Self { value, unit: DistanceUnit::Points }
    }

    /// Distance in price units.
    pub fn to_price(&self, spec: &ContractSpec) -> f64 {
        match self.unit {
            DistanceUnit::Ticks => spec.ticks_to_price(self.value),
            DistanceUnit::Points => spec.points_to_price(self.value),
        }
    }
}

// ─── Opening range breakout ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum OrbStop {
    /// Percent of the range size, measured back from the breakout side.
    Percentage { value: f64 },
    /// One tick beyond the opposite side of the range.
    OppositeSide,
    FixedDistance { value: f64, unit: DistanceUnit },
    AtrMultiple { value: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum OrbTarget {
    RMultiple { value: f64 },
    /// Multiple of the opening-range size beyond the entry.
    Extension { value: f64 },
    FixedDistance { value: f64, unit: DistanceUnit },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrbRules {
    pub period_minutes: u32,
    pub breakout_buffer_ticks: f64,
    pub stop: OrbStop,
    pub target: OrbTarget,
}

// ─── EMA pullback ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PullbackConfirmation {
    Touch,
    #[default]
    Bounce,
}

/// Inclusive RSI band an entry must fall inside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RsiFilter {
    pub min: f64,
    pub max: f64,
}

impl RsiFilter {
    pub fn allows(&self, rsi: f64) -> bool {
        rsi >= self.min && rsi <= self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum EmaStop {
    /// Beyond the most recent swing level supplied in the evaluation context.
    Structure {
        #[serde(rename = "bufferTicks")]
        buffer_ticks: f64,
    },
    AtrMultiple { value: f64 },
    FixedDistance { value: f64, unit: DistanceUnit },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum EmaTarget {
    RMultiple { value: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmaPullbackRules {
    pub ema_period: u32,
    pub confirmation: PullbackConfirmation,
    pub touch_tolerance_ticks: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi_filter: Option<RsiFilter>,
    pub stop: EmaStop,
    pub target: EmaTarget,
}

// ─── Breakout ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakoutConfirmation {
    #[default]
    Close,
    Wick,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum BreakoutStop {
    /// Beyond the broken channel level.
    BreakoutLevel {
        #[serde(rename = "bufferTicks")]
        buffer_ticks: f64,
    },
    AtrMultiple { value: f64 },
    FixedDistance { value: f64, unit: DistanceUnit },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum BreakoutTarget {
    RMultiple { value: f64 },
    /// Multiple of the channel height beyond the entry.
    Extension { value: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakoutRules {
    pub lookback_periods: u32,
    pub confirmation: BreakoutConfirmation,
    pub stop: BreakoutStop,
    pub target: BreakoutTarget,
}

// ─── Strategy ────────────────────────────────────────────────────────

/// Pattern-specific entry rules. The variant is the pattern discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "pattern", content = "entry", rename_all = "snake_case")]
pub enum EntryRules {
    Orb(OrbRules),
    EmaPullback(EmaPullbackRules),
    Breakout(BreakoutRules),
}

impl EntryRules {
    pub fn pattern(&self) -> Pattern {
        match self {
            EntryRules::Orb(_) => Pattern::Orb,
            EntryRules::EmaPullback(_) => Pattern::EmaPullback,
            EntryRules::Breakout(_) => Pattern::Breakout,
        }
    }

    pub fn as_orb(&self) -> Option<&OrbRules> {
        match self {
            EntryRules::Orb(rules) => Some(rules),
            _ => None,
        }
    }

    pub fn as_ema_pullback(&self) -> Option<&EmaPullbackRules> {
        match self {
            EntryRules::EmaPullback(rules) => Some(rules),
            _ => None,
        }
    }

    pub fn as_breakout(&self) -> Option<&BreakoutRules> {
        match self {
            EntryRules::Breakout(rules) => Some(rules),
            _ => None,
        }
    }

    pub fn is_orb_rules(&self) -> bool {
        self.as_orb().is_some()
    }

    pub fn is_ema_pullback_rules(&self) -> bool {
        self.as_ema_pullback().is_some()
    }

    pub fn is_breakout_rules(&self) -> bool {
        self.as_breakout().is_some()
    }
}

/// Registry entry referenced by a strategy; serializes as `{ "symbol": ... }`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstrumentRef(pub &'static ContractSpec);

impl InstrumentRef {
    pub fn spec(&self) -> &'static ContractSpec {
        self.0
    }

    pub fn symbol(&self) -> &'static str {
        self.0.symbol
    }
}

impl Serialize for InstrumentRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wire {
            symbol: &'static str,
        }
        Wire { symbol: self.0.symbol }.serialize(serializer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskConfig {
    /// Percent of account balance risked per trade (1.0 = 1%).
    pub risk_percent: f64,
    pub max_contracts: u32,
}

/// A validated canonical strategy.
///
/// Only [`validate_canonical`](crate::schema::validate_canonical) constructs
/// these from untyped input. There is no `Deserialize` impl.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CanonicalStrategy {
    pub instrument: InstrumentRef,
    pub direction: Direction,
    #[serde(flatten)]
    pub entry: EntryRules,
    pub risk: RiskConfig,
    pub session: SessionSpec,
}

impl CanonicalStrategy {
    pub fn pattern(&self) -> Pattern {
        self.entry.pattern()
    }

    pub fn contract(&self) -> &'static ContractSpec {
        self.instrument.spec()
    }
}
