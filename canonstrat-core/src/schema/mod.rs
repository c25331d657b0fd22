//! Canonical strategy schema: typed model and the validator that produces it.

mod reader;
pub mod types;
pub mod validate;

pub use types::{
    BreakoutConfirmation, BreakoutRules, BreakoutStop, BreakoutTarget, CanonicalStrategy,
    Direction, Distance, DistanceUnit, EmaPullbackRules, EmaStop, EmaTarget, EntryRules,
    InstrumentRef, OrbRules, OrbStop, OrbTarget, Pattern, PullbackConfirmation, RiskConfig,
    RsiFilter, Side,
};
pub use validate::{parse_canonical, parse_canonical_str, validate_canonical, MAX_RISK_PERCENT};
