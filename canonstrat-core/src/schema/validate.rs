//! Canonical strategy validation: untyped JSON in, [`CanonicalStrategy`] out.

use chrono::NaiveTime;
use serde_json::Value;
use tracing::debug;

use crate::domain::get_contract_spec;
use crate::error::{CoreError, ValidationError};
use crate::session::{parse_timezone, SessionKind, SessionSpec, DEFAULT_TRADER_TZ};

use super::reader::{Checker, Obj};
use super::types::*;

/// Upper bound on `risk.riskPercent`.
pub const MAX_RISK_PERCENT: f64 = 5.0;

pub const MIN_ORB_PERIOD_MINUTES: u32 = 5;
pub const MAX_ORB_PERIOD_MINUTES: u32 = 1440;
pub const MIN_EMA_PERIOD: u32 = 2;
pub const MAX_EMA_PERIOD: u32 = 500;
pub const MIN_LOOKBACK_PERIODS: u32 = 2;
pub const MAX_LOOKBACK_PERIODS: u32 = 500;
pub const DEFAULT_LOOKBACK_PERIODS: u32 = 20;
pub const DEFAULT_TOUCH_TOLERANCE_TICKS: f64 = 2.0;
pub const DEFAULT_BUFFER_TICKS: f64 = 1.0;
pub const DEFAULT_EMA_TARGET_R: f64 = 2.0;

const DIRECTIONS: &[(&str, Direction)] = &[
    ("long", Direction::Long),
    ("short", Direction::Short),
    ("both", Direction::Both),
];

const UNITS: &[(&str, DistanceUnit)] = &[
    ("ticks", DistanceUnit::Ticks),
    ("points", DistanceUnit::Points),
];

/// Validate an untyped document.
///
/// Never panics on input. On failure every field-level error is returned, in
/// the order the fields are checked: pattern, instrument, direction, entry,
/// risk, session. Validating the same input twice yields the same result.
pub fn validate_canonical(raw: &Value) -> Result<CanonicalStrategy, Vec<ValidationError>> {
    let mut ck = Checker::new();
    let strategy = read_strategy(&mut ck, raw);
    let result = ck.finish(strategy);
    if let Err(errors) = &result {
        debug!(errors = errors.len(), first = %errors[0], "canonical strategy rejected");
    }
    result
}

/// [`validate_canonical`] with the errors wrapped in [`CoreError::SchemaInvalid`].
pub fn parse_canonical(raw: &Value) -> Result<CanonicalStrategy, CoreError> {
    validate_canonical(raw).map_err(|errors| CoreError::SchemaInvalid { errors })
}

/// Parse JSON text, then validate. Syntax errors are reported at path `$`.
pub fn parse_canonical_str(json: &str) -> Result<CanonicalStrategy, CoreError> {
    let raw: Value = serde_json::from_str(json).map_err(|e| CoreError::SchemaInvalid {
        errors: vec![ValidationError::invalid("$", format!("invalid JSON: {e}"))],
    })?;
    parse_canonical(&raw)
}

fn read_strategy(ck: &mut Checker, raw: &Value) -> Option<CanonicalStrategy> {
    let root = ck.root(raw)?;

    let pattern = read_pattern(ck, &root);
    let instrument = read_instrument(ck, &root);
    let direction = ck.choice(&root, "direction", DIRECTIONS);
    let entry = pattern.and_then(|p| read_entry(ck, &root, p));
    let risk = read_risk(ck, &root);
    let session = read_session(ck, &root);

    Some(CanonicalStrategy {
        instrument: instrument?,
        direction: direction?,
        entry: entry?,
        risk: risk?,
        session: session?,
    })
}

fn read_pattern(ck: &mut Checker, root: &Obj<'_>) -> Option<Pattern> {
    let name = ck.string(root, "pattern")?;
    let pattern = Pattern::parse(name);
    if pattern.is_none() {
        ck.push(ValidationError::unsupported_pattern(
            root.field_path("pattern"),
            name,
            &Pattern::NAMES,
        ));
    }
    pattern
}

fn read_instrument(ck: &mut Checker, root: &Obj<'_>) -> Option<InstrumentRef> {
    let obj = ck.object(root, "instrument")?;
    let symbol = ck.string(&obj, "symbol")?;
    let path = obj.field_path("symbol");
    if !ck.check(!symbol.trim().is_empty(), path.clone(), "must not be empty") {
        return None;
    }
    match get_contract_spec(symbol) {
        Some(spec) => Some(InstrumentRef(spec)),
        None => {
            ck.push(ValidationError::unknown_instrument(path, symbol));
            None
        }
    }
}

fn read_entry(ck: &mut Checker, root: &Obj<'_>, pattern: Pattern) -> Option<EntryRules> {
    let entry = ck.object(root, "entry")?;
    match pattern {
        Pattern::Orb => read_orb(ck, &entry).map(EntryRules::Orb),
        Pattern::EmaPullback => read_ema_pullback(ck, &entry).map(EntryRules::EmaPullback),
        Pattern::Breakout => read_breakout(ck, &entry).map(EntryRules::Breakout),
    }
}

fn read_distance(ck: &mut Checker, obj: &Obj<'_>) -> Option<(f64, DistanceUnit)> {
    let value = ck.positive(obj, "value");
    let unit = ck.optional_choice(obj, "unit", UNITS, DistanceUnit::Ticks);
    Some((value?, unit))
}

fn read_method<'v>(ck: &mut Checker, obj: &Obj<'v>, methods: &[&'static str]) -> Option<&'static str> {
    let options: Vec<(&str, &'static str)> = methods.iter().map(|m| (*m, *m)).collect();
    ck.choice(obj, "method", &options)
}

// ─── ORB ─────────────────────────────────────────────────────────────

fn read_orb(ck: &mut Checker, entry: &Obj<'_>) -> Option<OrbRules> {
    let period = ck.integer(entry, "periodMinutes", MIN_ORB_PERIOD_MINUTES, MAX_ORB_PERIOD_MINUTES);
    let buffer = ck.non_negative_or(entry, "breakoutBufferTicks", 0.0);
    let stop = ck.object(entry, "stop").and_then(|o| read_orb_stop(ck, &o));
    let target = ck.object(entry, "target").and_then(|o| read_orb_target(ck, &o));

    Some(OrbRules {
        period_minutes: period?,
        breakout_buffer_ticks: buffer,
        stop: stop?,
        target: target?,
    })
}

fn read_orb_stop(ck: &mut Checker, obj: &Obj<'_>) -> Option<OrbStop> {
    let method = read_method(
        ck,
        obj,
        &["percentage", "opposite_side", "fixed_distance", "atr_multiple"],
    )?;
    match method {
        "percentage" => ck
            .number_where(
                obj,
                "value",
                |v| v > 0.0 && v <= 100.0,
                "must be greater than 0 and at most 100",
            )
            .map(|value| OrbStop::Percentage { value }),
        "opposite_side" => Some(OrbStop::OppositeSide),
        "fixed_distance" => {
            read_distance(ck, obj).map(|(value, unit)| OrbStop::FixedDistance { value, unit })
        }
        "atr_multiple" => ck.positive(obj, "value").map(|value| OrbStop::AtrMultiple { value }),
        _ => None,
    }
}

fn read_orb_target(ck: &mut Checker, obj: &Obj<'_>) -> Option<OrbTarget> {
    let method = read_method(ck, obj, &["r_multiple", "extension", "fixed_distance"])?;
    match method {
        "r_multiple" => ck.positive(obj, "value").map(|value| OrbTarget::RMultiple { value }),
        "extension" => ck.positive(obj, "value").map(|value| OrbTarget::Extension { value }),
        "fixed_distance" => {
            read_distance(ck, obj).map(|(value, unit)| OrbTarget::FixedDistance { value, unit })
        }
        _ => None,
    }
}

// ─── EMA pullback ────────────────────────────────────────────────────

fn read_ema_pullback(ck: &mut Checker, entry: &Obj<'_>) -> Option<EmaPullbackRules> {
    let period = ck.integer(entry, "emaPeriod", MIN_EMA_PERIOD, MAX_EMA_PERIOD);
    let confirmation = ck.optional_choice(
        entry,
        "confirmation",
        &[
            ("touch", PullbackConfirmation::Touch),
            ("bounce", PullbackConfirmation::Bounce),
        ],
        PullbackConfirmation::Bounce,
    );
    let tolerance = ck.non_negative_or(entry, "touchToleranceTicks", DEFAULT_TOUCH_TOLERANCE_TICKS);
    // Outer `Some` means the filter was given; inner `None` means it was invalid.
    let rsi_filter = ck
        .optional_object(entry, "rsiFilter")
        .map(|o| read_rsi_filter(ck, &o));
    let stop = ck.object(entry, "stop").and_then(|o| read_ema_stop(ck, &o));
    let target = match ck.optional_object(entry, "target") {
        Some(obj) => read_ema_target(ck, &obj),
        None => Some(EmaTarget::RMultiple { value: DEFAULT_EMA_TARGET_R }),
    };

    Some(EmaPullbackRules {
        ema_period: period?,
        confirmation,
        touch_tolerance_ticks: tolerance,
        rsi_filter: match rsi_filter {
            Some(filter) => Some(filter?),
            None => None,
        },
        stop: stop?,
        target: target?,
    })
}

fn read_rsi_filter(ck: &mut Checker, obj: &Obj<'_>) -> Option<RsiFilter> {
    let in_band = |v: f64| (0.0..=100.0).contains(&v);
    let min = ck.number_where(obj, "min", in_band, "must be between 0 and 100");
    let max = ck.number_where(obj, "max", in_band, "must be between 0 and 100");
    let (min, max) = (min?, max?);
    ck.check(min < max, obj.path(), "min must be less than max")
        .then_some(RsiFilter { min, max })
}

fn read_ema_stop(ck: &mut Checker, obj: &Obj<'_>) -> Option<EmaStop> {
    let method = read_method(ck, obj, &["structure", "atr_multiple", "fixed_distance"])?;
    match method {
        "structure" => Some(EmaStop::Structure {
            buffer_ticks: ck.non_negative_or(obj, "bufferTicks", DEFAULT_BUFFER_TICKS),
        }),
        "atr_multiple" => ck.positive(obj, "value").map(|value| EmaStop::AtrMultiple { value }),
        "fixed_distance" => {
            read_distance(ck, obj).map(|(value, unit)| EmaStop::FixedDistance { value, unit })
        }
        _ => None,
    }
}

fn read_ema_target(ck: &mut Checker, obj: &Obj<'_>) -> Option<EmaTarget> {
    read_method(ck, obj, &["r_multiple"])?;
    ck.positive(obj, "value").map(|value| EmaTarget::RMultiple { value })
}

// ─── Breakout ────────────────────────────────────────────────────────

fn read_breakout(ck: &mut Checker, entry: &Obj<'_>) -> Option<BreakoutRules> {
    let lookback = ck.optional_integer(
        entry,
        "lookbackPeriods",
        MIN_LOOKBACK_PERIODS,
        MAX_LOOKBACK_PERIODS,
        DEFAULT_LOOKBACK_PERIODS,
    );
    let confirmation = ck.optional_choice(
        entry,
        "confirmation",
        &[
            ("close", BreakoutConfirmation::Close),
            ("wick", BreakoutConfirmation::Wick),
        ],
        BreakoutConfirmation::Close,
    );
    let stop = ck.object(entry, "stop").and_then(|o| read_breakout_stop(ck, &o));
    let target = ck.object(entry, "target").and_then(|o| read_breakout_target(ck, &o));

    Some(BreakoutRules {
        lookback_periods: lookback?,
        confirmation,
        stop: stop?,
        target: target?,
    })
}

fn read_breakout_stop(ck: &mut Checker, obj: &Obj<'_>) -> Option<BreakoutStop> {
    let method = read_method(ck, obj, &["breakout_level", "atr_multiple", "fixed_distance"])?;
    match method {
        "breakout_level" => Some(BreakoutStop::BreakoutLevel {
            buffer_ticks: ck.non_negative_or(obj, "bufferTicks", DEFAULT_BUFFER_TICKS),
        }),
        "atr_multiple" => ck
            .positive(obj, "value")
            .map(|value| BreakoutStop::AtrMultiple { value }),
        "fixed_distance" => {
            read_distance(ck, obj).map(|(value, unit)| BreakoutStop::FixedDistance { value, unit })
        }
        _ => None,
    }
}

fn read_breakout_target(ck: &mut Checker, obj: &Obj<'_>) -> Option<BreakoutTarget> {
    let method = read_method(ck, obj, &["r_multiple", "extension"])?;
    let value = ck.positive(obj, "value")?;
    match method {
        "r_multiple" => Some(BreakoutTarget::RMultiple { value }),
        "extension" => Some(BreakoutTarget::Extension { value }),
        _ => None,
    }
}

// ─── Risk & session ──────────────────────────────────────────────────

fn read_risk(ck: &mut Checker, root: &Obj<'_>) -> Option<RiskConfig> {
    let risk = ck.object(root, "risk")?;
    let risk_percent = ck.number_where(
        &risk,
        "riskPercent",
        |v| v > 0.0 && v <= MAX_RISK_PERCENT,
        "must be greater than 0 and at most 5",
    );
    let max_contracts = ck.integer(&risk, "maxContracts", 1, u32::MAX);

    Some(RiskConfig {
        risk_percent: risk_percent?,
        max_contracts: max_contracts?,
    })
}

#[derive(Clone, Copy)]
enum SessionName {
    Ny,
    Globex,
    All,
    Custom,
}

fn read_session(ck: &mut Checker, root: &Obj<'_>) -> Option<SessionSpec> {
    let obj = ck.object(root, "session")?;
    let name = ck.choice(
        &obj,
        "session",
        &[
            ("ny", SessionName::Ny),
            ("globex", SessionName::Globex),
            ("all", SessionName::All),
            ("custom", SessionName::Custom),
        ],
    );
    let timezone = match ck.optional_string(&obj, "timezone") {
        Some(raw) => match parse_timezone(raw) {
            Some(tz) => Some(tz),
            None => {
                ck.fail(obj.field_path("timezone"), format!("unrecognized timezone '{raw}'"));
                None
            }
        },
        // A non-string timezone was already recorded by the reader.
        None => Some(DEFAULT_TRADER_TZ),
    };

    let kind = match name? {
        SessionName::Ny => SessionKind::Ny,
        SessionName::Globex => SessionKind::Globex,
        SessionName::All => SessionKind::All,
        SessionName::Custom => {
            let start = read_clock(ck, &obj, "customStart");
            let end = read_clock(ck, &obj, "customEnd");
            let (start, end) = (start?, end?);
            if !ck.check(start != end, obj.path(), "customStart and customEnd must differ") {
                return None;
            }
            SessionKind::Custom { start, end }
        }
    };

    Some(SessionSpec { kind, timezone: timezone? })
}

fn read_clock(ck: &mut Checker, obj: &Obj<'_>, key: &str) -> Option<NaiveTime> {
    let raw = ck.string(obj, key)?;
    match NaiveTime::parse_from_str(raw.trim(), "%H:%M") {
        Ok(t) => Some(t),
        Err(_) => {
            ck.fail(obj.field_path(key), format!("expected HH:MM, found '{raw}'"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationErrorKind;
    use serde_json::json;

    fn orb_doc() -> Value {
        json!({
            "pattern": "orb",
            "instrument": {"symbol": "ES"},
            "direction": "long",
            "entry": {
                "periodMinutes": 15,
                "stop": {"method": "opposite_side"},
                "target": {"method": "r_multiple", "value": 2}
            },
            "risk": {"riskPercent": 1, "maxContracts": 3},
            "session": {"session": "ny"}
        })
    }

    fn paths(errors: &[ValidationError]) -> Vec<&str> {
        errors.iter().map(|e| e.path.as_str()).collect()
    }

    #[test]
    fn valid_orb_document() {
        let s = validate_canonical(&orb_doc()).unwrap();
        assert_eq!(s.pattern(), Pattern::Orb);
        assert_eq!(s.instrument.symbol(), "ES");
        assert_eq!(s.session.timezone, DEFAULT_TRADER_TZ);
        let orb = s.entry.as_orb().unwrap();
        assert_eq!(orb.period_minutes, 15);
        assert_eq!(orb.breakout_buffer_ticks, 0.0);
    }

    #[test]
    fn collects_all_errors_in_field_order() {
        let doc = json!({
            "pattern": "orb",
            "instrument": {"symbol": "ZZ"},
            "direction": "up",
            "entry": {"periodMinutes": 3, "stop": {"method": "opposite_side"}, "target": {"method": "r_multiple", "value": 0}},
            "risk": {"riskPercent": 7, "maxContracts": 0},
            "session": {"session": "ny"}
        });
        let errors = validate_canonical(&doc).unwrap_err();
        assert_eq!(
            paths(&errors),
            vec![
                "instrument.symbol",
                "direction",
                "entry.periodMinutes",
                "entry.target.value",
                "risk.riskPercent",
                "risk.maxContracts",
            ]
        );
        assert_eq!(errors[0].kind, ValidationErrorKind::UnknownInstrument);
    }

    #[test]
    fn unknown_pattern_skips_entry_checks() {
        let mut doc = orb_doc();
        doc["pattern"] = json!("vwap_reversion");
        doc["entry"] = json!("garbage");
        let errors = validate_canonical(&doc).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ValidationErrorKind::UnsupportedPattern);
    }

    #[test]
    fn ema_defaults_apply() {
        let doc = json!({
            "pattern": "ema_pullback",
            "instrument": {"symbol": "mnq"},
            "direction": "both",
            "entry": {"emaPeriod": 21, "stop": {"method": "structure"}},
            "risk": {"riskPercent": 0.5, "maxContracts": 2},
            "session": {"session": "all"}
        });
        let s = validate_canonical(&doc).unwrap();
        let ema = s.entry.as_ema_pullback().unwrap();
        assert_eq!(ema.confirmation, PullbackConfirmation::Bounce);
        assert_eq!(ema.touch_tolerance_ticks, DEFAULT_TOUCH_TOLERANCE_TICKS);
        assert_eq!(ema.stop, EmaStop::Structure { buffer_ticks: 1.0 });
        assert_eq!(ema.target, EmaTarget::RMultiple { value: 2.0 });
        assert!(ema.rsi_filter.is_none());
        assert_eq!(s.instrument.symbol(), "MNQ");
    }

    #[test]
    fn rsi_filter_bounds() {
        let doc = json!({
            "pattern": "ema_pullback",
            "instrument": {"symbol": "ES"},
            "direction": "long",
            "entry": {"emaPeriod": 21, "rsiFilter": {"min": 70, "max": 30}, "stop": {"method": "atr_multiple", "value": 1.5}},
            "risk": {"riskPercent": 1, "maxContracts": 1},
            "session": {"session": "ny"}
        });
        let errors = validate_canonical(&doc).unwrap_err();
        assert_eq!(paths(&errors), vec!["entry.rsiFilter"]);
    }

    #[test]
    fn breakout_defaults_apply() {
        let doc = json!({
            "pattern": "breakout",
            "instrument": {"symbol": "CL"},
            "direction": "short",
            "entry": {"stop": {"method": "breakout_level", "bufferTicks": 2}, "target": {"method": "extension", "value": 1}},
            "risk": {"riskPercent": 2, "maxContracts": 5},
            "session": {"session": "globex"}
        });
        let s = validate_canonical(&doc).unwrap();
        let b = s.entry.as_breakout().unwrap();
        assert_eq!(b.lookback_periods, DEFAULT_LOOKBACK_PERIODS);
        assert_eq!(b.confirmation, BreakoutConfirmation::Close);
        assert_eq!(b.stop, BreakoutStop::BreakoutLevel { buffer_ticks: 2.0 });
    }

    #[test]
    fn custom_session_requires_distinct_clock_times() {
        let mut doc = orb_doc();
        doc["session"] = json!({"session": "custom", "customStart": "09:30", "customEnd": "09:30"});
        let errors = validate_canonical(&doc).unwrap_err();
        assert_eq!(paths(&errors), vec!["session"]);

        doc["session"] = json!({"session": "custom", "customStart": "9am"});
        let errors = validate_canonical(&doc).unwrap_err();
        assert_eq!(paths(&errors), vec!["session.customStart", "session.customEnd"]);
    }

    #[test]
    fn unresolvable_timezone_is_rejected() {
        let mut doc = orb_doc();
        doc["session"] = json!({"session": "ny", "timezone": "Narnia"});
        let errors = validate_canonical(&doc).unwrap_err();
        assert_eq!(paths(&errors), vec!["session.timezone"]);

        doc["session"] = json!({"session": "ny", "timezone": "pacific time"});
        let s = validate_canonical(&doc).unwrap();
        assert_eq!(s.session.timezone, chrono_tz::Tz::America__Los_Angeles);
    }

    #[test]
    fn json_syntax_error_is_reported_at_root() {
        let err = parse_canonical_str("{not json").unwrap_err();
        assert_eq!(err.validation_errors().len(), 1);
        assert_eq!(err.validation_errors()[0].path, "$");
    }
}
