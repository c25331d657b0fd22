//! Timezone resolution and trader-time → exchange-time conversion.
//!
//! All conversions go through the IANA tz database (`chrono-tz`). The trader's
//! zone and the exchange zone change DST on different dates in many region
//! pairs, so a static offset table would be an hour off for part of the year.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::{OffsetComponents, Tz};
use serde::Serialize;

use crate::error::CoreError;

/// Zone that defines session hours for the CME products in the registry.
pub const EXCHANGE_TZ: Tz = Tz::America__Chicago;

/// Trader zone assumed when a document does not name one.
pub const DEFAULT_TRADER_TZ: Tz = Tz::America__New_York;

/// Result of converting a trader-local wall-clock time to exchange time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeTime {
    pub exchange_time: NaiveTime,
    /// Whether the exchange zone observes daylight saving at that instant.
    pub is_dst: bool,
    /// Calendar-day shift from the reference date (-1, 0, or +1).
    pub day_offset: i8,
}

/// Convert `time` on `reference_date` in `trader_tz` to exchange wall-clock time.
pub fn convert_to_exchange_time(
    time: NaiveTime,
    trader_tz: Tz,
    reference_date: NaiveDate,
) -> ExchangeTime {
    let instant = localize(trader_tz, reference_date.and_time(time));
    let exchange = instant.with_timezone(&EXCHANGE_TZ);
    let day_offset = exchange
        .date_naive()
        .signed_duration_since(reference_date)
        .num_days() as i8;

    ExchangeTime {
        exchange_time: exchange.time(),
        is_dst: exchange.offset().dst_offset() != Duration::zero(),
        day_offset,
    }
}

/// Resolve a local wall-clock time to an instant.
///
/// Ambiguous times (fall-back overlap) take the earlier instant. Times inside a
/// spring-forward gap do not exist and are moved one hour later.
pub(crate) fn localize(tz: Tz, local: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(t) => t.with_timezone(&Utc),
        LocalResult::Ambiguous(a, b) => a.min(b).with_timezone(&Utc),
        LocalResult::None => match tz.from_local_datetime(&(local + Duration::hours(1))).earliest() {
            Some(t) => t.with_timezone(&Utc),
            None => Utc.from_utc_datetime(&local),
        },
    }
}

const ALIASES: &[(&str, Tz)] = &[
    // North America
    ("et", Tz::America__New_York),
    ("est", Tz::America__New_York),
    ("edt", Tz::America__New_York),
    ("eastern", Tz::America__New_York),
    ("nyc", Tz::America__New_York),
    ("ny", Tz::America__New_York),
    ("ct", Tz::America__Chicago),
    ("cst", Tz::America__Chicago),
    ("cdt", Tz::America__Chicago),
    ("central", Tz::America__Chicago),
    ("mt", Tz::America__Denver),
    ("mst", Tz::America__Denver),
    ("mdt", Tz::America__Denver),
    ("mountain", Tz::America__Denver),
    ("arizona", Tz::America__Phoenix),
    ("pt", Tz::America__Los_Angeles),
    ("pst", Tz::America__Los_Angeles),
    ("pdt", Tz::America__Los_Angeles),
    ("pacific", Tz::America__Los_Angeles),
    ("la", Tz::America__Los_Angeles),
    ("sf", Tz::America__Los_Angeles),
    ("san francisco", Tz::America__Los_Angeles),
    ("akst", Tz::America__Anchorage),
    ("akdt", Tz::America__Anchorage),
    ("alaska", Tz::America__Anchorage),
    ("hst", Tz::Pacific__Honolulu),
    ("hawaii", Tz::Pacific__Honolulu),
    // UTC
    ("utc", Tz::UTC),
    ("gmt", Tz::UTC),
    ("z", Tz::UTC),
    ("zulu", Tz::UTC),
    // Europe
    ("bst", Tz::Europe__London),
    ("uk", Tz::Europe__London),
    ("cet", Tz::Europe__Berlin),
    ("cest", Tz::Europe__Berlin),
    ("central european", Tz::Europe__Berlin),
    ("eet", Tz::Europe__Athens),
    ("eest", Tz::Europe__Athens),
    // Asia / Pacific
    ("ist", Tz::Asia__Kolkata),
    ("india", Tz::Asia__Kolkata),
    ("mumbai", Tz::Asia__Kolkata),
    ("jst", Tz::Asia__Tokyo),
    ("japan", Tz::Asia__Tokyo),
    ("hkt", Tz::Asia__Hong_Kong),
    ("sgt", Tz::Asia__Singapore),
    ("gst", Tz::Asia__Dubai),
    ("aest", Tz::Australia__Sydney),
    ("aedt", Tz::Australia__Sydney),
    ("awst", Tz::Australia__Perth),
    ("nzst", Tz::Pacific__Auckland),
    ("nzdt", Tz::Pacific__Auckland),
    ("new zealand", Tz::Pacific__Auckland),
    ("brt", Tz::America__Sao_Paulo),
];

/// Lowercase, collapse whitespace, and drop "time"/"standard"/"daylight" suffix words.
fn normalize(input: &str) -> String {
    let mut words: Vec<String> = input
        .split_whitespace()
        .map(|w| w.to_ascii_lowercase())
        .collect();
    while words.len() > 1
        && matches!(
            words.last().map(String::as_str),
            Some("time" | "timezone" | "zone" | "standard" | "daylight")
        )
    {
        words.pop();
    }
    words.join(" ")
}

/// Resolve a free-form timezone description.
///
/// Accepts IANA identifiers (any case), common abbreviations, region words
/// ("eastern", "pacific time"), and city names matched against the city part
/// of IANA identifiers ("new york", "Los Angeles", "tokyo"). Returns `None` when
/// nothing matches; fallback policy belongs to the caller.
pub fn parse_timezone(input: &str) -> Option<Tz> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    // Aliases go first: the tz database also carries fixed-offset zones named
    // "EST" and "MST" that ignore daylight saving.
    let key = normalize(trimmed);
    if let Some((_, tz)) = ALIASES.iter().find(|(alias, _)| *alias == key) {
        return Some(*tz);
    }
    if let Ok(tz) = trimmed.parse::<Tz>() {
        return Some(tz);
    }

    let underscored = key.replace(' ', "_");
    chrono_tz::TZ_VARIANTS
        .iter()
        .find(|tz| tz.name().eq_ignore_ascii_case(&underscored))
        .or_else(|| {
            chrono_tz::TZ_VARIANTS.iter().find(|tz| {
                tz.name().contains('/')
                    && tz
                        .name()
                        .rsplit('/')
                        .next()
                        .is_some_and(|city| city.eq_ignore_ascii_case(&underscored))
            })
        })
        .copied()
}

/// [`parse_timezone`] for callers that want an error instead of `None`.
pub fn resolve_timezone(input: &str) -> Result<Tz, CoreError> {
    parse_timezone(input).ok_or_else(|| CoreError::TimezoneUnresolved(input.to_string()))
}
