//! Session windows — named exchange sessions and custom trader-clock hours.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Serialize, Serializer};

use super::timezone::{convert_to_exchange_time, DEFAULT_TRADER_TZ, EXCHANGE_TZ};

pub const MINUTES_PER_DAY: u16 = 1440;

/// Which trading session a strategy is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    /// Regular trading hours, 08:30–15:00 exchange time.
    Ny,
    /// Overnight electronic session, 18:00–17:00 exchange time.
    Globex,
    /// The whole day.
    All,
    /// Trader-supplied wall-clock bounds in the session's timezone.
    Custom { start: NaiveTime, end: NaiveTime },
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Ny => "ny",
            SessionKind::Globex => "globex",
            SessionKind::All => "all",
            SessionKind::Custom { .. } => "custom",
        }
    }
}

/// Session configuration from a canonical strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSpec {
    pub kind: SessionKind,
    /// Trader timezone; only custom bounds are interpreted in it.
    pub timezone: Tz,
}

impl SessionSpec {
    pub fn new(kind: SessionKind) -> Self {
        Self {
            kind,
            timezone: DEFAULT_TRADER_TZ,
        }
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionWire {
    session: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    custom_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    custom_end: Option<String>,
    timezone: &'static str,
}

impl Serialize for SessionSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (custom_start, custom_end) = match self.kind {
            SessionKind::Custom { start, end } => (
                Some(start.format("%H:%M").to_string()),
                Some(end.format("%H:%M").to_string()),
            ),
            _ => (None, None),
        };
        SessionWire {
            session: self.kind.as_str(),
            custom_start,
            custom_end,
            timezone: self.timezone.name(),
        }
        .serialize(serializer)
    }
}

/// Session bounds in exchange-time minutes of day.
///
/// `start` is inclusive and `end` exclusive. When `start > end` the session
/// crosses midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionTimes {
    pub start: u16,
    pub end: u16,
}

impl SessionTimes {
    pub fn new(start: u16, end: u16) -> Self {
        Self { start, end }
    }

    pub fn crosses_midnight(&self) -> bool {
        self.start > self.end
    }

    /// Whether `minute` (minutes since exchange midnight) is inside the session.
    pub fn contains(&self, minute: u32) -> bool {
        let m = minute % u32::from(MINUTES_PER_DAY);
        let (start, end) = (u32::from(self.start), u32::from(self.end));
        if self.crosses_midnight() {
            m >= start || m < end
        } else {
            m >= start && m < end
        }
    }

    /// Session length in minutes.
    pub fn duration_minutes(&self) -> u16 {
        if self.crosses_midnight() {
            MINUTES_PER_DAY - self.start + self.end
        } else {
            self.end - self.start
        }
    }
}

impl fmt::Display for SessionTimes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hm = |m: u16| format!("{:02}:{:02}", m / 60, m % 60);
        write!(f, "{}-{}", hm(self.start), hm(self.end))
    }
}

fn minute_of_day(t: NaiveTime) -> u16 {
    (t.hour() * 60 + t.minute()) as u16
}

/// Session bounds in exchange time for `reference_date`.
///
/// Named sessions are fixed in exchange time. Custom bounds are converted from
/// the trader's zone on the reference date, so they follow both zones' DST rules.
pub fn get_session_times(spec: &SessionSpec, reference_date: NaiveDate) -> SessionTimes {
    match spec.kind {
        SessionKind::Ny => SessionTimes::new(510, 900),
        SessionKind::Globex => SessionTimes::new(1080, 1020),
        SessionKind::All => SessionTimes::new(0, MINUTES_PER_DAY),
        SessionKind::Custom { start, end } => {
            let start = convert_to_exchange_time(start, spec.timezone, reference_date);
            let end = convert_to_exchange_time(end, spec.timezone, reference_date);
            SessionTimes::new(
                minute_of_day(start.exchange_time),
                minute_of_day(end.exchange_time),
            )
        }
    }
}

/// Precomputed session check used by compiled strategies.
///
/// Named sessions are checked on the exchange clock. Custom sessions are
/// checked on the trader's clock at the instant itself, so each instant uses
/// the DST offsets in force on its own trader-local date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionWindow {
    spec: SessionSpec,
    clock: Tz,
    bounds: SessionTimes,
}

impl SessionWindow {
    pub fn new(spec: SessionSpec) -> Self {
        let (clock, bounds) = match spec.kind {
            SessionKind::Custom { start, end } => (
                spec.timezone,
                SessionTimes::new(minute_of_day(start), minute_of_day(end)),
            ),
            // Named sessions do not depend on the date.
            _ => (EXCHANGE_TZ, get_session_times(&spec, NaiveDate::MIN)),
        };
        Self { spec, clock, bounds }
    }

    pub fn spec(&self) -> &SessionSpec {
        &self.spec
    }

    /// Session bounds in exchange time for a given exchange date.
    pub fn times_on(&self, exchange_date: NaiveDate) -> SessionTimes {
        match self.spec.kind {
            SessionKind::Custom { .. } => get_session_times(&self.spec, exchange_date),
            _ => self.bounds,
        }
    }

    /// Whether `instant` falls inside the session.
    pub fn is_time_valid(&self, instant: DateTime<Utc>) -> bool {
        let local = instant.with_timezone(&self.clock);
        self.bounds.contains(local.hour() * 60 + local.minute())
    }
}
