//! Session hours and timezone handling.
//!
//! Session bounds are expressed in exchange time (`America/Chicago`). Trader
//! times are converted through the tz database on a concrete date.

pub mod timezone;
pub mod window;

pub use timezone::{
    convert_to_exchange_time, parse_timezone, resolve_timezone, ExchangeTime, DEFAULT_TRADER_TZ,
    EXCHANGE_TZ,
};
pub use window::{get_session_times, SessionKind, SessionSpec, SessionTimes, SessionWindow};
