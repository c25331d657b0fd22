//! canonstrat core — canonical strategy schema and pattern compiler.
//!
//! This crate turns a declarative trading-strategy document into pure decision
//! functions:
//! - Instrument registry with tick economics for CME futures
//! - Schema validator from untyped JSON to a typed canonical strategy
//! - Session windows and trader-timezone conversion through the tz database
//! - Risk-percent position sizing in whole contracts
//! - Pattern compiler for opening range breakout, EMA pullback, and breakout
//!
//! The crate performs no I/O. Market data, indicators, and swing levels arrive
//! in an [`EvaluationContext`] assembled by the caller.

pub mod compiler;
pub mod domain;
pub mod error;
pub mod fingerprint;
pub mod schema;
pub mod session;
pub mod sizing;

pub use compiler::{
    compile_canonical_strategy, compile_from_unknown, CompiledStrategy, PatternEvaluator,
    TradePlan,
};
pub use domain::{
    calculate_tick_value, get_contract_spec, Candle, ContractSpec, EvaluationContext,
    IndicatorSnapshot, OpeningRange, Quote, SwingLevels,
};
pub use error::{CoreError, ValidationError, ValidationErrorKind};
pub use fingerprint::StrategyFingerprint;
pub use schema::{
    parse_canonical, parse_canonical_str, validate_canonical, CanonicalStrategy, Direction,
    EntryRules, Pattern, Side,
};
pub use session::{
    convert_to_exchange_time, get_session_times, parse_timezone, resolve_timezone, ExchangeTime,
    SessionSpec, SessionTimes, SessionWindow,
};
pub use sizing::PositionSizer;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: compiled strategies and their inputs are Send + Sync.
    ///
    /// A compiled strategy is shared across backtest and live-signal threads
    /// without locking. If any type fails this check, the build breaks.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Compiled output
        require_send::<CompiledStrategy>();
        require_sync::<CompiledStrategy>();
        require_send::<TradePlan>();
        require_sync::<TradePlan>();
        require_send::<PositionSizer>();
        require_sync::<PositionSizer>();
        require_send::<SessionWindow>();
        require_sync::<SessionWindow>();

        // Inputs
        require_send::<CanonicalStrategy>();
        require_sync::<CanonicalStrategy>();
        require_send::<EvaluationContext>();
        require_sync::<EvaluationContext>();
        require_send::<ContractSpec>();
        require_sync::<ContractSpec>();

        // Errors
        require_send::<CoreError>();
        require_sync::<CoreError>();
    }
}
