//! Domain types: instrument registry, candles, and the evaluation context.

pub mod candle;
pub mod context;
pub mod instrument;

pub use candle::Candle;
pub use context::{EvaluationContext, IndicatorSnapshot, OpeningRange, Quote, SwingLevels};
pub use instrument::{
    all_contracts, calculate_tick_value, get_contract_spec, AssetClass, ContractSize, ContractSpec,
};
