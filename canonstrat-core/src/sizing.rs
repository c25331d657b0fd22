//! Position sizing — risk-percent sizing in whole contracts.

use crate::domain::ContractSpec;
use crate::error::CoreError;
use crate::schema::RiskConfig;

/// Tolerance added before flooring so `2.9999999997` contracts counts as 3.
const FLOOR_EPSILON: f64 = 1e-9;

/// Fixed-fractional sizer for one instrument.
///
/// # Formula
/// ```text
/// risk_dollars      = balance * risk_percent / 100
/// risk_ticks        = |entry - stop| / tick_size
/// risk_per_contract = risk_ticks * tick_value
/// contracts         = floor(risk_dollars / risk_per_contract), clamped to [0, max_contracts]
/// ```
///
/// # Example
/// - Instrument: ES (tick 0.25, $12.50 per tick)
/// - Balance: $50,000, risk 1% ($500)
/// - Entry 5015, stop 4990: 25 points = 100 ticks = $1,250 per contract
/// - Contracts: floor(500 / 1250) = 0
///
/// The quantity is never rounded up, so a single contract that would exceed
/// the risk budget is not taken.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSizer {
    instrument: &'static ContractSpec,
    /// Percent units: 1.0 = 1%
    risk_percent: f64,
    max_contracts: u32,
}

impl PositionSizer {
    pub fn new(instrument: &'static ContractSpec, risk_percent: f64, max_contracts: u32) -> Self {
        Self {
            instrument,
            risk_percent,
            max_contracts,
        }
    }

    pub fn from_risk(instrument: &'static ContractSpec, risk: &RiskConfig) -> Self {
        Self::new(instrument, risk.risk_percent, risk.max_contracts)
    }

    pub fn instrument(&self) -> &'static ContractSpec {
        self.instrument
    }

    pub fn risk_percent(&self) -> f64 {
        self.risk_percent
    }

    pub fn max_contracts(&self) -> u32 {
        self.max_contracts
    }

    /// Dollars at risk per trade for `balance`. Zero for a non-positive or non-finite balance.
    pub fn risk_dollars(&self, balance: f64) -> f64 {
        if !balance.is_finite() || balance <= 0.0 {
            return 0.0;
        }
        balance * self.risk_percent / 100.0
    }

    /// Dollar risk of one contract between `entry` and `stop`.
    pub fn risk_per_contract(&self, entry: f64, stop: f64) -> f64 {
        self.instrument.distance_dollars(entry - stop)
    }

    /// Whole contracts for the trade; 0 on any degenerate input.
    pub fn contract_quantity(&self, balance: f64, entry: f64, stop: f64) -> u32 {
        self.try_contract_quantity(balance, entry, stop)
            .unwrap_or(0)
    }

    /// Like [`contract_quantity`](Self::contract_quantity) but reports an entry
    /// and stop with no usable distance between them as [`CoreError::DegenerateRisk`].
    pub fn try_contract_quantity(&self, balance: f64, entry: f64, stop: f64) -> Result<u32, CoreError> {
        if !entry.is_finite()
            || !stop.is_finite()
            || (entry - stop).abs() < self.instrument.tick_size * 1e-6
        {
            return Err(CoreError::DegenerateRisk { entry, stop });
        }

        let budget = self.risk_dollars(balance);
        let per_contract = self.risk_per_contract(entry, stop);
        if budget <= 0.0 || !per_contract.is_finite() || per_contract <= 0.0 {
            return Ok(0);
        }

        let raw = (budget / per_contract + FLOOR_EPSILON).floor();
        Ok(raw.clamp(0.0, f64::from(self.max_contracts)) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::get_contract_spec;

    fn es_sizer(risk_percent: f64, max_contracts: u32) -> PositionSizer {
        PositionSizer::new(get_contract_spec("ES").unwrap(), risk_percent, max_contracts)
    }

    #[test]
    fn es_example_floors_to_zero() {
        let sizer = es_sizer(1.0, 10);
        assert_eq!(sizer.risk_dollars(50_000.0), 500.0);
        assert_eq!(sizer.risk_per_contract(5015.0, 4990.0), 1250.0);
        assert_eq!(sizer.contract_quantity(50_000.0, 5015.0, 4990.0), 0);
    }

    #[test]
    fn quantity_is_floored_and_clamped() {
        let sizer = es_sizer(1.0, 10);
        // $1,000 budget, 4 points = 16 ticks = $200 per contract -> 5
        assert_eq!(sizer.contract_quantity(100_000.0, 5000.0, 4996.0), 5);
        // $1,000 budget, 3 points = $150 -> 6.67 -> 6
        assert_eq!(sizer.contract_quantity(100_000.0, 5000.0, 4997.0), 6);
        // Budget allows 40 contracts, capped at 10.
        assert_eq!(sizer.contract_quantity(1_000_000.0, 5000.0, 4999.0), 10);
    }

    #[test]
    fn short_trades_size_the_same() {
        let sizer = es_sizer(1.0, 10);
        assert_eq!(
            sizer.contract_quantity(100_000.0, 5000.0, 5004.0),
            sizer.contract_quantity(100_000.0, 5000.0, 4996.0)
        );
    }

    #[test]
    fn exact_multiples_survive_float_error() {
        // MES: 0.25 tick, $1.25. 1% of $3,000 = $30; 6 ticks = $7.50 -> exactly 4.
        let sizer = PositionSizer::new(get_contract_spec("MES").unwrap(), 1.0, 100);
        assert_eq!(sizer.contract_quantity(3_000.0, 4001.5, 4000.0), 4);
    }

    #[test]
    fn degenerate_inputs_return_zero() {
        let sizer = es_sizer(1.0, 10);
        assert_eq!(sizer.contract_quantity(100_000.0, 5000.0, 5000.0), 0);
        assert_eq!(sizer.contract_quantity(100_000.0, f64::NAN, 4990.0), 0);
        assert_eq!(sizer.contract_quantity(0.0, 5000.0, 4990.0), 0);
        assert_eq!(sizer.contract_quantity(-5.0, 5000.0, 4990.0), 0);
        assert_eq!(sizer.contract_quantity(f64::INFINITY, 5000.0, 4990.0), 0);
    }

    #[test]
    fn try_quantity_reports_equal_prices() {
        let sizer = es_sizer(1.0, 10);
        assert_eq!(
            sizer.try_contract_quantity(100_000.0, 5000.0, 5000.0),
            Err(CoreError::DegenerateRisk { entry: 5000.0, stop: 5000.0 })
        );
        assert_eq!(sizer.try_contract_quantity(100_000.0, 5000.0, 4996.0), Ok(5));
    }
}
