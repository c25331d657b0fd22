use serde::Serialize;

/// Broad asset class of a futures contract.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum AssetClass {
    EquityIndex,
    Energy,
    Metals,
}

/// Whether a contract is the full-size or micro variant of its product.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum ContractSize {
    Full,
    Micro,
}

/// Contract economics for tick size, tick value, point value.
///
/// One point is one unit of quoted price; `point_value` is its dollar worth.
/// `tick_value == tick_size * point_value` for every registry entry.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ContractSpec {
    pub symbol: &'static str,
    pub description: &'static str,
    pub exchange: &'static str,
    pub asset_class: AssetClass,
    pub size: ContractSize,
    pub tick_size: f64,
    pub tick_value: f64,
    pub point_value: f64,
    /// Symbol of the other half of the micro/full pair.
    pub paired_symbol: Option<&'static str>,
}

impl ContractSpec {
    /// Number of ticks spanned by a price distance.
    pub fn price_to_ticks(&self, distance: f64) -> f64 {
        distance.abs() / self.tick_size
    }

    /// Price distance covered by `ticks` ticks.
    pub fn ticks_to_price(&self, ticks: f64) -> f64 {
        ticks * self.tick_size
    }

    /// Price distance covered by `points` points. Points are quoted price units.
    pub fn points_to_price(&self, points: f64) -> f64 {
        points
    }

    /// Dollar value of `ticks` ticks for one contract.
    pub fn tick_dollars(&self, ticks: f64) -> f64 {
        ticks * self.tick_value
    }

    /// Dollar value of a price distance for one contract.
    pub fn distance_dollars(&self, distance: f64) -> f64 {
        self.tick_dollars(self.price_to_ticks(distance))
    }

    /// The micro contract for this product (itself if already micro).
    pub fn micro_equivalent(&self) -> Option<&'static ContractSpec> {
        match self.size {
            ContractSize::Micro => get_contract_spec(self.symbol),
            ContractSize::Full => self.paired_symbol.and_then(get_contract_spec),
        }
    }

    /// The full-size contract for this product (itself if already full-size).
    pub fn full_equivalent(&self) -> Option<&'static ContractSpec> {
        match self.size {
            ContractSize::Full => get_contract_spec(self.symbol),
            ContractSize::Micro => self.paired_symbol.and_then(get_contract_spec),
        }
    }
}

static CONTRACTS: [ContractSpec; 12] = [
    ContractSpec {
        symbol: "ES",
        description: "E-mini S&P 500",
        exchange: "CME",
        asset_class: AssetClass::EquityIndex,
        size: ContractSize::Full,
        tick_size: 0.25,
        tick_value: 12.50,
        point_value: 50.0,
        paired_symbol: Some("MES"),
    },
    ContractSpec {
        symbol: "MES",
        description: "Micro E-mini S&P 500",
        exchange: "CME",
        asset_class: AssetClass::EquityIndex,
        size: ContractSize::Micro,
        tick_size: 0.25,
        tick_value: 1.25,
        point_value: 5.0,
        paired_symbol: Some("ES"),
    },
    ContractSpec {
        symbol: "NQ",
        description: "E-mini Nasdaq-100",
        exchange: "CME",
        asset_class: AssetClass::EquityIndex,
        size: ContractSize::Full,
        tick_size: 0.25,
        tick_value: 5.00,
        point_value: 20.0,
        paired_symbol: Some("MNQ"),
    },
    ContractSpec {
        symbol: "MNQ",
        description: "Micro E-mini Nasdaq-100",
        exchange: "CME",
        asset_class: AssetClass::EquityIndex,
        size: ContractSize::Micro,
        tick_size: 0.25,
        tick_value: 0.50,
        point_value: 2.0,
        paired_symbol: Some("NQ"),
    },
    ContractSpec {
        symbol: "YM",
        description: "E-mini Dow",
        exchange: "CBOT",
        asset_class: AssetClass::EquityIndex,
        size: ContractSize::Full,
        tick_size: 1.0,
        tick_value: 5.00,
        point_value: 5.0,
        paired_symbol: Some("MYM"),
    },
    ContractSpec {
        symbol: "MYM",
        description: "Micro E-mini Dow",
        exchange: "CBOT",
        asset_class: AssetClass::EquityIndex,
        size: ContractSize::Micro,
        tick_size: 1.0,
        tick_value: 0.50,
        point_value: 0.5,
        paired_symbol: Some("YM"),
    },
    ContractSpec {
        symbol: "RTY",
        description: "E-mini Russell 2000",
        exchange: "CME",
        asset_class: AssetClass::EquityIndex,
        size: ContractSize::Full,
        tick_size: 0.10,
        tick_value: 5.00,
        point_value: 50.0,
        paired_symbol: Some("M2K"),
    },
    ContractSpec {
        symbol: "M2K",
        description: "Micro E-mini Russell 2000",
        exchange: "CME",
        asset_class: AssetClass::EquityIndex,
        size: ContractSize::Micro,
        tick_size: 0.10,
        tick_value: 0.50,
        point_value: 5.0,
        paired_symbol: Some("RTY"),
    },
    ContractSpec {
        symbol: "CL",
        description: "Crude Oil",
        exchange: "NYMEX",
        asset_class: AssetClass::Energy,
        size: ContractSize::Full,
        tick_size: 0.01,
        tick_value: 10.00,
        point_value: 1000.0,
        paired_symbol: Some("MCL"),
    },
    ContractSpec {
        symbol: "MCL",
        description: "Micro Crude Oil",
        exchange: "NYMEX",
        asset_class: AssetClass::Energy,
        size: ContractSize::Micro,
        tick_size: 0.01,
        tick_value: 1.00,
        point_value: 100.0,
        paired_symbol: Some("CL"),
    },
    ContractSpec {
        symbol: "GC",
        description: "Gold",
        exchange: "COMEX",
        asset_class: AssetClass::Metals,
        size: ContractSize::Full,
        tick_size: 0.10,
        tick_value: 10.00,
        point_value: 100.0,
        paired_symbol: Some("MGC"),
    },
    ContractSpec {
        symbol: "MGC",
        description: "Micro Gold",
        exchange: "COMEX",
        asset_class: AssetClass::Metals,
        size: ContractSize::Micro,
        tick_size: 0.10,
        tick_value: 1.00,
        point_value: 10.0,
        paired_symbol: Some("GC"),
    },
];

/// Every contract in the registry, in table order.
pub fn all_contracts() -> &'static [ContractSpec] {
    &CONTRACTS
}

/// Look up a contract by symbol (case-insensitive, surrounding whitespace ignored).
pub fn get_contract_spec(symbol: &str) -> Option<&'static ContractSpec> {
    let symbol = symbol.trim();
    CONTRACTS
        .iter()
        .find(|spec| spec.symbol.eq_ignore_ascii_case(symbol))
}

/// Dollar value of `ticks` ticks of `symbol`, or `None` for an unknown symbol.
pub fn calculate_tick_value(symbol: &str, ticks: f64) -> Option<f64> {
    get_contract_spec(symbol).map(|spec| spec.tick_dollars(ticks))
}
