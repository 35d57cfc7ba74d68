//! Markets: consignment-lot books with one-day settlement lag, per-good
//! price/supply/demand state, and the legitimate/off-map/black distinction.

use crate::types::{CellId, CountyId, FacilityId, GoodId, MarketKind, Money, Price, Quantity};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SellerRef {
    County(CountyId),
    Facility(FacilityId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuyerRef {
    County(CountyId),
    Facility(FacilityId),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsignmentLot {
    pub seller: SellerRef,
    pub day_listed: u64,
    pub qty: Quantity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyOrder {
    pub buyer: BuyerRef,
    pub qty: Quantity,
    pub max_spend: Money,
    pub transport_cost: f64,
    pub day_posted: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoodMarketState {
    pub price: Price,
    pub base_price: Price,
    pub supply: Quantity,
    pub supply_offered: Quantity,
    pub demand: Quantity,
    pub last_trade_volume: Quantity,
    pub revenue: Money,
    pub lots: Vec<ConsignmentLot>,
    pub orders: Vec<BuyOrder>,
}

impl GoodMarketState {
    pub fn new(base_price: Price) -> Self {
        Self {
            price: base_price,
            base_price,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    pub kind: MarketKind,
    pub hub_cell: CellId,
    /// Precomputed seat-to-hub shortest-path cost per county assigned to
    /// this market's zone.
    pub zone_costs: HashMap<CountyId, f64>,
    pub goods: HashMap<GoodId, GoodMarketState>,
    /// Off-map markets only supply a declared subset of goods.
    pub supplied_goods: Option<Vec<GoodId>>,
}

impl Market {
    pub fn new(kind: MarketKind, hub_cell: CellId) -> Self {
        Self {
            kind,
            hub_cell,
            zone_costs: HashMap::new(),
            goods: HashMap::new(),
            supplied_goods: None,
        }
    }

    pub fn good_state(&mut self, good: GoodId, base_price: Price) -> &mut GoodMarketState {
        self.goods.entry(good).or_insert_with(|| GoodMarketState::new(base_price))
    }

    pub fn supplies(&self, good: GoodId) -> bool {
        match &self.supplied_goods {
            Some(list) => list.contains(&good),
            None => true,
        }
    }

    pub fn zone_cost(&self, county: CountyId) -> Option<f64> {
        self.zone_costs.get(&county).copied()
    }
}
