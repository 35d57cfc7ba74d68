//! 4.11 Inter-market / off-map trade (weekly). Two systems sharing the
//! transport-efficiency and black-market-diversion logic: one moves county
//! surplus/deficit against its legitimate market, the other keeps off-map
//! markets stocked as the economy's outside liquidity source.

use super::{TickContext, TickSystem};
use crate::economy::state::SimState;
use crate::economy::{BuyOrder, BuyerRef, ConsignmentLot, SellerRef};
use crate::map::MapData;
use crate::types::{CountyId, GoodId, MarketKind};

const CONSUMER_BUFFER_DAYS: f64 = 14.0;
const NON_CONSUMER_THRESHOLD: f64 = 50.0;
const OFF_MAP_RESTOCK_QTY: f64 = 1.0e6;
const MIN_EFFICIENCY: f64 = 0.5;
const MAX_EFFICIENCY: f64 = 1.0;
const TRANSPORT_EFFICIENCY_RATE: f64 = 0.01;
const BLACK_MARKET_FLOOR_FACTOR: f64 = 0.5;

pub struct InterMarketTradeSystem;

impl TickSystem for InterMarketTradeSystem {
    fn name(&self) -> &'static str {
        "inter_market_trade"
    }

    fn interval_days(&self) -> u32 {
        7
    }

    fn tick(&self, _ctx: &TickContext, state: &mut SimState, _map: &MapData) -> Result<(), String> {
        let day = state.current_day;
        let good_ids: Vec<_> = state.catalogs.goods.ids().collect();

        for county_id in state.county_ids_sorted() {
            let Some(market_id) = state.market_for_county(county_id) else { continue };
            let transport_cost = state.markets.get(market_id).and_then(|m| m.zone_cost(county_id)).unwrap_or(0.0);
            let efficiency = (1.0 / (1.0 + transport_cost * TRANSPORT_EFFICIENCY_RATE)).clamp(MIN_EFFICIENCY, MAX_EFFICIENCY);

            for &good in &good_ids {
                settle_county_good(state, county_id, market_id, good, efficiency, day);
            }
        }
        Ok(())
    }
}

fn settle_county_good(state: &mut SimState, county_id: CountyId, market_id: crate::types::MarketId, good: GoodId, efficiency: f64, day: u64) {
    let entry = state.catalogs.goods.get(good);
    let is_consumer = entry.need_category.is_some();
    let per_capita = entry.base_per_capita_consumption;
    let theft_risk = entry.theft_risk;
    let finished = entry.finished;
    let base_price = entry.base_price;

    let population = state.county(county_id).population.total() as f64;
    let stock = state.county(county_id).stockpile_of(good);

    let buffer_target = if is_consumer {
        population * per_capita * CONSUMER_BUFFER_DAYS
    } else {
        NON_CONSUMER_THRESHOLD
    };

    if stock > buffer_target {
        let surplus = stock - buffer_target;
        let loss = surplus * (1.0 - efficiency);
        let mut to_black_market = 0.0;
        if finished && theft_risk > 0.0 {
            to_black_market = loss;
        }
        let shipped = surplus - loss;
        state.county_mut(county_id).remove_stock(good, surplus);

        if shipped > 0.0 {
            let Some(market) = state.markets.get_mut(market_id) else { return };
            let gs = market.good_state(good, base_price);
            gs.lots.push(ConsignmentLot { seller: SellerRef::County(county_id), day_listed: day, qty: shipped });
            gs.supply += shipped;
        }
        if to_black_market > 0.0 {
            if let Some(black_id) = state.black_market {
                if let Some(market) = state.markets.get_mut(black_id) {
                    let gs = market.good_state(good, base_price);
                    gs.lots.push(ConsignmentLot { seller: SellerRef::County(county_id), day_listed: day, qty: to_black_market });
                    gs.supply += to_black_market;
                }
            }
        }
    } else if stock < buffer_target {
        let deficit = buffer_target - stock;
        let treasury = state.county(county_id).population.treasury();
        if treasury <= 0.0 || deficit <= 0.0 {
            return;
        }
        let price = state.markets.get(market_id).and_then(|m| m.goods.get(&good)).map(|g| g.price).unwrap_or(base_price).max(1e-6);
        let mut qty = deficit;
        let mut cost = qty * price;
        if cost > treasury {
            qty = treasury / price;
            cost = treasury;
        }
        if qty <= 0.0 {
            return;
        }
        let Some(market) = state.markets.get_mut(market_id) else { return };
        let gs = market.good_state(good, base_price);
        gs.orders.push(BuyOrder { buyer: BuyerRef::County(county_id), qty, max_spend: cost, transport_cost: 0.0, day_posted: day });
        gs.demand += qty;
    }
}

/// Keeps off-map markets perpetually stocked, since they model the economy's
/// outside world rather than a bounded local producer.
pub struct OffMapSupplySystem;

impl TickSystem for OffMapSupplySystem {
    fn name(&self) -> &'static str {
        "off_map_supply"
    }

    fn interval_days(&self) -> u32 {
        7
    }

    fn tick(&self, _ctx: &TickContext, state: &mut SimState, _map: &MapData) -> Result<(), String> {
        let off_map_ids = state.off_map_markets.clone();
        for market_id in off_map_ids {
            let Some(market) = state.markets.get_mut(market_id) else { continue };
            for (_, gs) in market.goods.iter_mut() {
                gs.supply = OFF_MAP_RESTOCK_QTY;
                gs.supply_offered = OFF_MAP_RESTOCK_QTY;
            }
        }

        if let Some(black_id) = state.black_market {
            if let Some(market) = state.markets.get_mut(black_id) {
                if market.kind == MarketKind::Black {
                    for (good, gs) in market.goods.iter_mut() {
                        let floor = state.catalogs.goods.get(*good).base_price * BLACK_MARKET_FLOOR_FACTOR;
                        if gs.price < floor {
                            gs.price = floor;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
