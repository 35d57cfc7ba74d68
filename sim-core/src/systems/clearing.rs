//! 4.4 Market clearing (daily). The one-day settlement lag (eligible supply
//! has `day_listed < current_day`, eligible demand has `day_posted <
//! current_day`) is the core ordering guarantee: nothing posted or listed
//! today can trade today.

use super::{TickContext, TickSystem};
use crate::economy::state::SimState;
use crate::economy::{BuyerRef, SellerRef};
use crate::map::MapData;
use crate::types::{CountyId, FacilityId};

const CULL_THRESHOLD: f64 = 1e-6;
const TRANSPORT_FEE_RATE: f64 = 0.005;

pub struct MarketClearingSystem;

impl TickSystem for MarketClearingSystem {
    fn name(&self) -> &'static str {
        "market_clearing"
    }

    fn interval_days(&self) -> u32 {
        1
    }

    fn tick(&self, _ctx: &TickContext, state: &mut SimState, _map: &MapData) -> Result<(), String> {
        let day = state.current_day;
        for market_id in state.market_ids_sorted() {
            let good_ids: Vec<_> = state.markets.get(market_id).map(|m| m.goods.keys().copied().collect()).unwrap_or_default();
            for good in good_ids {
                clear_good(state, market_id, good, day);
            }
        }
        Ok(())
    }
}

fn decay_rate_of(state: &SimState, good: crate::types::GoodId) -> f64 {
    state.catalogs.goods.get(good).decay_rate
}

fn clear_good(state: &mut SimState, market_id: crate::types::MarketId, good: crate::types::GoodId, day: u64) {
    let decay_rate = decay_rate_of(state, good);
    let Some(market) = state.markets.get_mut(market_id) else { return };
    let Some(gs) = market.goods.get_mut(&good) else { return };

    // 1. Decay existing lots, cull near-empty ones.
    if decay_rate > 0.0 {
        for lot in gs.lots.iter_mut() {
            lot.qty *= 1.0 - decay_rate;
        }
    }
    gs.lots.retain(|lot| lot.qty > CULL_THRESHOLD);

    // 2. Aggregate eligible supply/demand under the one-day lag.
    let eligible_supply: f64 = gs.lots.iter().filter(|l| l.day_listed < day).map(|l| l.qty).sum();
    let eligible_demand: f64 = gs.orders.iter().filter(|o| o.day_posted < day).map(|o| o.qty).sum();

    gs.supply = gs.lots.iter().map(|l| l.qty).sum();
    gs.supply_offered = eligible_supply;
    gs.demand = gs.orders.iter().map(|o| o.qty).sum();

    if eligible_supply <= 0.0 || eligible_demand <= 0.0 {
        return;
    }

    // 3. Plan.
    let planned = eligible_demand.min(eligible_supply);
    let buyer_fill_ratio = planned / eligible_demand;

    // 4. Debit buyers at scaled quantity, crediting transport fee locally.
    let price = gs.price;
    let mut actual_filled = 0.0;
    let mut revenue_from_buyers = 0.0;

    for order in gs.orders.iter_mut() {
        if order.day_posted >= day {
            continue;
        }
        let desired = order.qty * buyer_fill_ratio;
        if desired <= 0.0 {
            continue;
        }
        let base_cost = desired * price;
        let fee = base_cost * order.transport_cost.max(0.0) * TRANSPORT_FEE_RATE;
        let mut gross = base_cost + fee;

        let available = buyer_treasury(state, order.buyer);
        let mut final_qty = desired;
        if gross > available {
            let scale = if gross > 0.0 { available / gross } else { 0.0 };
            final_qty = desired * scale;
            gross *= scale;
        }
        if final_qty <= 0.0 {
            order.qty = 0.0;
            continue;
        }
        let final_base = final_qty * price;
        let final_fee = gross - final_base;

        debit_buyer(state, order.buyer, gross);
        let local_county = buyer_local_county(state, order.buyer);
        if let Some(county) = local_county {
            state.county_mut(county).population.treasury += final_fee;
        }
        if let BuyerRef::Facility(fid) = order.buyer {
            if let Some(f) = state.facilities.get_mut(fid) {
                f.add_input(good, final_qty);
            }
        }

        actual_filled += final_qty;
        revenue_from_buyers += final_base;
        order.qty -= final_qty;
    }

    // 5. Sell lots FIFO, oldest `day_listed` first, up to actual filled demand.
    let Some(market) = state.markets.get_mut(market_id) else { return };
    let Some(gs) = market.goods.get_mut(&good) else { return };
    gs.lots.sort_by_key(|l| l.day_listed);

    let mut to_sell = actual_filled;
    let mut county_credits: Vec<(CountyId, f64)> = Vec::new();
    let mut facility_credits: Vec<(FacilityId, f64)> = Vec::new();

    for lot in gs.lots.iter_mut() {
        if lot.day_listed >= day || to_sell <= 0.0 {
            continue;
        }
        let sold = lot.qty.min(to_sell);
        if sold <= 0.0 {
            continue;
        }
        lot.qty -= sold;
        to_sell -= sold;
        let proceeds = sold * price;
        match lot.seller {
            SellerRef::County(c) => county_credits.push((c, proceeds)),
            SellerRef::Facility(f) => facility_credits.push((f, proceeds)),
        }
    }
    gs.last_trade_volume = actual_filled - to_sell;
    gs.revenue = revenue_from_buyers;

    // 6. Cull fully-filled orders and near-empty lots.
    gs.orders.retain(|o| o.qty > CULL_THRESHOLD);
    gs.lots.retain(|l| l.qty > CULL_THRESHOLD);

    drop(market);
    for (county, amount) in county_credits {
        state.county_mut(county).population.treasury += amount;
    }
    for (facility, amount) in facility_credits {
        if let Some(f) = state.facilities.get_mut(facility) {
            f.treasury += amount;
            f.revenue_ema = f.revenue_ema * 0.8 + amount * 0.2;
        }
    }
}

fn buyer_treasury(state: &SimState, buyer: BuyerRef) -> f64 {
    match buyer {
        BuyerRef::County(c) => state.county(c).population.treasury(),
        BuyerRef::Facility(f) => state.facilities.get(f).map(|f| f.treasury()).unwrap_or(0.0),
    }
}

fn debit_buyer(state: &mut SimState, buyer: BuyerRef, amount: f64) {
    match buyer {
        BuyerRef::County(c) => state.county_mut(c).population.treasury -= amount,
        BuyerRef::Facility(f) => {
            if let Some(facility) = state.facilities.get_mut(f) {
                facility.treasury -= amount;
            }
        }
    }
}

fn buyer_local_county(state: &SimState, buyer: BuyerRef) -> Option<CountyId> {
    match buyer {
        BuyerRef::County(c) => Some(c),
        BuyerRef::Facility(f) => state.facilities.get(f).map(|f| f.resident_county),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::{BuyOrder, ConsignmentLot};
    use crate::types::GoodId;

    fn base_state() -> SimState {
        crate::bootstrap::test_support::empty_state()
    }

    #[test]
    fn one_day_lag_prevents_same_day_trade() {
        let mut state = base_state();
        let good = GoodId(0);
        let market_id = state.market_ids_sorted()[0];
        let county = CountyId::new(0);
        state.county_mut(county).population.treasury = 1000.0;
        {
            let market = state.markets.get_mut(market_id).unwrap();
            let gs = market.good_state(good, 10.0);
            gs.lots.push(ConsignmentLot { seller: SellerRef::County(county), day_listed: state.current_day, qty: 100.0 });
            gs.orders.push(BuyOrder { buyer: BuyerRef::County(county), qty: 10.0, max_spend: 1000.0, transport_cost: 0.0, day_posted: state.current_day });
        }
        clear_good(&mut state, market_id, good, state.current_day);
        let gs = state.markets.get(market_id).unwrap().goods.get(&good).unwrap();
        assert_eq!(gs.last_trade_volume, 0.0);
    }

    #[test]
    fn lag_one_day_later_trades_and_conserves_money() {
        let mut state = base_state();
        let good = GoodId(0);
        let market_id = state.market_ids_sorted()[0];
        let county = CountyId::new(0);
        state.county_mut(county).population.treasury = 1000.0;
        let listed_day = 0;
        {
            let market = state.markets.get_mut(market_id).unwrap();
            let gs = market.good_state(good, 10.0);
            gs.lots.push(ConsignmentLot { seller: SellerRef::County(county), day_listed: listed_day, qty: 100.0 });
            gs.orders.push(BuyOrder { buyer: BuyerRef::County(county), qty: 10.0, max_spend: 1000.0, transport_cost: 0.0, day_posted: listed_day });
        }
        let before = state.county(county).population.treasury;
        clear_good(&mut state, market_id, good, 1);
        let gs = state.markets.get(market_id).unwrap().goods.get(&good).unwrap();
        assert!(gs.last_trade_volume > 0.0);
        // Buyer and seller are the same county here, so the net money effect
        // is the (zero) transport fee only.
        let after = state.county(county).population.treasury;
        assert!((after - before).abs() < 1e-6);
    }
}
