//! 4.3 Order posting (daily): population need-tier orders and facility
//! input orders, both constrained by the poster's remaining treasury.

use super::{TickContext, TickSystem};
use crate::economy::state::SimState;
use crate::economy::{BuyOrder, BuyerRef};
use crate::log::{Domain, Level};
use crate::map::MapData;
use crate::types::{FacilityKind, GoodId, MarketKind, NeedCategory};

/// Grain-family goods that partially substitute for bread, and the oat-like
/// substitution for cheese, named explicitly because the spec calls out
/// these specific goods rather than a generic category.
const BREAD_SUBSTITUTES: &[(&str, f64)] = &[
    ("wheat", 0.5),
    ("rye", 0.5),
    ("barley", 0.5),
    ("rice_grain", 0.5),
];
const CHEESE_SUBSTITUTES: &[(&str, f64)] = &[("goats", 0.3)];

const TRANSPORT_SURCHARGE_PER_COST: f64 = 0.005;

pub struct PostOrdersSystem;

impl TickSystem for PostOrdersSystem {
    fn name(&self) -> &'static str {
        "orders"
    }

    fn interval_days(&self) -> u32 {
        1
    }

    fn tick(&self, ctx: &TickContext, state: &mut SimState, map: &MapData) -> Result<(), String> {
        // Orders posted today become eligible starting tomorrow's clearing —
        // the one-day settlement lag that is the core ordering guarantee.
        let day = state.current_day;
        let county_ids = state.county_ids_sorted();

        for county_id in county_ids {
            let Some(market_id) = state.market_for_county(county_id) else {
                ctx.emit(Domain::Economy, Level::Warn, "county has no assigned market", format!("county={}", county_id.0));
                continue;
            };
            post_population_orders(ctx, state, map, county_id, market_id, day);
        }

        for facility_id in state.facility_ids_sorted() {
            post_facility_input_orders(state, facility_id, day);
        }

        Ok(())
    }
}

fn effective_price(local_price: f64, off_map_price: Option<f64>, off_map_cost: f64) -> (f64, bool, f64) {
    let local_effective = local_price;
    match off_map_price {
        Some(p) if off_map_cost.is_finite() => {
            let off_map_effective = p * (1.0 + off_map_cost.max(0.0) * TRANSPORT_SURCHARGE_PER_COST);
            if off_map_effective < local_effective {
                return (off_map_effective, true, off_map_cost);
            }
            (local_effective, false, 0.0)
        }
        _ => (local_effective, false, 0.0),
    }
}

fn best_off_map(state: &mut SimState, map: &MapData, county_seat: crate::types::CellId, good: GoodId) -> Option<(f64, f64)> {
    let off_map_ids = state.off_map_markets.clone();
    let catalog_base_price = state.catalogs.goods.get(good).base_price;
    let mut best: Option<(f64, f64)> = None;
    for mid in off_map_ids {
        let (hub, price, supplies) = {
            let Some(market) = state.markets.get(mid) else { continue };
            if !market.supplies(good) {
                continue;
            }
            // An off-map good with no entry yet hasn't been priced by anyone;
            // fall back to its catalog base price rather than treating it as
            // free, since that price also seeds the entry's `base_price` the
            // first time an order is posted against it.
            let price = market.goods.get(&good).map(|g| g.price).unwrap_or(catalog_base_price);
            (market.hub_cell, price, true)
        };
        if !supplies {
            continue;
        }
        let cost = state.transport.get_transport_cost(map, county_seat, hub);
        if !cost.is_finite() {
            continue;
        }
        if best.map(|(_, c)| cost < c).unwrap_or(true) {
            best = Some((price, cost));
        }
    }
    best
}

fn substitution_offset(state: &SimState, county_id: crate::types::CountyId, target: &str, subs: &[(&str, f64)]) -> f64 {
    let Some(target_good) = state.catalogs.goods.lookup(target) else { return 0.0 };
    let base_per_capita = state.catalogs.goods.get(target_good).base_per_capita_consumption;
    let population = state.county(county_id).population.total() as f64;
    let bread_demand = population * base_per_capita;

    let mut substitute_supply = 0.0;
    for (sub_id, rate) in subs {
        if let Some(good) = state.catalogs.goods.lookup(sub_id) {
            let stock = state.county(county_id).stockpile_of(good);
            substitute_supply += stock * rate;
        }
    }
    substitute_supply.min(bread_demand)
}

fn post_population_orders(
    ctx: &TickContext,
    state: &mut SimState,
    map: &MapData,
    county_id: crate::types::CountyId,
    market_id: crate::types::MarketId,
    day: u64,
) {
    let population = state.county(county_id).population.total();
    if population == 0 {
        return;
    }
    let population = population as f64;
    let county_seat = match map.county(county_id) {
        Some(c) => c.seat_cell,
        None => {
            ctx.emit(Domain::Economy, Level::Warn, "county has no seat cell", format!("county={}", county_id.0));
            return;
        }
    };

    let bread_offset = substitution_offset(state, county_id, "bread", BREAD_SUBSTITUTES);
    let cheese_offset = substitution_offset(state, county_id, "cheese", CHEESE_SUBSTITUTES);
    let bread_good = state.catalogs.goods.lookup("bread");
    let cheese_good = state.catalogs.goods.lookup("cheese");

    let mut remaining_budget = state.county(county_id).population.treasury();

    for tier in [NeedCategory::Basic, NeedCategory::Comfort, NeedCategory::Luxury] {
        if remaining_budget <= 0.0 {
            break;
        }
        let tier_goods: Vec<GoodId> = state
            .catalogs
            .goods
            .ids()
            .filter(|g| state.catalogs.goods.get(*g).need_category == Some(tier))
            .collect();

        let mut lines: Vec<(GoodId, f64, f64, bool, f64)> = Vec::new(); // (good, qty, price, is_off_map, cost)
        let mut total_cost = 0.0;
        for good in tier_goods {
            let entry = state.catalogs.goods.get(good);
            let mut demand = population * entry.base_per_capita_consumption;
            if Some(good) == bread_good {
                demand = (demand - bread_offset).max(0.0);
            }
            if Some(good) == cheese_good {
                demand = (demand - cheese_offset).max(0.0);
            }
            if demand <= 0.0 {
                continue;
            }
            let local_price = state
                .markets
                .get(market_id)
                .and_then(|m| m.goods.get(&good))
                .map(|g| g.price)
                .unwrap_or(entry.base_price);
            let off_map = best_off_map(state, map, county_seat, good);
            let (price, is_off_map, cost) = effective_price(local_price, off_map.map(|(p, _)| p), off_map.map(|(_, c)| c).unwrap_or(f64::INFINITY));
            let line_cost = demand * price;
            total_cost += line_cost;
            lines.push((good, demand, price, is_off_map, cost));
        }

        if total_cost <= 0.0 {
            continue;
        }

        let scale = if total_cost > remaining_budget { remaining_budget / total_cost } else { 1.0 };

        for (good, qty, price, is_off_map, cost) in lines {
            let scaled_qty = qty * scale;
            if scaled_qty <= 0.0 {
                continue;
            }
            let line_cost = scaled_qty * price;
            let target_market = if is_off_map {
                state.off_map_markets.iter().copied().find(|mid| {
                    state.markets.get(*mid).map(|m| m.supplies(good)).unwrap_or(false)
                })
            } else {
                Some(market_id)
            };
            let Some(target_market) = target_market else { continue };
            let Some(market) = state.markets.get_mut(target_market) else { continue };
            let base_price = market.goods.get(&good).map(|g| g.base_price).unwrap_or(price);
            let good_state = market.good_state(good, base_price);
            good_state.orders.push(BuyOrder {
                buyer: BuyerRef::County(county_id),
                qty: scaled_qty,
                max_spend: line_cost,
                transport_cost: cost,
                day_posted: day,
            });
            good_state.demand += scaled_qty;
        }

        remaining_budget = (remaining_budget - total_cost.min(remaining_budget)).max(0.0);
    }
}

fn post_facility_input_orders(state: &mut SimState, facility_id: crate::types::FacilityId, day: u64) {
    let Some(facility) = state.facilities.get(facility_id) else { return };
    if !facility.active || facility.assigned_workers == 0 {
        return;
    }
    let Some(def) = state.catalogs.facility_def(&facility.facility_def).cloned() else { return };
    if def.kind == FacilityKind::Extraction {
        return;
    }
    let output_entry = state.catalogs.goods.get(def.output_good).clone();
    let bom = def.input_overrides.clone().unwrap_or_else(|| output_entry.input_bom.clone());
    let market_id = facility.assigned_market;
    let mut remaining_treasury = facility.treasury();

    for (input_good, qty_per_unit) in bom {
        if remaining_treasury <= 0.0 {
            break;
        }
        let throughput = def.base_throughput * facility.fill_ratio();
        let needed = (throughput * qty_per_unit - facility.input_qty(input_good)).max(0.0);
        if needed <= 0.0 {
            continue;
        }
        let Some(market) = state.markets.get_mut(market_id) else { break };
        let base_price = market.goods.get(&input_good).map(|g| g.base_price).unwrap_or_else(|| state.catalogs.goods.get(input_good).base_price);
        let good_state = market.good_state(input_good, base_price);
        let price = good_state.price.max(1e-6);
        let mut qty = needed;
        let mut cost = qty * price;
        if cost > remaining_treasury {
            qty = remaining_treasury / price;
            cost = remaining_treasury;
        }
        if qty <= 0.0 {
            continue;
        }
        good_state.orders.push(BuyOrder {
            buyer: BuyerRef::Facility(facility_id),
            qty,
            max_spend: cost,
            transport_cost: 0.0,
            day_posted: day,
        });
        good_state.demand += qty;
        remaining_treasury -= cost;
    }
}
