//! 4.5 Production (daily): the activation gate, the extraction/processing
//! run, and the output flush to market.

use super::{TickContext, TickSystem};
use crate::economy::state::SimState;
use crate::log::{Domain, Level};
use crate::map::MapData;
use crate::types::{CountyId, FacilityId, FacilityKind, GoodId, LaborType};

const GRACE_DAYS: u32 = 14;
const LOSS_DAYS_TO_DEACTIVATE: u32 = 7;
const ACTIVATION_MARGIN_SHARE: f64 = 0.7;
const EXTRACTION_SUBSISTENCE_SHARE: f64 = 0.20;
const HAUL_ARRIVAL_LOSS_RATE: f64 = 0.01;
const HAUL_FEE_RATE: f64 = 0.005;

pub struct ProductionSystem;

impl TickSystem for ProductionSystem {
    fn name(&self) -> &'static str {
        "production"
    }

    fn interval_days(&self) -> u32 {
        1
    }

    fn tick(&self, ctx: &TickContext, state: &mut SimState, _map: &MapData) -> Result<(), String> {
        for facility_id in state.facility_ids_sorted() {
            run_activation_gate(state, facility_id);
            run_production(state, facility_id);
            flush_to_market(ctx, state, facility_id);
        }
        Ok(())
    }
}

fn run_activation_gate(state: &mut SimState, facility_id: FacilityId) {
    let Some(facility) = state.facilities.get(facility_id) else { return };

    if facility.active {
        let rolling_profit = facility.profit_ema;
        let mut consecutive_loss_days = facility.consecutive_loss_days;
        if rolling_profit < 0.0 {
            consecutive_loss_days += 1;
        } else {
            consecutive_loss_days = 0;
        }
        let grace = facility.grace_days_remaining;
        let f = state.facilities.get_mut(facility_id).unwrap();
        f.consecutive_loss_days = consecutive_loss_days;
        if grace > 0 {
            f.grace_days_remaining -= 1;
            return;
        }
        if consecutive_loss_days >= LOSS_DAYS_TO_DEACTIVATE {
            f.active = false;
            f.assigned_workers = 0;
        }
        return;
    }

    let (def, resident_county, market_id) = {
        let Some(def) = state.catalogs.facility_def(&facility.facility_def).cloned() else { return };
        (def, facility.resident_county, facility.assigned_market)
    };

    let required = (def.required_labor as f64 / 2.0).ceil() as u64;
    let available = available_matching_labor(state, resident_county, def.labor_type);
    if available < required {
        return;
    }

    let output_entry = state.catalogs.goods.get(def.output_good).clone();
    let output_price = state.markets.get(market_id).and_then(|m| m.goods.get(&def.output_good)).map(|g| g.price).unwrap_or(output_entry.base_price);
    let transport_cost = state.markets.get(market_id).and_then(|m| m.zone_cost(resident_county)).unwrap_or(0.0);

    let hypothetical_output = def.base_throughput;
    let arrival = hypothetical_output / (1.0 + transport_cost * HAUL_ARRIVAL_LOSS_RATE);
    let fee_rate = transport_cost * HAUL_FEE_RATE;
    let hypothetical_revenue = arrival * output_price * (1.0 - fee_rate.min(1.0));

    let bom = def.input_overrides.clone().unwrap_or_else(|| output_entry.input_bom.clone());
    let mut hypothetical_input_cost = 0.0;
    for (input_good, qty_per_unit) in &bom {
        let price = state.markets.get(market_id).and_then(|m| m.goods.get(input_good)).map(|g| g.price).unwrap_or_else(|| state.catalogs.goods.get(*input_good).base_price);
        hypothetical_input_cost += hypothetical_output * qty_per_unit * price * (1.0 + transport_cost * HAUL_FEE_RATE);
    }

    let wage_cost = state.subsistence_wage * def.required_labor as f64;
    let margin = (hypothetical_revenue - hypothetical_input_cost - wage_cost) * ACTIVATION_MARGIN_SHARE;

    if margin > 0.0 {
        let f = state.facilities.get_mut(facility_id).unwrap();
        f.active = true;
        f.grace_days_remaining = GRACE_DAYS;
        f.consecutive_loss_days = 0;
    }
}

fn available_matching_labor(state: &SimState, county_id: CountyId, labor_type: LaborType) -> u64 {
    let pop = &state.county(county_id).population;
    let estate = match labor_type {
        LaborType::Unskilled => crate::types::Estate::Laborers,
        LaborType::Skilled => crate::types::Estate::Artisans,
    };
    pop.cohort(estate).saturating_sub(pop.employed(labor_type))
}

fn run_production(state: &mut SimState, facility_id: FacilityId) {
    let Some(facility) = state.facilities.get(facility_id) else { return };
    if !facility.active || facility.assigned_workers == 0 {
        return;
    }
    let Some(def) = state.catalogs.facility_def(&facility.facility_def).cloned() else { return };
    let throughput = def.base_throughput * facility.fill_ratio();

    match def.kind {
        FacilityKind::Extraction => {
            let resident_county = facility.resident_county;
            let abundance = state.county(resident_county).resource_abundance.get(&def.output_good).copied().unwrap_or(1.0);
            let produced = throughput * abundance;
            let subsistence_cut = produced * EXTRACTION_SUBSISTENCE_SHARE;
            let remainder = produced - subsistence_cut;
            state.county_mut(resident_county).add_stock(def.output_good, subsistence_cut);
            state.facilities.get_mut(facility_id).unwrap().add_output(def.output_good, remainder);
        }
        FacilityKind::Processing => {
            let output_entry = state.catalogs.goods.get(def.output_good).clone();
            let bom = def.input_overrides.clone().unwrap_or_else(|| output_entry.input_bom.clone());
            if bom.is_empty() {
                return;
            }
            let f = state.facilities.get(facility_id).unwrap();
            let mut max_batches = throughput;
            for (input_good, qty_per_unit) in &bom {
                if *qty_per_unit <= 0.0 {
                    continue;
                }
                let available = f.input_qty(*input_good);
                max_batches = max_batches.min(available / qty_per_unit);
            }
            max_batches = max_batches.max(0.0);
            if max_batches <= 0.0 {
                return;
            }
            let f = state.facilities.get_mut(facility_id).unwrap();
            for (input_good, qty_per_unit) in &bom {
                f.consume_input(*input_good, max_batches * qty_per_unit);
            }
            f.add_output(def.output_good, max_batches);
        }
    }
}

fn flush_to_market(ctx: &TickContext, state: &mut SimState, facility_id: FacilityId) {
    let Some(facility) = state.facilities.get(facility_id) else { return };
    if !facility.active {
        return;
    }
    let Some(def) = state.catalogs.facility_def(&facility.facility_def).cloned() else { return };
    let good = def.output_good;
    let output_qty = facility.output_qty(good);
    if output_qty <= 0.0 {
        return;
    }
    let market_id = facility.assigned_market;
    let resident_county = facility.resident_county;
    let transport_cost = state.markets.get(market_id).and_then(|m| m.zone_cost(resident_county)).unwrap_or(0.0);

    let arrival_qty = output_qty / (1.0 + transport_cost * HAUL_ARRIVAL_LOSS_RATE);
    let market_price = state.markets.get(market_id).and_then(|m| m.goods.get(&good)).map(|g| g.price).unwrap_or_else(|| state.catalogs.goods.get(good).base_price);
    let mut fee = arrival_qty * market_price * transport_cost * HAUL_FEE_RATE;

    let available_treasury = state.facilities.get(facility_id).unwrap().treasury();
    let mut shipped_qty = arrival_qty;
    let mut taken = output_qty;
    if fee > available_treasury {
        let scale = if fee > 0.0 { available_treasury / fee } else { 0.0 };
        shipped_qty *= scale;
        taken *= scale;
        fee *= scale;
    }
    if shipped_qty <= 0.0 {
        return;
    }

    let f = state.facilities.get_mut(facility_id).unwrap();
    f.take_output(good, taken);
    f.treasury -= fee;
    f.revenue_ring.push(0.0); // revenue recognized at clearing, not at flush
    f.input_cost_ring.push(0.0);
    f.profit_ema = f.revenue_ema - f.input_cost_ema;

    state.county_mut(resident_county).population.treasury += fee;

    let base_price = state.markets.get(market_id).and_then(|m| m.goods.get(&good)).map(|g| g.base_price).unwrap_or_else(|| state.catalogs.goods.get(good).base_price);
    let day = state.current_day;
    let Some(market) = state.markets.get_mut(market_id) else {
        ctx.emit(Domain::Economy, Level::Warn, "facility's market is missing", format!("facility={:?}", facility_id));
        return;
    };
    let gs = market.good_state(good, base_price);
    gs.lots.push(crate::economy::ConsignmentLot {
        seller: crate::economy::SellerRef::Facility(facility_id),
        day_listed: day,
        qty: shipped_qty,
    });
    gs.supply += shipped_qty;
}
