//! 4.6 Wages (daily). Computes the population-weighted basic basket cost,
//! smooths it into a subsistence wage with a daily ratchet, then pays every
//! facility's wage bill out of its own treasury.

use super::{TickContext, TickSystem};
use crate::economy::state::SimState;
use crate::map::MapData;
use crate::types::{MarketKind, NeedCategory};

const BASKET_EMA_ALPHA: f64 = 2.0 / 31.0;
const SUBSISTENCE_MULTIPLIER: f64 = 1.2;
const SUBSISTENCE_RATCHET: f64 = 0.02;
const MARGIN_WAGE_SHARE: f64 = 0.7;
const WAGE_DEBT_DISTRESS_DAYS: u32 = 60;

pub struct WagesSystem;

impl TickSystem for WagesSystem {
    fn name(&self) -> &'static str {
        "wages"
    }

    fn interval_days(&self) -> u32 {
        1
    }

    fn tick(&self, _ctx: &TickContext, state: &mut SimState, _map: &MapData) -> Result<(), String> {
        update_subsistence_wage(state);
        let subsistence = state.subsistence_wage;
        let day = state.current_day;

        for facility_id in state.facility_ids_sorted() {
            pay_facility(state, facility_id, subsistence, day);
        }
        Ok(())
    }
}

fn update_subsistence_wage(state: &mut SimState) {
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;

    for market_id in state.market_ids_sorted() {
        let Some(market) = state.markets.get(market_id) else { continue };
        if market.kind != MarketKind::Legitimate {
            continue;
        }
        let mut basket = 0.0;
        for good in state.catalogs.goods.ids() {
            let entry = state.catalogs.goods.get(good);
            if entry.need_category != Some(NeedCategory::Basic) {
                continue;
            }
            let price = market.goods.get(&good).map(|g| g.price).unwrap_or(entry.base_price);
            basket += price * entry.base_per_capita_consumption;
        }
        let population: u64 = state
            .county_to_market
            .iter()
            .filter(|(_, m)| **m == market_id)
            .map(|(c, _)| state.county(*c).population.total())
            .sum();
        if population == 0 {
            continue;
        }
        weighted_sum += basket * population as f64;
        weight_total += population as f64;
    }

    if weight_total <= 0.0 {
        return;
    }
    let basket_cost = weighted_sum / weight_total;

    if state.smoothed_basket_cost <= 0.0 {
        state.smoothed_basket_cost = basket_cost;
    } else {
        state.smoothed_basket_cost = state.smoothed_basket_cost * (1.0 - BASKET_EMA_ALPHA) + basket_cost * BASKET_EMA_ALPHA;
    }

    let candidate = state.smoothed_basket_cost * SUBSISTENCE_MULTIPLIER;
    if state.subsistence_wage <= 0.0 {
        state.subsistence_wage = candidate;
    } else {
        let prev = state.subsistence_wage;
        state.subsistence_wage = candidate.clamp(prev * (1.0 - SUBSISTENCE_RATCHET), prev * (1.0 + SUBSISTENCE_RATCHET));
    }
}

fn pay_facility(state: &mut SimState, facility_id: crate::types::FacilityId, subsistence: f64, day: u64) {
    let Some(facility) = state.facilities.get_mut(facility_id) else { return };

    if !facility.active || facility.assigned_workers == 0 {
        facility.wage_rate = subsistence;
        if facility.wage_debt_days > 0 && day % 5 == 0 {
            facility.wage_debt_days -= 1;
        }
        return;
    }

    let margin = facility.revenue_ring.average() - facility.input_cost_ring.average();
    let wage = if margin > 0.0 {
        (margin / facility.required_labor as f64 * MARGIN_WAGE_SHARE).max(subsistence)
    } else {
        subsistence
    };
    facility.wage_rate = wage;

    let bill = wage * facility.assigned_workers as f64;
    let available = facility.treasury();
    let paid = bill.min(available);
    facility.treasury -= paid;

    let coverage = if bill > 0.0 { paid / bill } else { 1.0 };
    if coverage < 0.60 {
        facility.wage_debt_days += 1;
    } else if coverage >= 0.95 {
        facility.wage_debt_days = facility.wage_debt_days.saturating_sub(1);
    } else if coverage >= 0.80 && day % 3 == 0 {
        facility.wage_debt_days = facility.wage_debt_days.saturating_sub(1);
    }

    let resident = facility.resident_county;
    state.county_mut(resident).population.treasury += paid;
    let _ = WAGE_DEBT_DISTRESS_DAYS;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_facility_takes_subsistence_wage() {
        let mut f = crate::economy::FacilityInstance::new(
            "farm".into(),
            crate::types::CountyId::new(0),
            crate::types::MarketId::default(),
            4,
        );
        f.active = false;
        assert_eq!(f.wage_rate, 0.0);
        // pay_facility is exercised end-to-end via the bootstrap integration
        // tests; this unit test only pins the starting fixture shape.
        let _ = WagesSystem;
    }
}
