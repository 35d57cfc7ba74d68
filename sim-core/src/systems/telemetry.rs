//! 4.14 Telemetry (daily): aggregates end-of-day totals into a replaceable
//! snapshot. Observers only ever see the handle produced here, never a live
//! reference into simulation state.

use super::{TickContext, TickSystem};
use crate::economy::state::SimState;
use crate::map::MapData;
use crate::telemetry::{GoodTelemetry, TelemetrySnapshot};
use crate::types::MarketKind;
use std::collections::HashMap;

const DISTRESS_DAYS: u32 = 60;

pub struct TelemetrySystem;

impl TickSystem for TelemetrySystem {
    fn name(&self) -> &'static str {
        "telemetry"
    }

    fn interval_days(&self) -> u32 {
        1
    }

    fn tick(&self, _ctx: &TickContext, state: &mut SimState, _map: &MapData) -> Result<(), String> {
        let total_pop_treasury: f64 = state.counties.iter().map(|c| c.population.treasury()).sum();
        let total_facility_treasury: f64 = state.facilities.values().map(|f| f.treasury()).sum();
        let total_money_supply = total_pop_treasury + total_facility_treasury;

        let mut active_facilities = 0u32;
        let mut idle_facilities = 0u32;
        let mut distressed_facilities = 0u32;
        for f in state.facilities.values() {
            if f.active {
                active_facilities += 1;
            } else {
                idle_facilities += 1;
            }
            if f.wage_debt_days >= DISTRESS_DAYS {
                distressed_facilities += 1;
            }
        }

        let mut per_good: HashMap<_, GoodTelemetry> = HashMap::new();
        let mut daily_trade_value = 0.0;
        let mut price_weight: HashMap<_, f64> = HashMap::new();

        for market in state.markets.values() {
            if market.kind == MarketKind::OffMap {
                continue;
            }
            for (&good, gs) in market.goods.iter() {
                let entry = per_good.entry(good).or_default();
                entry.total_supply += gs.supply;
                entry.total_demand += gs.demand;
                entry.total_trade_volume += gs.last_trade_volume;
                entry.avg_price += gs.price * gs.supply.max(1.0);
                *price_weight.entry(good).or_insert(0.0) += gs.supply.max(1.0);
                daily_trade_value += gs.last_trade_volume * gs.price;
            }
        }
        for good in state.catalogs.goods.ids() {
            let unmet: f64 = state.counties.iter().map(|c| c.unmet_demand.get(&good).copied().unwrap_or(0.0)).sum();
            let entry = per_good.entry(good).or_default();
            entry.unmet_demand = unmet;
            if let Some(w) = price_weight.get(&good) {
                if *w > 0.0 {
                    entry.avg_price /= w;
                }
            }
        }

        let money_velocity = if total_money_supply > 0.0 { daily_trade_value / total_money_supply } else { 0.0 };

        state.telemetry = TelemetrySnapshot {
            day: state.current_day,
            total_pop_treasury,
            total_facility_treasury,
            total_money_supply,
            money_velocity,
            active_facilities,
            idle_facilities,
            distressed_facilities,
            per_good,
        };
        Ok(())
    }
}
