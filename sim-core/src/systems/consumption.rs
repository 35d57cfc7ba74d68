//! 4.9 Consumption & decay (daily): population draws down local stockpiles
//! for every consumer good, then decay removes a fraction of what remains.

use super::{TickContext, TickSystem};
use crate::economy::state::SimState;
use crate::map::MapData;

pub struct ConsumptionSystem;

impl TickSystem for ConsumptionSystem {
    fn name(&self) -> &'static str {
        "consumption"
    }

    fn interval_days(&self) -> u32 {
        1
    }

    fn tick(&self, _ctx: &TickContext, state: &mut SimState, _map: &MapData) -> Result<(), String> {
        let good_ids: Vec<_> = state.catalogs.goods.ids().collect();
        for county_id in state.county_ids_sorted() {
            let population = state.county(county_id).population.total();
            if population == 0 {
                continue;
            }
            let population = population as f64;
            for &good in &good_ids {
                let entry = state.catalogs.goods.get(good);
                let demand = population * entry.base_per_capita_consumption;
                if demand <= 0.0 {
                    continue;
                }
                let county = state.county_mut(county_id);
                let removed = county.remove_stock(good, demand);
                county.record_unmet(good, demand - removed);
            }
        }

        for county_id in state.county_ids_sorted() {
            let county = state.county_mut(county_id);
            let goods_with_stock: Vec<_> = county.stockpile.keys().copied().collect();
            for good in goods_with_stock {
                let decay_rate = state.catalogs.goods.get(good).decay_rate;
                if decay_rate <= 0.0 {
                    continue;
                }
                let county = state.county_mut(county_id);
                let qty = county.stockpile_of(good);
                county.remove_stock(good, qty * decay_rate);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortfall_is_recorded_when_stockpile_is_insufficient() {
        // Directly exercises the recording path used inside the tick loop.
        let mut county = crate::economy::CountyEconomy::default();
        let good = crate::types::GoodId(0);
        county.add_stock(good, 2.0);
        let removed = county.remove_stock(good, 5.0);
        county.record_unmet(good, 5.0 - removed);
        assert_eq!(removed, 2.0);
        assert_eq!(county.unmet_demand.get(&good).copied().unwrap_or(0.0), 3.0);
    }
}
