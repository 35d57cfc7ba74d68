//! 4.10 Theft (daily): finished consumer goods above a minimum stockpile
//! leak into the black market at a rate scaled by the good's theft risk.

use super::{TickContext, TickSystem};
use crate::economy::state::SimState;
use crate::map::MapData;

const MIN_STOCKPILE_THRESHOLD: f64 = 1.0;
const MIN_THEFT_UNITS: f64 = 0.01;
const BASE_THEFT_RATE: f64 = 0.02;

pub struct TheftSystem;

impl TickSystem for TheftSystem {
    fn name(&self) -> &'static str {
        "theft"
    }

    fn interval_days(&self) -> u32 {
        1
    }

    fn tick(&self, _ctx: &TickContext, state: &mut SimState, _map: &MapData) -> Result<(), String> {
        let Some(black_market) = state.black_market else { return Ok(()) };
        let good_ids: Vec<_> = state
            .catalogs
            .goods
            .ids()
            .filter(|g| {
                let e = state.catalogs.goods.get(*g);
                e.finished && e.theft_risk > 0.0
            })
            .collect();
        let day = state.current_day;

        for county_id in state.county_ids_sorted() {
            for &good in &good_ids {
                let theft_risk = state.catalogs.goods.get(good).theft_risk;
                let county = state.county_mut(county_id);
                let stock = county.stockpile_of(good);
                if stock < MIN_STOCKPILE_THRESHOLD {
                    continue;
                }
                let stolen = stock * BASE_THEFT_RATE * theft_risk;
                if stolen < MIN_THEFT_UNITS {
                    continue;
                }
                county.remove_stock(good, stolen);

                let base_price = state.catalogs.goods.get(good).base_price;
                let Some(market) = state.markets.get_mut(black_market) else { continue };
                let gs = market.good_state(good, base_price);
                gs.lots.push(crate::economy::ConsignmentLot {
                    seller: crate::economy::SellerRef::County(county_id),
                    day_listed: day,
                    qty: stolen,
                });
                gs.supply += stolen;
            }
        }
        Ok(())
    }
}
