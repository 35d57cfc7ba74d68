//! 4.8 Price adjustment (daily). Off-map markets hold at base price; every
//! other market nudges price toward its demand/supply ratio with an
//! asymmetric clamp so prices fall faster than they rise.

use super::{TickContext, TickSystem};
use crate::economy::state::SimState;
use crate::map::MapData;
use crate::types::MarketKind;

const DEPTH_EPSILON: f64 = 5.0;
const ADJUSTMENT_CLAMP: f64 = 0.5;
const DELTA_SCALE: f64 = 0.1;
const DELTA_FLOOR: f64 = -0.03;
const DELTA_CEIL: f64 = 0.01;
const PRICE_FLOOR: f64 = 1e-4;

pub struct PriceAdjustmentSystem;

impl TickSystem for PriceAdjustmentSystem {
    fn name(&self) -> &'static str {
        "prices"
    }

    fn interval_days(&self) -> u32 {
        1
    }

    fn tick(&self, _ctx: &TickContext, state: &mut SimState, _map: &MapData) -> Result<(), String> {
        for market_id in state.market_ids_sorted() {
            let Some(market) = state.markets.get_mut(market_id) else { continue };
            if market.kind == MarketKind::OffMap {
                for (_, gs) in market.goods.iter_mut() {
                    gs.price = gs.base_price;
                }
                continue;
            }
            for (_, gs) in market.goods.iter_mut() {
                let ratio = (gs.demand + DEPTH_EPSILON) / (gs.supply + DEPTH_EPSILON);
                let adjustment = (ratio - 1.0).clamp(-ADJUSTMENT_CLAMP, ADJUSTMENT_CLAMP);
                let mut delta = DELTA_SCALE * adjustment;
                if delta > 0.0 {
                    let liquidity = if gs.demand > 0.0 { (gs.last_trade_volume / gs.demand).clamp(0.0, 1.0) } else { 0.0 };
                    delta *= 0.15 + 0.85 * liquidity;
                }
                delta = delta.clamp(DELTA_FLOOR, DELTA_CEIL);
                gs.price = (gs.price * (1.0 + delta)).max(PRICE_FLOOR);
            }
        }
        Ok(())
    }
}
