//! 4.13 Road development (monthly). Commits the traffic accumulated daily
//! by the order/production systems into road tiers, invalidating the
//! transport cache whenever any tier actually changes.

use super::{TickContext, TickSystem};
use crate::economy::state::SimState;
use crate::map::MapData;

const TRAFFIC_TO_TIER_SCALE: f64 = 1.0e-4;
const MIN_MULTIPLIER: f64 = 0.3;

pub struct RoadDevelopmentSystem;

impl TickSystem for RoadDevelopmentSystem {
    fn name(&self) -> &'static str {
        "road_development"
    }

    fn interval_days(&self) -> u32 {
        30
    }

    fn tick(&self, _ctx: &TickContext, state: &mut SimState, _map: &MapData) -> Result<(), String> {
        if state.pending_traffic.is_empty() {
            return Ok(());
        }
        let mut new_roads = state.transport.road_state().clone();
        let mut changed = false;

        for (&(a, b), &traffic) in state.pending_traffic.iter() {
            let current = new_roads.multiplier(a, b);
            let improvement = (traffic * TRAFFIC_TO_TIER_SCALE).min(1.0 - MIN_MULTIPLIER);
            let candidate = (1.0 - improvement).max(MIN_MULTIPLIER);
            if candidate < current {
                new_roads.set_edge(a, b, candidate);
                changed = true;
            }
        }

        state.pending_traffic.clear();
        if changed {
            state.transport.set_road_state(new_roads);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn improvement_never_crosses_the_floor() {
        let candidate = (1.0 - (1.0e6 * TRAFFIC_TO_TIER_SCALE).min(1.0 - MIN_MULTIPLIER)).max(MIN_MULTIPLIER);
        assert!(candidate >= MIN_MULTIPLIER);
    }
}
