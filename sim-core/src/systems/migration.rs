//! 4.12 Migration (monthly): push/pull scoring per county and mobile
//! estate, migrants distributed across reachable destinations by score.

use super::{TickContext, TickSystem};
use crate::economy::state::SimState;
use crate::map::MapData;
use crate::types::{CountyId, Estate};

const FOOD_HORIZON_DAYS: f64 = 30.0;
const MIGRATION_RATE: f64 = 0.01;
const MAX_DESTINATION_COST: f64 = 50.0;
const ADJACENCY_SCALE: f64 = 10.0;
const DISTANCE_DECAY_SCALE: f64 = 30.0;
const SAME_CULTURE_AFFINITY: f64 = 1.0;
const OTHER_CULTURE_AFFINITY: f64 = 0.2;
const EMPLOYMENT_PULL_FLOOR: f64 = 0.1;
const FOOD_PULL_FLOOR: f64 = 0.1;
const MERCHANT_PUSH: f64 = 0.10;

pub struct MigrationSystem;

impl TickSystem for MigrationSystem {
    fn name(&self) -> &'static str {
        "migration"
    }

    fn interval_days(&self) -> u32 {
        30
    }

    fn tick(&self, _ctx: &TickContext, state: &mut SimState, map: &MapData) -> Result<(), String> {
        let county_ids = state.county_ids_sorted();
        let mut transfers: Vec<(CountyId, CountyId, Estate, u64)> = Vec::new();

        for &origin in &county_ids {
            for estate in Estate::all() {
                let pop = state.county(origin).population.cohort(estate);
                if pop == 0 {
                    continue;
                }
                let push = push_score(state, origin, estate);
                let migrants = ((pop as f64) * MIGRATION_RATE * estate.mobility() * push).floor() as u64;
                let migrants = migrants.min(pop.saturating_sub(1));
                if migrants == 0 {
                    continue;
                }

                let destinations = candidate_destinations(state, map, origin, estate, &county_ids);
                if destinations.is_empty() {
                    continue;
                }
                let score_total: f64 = destinations.iter().map(|(_, s)| s).sum();
                if score_total <= 0.0 {
                    continue;
                }
                let mut distributed = 0u64;
                let n = destinations.len();
                for (idx, (dest, score)) in destinations.iter().enumerate() {
                    let share = if idx + 1 == n {
                        migrants - distributed
                    } else {
                        let s = ((migrants as f64) * (score / score_total)).floor() as u64;
                        distributed += s;
                        s
                    };
                    if share > 0 {
                        transfers.push((origin, *dest, estate, share));
                    }
                }
            }
        }

        for (origin, dest, estate, count) in transfers {
            let available = state.county(origin).population.cohort(estate);
            let moved = count.min(available);
            if moved == 0 {
                continue;
            }
            *state.county_mut(origin).population.cohorts.entry(estate).or_insert(0) -= moved;
            *state.county_mut(dest).population.cohorts.entry(estate).or_insert(0) += moved;
        }
        Ok(())
    }
}

fn push_score(state: &SimState, county_id: CountyId, estate: Estate) -> f64 {
    if estate == Estate::Merchants {
        return MERCHANT_PUSH;
    }
    let pop = &state.county(county_id).population;
    let cohort = pop.cohort(estate).max(1) as f64;
    let employed = pop.employed(match estate {
        Estate::Laborers => crate::types::LaborType::Unskilled,
        Estate::Artisans => crate::types::LaborType::Skilled,
        Estate::Merchants => crate::types::LaborType::Unskilled,
    }) as f64;
    let idle_fraction = ((cohort - employed) / cohort).clamp(0.0, 1.0);

    let bread_good = state.catalogs.goods.lookup("bread");
    let food_push = if let Some(bread) = bread_good {
        let entry = state.catalogs.goods.get(bread);
        let daily_demand = pop.total() as f64 * entry.base_per_capita_consumption;
        if daily_demand <= 0.0 {
            0.0
        } else {
            let days_food = state.county(county_id).stockpile_of(bread) / daily_demand;
            (1.0 - days_food / FOOD_HORIZON_DAYS).max(0.0)
        }
    } else {
        0.0
    };

    idle_fraction.max(food_push)
}

fn candidate_destinations(state: &mut SimState, map: &MapData, origin: CountyId, estate: Estate, all_counties: &[CountyId]) -> Vec<(CountyId, f64)> {
    let Some(origin_county) = map.county(origin) else { return Vec::new() };
    let origin_seat = origin_county.seat_cell;
    let origin_culture = origin_county.culture;

    let mut out = Vec::new();
    for &dest in all_counties {
        if dest == origin {
            continue;
        }
        let Some(dest_county) = map.county(dest) else { continue };
        let cost = state.transport.get_transport_cost(map, origin_seat, dest_county.seat_cell) * ADJACENCY_SCALE;
        if !cost.is_finite() || cost > MAX_DESTINATION_COST {
            continue;
        }
        let culture_affinity = if dest_county.culture == origin_culture { SAME_CULTURE_AFFINITY } else { OTHER_CULTURE_AFFINITY };
        let distance_decay = 1.0 / (1.0 + cost / DISTANCE_DECAY_SCALE);

        let dest_pop = &state.county(dest).population;
        let dest_cohort = dest_pop.cohort(estate).max(1) as f64;
        let dest_employed = dest_pop.employed(match estate {
            Estate::Laborers => crate::types::LaborType::Unskilled,
            Estate::Artisans => crate::types::LaborType::Skilled,
            Estate::Merchants => crate::types::LaborType::Unskilled,
        }) as f64;
        let employment_pull = ((dest_cohort - dest_employed) / dest_cohort).clamp(0.0, 1.0).max(EMPLOYMENT_PULL_FLOOR);

        let bread_good = state.catalogs.goods.lookup("bread");
        let food_pull = if let Some(bread) = bread_good {
            let entry = state.catalogs.goods.get(bread);
            let daily_demand = dest_pop.total() as f64 * entry.base_per_capita_consumption;
            if daily_demand <= 0.0 {
                1.0
            } else {
                (state.county(dest).stockpile_of(bread) / daily_demand / FOOD_HORIZON_DAYS).clamp(0.0, 1.0).max(FOOD_PULL_FLOOR)
            }
        } else {
            FOOD_PULL_FLOOR
        };

        let pull = employment_pull * food_pull;
        let score = pull * culture_affinity * distance_decay;
        if score > 0.0 {
            out.push((dest, score));
        }
    }
    out
}
