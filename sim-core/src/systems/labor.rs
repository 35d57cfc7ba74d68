//! 4.7 Labor reallocation. Runs on a 7-slice daily rotation (`county_id mod 7
//! == current_day mod 7`) to bound per-day cost across a large county count.
//!
//! Population cohorts map to labor types one estate at a time: Laborers
//! supply unskilled labor, Artisans supply skilled labor. Merchants are
//! mobile traders the facility labor market never draws on.

use super::{TickContext, TickSystem};
use crate::economy::state::SimState;
use crate::economy::FacilityInstance;
use crate::map::MapData;
use crate::types::{CountyId, Estate, FacilityId, LaborType};

const SLICES: u64 = 7;
const DISTRESS_DAYS: u32 = 60;
const DISTRESS_RETENTION: f64 = 0.75;
const RECONSIDER_FRACTION: f64 = 0.15;
const RECONSIDER_WAGE_PREMIUM: f64 = 1.10;
const RECONSIDER_WAGE_FLOOR: f64 = 0.98;
const RECONSIDER_FILL_GAP: f64 = 0.35;

pub struct LaborAllocationSystem;

impl TickSystem for LaborAllocationSystem {
    fn name(&self) -> &'static str {
        "labor"
    }

    fn interval_days(&self) -> u32 {
        1
    }

    fn tick(&self, _ctx: &TickContext, state: &mut SimState, _map: &MapData) -> Result<(), String> {
        let slice = state.current_day % SLICES;
        let subsistence = state.subsistence_wage;
        let county_ids: Vec<CountyId> = state.county_ids_sorted().into_iter().filter(|c| c.0 as u64 % SLICES == slice).collect();

        for county_id in county_ids {
            for labor_type in [LaborType::Unskilled, LaborType::Skilled] {
                reallocate(state, county_id, labor_type, subsistence);
            }
            publish_totals(state, county_id);
        }
        Ok(())
    }
}

fn estate_for(labor_type: LaborType) -> Estate {
    match labor_type {
        LaborType::Unskilled => Estate::Laborers,
        LaborType::Skilled => Estate::Artisans,
    }
}

fn facility_labor_type(state: &SimState, facility: &FacilityInstance) -> Option<LaborType> {
    state.catalogs.facility_def(&facility.facility_def).map(|d| d.labor_type)
}

fn reallocate(state: &mut SimState, county_id: CountyId, labor_type: LaborType, subsistence: f64) {
    let facility_ids: Vec<FacilityId> = state
        .county(county_id)
        .facility_ids
        .iter()
        .copied()
        .filter(|id| {
            state
                .facilities
                .get(*id)
                .map(|f| f.active && facility_labor_type(state, f) == Some(labor_type))
                .unwrap_or(false)
        })
        .collect();
    if facility_ids.is_empty() {
        return;
    }

    // 1. Shrink distressed facilities first, releasing workers to the idle pool.
    let mut idle_released: u32 = 0;
    for &id in &facility_ids {
        let Some(f) = state.facilities.get_mut(id) else { continue };
        if f.wage_debt_days >= DISTRESS_DAYS {
            let target = (f.required_labor as f64 * DISTRESS_RETENTION).ceil() as u32;
            if f.assigned_workers > target {
                idle_released += f.assigned_workers - target;
                f.assigned_workers = target;
            }
        }
    }

    let estate = estate_for(labor_type);
    let cohort = state.county(county_id).population.cohort(estate);
    let employed = state.county(county_id).population.employed(labor_type);
    let assigned_now: u32 = facility_ids.iter().filter_map(|id| state.facilities.get(*id).map(|f| f.assigned_workers)).sum();
    let mut idle_pool = (cohort.saturating_sub(employed)) as u32 + idle_released;

    // 2. Deterministic sort: descending wage, ascending fill ratio, ascending
    // required_labor, ascending id.
    let mut ranked = facility_ids.clone();
    ranked.sort_by(|a, b| {
        let fa = state.facilities.get(*a).unwrap();
        let fb = state.facilities.get(*b).unwrap();
        fb.wage_rate
            .partial_cmp(&fa.wage_rate)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| fa.fill_ratio().partial_cmp(&fb.fill_ratio()).unwrap_or(std::cmp::Ordering::Equal))
            .then_with(|| fa.required_labor.cmp(&fb.required_labor))
            .then_with(|| id_order(*a, *b))
    });

    // 3. Reconsideration: pull workers off the worst-ranked facilities toward
    // a meaningfully better-ranked one with spare capacity.
    let reconsider_budget = (assigned_now as f64 * RECONSIDER_FRACTION).floor() as u32;
    let mut pulled = 0u32;
    for &worst_id in ranked.iter().rev() {
        if pulled >= reconsider_budget {
            break;
        }
        let (worst_wage, worst_fill) = {
            let w = state.facilities.get(worst_id).unwrap();
            (w.wage_rate, w.fill_ratio())
        };
        let better = ranked.iter().find(|&&cand_id| {
            if cand_id == worst_id {
                return false;
            }
            let c = state.facilities.get(cand_id).unwrap();
            let has_room = c.assigned_workers < c.required_labor;
            let wage_gain = c.wage_rate > worst_wage * RECONSIDER_WAGE_PREMIUM
                || (c.wage_rate >= worst_wage * RECONSIDER_WAGE_FLOOR && c.fill_ratio() + RECONSIDER_FILL_GAP < worst_fill);
            has_room && wage_gain
        }).copied();
        let Some(better_id) = better else { continue };
        let worst = state.facilities.get_mut(worst_id).unwrap();
        if worst.assigned_workers == 0 {
            continue;
        }
        worst.assigned_workers -= 1;
        let better = state.facilities.get_mut(better_id).unwrap();
        better.assigned_workers += 1;
        pulled += 1;
    }

    // 4. Fill vacancies in ranked order from the idle pool.
    for &id in &ranked {
        if idle_pool == 0 {
            break;
        }
        let f = state.facilities.get_mut(id).unwrap();
        if f.wage_rate < subsistence || f.wage_debt_days >= DISTRESS_DAYS {
            continue;
        }
        let vacancy = f.required_labor.saturating_sub(f.assigned_workers);
        let take = vacancy.min(idle_pool);
        f.assigned_workers += take;
        idle_pool -= take;
    }
}

fn id_order(a: FacilityId, b: FacilityId) -> std::cmp::Ordering {
    use slotmap::Key;
    a.data().as_ffi().cmp(&b.data().as_ffi())
}

fn publish_totals(state: &mut SimState, county_id: CountyId) {
    let facility_ids = state.county(county_id).facility_ids.clone();
    let mut unskilled = 0u64;
    let mut skilled = 0u64;
    for id in facility_ids {
        let Some(f) = state.facilities.get(id) else { continue };
        match facility_labor_type(state, f) {
            Some(LaborType::Unskilled) => unskilled += f.assigned_workers as u64,
            Some(LaborType::Skilled) => skilled += f.assigned_workers as u64,
            None => {}
        }
    }
    let county = state.county_mut(county_id);
    county.population.employed_unskilled = unskilled;
    county.population.employed_skilled = skilled;
}
