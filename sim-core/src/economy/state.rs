//! `SimState`: the single owner of economy, transport, and telemetry state.
//! Facilities, counties, and markets cross-reference each other by id only
//! — there are no owning references between simulation entities, which is
//! what keeps county/market/facility free of reference cycles.

use super::{Catalogs, CountyEconomy, FacilityInstance, Market};
use crate::config::SimConfig;
use crate::telemetry::TelemetrySnapshot;
use crate::transport::TransportGraph;
use crate::types::{CountyId, FacilityId, MarketId};
use slotmap::SlotMap;
use std::collections::HashMap;

pub struct SimState {
    pub current_day: u64,
    pub paused: bool,
    pub time_scale: f64,
    pub smoothed_basket_cost: f64,
    pub subsistence_wage: f64,
    pub config: SimConfig,
    pub catalogs: Catalogs,

    pub counties: Vec<CountyEconomy>,
    pub county_to_market: HashMap<CountyId, MarketId>,
    pub facilities: SlotMap<FacilityId, FacilityInstance>,
    pub markets: SlotMap<MarketId, Market>,
    pub black_market: Option<MarketId>,
    pub off_map_markets: Vec<MarketId>,

    pub transport: TransportGraph,
    pub telemetry: TelemetrySnapshot,

    /// Pending per-edge traffic accumulated daily by the production/order
    /// systems, committed to road tiers monthly.
    pub pending_traffic: HashMap<(crate::types::CellId, crate::types::CellId), f64>,
}

impl SimState {
    pub fn county(&self, id: CountyId) -> &CountyEconomy {
        &self.counties[id.index()]
    }

    pub fn county_mut(&mut self, id: CountyId) -> &mut CountyEconomy {
        &mut self.counties[id.index()]
    }

    pub fn market_for_county(&self, county: CountyId) -> Option<MarketId> {
        self.county_to_market.get(&county).copied()
    }

    /// Every facility id in ascending slot order for the iteration order
    /// the determinism rules require. Slot keys aren't naturally ordered,
    /// so we sort by the ffi-encoded value, which is stable across a run.
    pub fn facility_ids_sorted(&self) -> Vec<FacilityId> {
        let mut ids: Vec<FacilityId> = self.facilities.keys().collect();
        ids.sort_by_key(|id| {
            use slotmap::Key;
            id.data().as_ffi()
        });
        ids
    }

    pub fn market_ids_sorted(&self) -> Vec<MarketId> {
        let mut ids: Vec<MarketId> = self.markets.keys().collect();
        ids.sort_by_key(|id| {
            use slotmap::Key;
            id.data().as_ffi()
        });
        ids
    }

    pub fn county_ids_sorted(&self) -> Vec<CountyId> {
        let mut ids: Vec<CountyId> = (0..self.counties.len() as u32).map(CountyId::new).collect();
        ids.sort_by_key(|id| id.0);
        ids
    }
}
