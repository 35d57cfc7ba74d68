//! Persisted state: a serializable snapshot of everything a reload needs to
//! resume a run bit-for-bit except for transport cache contents, which are
//! rebuilt lazily on first use after load. Forward-compatible per field via
//! `#[serde(default)]`.

use crate::economy::{Catalogs, CountyEconomy, FacilityInstance, Market};
use crate::economy::state::SimState;
use crate::error::EngineError;
use crate::telemetry::TelemetrySnapshot;
use crate::transport::{RoadState, TransportGraph};
use crate::types::{CountyId, FacilityId, MarketId};
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use std::collections::HashMap;

#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotV1 {
    pub current_day: u64,
    #[serde(default)]
    pub paused: bool,
    #[serde(default = "default_time_scale")]
    pub time_scale: f64,
    #[serde(default)]
    pub smoothed_basket_cost: f64,
    #[serde(default)]
    pub subsistence_wage: f64,
    pub counties: Vec<CountyEconomy>,
    pub county_to_market: HashMap<CountyId, MarketId>,
    pub facilities: SlotMap<FacilityId, FacilityInstance>,
    pub markets: SlotMap<MarketId, Market>,
    #[serde(default)]
    pub black_market: Option<MarketId>,
    #[serde(default)]
    pub off_map_markets: Vec<MarketId>,
    #[serde(default)]
    pub telemetry: TelemetrySnapshot,
}

fn default_time_scale() -> f64 {
    1.0
}

pub fn save(state: &SimState) -> Result<String, EngineError> {
    let snapshot = SnapshotV1 {
        current_day: state.current_day,
        paused: state.paused,
        time_scale: state.time_scale,
        smoothed_basket_cost: state.smoothed_basket_cost,
        subsistence_wage: state.subsistence_wage,
        counties: state.counties.clone(),
        county_to_market: state.county_to_market.clone(),
        facilities: state.facilities.clone(),
        markets: state.markets.clone(),
        black_market: state.black_market,
        off_map_markets: state.off_map_markets.clone(),
        telemetry: state.telemetry.clone(),
    };
    serde_json::to_string(&snapshot).map_err(|e| EngineError::PersistenceLoad { reason: e.to_string() })
}

/// Rehydrates a snapshot against the caller's config and catalogs — those
/// are bootstrap-time content, not part of the persisted state, so a reload
/// always uses whatever catalogs the embedder currently has loaded.
pub fn load(json: &str, catalogs: Catalogs) -> Result<SimState, EngineError> {
    let snapshot: SnapshotV1 = serde_json::from_str(json).map_err(|e| EngineError::PersistenceLoad { reason: e.to_string() })?;

    Ok(SimState {
        current_day: snapshot.current_day,
        paused: snapshot.paused,
        time_scale: snapshot.time_scale,
        smoothed_basket_cost: snapshot.smoothed_basket_cost,
        subsistence_wage: snapshot.subsistence_wage,
        config: crate::config::SimConfig::default(),
        catalogs,
        counties: snapshot.counties,
        county_to_market: snapshot.county_to_market,
        facilities: snapshot.facilities,
        markets: snapshot.markets,
        black_market: snapshot.black_market,
        off_map_markets: snapshot.off_map_markets,
        transport: TransportGraph::new(4096, RoadState::default()),
        telemetry: snapshot.telemetry,
        pending_traffic: HashMap::new(),
    })
}
