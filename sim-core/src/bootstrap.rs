//! Builds the initial [`SimState`] from immutable map data and content
//! catalogs. The only fallible entry point in the engine — everything after
//! bootstrap runs inside the tick loop, which never returns `Result` to the
//! embedder (see the error taxonomy in `crate::error`).

use crate::config::SimConfig;
use crate::economy::{Catalogs, CountyEconomy, FacilityInstance, Market};
use crate::error::EngineError;
use crate::economy::state::SimState;
use crate::map::MapData;
use crate::telemetry::TelemetrySnapshot;
use crate::transport::{RoadState, TransportGraph};
use crate::types::{CountyId, Estate, FacilityKind, MarketKind};
use slotmap::SlotMap;
use std::collections::HashMap;

const DEFAULT_SEED_POPULATION: u32 = 500;

pub fn build_economy(map: &MapData, catalogs: &Catalogs, config: &SimConfig) -> Result<SimState, EngineError> {
    if map.counties.is_empty() {
        return Err(EngineError::Bootstrap { reason: "map has no counties".to_string() });
    }

    let mut transport = TransportGraph::new(config.path_cache_capacity, RoadState::default());

    // 2. One CountyEconomy per County, seeded from the map or the default.
    let mut counties: Vec<CountyEconomy> = Vec::with_capacity(map.counties.len());
    for county in &map.counties {
        if map.cell(county.seat_cell).is_none() {
            return Err(EngineError::Bootstrap {
                reason: format!("county {} has no seat cell", county.id.0),
            });
        }
        let seed_population = county.seed_population.unwrap_or(DEFAULT_SEED_POPULATION) as u64;
        let mut economy = CountyEconomy::default();
        let per_estate = seed_population / Estate::all().len() as u64;
        for estate in Estate::all() {
            economy.population.cohorts.insert(estate, per_estate);
        }
        counties.push(economy);
    }

    // 3. One legitimate market per county; precompute its zone cost map.
    let mut markets: SlotMap<crate::types::MarketId, Market> = SlotMap::with_key();
    let mut county_to_market = HashMap::new();
    for county in &map.counties {
        let mut market = Market::new(MarketKind::Legitimate, county.seat_cell);
        let cost = transport.get_transport_cost(map, county.seat_cell, county.seat_cell);
        market.zone_costs.insert(county.id, cost);
        let market_id = markets.insert(market);
        county_to_market.insert(county.id, market_id);
    }

    // 4. Seed one instance of every facility definition into every county.
    // The map format carries no separate resource layer (see DESIGN.md), so
    // extraction facilities get abundance 1.0 for their output good rather
    // than a per-county resource placement; processing facilities need no
    // abundance entry since their output comes from purchased inputs, not
    // local extraction. All instances start inactive.
    let mut facilities: SlotMap<crate::types::FacilityId, FacilityInstance> = SlotMap::with_key();
    for county in &map.counties {
        let market_id = *county_to_market.get(&county.id).expect("assigned above");
        for def in catalogs.facilities.values() {
            if def.kind == FacilityKind::Extraction {
                counties[county.id.index()].resource_abundance.insert(def.output_good, 1.0);
            }
            let id = facilities.insert(FacilityInstance::new(def.string_id.clone(), county.id, market_id, def.required_labor));
            counties[county.id.index()].facility_ids.push(id);
        }
    }

    // 5. Road state is already installed (step above); off-map and black
    // markets are singletons with no zone costs of their own.
    let off_map_hub = map.counties[0].seat_cell;
    let off_map_id = markets.insert(Market::new(MarketKind::OffMap, off_map_hub));
    let black_hub = map.counties[0].seat_cell;
    let black_id = markets.insert(Market::new(MarketKind::Black, black_hub));

    let state = SimState {
        current_day: 0,
        paused: false,
        time_scale: config.speed.time_scale(),
        smoothed_basket_cost: 0.0,
        subsistence_wage: 0.0,
        config: config.clone(),
        catalogs: catalogs.clone(),
        counties,
        county_to_market,
        facilities,
        markets,
        black_market: Some(black_id),
        off_map_markets: vec![off_map_id],
        transport,
        telemetry: TelemetrySnapshot::default(),
        pending_traffic: HashMap::new(),
    };

    Ok(state)
}

/// Minimal fixtures for unit tests elsewhere in the crate that need a
/// syntactically valid [`SimState`] without a full map. Not used by
/// `build_economy` itself.
#[cfg(test)]
pub mod test_support {
    use super::*;
    use crate::config::SimConfig;
    use crate::map::{Biome, Cell, County, MapData};
    use crate::types::{BiomeId, CellId, CultureId, GoodCatalog, GoodCatalogEntry, ProvinceId, RealmId, ReligionId};

    pub fn tiny_map() -> MapData {
        let mut map = MapData {
            typical_cell_spacing: 1.0,
            steep_elevation_threshold: 100.0,
            ..Default::default()
        };
        map.biomes.insert(BiomeId::new(0), Biome { id: BiomeId::new(0), movement_cost: 1.0 });
        map.cells = vec![Cell {
            id: CellId::new(0),
            center: (0.0, 0.0),
            height: 0.0,
            is_land: true,
            biome: BiomeId::new(0),
            neighbors: vec![],
            river_id: None,
            county: Some(CountyId::new(0)),
        }];
        map.counties = vec![County {
            id: CountyId::new(0),
            seat_cell: CellId::new(0),
            realm: RealmId::new(0),
            province: ProvinceId::new(0),
            culture: CultureId::new(0),
            religion: ReligionId::new(0),
            cell_count: 1,
            seed_population: Some(100),
        }];
        map
    }

    pub fn tiny_catalogs() -> Catalogs {
        let goods = GoodCatalog::build(vec![GoodCatalogEntry {
            string_id: "bread".to_string(),
            id: crate::types::GoodId(0),
            base_price: 10.0,
            need_category: Some(crate::types::NeedCategory::Basic),
            base_per_capita_consumption: 0.1,
            decay_rate: 0.01,
            theft_risk: 0.0,
            finished: true,
            input_bom: Vec::new(),
        }]);
        Catalogs { goods, facilities: HashMap::new() }
    }

    pub fn empty_state() -> SimState {
        let map = tiny_map();
        let catalogs = tiny_catalogs();
        let config = SimConfig::default();
        build_economy(&map, &catalogs, &config).expect("fixture bootstrap must succeed")
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn bootstrap_rejects_a_map_with_no_counties() {
        let map = MapData::default();
        let catalogs = tiny_catalogs();
        let config = SimConfig::default();
        assert!(build_economy(&map, &catalogs, &config).is_err());
    }

    #[test]
    fn bootstrap_assigns_every_county_a_market() {
        let state = empty_state();
        assert_eq!(state.county_to_market.len(), 1);
        assert_eq!(state.market_ids_sorted().len(), 3); // legitimate + off-map + black
    }
}
