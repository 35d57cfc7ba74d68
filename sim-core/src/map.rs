//! Immutable map data: the output of the (out-of-scope) world generator and
//! the sole input to [`crate::bootstrap::build_economy`]. Nothing here is
//! ever mutated after it is handed to the engine.

use crate::types::{BiomeId, CellId, CountyId, CultureId, ProvinceId, RealmId, ReligionId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    pub center: (f64, f64),
    pub height: f64,
    pub is_land: bool,
    pub biome: BiomeId,
    pub neighbors: Vec<CellId>,
    pub river_id: Option<u32>,
    pub county: Option<CountyId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct County {
    pub id: CountyId,
    pub seat_cell: CellId,
    pub realm: RealmId,
    pub province: ProvinceId,
    pub culture: CultureId,
    pub religion: ReligionId,
    pub cell_count: u32,
    /// Seed population, if the generator supplied one; otherwise bootstrap
    /// falls back to a configured default.
    pub seed_population: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Province {
    pub id: ProvinceId,
    pub realm: RealmId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Realm {
    pub id: RealmId,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Biome {
    pub id: BiomeId,
    /// Movement cost multiplier; 1.0 is typical open ground.
    pub movement_cost: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapData {
    pub cells: Vec<Cell>,
    pub counties: Vec<County>,
    pub provinces: Vec<Province>,
    pub realms: Vec<Realm>,
    pub biomes: HashMap<BiomeId, Biome>,
    /// Elevation above which a cell's per-cell movement cost is penalized
    /// steeply, and above which the cell becomes impassable outright once
    /// the penalty pushes cost above the graph's impassable threshold.
    pub steep_elevation_threshold: f64,
    /// Average spacing between adjacent cell centers, used to normalize
    /// Euclidean distance into edge-cost units.
    pub typical_cell_spacing: f64,
}

impl MapData {
    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(id.index())
    }

    pub fn county(&self, id: CountyId) -> Option<&County> {
        self.counties.get(id.index())
    }

    pub fn biome_movement_cost(&self, id: BiomeId) -> f64 {
        self.biomes.get(&id).map(|b| b.movement_cost).unwrap_or(1.0)
    }
}
