//! Shared fixture builders for the integration tests in this directory.
//! Builds go through the same public `MapData`/`Catalogs` surface an
//! embedder would use — no private test-only backdoor into bootstrap.

use std::collections::HashMap;

use sim_core::{
    Biome, BiomeId, Catalogs, Cell, CellId, County, CountyId, CultureId, Estate, FacilityDef,
    FacilityKind, GoodCatalog, GoodCatalogEntry, GoodId, LaborType, MapData, NeedCategory,
    ProvinceId, RealmId, ReligionId,
};

pub fn flat_biome() -> (BiomeId, Biome) {
    let id = BiomeId::new(0);
    (id, Biome { id, movement_cost: 1.0 })
}

fn cell(id: u32, x: f64, y: f64, neighbors: Vec<u32>) -> Cell {
    Cell {
        id: CellId::new(id),
        center: (x, y),
        height: 0.0,
        is_land: true,
        biome: BiomeId::new(0),
        neighbors: neighbors.into_iter().map(CellId::new).collect(),
        river_id: None,
        county: Some(CountyId::new(id)),
    }
}

fn county(id: u32, seat_cell: u32, seed_population: u32) -> County {
    County {
        id: CountyId::new(id),
        seat_cell: CellId::new(seat_cell),
        realm: RealmId::new(0),
        province: ProvinceId::new(0),
        culture: CultureId::new(0),
        religion: ReligionId::new(0),
        cell_count: 1,
        seed_population: Some(seed_population),
    }
}

/// A single county occupying a single cell.
pub fn single_county_map(seed_population: u32) -> MapData {
    let (biome_id, biome) = flat_biome();
    let mut map = MapData {
        typical_cell_spacing: 1.0,
        steep_elevation_threshold: 1_000.0,
        ..Default::default()
    };
    map.biomes.insert(biome_id, biome);
    map.cells = vec![cell(0, 0.0, 0.0, vec![])];
    map.counties = vec![county(0, 0, seed_population)];
    map
}

/// Two counties, one cell each, connected by a single edge. With a flat
/// biome (movement cost 1.0) and unit cell spacing, the edge's transport
/// cost equals the straight-line distance between the two seats, so callers
/// pick `target_cost` directly as that distance.
pub fn two_county_map(seed_population_a: u32, seed_population_b: u32, target_cost: f64) -> MapData {
    let (biome_id, biome) = flat_biome();
    let mut map = MapData {
        typical_cell_spacing: 1.0,
        steep_elevation_threshold: 1_000.0,
        ..Default::default()
    };
    map.biomes.insert(biome_id, biome);
    map.cells = vec![cell(0, 0.0, 0.0, vec![1]), cell(1, target_cost, 0.0, vec![0])];
    map.counties = vec![county(0, 0, seed_population_a), county(1, 1, seed_population_b)];
    map
}

fn good(string_id: &str, base_price: f64, need: Option<NeedCategory>, per_capita: f64, decay: f64, theft_risk: f64, finished: bool, bom: Vec<(&str, f64)>, catalog_so_far: &HashMap<&str, GoodId>) -> GoodCatalogEntry {
    GoodCatalogEntry {
        string_id: string_id.to_string(),
        id: GoodId(0),
        base_price,
        need_category: need,
        base_per_capita_consumption: per_capita,
        decay_rate: decay,
        theft_risk,
        finished,
        input_bom: bom.into_iter().map(|(id, qty)| (*catalog_so_far.get(id).expect("input good must be declared first"), qty)).collect(),
    }
}

/// One extraction facility producing "wheat", consumed as a Basic good.
pub fn wheat_only_catalogs(throughput: f64, required_labor: u32) -> (Catalogs, GoodId) {
    let goods = GoodCatalog::build(vec![good("wheat", 5.0, Some(NeedCategory::Basic), 0.05, 0.02, 0.0, true, vec![], &HashMap::new())]);
    let wheat = goods.lookup("wheat").unwrap();
    let mut facilities = HashMap::new();
    facilities.insert(
        "wheat_farm".to_string(),
        FacilityDef {
            string_id: "wheat_farm".to_string(),
            kind: FacilityKind::Extraction,
            labor_type: LaborType::Unskilled,
            required_labor,
            base_throughput: throughput,
            output_good: wheat,
            input_overrides: None,
        },
    );
    (Catalogs { goods, facilities }, wheat)
}

/// Wheat (a non-consumer extraction input) plus bread (a Basic good made
/// from two units of wheat per unit of bread).
pub fn wheat_bread_catalogs(wheat_throughput: f64, wheat_labor: u32, bread_throughput: f64, bread_labor: u32) -> (Catalogs, GoodId, GoodId) {
    let mut by_name = HashMap::new();
    let wheat_entry = good("wheat", 2.0, None, 0.0, 0.01, 0.0, false, vec![], &by_name);
    let wheat_catalog_preview = GoodCatalog::build(vec![wheat_entry.clone()]);
    by_name.insert("wheat", wheat_catalog_preview.lookup("wheat").unwrap());
    let bread_entry = good("bread", 10.0, Some(NeedCategory::Basic), 0.01, 0.02, 0.0, true, vec![("wheat", 2.0)], &by_name);

    let goods = GoodCatalog::build(vec![wheat_entry, bread_entry]);
    let wheat = goods.lookup("wheat").unwrap();
    let bread = goods.lookup("bread").unwrap();

    let mut facilities = HashMap::new();
    facilities.insert(
        "wheat_farm".to_string(),
        FacilityDef {
            string_id: "wheat_farm".to_string(),
            kind: FacilityKind::Extraction,
            labor_type: LaborType::Unskilled,
            required_labor: wheat_labor,
            base_throughput: wheat_throughput,
            output_good: wheat,
            input_overrides: None,
        },
    );
    facilities.insert(
        "bakery".to_string(),
        FacilityDef {
            string_id: "bakery".to_string(),
            kind: FacilityKind::Processing,
            labor_type: LaborType::Unskilled,
            required_labor: bread_labor,
            base_throughput: bread_throughput,
            output_good: bread,
            input_overrides: None,
        },
    );
    (Catalogs { goods, facilities }, wheat, bread)
}

pub const ALL_ESTATES: [Estate; 3] = [Estate::Laborers, Estate::Artisans, Estate::Merchants];

/// A chain of `n` cells at unit spacing along the x axis, `0 - 1 - 2 - ... `,
/// with no county association — for transport-graph-only fixtures that have
/// no need of the economy layer above them.
pub fn line_map(n: u32) -> MapData {
    let (biome_id, biome) = flat_biome();
    let mut map = MapData {
        typical_cell_spacing: 1.0,
        steep_elevation_threshold: 1_000.0,
        ..Default::default()
    };
    map.biomes.insert(biome_id, biome);
    map.cells = (0..n)
        .map(|i| {
            let mut neighbors = Vec::new();
            if i > 0 {
                neighbors.push(CellId::new(i - 1));
            }
            if i + 1 < n {
                neighbors.push(CellId::new(i + 1));
            }
            Cell {
                id: CellId::new(i),
                center: (i as f64, 0.0),
                height: 0.0,
                is_land: true,
                biome: BiomeId::new(0),
                neighbors,
                river_id: None,
                county: None,
            }
        })
        .collect();
    map
}
