//! Stable identifiers and small value types shared across the engine.
//!
//! Instance ids that are created and destroyed during a run (facilities,
//! markets) use `slotmap` generational keys so a stale id can never alias a
//! reused slot, matching the generational-index pattern the rest of the
//! corpus uses for its own instance ids. Map-derived ids (cells, counties,
//! provinces, realms, cultures, religions) are dense and immutable for the
//! lifetime of a run, so plain `u32` newtypes are enough for them.

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use std::collections::HashMap;

new_key_type! {
    pub struct FacilityId;
    pub struct MarketId;
}

macro_rules! dense_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            pub fn new(raw: u32) -> Self {
                Self(raw)
            }

            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

dense_id!(CellId);
dense_id!(CountyId);
dense_id!(ProvinceId);
dense_id!(RealmId);
dense_id!(CultureId);
dense_id!(ReligionId);
dense_id!(BiomeId);

pub type Price = f64;
pub type Quantity = f64;
pub type Money = f64;

/// Dense, bootstrap-assigned index for a good. Hot loops index arrays by
/// this value; ingestion and persistence use the catalog's stable string id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GoodId(pub u16);

impl GoodId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NeedCategory {
    Basic,
    Comfort,
    Luxury,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LaborType {
    Unskilled,
    Skilled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketKind {
    Legitimate,
    OffMap,
    Black,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Estate {
    Laborers,
    Artisans,
    Merchants,
}

impl Estate {
    pub fn mobility(self) -> f64 {
        match self {
            Estate::Laborers => 0.40,
            Estate::Artisans => 0.20,
            Estate::Merchants => 0.10,
        }
    }

    pub fn all() -> [Estate; 3] {
        [Estate::Laborers, Estate::Artisans, Estate::Merchants]
    }
}

/// One entry in the goods catalog: one per stable string id, assigned a
/// dense `GoodId` once at bootstrap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoodCatalogEntry {
    pub string_id: String,
    #[serde(default)]
    pub id: GoodId,
    pub base_price: Price,
    pub need_category: Option<NeedCategory>,
    pub base_per_capita_consumption: f64,
    pub decay_rate: f64,
    pub theft_risk: f64,
    pub finished: bool,
    /// Input bill-of-materials: (input good, quantity per unit of output).
    #[serde(default)]
    pub input_bom: Vec<(GoodId, f64)>,
}

impl Default for GoodId {
    fn default() -> Self {
        GoodId(0)
    }
}

/// Bijection between stable string ids and dense runtime indices, built
/// once at bootstrap and never mutated afterward.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoodCatalog {
    entries: Vec<GoodCatalogEntry>,
    by_string_id: HashMap<String, GoodId>,
}

impl GoodCatalog {
    /// Builds the bijection. Entries are sorted by string id first so the
    /// dense index assignment is a deterministic function of the catalog
    /// content, not of iteration order.
    pub fn build(mut entries: Vec<GoodCatalogEntry>) -> Self {
        entries.sort_by(|a, b| a.string_id.cmp(&b.string_id));
        let mut by_string_id = HashMap::with_capacity(entries.len());
        for (idx, entry) in entries.iter_mut().enumerate() {
            entry.id = GoodId(idx as u16);
            by_string_id.insert(entry.string_id.clone(), entry.id);
        }
        Self { entries, by_string_id }
    }

    pub fn get(&self, id: GoodId) -> &GoodCatalogEntry {
        &self.entries[id.index()]
    }

    pub fn lookup(&self, string_id: &str) -> Option<GoodId> {
        self.by_string_id.get(string_id).copied()
    }

    pub fn ids(&self) -> impl Iterator<Item = GoodId> + '_ {
        self.entries.iter().map(|e| e.id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FacilityKind {
    Extraction,
    Processing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityDef {
    pub string_id: String,
    pub kind: FacilityKind,
    pub labor_type: LaborType,
    pub required_labor: u32,
    pub base_throughput: f64,
    pub output_good: GoodId,
    /// Overrides the output good's catalog BOM when present.
    pub input_overrides: Option<Vec<(GoodId, f64)>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str) -> GoodCatalogEntry {
        GoodCatalogEntry {
            string_id: id.to_string(),
            id: GoodId(0),
            base_price: 1.0,
            need_category: None,
            base_per_capita_consumption: 0.0,
            decay_rate: 0.0,
            theft_risk: 0.0,
            finished: false,
            input_bom: Vec::new(),
        }
    }

    #[test]
    fn catalog_bijection_is_stable_and_dense() {
        let catalog = GoodCatalog::build(vec![entry("wheat"), entry("bread"), entry("tools")]);
        assert_eq!(catalog.len(), 3);
        for (idx, good) in catalog.ids().enumerate() {
            assert_eq!(good.index(), idx);
        }
        let bread = catalog.lookup("bread").unwrap();
        assert_eq!(catalog.get(bread).string_id, "bread");
    }
}
