//! Bootstrap-time content: the goods catalog plus the table of facility
//! definitions keyed by their stable string id.

use crate::types::{FacilityDef, GoodCatalog};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalogs {
    pub goods: GoodCatalog,
    pub facilities: HashMap<String, FacilityDef>,
}

impl Catalogs {
    pub fn facility_def(&self, string_id: &str) -> Option<&FacilityDef> {
        self.facilities.get(string_id)
    }
}
