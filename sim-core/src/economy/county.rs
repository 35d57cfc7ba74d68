//! County-level population and stockpile state.

use crate::types::{Estate, FacilityId, GoodId, LaborType, Money, Quantity};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PopulationBlock {
    /// Headcount per mobile estate. Laborers/Artisans/Merchants sum to the
    /// county's working-age population; this block does not model children
    /// or the elderly separately — the distilled spec treats population as
    /// a single working-age figure per need-consumption purposes.
    pub cohorts: HashMap<Estate, u64>,
    pub employed_unskilled: u64,
    pub employed_skilled: u64,
    pub treasury: Money,
}

impl PopulationBlock {
    pub fn total(&self) -> u64 {
        self.cohorts.values().sum()
    }

    pub fn cohort(&self, estate: Estate) -> u64 {
        self.cohorts.get(&estate).copied().unwrap_or(0)
    }

    /// Treasury never goes negative at the point another system reads it;
    /// transient float-error negatives are clamped here rather than at the
    /// write site, per the numeric-underflow error taxonomy.
    pub fn treasury(&self) -> Money {
        self.treasury.max(0.0)
    }

    pub fn employed(&self, labor_type: LaborType) -> u64 {
        match labor_type {
            LaborType::Unskilled => self.employed_unskilled,
            LaborType::Skilled => self.employed_skilled,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CountyEconomy {
    pub stockpile: HashMap<GoodId, Quantity>,
    /// Local abundance multiplier for the good an extraction facility of
    /// the matching type would produce.
    pub resource_abundance: HashMap<GoodId, f64>,
    pub unmet_demand: HashMap<GoodId, Quantity>,
    pub population: PopulationBlock,
    pub facility_ids: Vec<FacilityId>,
}

impl CountyEconomy {
    pub fn stockpile_of(&self, good: GoodId) -> Quantity {
        self.stockpile.get(&good).copied().unwrap_or(0.0).max(0.0)
    }

    pub fn add_stock(&mut self, good: GoodId, qty: Quantity) {
        *self.stockpile.entry(good).or_insert(0.0) += qty;
    }

    /// Removes up to `qty`, returning the amount actually removed. Never
    /// drives the stockpile negative.
    pub fn remove_stock(&mut self, good: GoodId, qty: Quantity) -> Quantity {
        let entry = self.stockpile.entry(good).or_insert(0.0);
        let removed = qty.min(*entry).max(0.0);
        *entry -= removed;
        removed
    }

    pub fn record_unmet(&mut self, good: GoodId, shortfall: Quantity) {
        if shortfall > 0.0 {
            *self.unmet_demand.entry(good).or_insert(0.0) += shortfall;
        }
    }
}
