//! Facility instances: mutable production state keyed by a generational
//! [`FacilityId`]. Definitions ([`crate::types::FacilityDef`]) are immutable
//! content; this type is the per-instance state the tick systems mutate.

use crate::types::{CountyId, GoodId, MarketId, Money, Quantity};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const RING_SLOTS: usize = 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollingMetric {
    slots: [f64; RING_SLOTS],
    cursor: usize,
    filled: usize,
}

impl Default for RollingMetric {
    fn default() -> Self {
        Self {
            slots: [0.0; RING_SLOTS],
            cursor: 0,
            filled: 0,
        }
    }
}

impl RollingMetric {
    pub fn push(&mut self, value: f64) {
        self.slots[self.cursor] = value;
        self.cursor = (self.cursor + 1) % RING_SLOTS;
        self.filled = (self.filled + 1).min(RING_SLOTS);
    }

    pub fn average(&self) -> f64 {
        if self.filled == 0 {
            return 0.0;
        }
        self.slots.iter().take(self.filled).sum::<f64>() / self.filled as f64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityInstance {
    pub facility_def: String,
    pub resident_county: CountyId,
    pub assigned_market: MarketId,
    pub active: bool,
    pub assigned_workers: u32,
    pub required_labor: u32,
    pub treasury: Money,
    pub wage_rate: f64,
    pub wage_debt_days: u32,
    pub revenue_ema: f64,
    pub input_cost_ema: f64,
    pub profit_ema: f64,
    pub grace_days_remaining: u32,
    pub consecutive_loss_days: u32,
    pub revenue_ring: RollingMetric,
    pub wage_bill_ring: RollingMetric,
    pub input_cost_ring: RollingMetric,
    pub input_buffer: HashMap<GoodId, Quantity>,
    pub output_buffer: HashMap<GoodId, Quantity>,
}

impl FacilityInstance {
    pub fn new(facility_def: String, resident_county: CountyId, assigned_market: MarketId, required_labor: u32) -> Self {
        Self {
            facility_def,
            resident_county,
            assigned_market,
            active: false,
            assigned_workers: 0,
            required_labor,
            treasury: 0.0,
            wage_rate: 0.0,
            wage_debt_days: 0,
            revenue_ema: 0.0,
            input_cost_ema: 0.0,
            profit_ema: 0.0,
            grace_days_remaining: 0,
            consecutive_loss_days: 0,
            revenue_ring: RollingMetric::default(),
            wage_bill_ring: RollingMetric::default(),
            input_cost_ring: RollingMetric::default(),
            input_buffer: HashMap::new(),
            output_buffer: HashMap::new(),
        }
    }

    /// Clamped at read, per the numeric-underflow taxonomy: the wage system
    /// may debit this below zero within a step, but nothing downstream ever
    /// observes a negative treasury.
    pub fn treasury(&self) -> Money {
        self.treasury.max(0.0)
    }

    pub fn fill_ratio(&self) -> f64 {
        if self.required_labor == 0 {
            0.0
        } else {
            self.assigned_workers as f64 / self.required_labor as f64
        }
    }

    pub fn input_qty(&self, good: GoodId) -> Quantity {
        self.input_buffer.get(&good).copied().unwrap_or(0.0)
    }

    pub fn output_qty(&self, good: GoodId) -> Quantity {
        self.output_buffer.get(&good).copied().unwrap_or(0.0)
    }

    pub fn add_input(&mut self, good: GoodId, qty: Quantity) {
        *self.input_buffer.entry(good).or_insert(0.0) += qty;
    }

    pub fn consume_input(&mut self, good: GoodId, qty: Quantity) -> Quantity {
        let entry = self.input_buffer.entry(good).or_insert(0.0);
        let used = qty.min(*entry).max(0.0);
        *entry -= used;
        used
    }

    pub fn add_output(&mut self, good: GoodId, qty: Quantity) {
        *self.output_buffer.entry(good).or_insert(0.0) += qty;
    }

    pub fn take_output(&mut self, good: GoodId, qty: Quantity) -> Quantity {
        let entry = self.output_buffer.entry(good).or_insert(0.0);
        let taken = qty.min(*entry).max(0.0);
        *entry -= taken;
        taken
    }
}
