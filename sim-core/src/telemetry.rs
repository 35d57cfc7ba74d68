//! Telemetry snapshot type. Populated by the telemetry tick system at the
//! end of each day and exposed to observers as a read-only copy, never a
//! live reference into simulation state.

use crate::types::{GoodId, Money};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoodTelemetry {
    pub avg_price: f64,
    pub total_supply: f64,
    pub total_demand: f64,
    pub total_trade_volume: f64,
    pub unmet_demand: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub day: u64,
    pub total_pop_treasury: Money,
    pub total_facility_treasury: Money,
    pub total_money_supply: Money,
    pub money_velocity: f64,
    pub active_facilities: u32,
    pub idle_facilities: u32,
    pub distressed_facilities: u32,
    pub per_good: HashMap<GoodId, GoodTelemetry>,
}
