//! Embedder-supplied configuration. Nothing in here is loaded from a file by
//! core code (out of scope per the purpose statement) — `SimConfig` derives
//! `serde` so an embedder can deserialize it from whatever format it likes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intervals {
    pub daily: u32,
    pub weekly: u32,
    pub monthly: u32,
}

impl Default for Intervals {
    fn default() -> Self {
        Self {
            daily: 1,
            weekly: 7,
            monthly: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speed {
    Slow,
    Normal,
    Fast,
    Ultra,
    Hyper,
}

impl Speed {
    /// Simulated days advanced per wall-clock second at this speed.
    pub fn time_scale(self) -> f64 {
        match self {
            Speed::Slow => 0.25,
            Speed::Normal => 1.0,
            Speed::Fast => 4.0,
            Speed::Ultra => 16.0,
            Speed::Hyper => 64.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub intervals: Intervals,
    pub speed: Speed,
    pub subsistence_floor: f64,
    /// Maximum cost a transport path may have before it's treated as
    /// unreachable for inter-market/off-map diversion purposes.
    pub transport_cache_max_cost: f64,
    pub path_cache_capacity: usize,
    pub log_ring_capacity: usize,
    /// Reserved for a future stochastic subsystem; unused by any shipped
    /// tick system today (the core tick loop is fully deterministic).
    pub rng_seed: Option<u64>,
    /// Upper bound on days processed within a single `advance()` call, the
    /// anti spiral-of-death guard from the scheduler design.
    pub max_days_per_advance: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            intervals: Intervals::default(),
            speed: Speed::Normal,
            subsistence_floor: 1.0,
            transport_cache_max_cost: 10_000.0,
            path_cache_capacity: 4096,
            log_ring_capacity: 4096,
            rng_seed: None,
            max_days_per_advance: 365,
        }
    }
}
