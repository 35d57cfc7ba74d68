//! The embedding contract: a host drives the simulation by calling
//! `advance`, reads state through `state()`, and observes the domain log
//! through `register_log_sink`. This module is plain Rust; the
//! `#[wasm_bindgen]` surface in [`crate::wasm`] is a thin wrapper around it.

use crate::bootstrap;
use crate::economy::state::SimState;
use crate::economy::Catalogs;
use crate::error::EngineError;
use crate::log::{LogBus, LogSink};
use crate::map::MapData;
use crate::systems::clearing::MarketClearingSystem;
use crate::systems::consumption::ConsumptionSystem;
use crate::systems::labor::LaborAllocationSystem;
use crate::systems::migration::MigrationSystem;
use crate::systems::orders::PostOrdersSystem;
use crate::systems::prices::PriceAdjustmentSystem;
use crate::systems::production::ProductionSystem;
use crate::systems::roads::RoadDevelopmentSystem;
use crate::systems::telemetry::TelemetrySystem;
use crate::systems::theft::TheftSystem;
use crate::systems::trade::{InterMarketTradeSystem, OffMapSupplySystem};
use crate::systems::wages::WagesSystem;
use crate::systems::{Scheduler, TickContext};
use crate::telemetry::TelemetrySnapshot;

/// Read-only view over the pieces of [`SimState`] the embedding contract
/// exposes, so host shells never get a live mutable reference into the
/// engine's internals.
pub struct StateView<'a> {
    pub current_day: u64,
    pub paused: bool,
    pub telemetry: &'a TelemetrySnapshot,
}

pub struct Simulation {
    state: SimState,
    map: MapData,
    scheduler: Scheduler,
    log: LogBus,
    day_budget: f64,
}

impl Simulation {
    /// Builds the scheduler in the §2 data-flow order — that registration
    /// order is itself the contract, not an implementation detail.
    fn build_scheduler() -> Result<Scheduler, EngineError> {
        let mut scheduler = Scheduler::new();
        scheduler.register(Box::new(PostOrdersSystem))?;
        scheduler.register(Box::new(MarketClearingSystem))?;
        scheduler.register(Box::new(PriceAdjustmentSystem))?;
        scheduler.register(Box::new(LaborAllocationSystem))?;
        scheduler.register(Box::new(ProductionSystem))?;
        scheduler.register(Box::new(WagesSystem))?;
        scheduler.register(Box::new(TheftSystem))?;
        scheduler.register(Box::new(InterMarketTradeSystem))?;
        scheduler.register(Box::new(ConsumptionSystem))?;
        scheduler.register(Box::new(MigrationSystem))?;
        scheduler.register(Box::new(RoadDevelopmentSystem))?;
        scheduler.register(Box::new(OffMapSupplySystem))?;
        scheduler.register(Box::new(TelemetrySystem))?;
        Ok(scheduler)
    }

    pub fn new(map: MapData, catalogs: Catalogs, config: crate::config::SimConfig) -> Result<Self, EngineError> {
        let state = bootstrap::build_economy(&map, &catalogs, &config)?;
        let scheduler = Self::build_scheduler()?;
        let log_capacity = state.config.log_ring_capacity;
        let mut log = LogBus::default();
        log.register(Box::new(crate::log::RingBufferSink::new(log_capacity)?));
        Ok(Self {
            state,
            map,
            scheduler,
            log,
            day_budget: 0.0,
        })
    }

    pub fn pause(&mut self) {
        self.state.paused = true;
    }

    pub fn resume(&mut self) {
        self.state.paused = false;
    }

    pub fn set_time_scale(&mut self, scale: f64) {
        self.state.time_scale = scale.max(0.0);
    }

    /// Cooperative tick-drive: scales wall-clock delta into a day budget and
    /// runs whole days while the budget allows, bounded by
    /// `max_days_per_advance` so a long pause can't trigger a spiral of
    /// processing on resume.
    pub fn advance(&mut self, delta_seconds: f64, timestamp_ms: i64) {
        if self.state.paused {
            return;
        }
        self.day_budget += delta_seconds.max(0.0) * self.state.time_scale;
        let mut processed = 0u32;
        let ctx = TickContext { log: &self.log, timestamp_ms };
        while self.day_budget >= 1.0 && processed < self.state.config.max_days_per_advance {
            self.scheduler.run_day(&ctx, &mut self.state, &self.map);
            self.day_budget -= 1.0;
            processed += 1;
        }
    }

    pub fn state(&self) -> StateView<'_> {
        StateView {
            current_day: self.state.current_day,
            paused: self.state.paused,
            telemetry: &self.state.telemetry,
        }
    }

    /// Full read access to simulation internals (every county, facility,
    /// and market). The narrow [`StateView`] above is the contract a host
    /// shell should prefer; this exists for test assertions and debugging
    /// tools that need to reach past it.
    pub fn raw_state(&self) -> &SimState {
        &self.state
    }

    /// Mutable counterpart to [`Self::raw_state`], for seeding scenario
    /// fixtures (e.g. starting treasuries) that bootstrap has no input for.
    pub fn raw_state_mut(&mut self) -> &mut SimState {
        &mut self.state
    }

    pub fn map(&self) -> &MapData {
        &self.map
    }

    pub fn register_log_sink(&mut self, sink: Box<dyn LogSink>) {
        self.log.register(sink);
    }

    pub fn snapshot(&self) -> Result<String, EngineError> {
        crate::persistence::save(&self.state)
    }

    pub fn load_snapshot(&mut self, json: &str) -> Result<(), EngineError> {
        self.state = crate::persistence::load(json, self.state.catalogs.clone())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_without_resume_does_nothing() {
        let map = crate::bootstrap::test_support::tiny_map();
        let catalogs = crate::bootstrap::test_support::tiny_catalogs();
        let mut sim = Simulation::new(map, catalogs, crate::config::SimConfig::default()).unwrap();
        sim.pause();
        sim.advance(10.0, 0);
        assert_eq!(sim.state().current_day, 0);
    }

    #[test]
    fn advance_processes_whole_days_only() {
        let map = crate::bootstrap::test_support::tiny_map();
        let catalogs = crate::bootstrap::test_support::tiny_catalogs();
        let mut sim = Simulation::new(map, catalogs, crate::config::SimConfig::default()).unwrap();
        sim.set_time_scale(1.0);
        sim.advance(2.5, 0);
        assert_eq!(sim.state().current_day, 2);
    }
}
