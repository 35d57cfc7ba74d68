//! Tick scheduler: a capability set of trait objects, not an ECS schedule.
//! Each registered system carries a name, an interval, and a `tick` method;
//! the scheduler accumulates wall-clock time into a day budget and, once a
//! whole day is due, runs every system whose `current_day % interval == 0`
//! in registration order — that order is the §2 data-flow contract.

pub mod clearing;
pub mod consumption;
pub mod labor;
pub mod migration;
pub mod orders;
pub mod prices;
pub mod production;
pub mod roads;
pub mod telemetry;
pub mod theft;
pub mod trade;
pub mod wages;

use crate::economy::state::SimState;
use crate::error::EngineError;
use crate::log::{Domain, Level, LogBus, LogEvent};
use crate::map::MapData;

/// Handed to every system's `tick`. Carries the log bus and the current
/// wall-clock timestamp (in ms) so systems never reach for a clock
/// themselves, matching the "explicit context handle" design note.
pub struct TickContext<'a> {
    pub log: &'a LogBus,
    pub timestamp_ms: i64,
}

impl<'a> TickContext<'a> {
    pub fn emit(&self, domain: Domain, level: Level, message: impl Into<String>, context: impl Into<String>) {
        self.log.emit(LogEvent {
            timestamp_ms: self.timestamp_ms,
            domain,
            level,
            message: message.into(),
            context: context.into(),
        });
    }
}

/// A named subsystem at a fixed cadence. Implementations hold no state of
/// their own beyond configuration — all mutable state lives in `SimState`.
pub trait TickSystem {
    fn name(&self) -> &'static str;
    fn interval_days(&self) -> u32;

    /// Runs once per day this system is due. Must never panic on malformed
    /// or missing ids; log and skip instead. Errors returned here are
    /// caught at the scheduler boundary and never abort the day.
    fn tick(&self, ctx: &TickContext, state: &mut SimState, map: &MapData) -> Result<(), String>;
}

pub struct Scheduler {
    systems: Vec<Box<dyn TickSystem>>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self { systems: Vec::new() }
    }

    pub fn register(&mut self, system: Box<dyn TickSystem>) -> Result<(), EngineError> {
        if self.systems.iter().any(|s| s.name() == system.name()) {
            return Err(EngineError::DuplicateSystemRegistration {
                name: system.name().to_string(),
            });
        }
        self.systems.push(system);
        Ok(())
    }

    /// Runs every due system in registration order, then advances the day
    /// counter by exactly one. A system failure is logged with its name and
    /// the current day; the remaining systems still run.
    pub fn run_day(&self, ctx: &TickContext, state: &mut SimState, map: &MapData) {
        let day = state.current_day;
        for system in &self.systems {
            if system.interval_days() == 0 || day % system.interval_days() as u64 != 0 {
                continue;
            }
            if let Err(e) = system.tick(ctx, state, map) {
                ctx.emit(
                    Domain::Simulation,
                    Level::Error,
                    format!("tick system failed: {e}"),
                    format!("system={} day={}", system.name(), day),
                );
            }
        }
        state.current_day += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop(&'static str, u32);
    impl TickSystem for Noop {
        fn name(&self) -> &'static str {
            self.0
        }
        fn interval_days(&self) -> u32 {
            self.1
        }
        fn tick(&self, _ctx: &TickContext, _state: &mut SimState, _map: &MapData) -> Result<(), String> {
            Ok(())
        }
    }

    #[test]
    fn duplicate_registration_is_a_construction_error() {
        let mut sched = Scheduler::new();
        sched.register(Box::new(Noop("a", 1))).unwrap();
        let err = sched.register(Box::new(Noop("a", 1)));
        assert!(err.is_err());
    }
}
