//! Domain log: a value-type event plus a ring-buffer sink and a
//! callback-based sink, both behind the same [`LogSink`] interface. Core
//! code never reaches for a global logger — every tick system is handed a
//! [`LogBus`] through its context and writes through that.
//!
//! When the crate's `instrument` feature is enabled, every event is also
//! mirrored to a `tracing::event!` call at the matching level, so an
//! embedder who wants the richer `econ-telemetry` column store gets it for
//! free without the core depending on `tracing` directly in non-optional
//! code paths.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Domain {
    Transport,
    Economy,
    Labor,
    Market,
    Production,
    Migration,
    Roads,
    Telemetry,
    Bootstrap,
    Simulation,
}

impl Domain {
    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Transport => "TRANSPORT",
            Domain::Economy => "ECONOMY",
            Domain::Labor => "LABOR",
            Domain::Market => "MARKET",
            Domain::Production => "PRODUCTION",
            Domain::Migration => "MIGRATION",
            Domain::Roads => "ROADS",
            Domain::Telemetry => "TELEMETRY",
            Domain::Bootstrap => "BOOTSTRAP",
            Domain::Simulation => "SIMULATION",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    /// Milliseconds since Unix epoch, supplied by the caller so the core
    /// never reaches for a wall clock itself.
    pub timestamp_ms: i64,
    pub domain: Domain,
    pub level: Level,
    pub message: String,
    pub context: String,
}

impl LogEvent {
    /// Renders `[hh:mm:ss.fff] [LEVEL] [DOMAIN] [CONTEXT] MESSAGE`, omitting
    /// the context bracket when empty.
    pub fn format_line(&self) -> String {
        let ms_of_day = self.timestamp_ms.rem_euclid(86_400_000);
        let hh = ms_of_day / 3_600_000;
        let mm = (ms_of_day / 60_000) % 60;
        let ss = (ms_of_day / 1_000) % 60;
        let fff = ms_of_day % 1_000;
        let prefix = format!(
            "[{hh:02}:{mm:02}:{ss:02}.{fff:03}] [{}] [{}]",
            self.level.as_str(),
            self.domain.as_str()
        );
        if self.context.is_empty() {
            format!("{prefix} {}", self.message)
        } else {
            format!("{prefix} [{}] {}", self.context, self.message)
        }
    }
}

/// Sinks are not required to be `Send`/`Sync` themselves — the scheduling
/// model (§5) is single-threaded cooperative, so the only thread-safety
/// requirement lives inside individual sinks that choose to expose a
/// snapshot to another real OS thread, like [`RingBufferSink`].
pub trait LogSink {
    fn record(&self, event: &LogEvent);
}

/// Thread-safe fixed-capacity ring buffer sink. Oldest events are evicted
/// silently once the buffer is full; that eviction is itself a Capacity
/// condition, not an error.
pub struct RingBufferSink {
    capacity: usize,
    buffer: Mutex<VecDeque<LogEvent>>,
}

impl RingBufferSink {
    pub fn new(capacity: usize) -> Result<Self, crate::error::EngineError> {
        if capacity == 0 {
            return Err(crate::error::EngineError::InvalidRingCapacity { capacity });
        }
        Ok(Self {
            capacity,
            buffer: Mutex::new(VecDeque::with_capacity(capacity)),
        })
    }

    /// Returns up to `n` most recent events, in arrival order.
    pub fn snapshot(&self, n: usize) -> Vec<LogEvent> {
        let buffer = self.buffer.lock().expect("log ring buffer mutex poisoned");
        let skip = buffer.len().saturating_sub(n);
        buffer.iter().skip(skip).cloned().collect()
    }
}

impl LogSink for RingBufferSink {
    fn record(&self, event: &LogEvent) {
        let mut buffer = self.buffer.lock().expect("log ring buffer mutex poisoned");
        if buffer.len() == self.capacity {
            buffer.pop_front();
        }
        buffer.push_back(event.clone());
    }
}

/// Sink that dispatches to a boxed closure, keyed by nothing more than
/// "called for every event" — filtering by level is the callback's job.
pub struct CallbackSink<F: Fn(&LogEvent)> {
    callback: F,
}

impl<F: Fn(&LogEvent)> CallbackSink<F> {
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F: Fn(&LogEvent)> LogSink for CallbackSink<F> {
    fn record(&self, event: &LogEvent) {
        (self.callback)(event);
    }
}

/// Polymorphic set of sinks that core code writes through. Owned by
/// [`crate::simulation::Simulation`] and handed to tick systems by shared
/// reference through the tick context.
#[derive(Default)]
pub struct LogBus {
    sinks: Vec<Box<dyn LogSink>>,
}

impl LogBus {
    pub fn register(&mut self, sink: Box<dyn LogSink>) {
        self.sinks.push(sink);
    }

    pub fn emit(&self, event: LogEvent) {
        #[cfg(feature = "instrument")]
        {
            match event.level {
                Level::Debug => tracing::debug!(target: "domain_log", domain = event.domain.as_str(), context = event.context.as_str(), "{}", event.message),
                Level::Info => tracing::info!(target: "domain_log", domain = event.domain.as_str(), context = event.context.as_str(), "{}", event.message),
                Level::Warn => tracing::warn!(target: "domain_log", domain = event.domain.as_str(), context = event.context.as_str(), "{}", event.message),
                Level::Error => tracing::error!(target: "domain_log", domain = event.domain.as_str(), context = event.context.as_str(), "{}", event.message),
            }
        }
        for sink in &self.sinks {
            sink.record(&event);
        }
    }
}
