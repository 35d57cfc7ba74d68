//! County economy simulation core.
//!
//! A deterministic, tick-driven economic simulation over a spatial cell
//! graph derived from a procedurally generated world map (out of scope
//! here — this crate consumes [`map::MapData`] as an immutable input).
//! Counties hold population cohorts and a treasury; production facilities
//! turn labor and inputs into goods; markets clear consignment lots against
//! buy orders with a one-day settlement lag. Twelve daily/weekly/monthly
//! tick systems drive the economy forward; a domain log and a telemetry
//! snapshot are the two observation points a host embeds against.
//!
//! ## Module structure
//!
//! - `types`       Stable ids and small value types (goods, facilities)
//! - `map`         Immutable map data consumed at bootstrap
//! - `transport`   Weighted shortest paths and cost caching
//! - `economy`     Mutable simulation state: counties, facilities, markets
//! - `systems`     The tick scheduler and its twelve subsystems
//! - `telemetry`   The end-of-day aggregate snapshot type
//! - `log`         The always-on domain log (ring buffer + callback sinks)
//! - `config`      Embedder-supplied `SimConfig`
//! - `error`       `EngineError`, the construction-time failure taxonomy
//! - `bootstrap`   Builds the initial `SimState` from map + catalogs
//! - `persistence` Serializable snapshot save/load
//! - `simulation`  The plain-Rust embedding contract (`advance`, `state`, ...)
//! - `wasm`        The `#[wasm_bindgen]` wrapper around `simulation` (wasm32 only)

pub mod bootstrap;
pub mod config;
pub mod economy;
pub mod error;
pub mod log;
pub mod map;
pub mod persistence;
pub mod simulation;
pub mod systems;
pub mod telemetry;
pub mod transport;
pub mod types;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use bootstrap::build_economy;
pub use config::{Intervals, SimConfig, Speed};
pub use economy::state::SimState;
pub use economy::{BuyOrder, BuyerRef, Catalogs, ConsignmentLot, CountyEconomy, FacilityInstance, GoodMarketState, Market, SellerRef};
pub use error::EngineError;
pub use log::{CallbackSink, Domain, Level, LogBus, LogEvent, LogSink, RingBufferSink};
pub use map::{Biome, Cell, County, MapData, Province, Realm};
pub use simulation::{Simulation, StateView};
pub use telemetry::TelemetrySnapshot;
pub use types::{
    BiomeId, CellId, CountyId, CultureId, Estate, FacilityDef, FacilityId, FacilityKind,
    GoodCatalog, GoodCatalogEntry, GoodId, LaborType, MarketId, MarketKind, NeedCategory,
    ProvinceId, RealmId, ReligionId,
};
