//! `#[wasm_bindgen]` surface over [`crate::simulation::Simulation`]. Pure
//! boundary glue: no engine logic lives here, only type conversion between
//! `EngineError`/domain types and the JS-facing shapes `wasm-bindgen` needs.

use crate::config::SimConfig;
use crate::economy::Catalogs;
use crate::error::EngineError;
use crate::log::{CallbackSink, LogEvent};
use crate::map::MapData;
use crate::simulation::Simulation as CoreSimulation;
use js_sys::Function;
use tsify_next::Tsify;
use wasm_bindgen::prelude::*;

impl From<EngineError> for JsValue {
    fn from(err: EngineError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

#[derive(serde::Serialize, serde::Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct StateSummary {
    pub current_day: u64,
    pub paused: bool,
    pub total_money_supply: f64,
    pub active_facilities: u32,
}

#[wasm_bindgen]
pub struct Simulation {
    inner: CoreSimulation,
}

#[wasm_bindgen]
impl Simulation {
    #[wasm_bindgen(constructor)]
    pub fn new(map_json: &str, catalogs_json: &str, config_json: &str) -> Result<Simulation, JsValue> {
        console_error_panic_hook::set_once();
        let map: MapData = serde_json::from_str(map_json).map_err(|e| EngineError::Bootstrap { reason: e.to_string() })?;
        let catalogs: Catalogs = serde_json::from_str(catalogs_json).map_err(|e| EngineError::Bootstrap { reason: e.to_string() })?;
        let config: SimConfig = serde_json::from_str(config_json).map_err(|e| EngineError::Bootstrap { reason: e.to_string() })?;
        let inner = CoreSimulation::new(map, catalogs, config)?;
        Ok(Self { inner })
    }

    pub fn advance(&mut self, delta_seconds: f64, timestamp_ms: f64) {
        self.inner.advance(delta_seconds, timestamp_ms as i64);
    }

    pub fn pause(&mut self) {
        self.inner.pause();
    }

    pub fn resume(&mut self) {
        self.inner.resume();
    }

    #[wasm_bindgen(js_name = setTimeScale)]
    pub fn set_time_scale(&mut self, scale: f64) {
        self.inner.set_time_scale(scale);
    }

    pub fn state(&self) -> StateSummary {
        let view = self.inner.state();
        StateSummary {
            current_day: view.current_day,
            paused: view.paused,
            total_money_supply: view.telemetry.total_money_supply,
            active_facilities: view.telemetry.active_facilities,
        }
    }

    #[wasm_bindgen(js_name = registerLogSink)]
    pub fn register_log_sink(&mut self, callback: Function) {
        let sink = CallbackSink::new(move |event: &LogEvent| {
            let line = JsValue::from_str(&event.format_line());
            let _ = callback.call1(&JsValue::NULL, &line);
        });
        self.inner.register_log_sink(Box::new(sink));
    }

    pub fn snapshot(&self) -> Result<String, JsValue> {
        self.inner.snapshot().map_err(JsValue::from)
    }

    #[wasm_bindgen(js_name = loadSnapshot)]
    pub fn load_snapshot(&mut self, json: &str) -> Result<(), JsValue> {
        self.inner.load_snapshot(json).map_err(JsValue::from)
    }
}
