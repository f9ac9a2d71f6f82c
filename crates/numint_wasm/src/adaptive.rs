//! Adaptive stepper binding.

use crate::system::JsSystem;
use js_sys::Function;
use numint_core::integrate::integrate_adaptive;
use numint_core::observer::Silent;
use numint_core::traits::DynamicalSystem;
use numint_core::{AdaptiveSettings, AdaptiveStepper};
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[derive(Debug, Clone, Serialize)]
pub struct AdaptiveSnapshot {
    pub time: f64,
    pub time_step: f64,
    pub last_error: f64,
    pub steps: u64,
    pub state: Vec<f64>,
}

#[wasm_bindgen]
pub struct WasmAdaptiveStepper {
    system: JsSystem,
    stepper: AdaptiveStepper<f64>,
}

#[wasm_bindgen]
impl WasmAdaptiveStepper {
    /// `settings` may be `undefined`/`null` for the defaults, or a partial
    /// settings object whose missing fields take their default values.
    #[wasm_bindgen(constructor)]
    pub fn new(
        dim: usize,
        callback: Function,
        tolerance: f64,
        settings: JsValue,
    ) -> Result<WasmAdaptiveStepper, JsValue> {
        console_error_panic_hook::set_once();

        let settings: AdaptiveSettings = if settings.is_undefined() || settings.is_null() {
            AdaptiveSettings::default()
        } else {
            from_value(settings).map_err(|e| JsValue::from_str(&format!("Invalid settings: {}", e)))?
        };
        let stepper = AdaptiveStepper::with_settings(tolerance, settings)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        Ok(WasmAdaptiveStepper {
            system: JsSystem::new(callback, dim),
            stepper,
        })
    }

    pub fn initialize(&mut self, state: Vec<f64>, time: f64, time_step: f64) -> Result<(), JsValue> {
        if state.len() != self.system.dimension() {
            return Err(JsValue::from_str("Initial state dimension mismatch."));
        }
        self.stepper
            .initialize(state, time, time_step)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn step(&mut self) -> Result<(), JsValue> {
        self.stepper
            .step(&self.system)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Steps until the session time reaches `t_end`; returns the number of steps.
    pub fn integrate_to(&mut self, t_end: f64) -> Result<u32, JsValue> {
        let steps = integrate_adaptive(&mut self.stepper, &self.system, t_end, Silent)
            .map_err(|e| JsValue::from_str(&format!("Integration failed: {:#}", e)))?;
        u32::try_from(steps).map_err(|_| JsValue::from_str("Step count overflows u32."))
    }

    pub fn current_state(&self) -> Vec<f64> {
        self.stepper.current_state().clone()
    }

    pub fn current_time(&self) -> f64 {
        self.stepper.current_time()
    }

    pub fn current_time_step(&self) -> f64 {
        self.stepper.current_time_step()
    }

    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        to_value(&self.snapshot_data())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }
}

impl WasmAdaptiveStepper {
    pub(crate) fn snapshot_data(&self) -> AdaptiveSnapshot {
        AdaptiveSnapshot {
            time: self.stepper.current_time(),
            time_step: self.stepper.current_time_step(),
            last_error: self.stepper.last_error(),
            steps: self.stepper.steps(),
            state: self.stepper.current_state().clone(),
        }
    }
}
