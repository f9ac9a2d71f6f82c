//! JS-backed systems and the fixed-step stepper binding.

use js_sys::{Float64Array, Function};
use numint_core::solvers::{Trapezoidal, RK4};
use numint_core::traits::{DynamicalSystem, Steppable};
use wasm_bindgen::prelude::*;

/// Vector field evaluated by a JS callback `(t, x) => dxdt`.
///
/// `x` is passed as a `Float64Array`; the callback may return any array-like
/// of numbers. A thrown exception or a result of the wrong length fills the
/// derivative with NaN, which the adaptive stepper reports as divergence.
pub(crate) struct JsSystem {
    callback: Function,
    dim: usize,
}

impl JsSystem {
    pub(crate) fn new(callback: Function, dim: usize) -> Self {
        Self { callback, dim }
    }
}

impl DynamicalSystem<f64> for JsSystem {
    fn dimension(&self) -> usize {
        self.dim
    }

    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]) {
        let input = Float64Array::from(x);
        if let Ok(value) = self
            .callback
            .call2(&JsValue::NULL, &JsValue::from_f64(t), &input)
        {
            if value.is_object() {
                let values = Float64Array::new(&value);
                if values.length() as usize == out.len() {
                    values.copy_to(out);
                    return;
                }
            }
        }
        out.fill(f64::NAN);
    }
}

pub(crate) enum SolverType {
    RK4(RK4<f64>),
    Trapezoidal(Trapezoidal<f64>),
}

pub(crate) fn build_solver(name: &str, dim: usize) -> Result<SolverType, String> {
    match name {
        "rk4" => Ok(SolverType::RK4(RK4::new(dim))),
        "trapezoidal" => Ok(SolverType::Trapezoidal(Trapezoidal::new(dim))),
        _ => Err(format!("Unknown solver: {name}")),
    }
}

#[wasm_bindgen]
pub struct WasmFixedStepper {
    system: JsSystem,
    state: Vec<f64>,
    t: f64,
    solver: SolverType,
}

#[wasm_bindgen]
impl WasmFixedStepper {
    #[wasm_bindgen(constructor)]
    pub fn new(dim: usize, callback: Function, solver_name: &str) -> Result<WasmFixedStepper, JsValue> {
        console_error_panic_hook::set_once();

        let solver = build_solver(solver_name, dim).map_err(|e| JsValue::from_str(&e))?;

        Ok(WasmFixedStepper {
            system: JsSystem::new(callback, dim),
            state: vec![0.0; dim],
            t: 0.0,
            solver,
        })
    }

    pub fn set_state(&mut self, state: &[f64]) -> Result<(), JsValue> {
        if state.len() != self.system.dimension() {
            return Err(JsValue::from_str("State dimension mismatch."));
        }
        self.state = state.to_vec();
        Ok(())
    }

    pub fn get_state(&self) -> Vec<f64> {
        self.state.clone()
    }

    pub fn set_t(&mut self, t: f64) {
        self.t = t;
    }

    pub fn get_t(&self) -> f64 {
        self.t
    }

    pub fn order(&self) -> u16 {
        match &self.solver {
            SolverType::RK4(s) => s.order(),
            SolverType::Trapezoidal(s) => s.order(),
        }
    }

    pub fn step(&mut self, dt: f64) -> Result<(), JsValue> {
        let result = match &mut self.solver {
            SolverType::RK4(s) => s.try_step(&self.system, &mut self.state, self.t, dt),
            SolverType::Trapezoidal(s) => s.try_step(&self.system, &mut self.state, self.t, dt),
        };
        result.map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.t += dt;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{build_solver, SolverType};

    #[test]
    fn build_solver_accepts_known_names() {
        assert!(matches!(build_solver("rk4", 2), Ok(SolverType::RK4(_))));
        assert!(matches!(
            build_solver("trapezoidal", 2),
            Ok(SolverType::Trapezoidal(_))
        ));
    }

    #[test]
    fn build_solver_rejects_unknown_names() {
        let err = build_solver("tsit5", 2).err().unwrap_or_default();
        assert!(err.contains("Unknown solver"));
    }
}
