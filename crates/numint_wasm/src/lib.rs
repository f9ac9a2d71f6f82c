//! WASM bindings for the `numint_core` integrators.
//!
//! The ODE right-hand side is supplied from JavaScript as a callback
//! `(t, x) => dxdt`.

mod adaptive;
mod system;

pub use adaptive::{AdaptiveSnapshot, WasmAdaptiveStepper};
pub use system::WasmFixedStepper;
