//! The `numint_core` crate provides explicit single-step ODE integrators and an
//! adaptive step-size controller built on top of them.
//!
//! Key components:
//! - **Traits**: `Scalar` (numeric type abstraction), `DynamicalSystem` (the ODE right-hand side),
//!   `Steppable` (fixed-step integrators).
//! - **State**: `StateVector`, implemented for `Vec`, arrays and nalgebra vectors.
//! - **Solvers**: fixed-step RK4 and trapezoidal integrators.
//! - **Adaptive**: step-doubling error control over any fixed-step integrator.
//! - **Observer** and **Integrate**: reporting hooks and caller-driven loops.
pub mod adaptive;
pub mod error;
pub mod integrate;
pub mod observer;
pub mod solvers;
pub mod state;
pub mod traits;

pub use adaptive::{AdaptiveSettings, AdaptiveStepper, ErrorNorm};
pub use error::IntegrationError;
