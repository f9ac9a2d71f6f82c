//! Adaptive step-size control by step doubling.
//!
//! Every call to [`AdaptiveStepper::step`] integrates the same interval twice
//! with the inner fixed-step method: once with the full step and once with two
//! half steps. The infinity norm of their difference estimates the local
//! truncation error, and the next step size is scaled so that the estimate
//! stays near the tolerance:
//!
//! ```text
//! dt_next = safety * dt * clamp((tolerance / (2 * error))^exponent, min_scale, max_scale)
//! ```
//!
//! The half-step result is kept as the new state.

use crate::error::IntegrationError;
use crate::solvers::RK4;
use crate::state::{is_finite, StateVector};
use crate::traits::{lit, DynamicalSystem, Scalar, Steppable};
use serde::{Deserialize, Serialize};

/// How the per-component difference between the two estimates is measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorNorm {
    /// `|b - a|`
    #[default]
    Absolute,
    /// `|(b - a) / b|`
    Relative,
    /// The smaller of the absolute and relative errors.
    Mixed,
}

impl ErrorNorm {
    /// Infinity norm of the component errors between the full-step estimate
    /// `full` and the half-step estimate `half`.
    ///
    /// NaN component errors never win the comparison, so an all-NaN input
    /// yields zero.
    pub fn estimate<T: Scalar>(self, full: &[T], half: &[T]) -> T {
        full.iter()
            .zip(half)
            .map(|(&a, &b)| self.component(a, b))
            .fold(T::zero(), |acc, err| if err > acc { err } else { acc })
    }

    fn component<T: Scalar>(self, a: T, b: T) -> T {
        let absolute = (b - a).abs();
        match self {
            ErrorNorm::Absolute => absolute,
            ErrorNorm::Relative => ((b - a) / b).abs(),
            ErrorNorm::Mixed => {
                let relative = ((b - a) / b).abs();
                if relative < absolute {
                    relative
                } else {
                    absolute
                }
            }
        }
    }
}

/// Tunables of the step-size controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveSettings {
    /// Multiplies every new step size to stay clear of the tolerance boundary.
    pub safety: f64,
    /// Smallest allowed growth factor per call, before `safety`.
    pub min_scale: f64,
    /// Largest allowed growth factor per call, before `safety`.
    pub max_scale: f64,
    /// Substitute for an error estimate that is exactly zero.
    pub error_floor: f64,
    /// Exponent of the correction factor. The default of 0.2 assumes a
    /// 4th-order inner method; use 1 / (order + 1) for other methods.
    pub exponent: f64,
    pub error_norm: ErrorNorm,
    /// Step size used until [`AdaptiveStepper::initialize`] is called.
    pub initial_time_step: f64,
}

impl Default for AdaptiveSettings {
    fn default() -> Self {
        Self {
            safety: 0.9,
            min_scale: 0.3,
            max_scale: 1.5,
            error_floor: 1e-15,
            exponent: 0.2,
            error_norm: ErrorNorm::Absolute,
            initial_time_step: 1e-12,
        }
    }
}

impl AdaptiveSettings {
    pub fn validate(&self) -> Result<(), IntegrationError> {
        let positive = [
            ("safety", self.safety),
            ("min_scale", self.min_scale),
            ("max_scale", self.max_scale),
            ("error_floor", self.error_floor),
            ("exponent", self.exponent),
            ("initial_time_step", self.initial_time_step),
        ];
        for (name, value) in positive {
            if !(value > 0.0 && value.is_finite()) {
                return Err(IntegrationError::InvalidArgument(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }
        if self.min_scale > self.max_scale {
            return Err(IntegrationError::InvalidArgument(format!(
                "min_scale ({}) must not exceed max_scale ({})",
                self.min_scale, self.max_scale
            )));
        }
        Ok(())
    }
}

/// Computes the step size for the next call from the step just taken and its
/// (already floored) error estimate.
pub fn next_time_step<T: Scalar>(
    time_step: T,
    error: T,
    tolerance: T,
    settings: &AdaptiveSettings,
) -> T {
    let two = lit::<T>(2.0);
    let scale = (tolerance / (two * error))
        .powf(lit(settings.exponent))
        .max(lit(settings.min_scale))
        .min(lit(settings.max_scale));
    lit::<T>(settings.safety) * time_step * scale
}

/// Step-doubling integrator session.
///
/// Owns the evolving state, time and step size. `I` is the inner fixed-step
/// method; two independent instances are kept, one for the full step and one
/// for the pair of half steps.
#[derive(Debug, Clone)]
pub struct AdaptiveStepper<T: Scalar, S = Vec<T>, I = RK4<T>> {
    full: I,
    half: I,
    state: S,
    full_estimate: Vec<T>,
    tolerance: T,
    time_step: T,
    time: T,
    last_error: T,
    steps: u64,
    settings: AdaptiveSettings,
}

impl<T, S, I> AdaptiveStepper<T, S, I>
where
    T: Scalar,
    S: StateVector<T> + Default,
    I: Steppable<T> + Default,
{
    pub fn new(tolerance: T) -> Result<Self, IntegrationError> {
        Self::with_settings(tolerance, AdaptiveSettings::default())
    }

    pub fn with_settings(tolerance: T, settings: AdaptiveSettings) -> Result<Self, IntegrationError> {
        if !(tolerance > T::zero() && tolerance.is_finite()) {
            return Err(IntegrationError::InvalidArgument(format!(
                "tolerance must be positive and finite, got {:?}",
                tolerance
            )));
        }
        settings.validate()?;
        Ok(Self {
            full: I::default(),
            half: I::default(),
            state: S::default(),
            full_estimate: Vec::new(),
            tolerance,
            time_step: lit(settings.initial_time_step),
            time: T::zero(),
            last_error: T::zero(),
            steps: 0,
            settings,
        })
    }
}

impl<T, S, I> AdaptiveStepper<T, S, I>
where
    T: Scalar,
    S: StateVector<T>,
    I: Steppable<T>,
{
    /// Seeds a new run, replacing state, time and step size.
    pub fn initialize(&mut self, state: S, time: T, time_step: T) -> Result<(), IntegrationError> {
        if !time.is_finite() {
            return Err(IntegrationError::InvalidArgument(format!(
                "initial time must be finite, got {:?}",
                time
            )));
        }
        if !(time_step > T::zero() && time_step.is_finite()) {
            return Err(IntegrationError::InvalidArgument(format!(
                "time step must be positive and finite, got {:?}",
                time_step
            )));
        }

        let dim = state.len();
        self.full.adjust_size(dim);
        self.half.adjust_size(dim);
        self.full_estimate.clear();
        self.full_estimate.reserve(dim);

        self.state = state;
        self.time = time;
        self.time_step = time_step;
        self.last_error = T::zero();
        self.steps = 0;
        Ok(())
    }

    /// Advances the session by the current step size and picks the next one.
    ///
    /// State, time and step size are committed before the finiteness check,
    /// so after [`IntegrationError::Diverged`] they hold the diverged values.
    pub fn step(&mut self, system: &impl DynamicalSystem<T>) -> Result<(), IntegrationError> {
        let dim = self.state.len();
        if system.dimension() != dim {
            return Err(IntegrationError::DimensionMismatch {
                expected: dim,
                found: system.dimension(),
            });
        }

        let t0 = self.time;
        let dt = self.time_step;
        let half_dt = dt * lit(0.5);

        // y_{n+1} from one full step.
        self.full_estimate.clear();
        self.full_estimate.extend_from_slice(self.state.as_slice());
        self.full.do_step(system, &mut self.full_estimate, t0, dt);

        // y_{n+1} from two half steps, in place.
        let state = self.state.as_mut_slice();
        self.half.do_step(system, state, t0, half_dt);
        self.half.do_step(system, state, t0 + half_dt, half_dt);

        self.time = t0 + dt;

        let mut error = self
            .settings
            .error_norm
            .estimate(&self.full_estimate, self.state.as_slice());
        if error == T::zero() {
            error = lit(self.settings.error_floor);
        }
        self.last_error = error;
        self.time_step = next_time_step(dt, error, self.tolerance, &self.settings);
        self.steps += 1;

        if !is_finite(self.state.as_slice()) || !self.time_step.is_finite() {
            return Err(IntegrationError::Diverged {
                time: self.time.to_f64().unwrap_or(f64::NAN),
            });
        }
        Ok(())
    }

    /// Single fixed-size step on a caller-owned state, using the full-step integrator.
    /// Does not touch the session.
    pub fn do_step(&mut self, system: &impl DynamicalSystem<T>, state: &mut [T], t: T, dt: T) {
        self.full.do_step(system, state, t, dt);
    }

    pub fn current_state(&self) -> &S {
        &self.state
    }

    pub fn current_time(&self) -> T {
        self.time
    }

    /// Step size the next call to [`AdaptiveStepper::step`] will use.
    pub fn current_time_step(&self) -> T {
        self.time_step
    }

    pub fn tolerance(&self) -> T {
        self.tolerance
    }

    pub fn settings(&self) -> &AdaptiveSettings {
        &self.settings
    }

    /// Error estimate of the last step, after flooring. Zero before the first step.
    pub fn last_error(&self) -> T {
        self.last_error
    }

    /// Number of calls to [`AdaptiveStepper::step`] since the last initialization.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Order of the inner integrator.
    pub fn order(&self) -> u16 {
        self.full.order()
    }
}
