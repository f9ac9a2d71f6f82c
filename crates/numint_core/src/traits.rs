use crate::error::IntegrationError;
use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types that can be used as scalars in the integrators.
/// Must support basic arithmetic, debug printing, and conversion from f64.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// Converts an `f64` constant into the scalar type.
pub(crate) fn lit<T: Scalar>(value: f64) -> T {
    T::from_f64(value).unwrap_or_else(T::nan)
}

/// Represents a system of first-order ODEs.
pub trait DynamicalSystem<T: Scalar> {
    /// Returns the dimension of the state space.
    fn dimension(&self) -> usize;

    /// Evaluates the vector field.
    /// t: current time
    /// x: current state
    /// out: buffer to write dx/dt into, same length as `x`
    fn apply(&self, t: T, x: &[T], out: &mut [T]);
}

impl<T: Scalar, D: DynamicalSystem<T> + ?Sized> DynamicalSystem<T> for &D {
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn apply(&self, t: T, x: &[T], out: &mut [T]) {
        (**self).apply(t, x, out)
    }
}

/// Adapts a closure `|t, x, out|` into a [`DynamicalSystem`] of fixed dimension.
#[derive(Debug, Clone, Copy)]
pub struct FnSystem<F> {
    dim: usize,
    f: F,
}

impl<F> FnSystem<F> {
    pub fn new(dim: usize, f: F) -> Self {
        Self { dim, f }
    }
}

impl<T, F> DynamicalSystem<T> for FnSystem<F>
where
    T: Scalar,
    F: Fn(T, &[T], &mut [T]),
{
    fn dimension(&self) -> usize {
        self.dim
    }

    fn apply(&self, t: T, x: &[T], out: &mut [T]) {
        (self.f)(t, x, out)
    }
}

/// A fixed-step explicit integrator.
///
/// Implementors own their derivative scratch buffers; the buffers are resized
/// to the state length on first use or through [`Steppable::adjust_size`] and
/// carry no information between calls.
pub trait Steppable<T: Scalar> {
    /// Order of accuracy of the formula (local error is O(dt^(order + 1))).
    fn order(&self) -> u16;

    /// Number of steps taken since construction or the last reset.
    fn steps(&self) -> u64;

    /// Clears the step counter.
    fn reset_steps(&mut self);

    /// Resizes the internal scratch buffers to `len` components.
    fn adjust_size(&mut self, len: usize);

    /// Performs one step of size dt, overwriting `state` with the estimate at `t + dt`.
    /// No input validation is done; non-finite values propagate into `state`.
    fn do_step(&mut self, system: &impl DynamicalSystem<T>, state: &mut [T], t: T, dt: T);

    /// Same as [`Steppable::do_step`], but rejects a zero or non-finite step size
    /// and a state whose length does not match the system dimension.
    fn try_step(
        &mut self,
        system: &impl DynamicalSystem<T>,
        state: &mut [T],
        t: T,
        dt: T,
    ) -> Result<(), IntegrationError> {
        if dt == T::zero() || !dt.is_finite() {
            return Err(IntegrationError::InvalidArgument(format!(
                "step size must be non-zero and finite, got {:?}",
                dt
            )));
        }
        if state.len() != system.dimension() {
            return Err(IntegrationError::DimensionMismatch {
                expected: system.dimension(),
                found: state.len(),
            });
        }
        self.do_step(system, state, t, dt);
        Ok(())
    }
}
