//! Caller-driven integration loops.
//!
//! Thin drivers that repeatedly invoke a stepper until an end time is reached,
//! notifying an [`Observer`] of the initial state and of every step.

use crate::adaptive::AdaptiveStepper;
use crate::observer::Observer;
use crate::state::StateVector;
use crate::traits::{lit, DynamicalSystem, Scalar, Steppable};
use anyhow::{anyhow, bail, Context, Result};

/// Integrates with a constant step from `t0` to `t_end`.
///
/// The number of steps is `floor((t_end - t0) / dt)`; the last step may stop
/// short of `t_end` by less than `dt`. Time is recomputed as `t0 + n * dt`
/// rather than accumulated. Returns the number of steps taken.
pub fn integrate_const<T, Sys, St, O>(
    stepper: &mut St,
    system: &Sys,
    state: &mut [T],
    t0: T,
    t_end: T,
    dt: T,
    mut observer: O,
) -> Result<usize>
where
    T: Scalar,
    Sys: DynamicalSystem<T>,
    St: Steppable<T>,
    O: Observer<T>,
{
    if state.len() != system.dimension() {
        bail!(
            "Initial state dimension mismatch. Expected {}, got {}.",
            system.dimension(),
            state.len()
        );
    }
    if !(dt > T::zero() && dt.is_finite()) {
        bail!("Step size dt must be positive.");
    }
    if !(t0.is_finite() && t_end.is_finite()) || t_end < t0 {
        bail!("Integration interval must be finite with t_end >= t0.");
    }

    // Slack keeps an interval that is an exact multiple of dt from losing
    // its last step to rounding.
    let steps = ((t_end - t0) / dt + lit(1e-9))
        .floor()
        .to_usize()
        .ok_or_else(|| anyhow!("Requested interval overflows usize."))?;

    observer
        .observe(state, t0)
        .context("Observer failed on the initial state.")?;

    let mut t = t0;
    for n in 1..=steps {
        stepper.do_step(system, state, t, dt);
        t = t0 + dt * lit(n as f64);
        observer
            .observe(state, t)
            .with_context(|| format!("Observer failed after step {n}."))?;
    }

    Ok(steps)
}

/// Steps an adaptive session until its time reaches `t_end`.
///
/// The last step is not shortened to land on `t_end`, so the final time may
/// overshoot it by up to one step. Returns the number of steps taken.
pub fn integrate_adaptive<T, S, I, Sys, O>(
    stepper: &mut AdaptiveStepper<T, S, I>,
    system: &Sys,
    t_end: T,
    mut observer: O,
) -> Result<usize>
where
    T: Scalar,
    S: StateVector<T>,
    I: Steppable<T>,
    Sys: DynamicalSystem<T>,
    O: Observer<T>,
{
    if !t_end.is_finite() {
        bail!("End time must be finite.");
    }

    observer
        .observe(stepper.current_state().as_slice(), stepper.current_time())
        .context("Observer failed on the initial state.")?;

    let mut steps = 0usize;
    while stepper.current_time() < t_end {
        stepper
            .step(system)
            .with_context(|| format!("Adaptive step {} failed.", steps + 1))?;
        steps += 1;
        observer
            .observe(stepper.current_state().as_slice(), stepper.current_time())
            .with_context(|| format!("Observer failed after step {steps}."))?;
    }

    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::{integrate_adaptive, integrate_const};
    use crate::adaptive::AdaptiveStepper;
    use crate::error::IntegrationError;
    use crate::observer::{Decimate, Print, Record, Silent};
    use crate::solvers::{Trapezoidal, RK4};
    use crate::traits::{DynamicalSystem, FnSystem};

    struct Oscillator;

    impl DynamicalSystem<f64> for Oscillator {
        fn dimension(&self) -> usize {
            2
        }

        fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
            out[0] = x[1];
            out[1] = -x[0];
        }
    }

    fn assert_err_contains<T: std::fmt::Debug>(result: anyhow::Result<T>, needle: &str) {
        let err = result.expect_err("expected error");
        let message = format!("{err:#}");
        assert!(
            message.contains(needle),
            "expected error to contain \"{needle}\", got \"{message}\""
        );
    }

    #[test]
    fn integrate_const_observes_every_step() {
        let mut stepper = RK4::new(2);
        let mut state = [1.0, 0.0];
        let mut record = Record::new();
        let steps = integrate_const(
            &mut stepper,
            &Oscillator,
            &mut state,
            0.0,
            1.0,
            0.1,
            &mut record,
        )
        .expect("integration should succeed");

        assert_eq!(steps, 10);
        assert_eq!(record.len(), 11);
        assert_eq!(record.times[0], 0.0);
        assert!((record.times[10] - 1.0).abs() < 1e-12);
        assert!((state[0] - 1.0f64.cos()).abs() < 1e-5);
        assert!((state[1] + 1.0f64.sin()).abs() < 1e-5);
    }

    #[test]
    fn integrate_const_rejects_invalid_inputs() {
        let mut stepper = Trapezoidal::new(2);
        let mut state = [1.0, 0.0];
        assert_err_contains(
            integrate_const(&mut stepper, &Oscillator, &mut state, 0.0, 1.0, 0.0, Silent),
            "dt must be positive",
        );
        assert_err_contains(
            integrate_const(&mut stepper, &Oscillator, &mut state, 1.0, 0.0, 0.1, Silent),
            "t_end >= t0",
        );
        let mut short = [1.0];
        assert_err_contains(
            integrate_const(&mut stepper, &Oscillator, &mut short, 0.0, 1.0, 0.1, Silent),
            "dimension mismatch",
        );
    }

    #[test]
    fn integrate_adaptive_reaches_end_time() {
        let mut stepper: AdaptiveStepper<f64> = AdaptiveStepper::new(1e-8).expect("valid");
        stepper.initialize(vec![1.0, 0.0], 0.0, 1e-3).expect("valid");
        let mut record = Record::new();
        let steps = integrate_adaptive(&mut stepper, &Oscillator, 3.0, &mut record)
            .expect("integration should succeed");

        let t = stepper.current_time();
        assert!(t >= 3.0);
        assert_eq!(record.len(), steps + 1);
        assert!(record.times.windows(2).all(|w| w[1] > w[0]));
        let state = stepper.current_state();
        assert!((state[0] - t.cos()).abs() < 1e-5);
        assert!((state[1] + t.sin()).abs() < 1e-5);
    }

    #[test]
    fn integrate_adaptive_reports_divergence() {
        let mut stepper: AdaptiveStepper<f64> = AdaptiveStepper::new(1e-4).expect("valid");
        stepper.initialize(vec![1.0], 0.0, 0.1).expect("valid");
        let system = FnSystem::new(1, |t: f64, _x: &[f64], out: &mut [f64]| {
            out[0] = if t > 0.5 { f64::NAN } else { 1.0 };
        });
        let result = integrate_adaptive(&mut stepper, &system, 10.0, Silent);
        let err = result.expect_err("should diverge");
        assert!(err.to_string().contains("Adaptive step"));
        assert!(matches!(
            err.downcast_ref::<IntegrationError>(),
            Some(IntegrationError::Diverged { .. })
        ));
    }

    #[test]
    fn integrate_adaptive_with_decimated_printer() {
        let mut stepper: AdaptiveStepper<f64> = AdaptiveStepper::new(1e-4).expect("valid");
        stepper.initialize(vec![1.0, 0.0], 0.0, 0.01).expect("valid");
        let mut printer = Decimate::new(5, Print::new(Vec::new()));
        let steps = integrate_adaptive(&mut stepper, &Oscillator, 1.0, &mut printer)
            .expect("integration should succeed");

        let text = String::from_utf8(printer.into_inner().into_inner()).expect("utf8");
        assert_eq!(text.lines().count(), (steps + 1) / 5);
        for line in text.lines() {
            assert_eq!(line.split(' ').count(), 3);
        }
    }
}
