use crate::traits::{lit, DynamicalSystem, Scalar, Steppable};

/// Classic Runge-Kutta 4th Order Solver
#[derive(Debug, Clone)]
pub struct RK4<T: Scalar> {
    k1: Vec<T>,
    k2: Vec<T>,
    k3: Vec<T>,
    k4: Vec<T>,
    tmp: Vec<T>,
    steps: u64,
}

impl<T: Scalar> RK4<T> {
    pub fn new(dim: usize) -> Self {
        let z = T::zero();
        Self {
            k1: vec![z; dim],
            k2: vec![z; dim],
            k3: vec![z; dim],
            k4: vec![z; dim],
            tmp: vec![z; dim],
            steps: 0,
        }
    }
}

impl<T: Scalar> Default for RK4<T> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<T: Scalar> Steppable<T> for RK4<T> {
    fn order(&self) -> u16 {
        4
    }

    fn steps(&self) -> u64 {
        self.steps
    }

    fn reset_steps(&mut self) {
        self.steps = 0;
    }

    fn adjust_size(&mut self, len: usize) {
        let z = T::zero();
        self.k1.resize(len, z);
        self.k2.resize(len, z);
        self.k3.resize(len, z);
        self.k4.resize(len, z);
        self.tmp.resize(len, z);
    }

    fn do_step(&mut self, system: &impl DynamicalSystem<T>, state: &mut [T], t: T, dt: T) {
        if self.tmp.len() != state.len() {
            self.adjust_size(state.len());
        }

        let half = lit::<T>(0.5);
        let sixth = lit::<T>(1.0 / 6.0);
        let two = lit::<T>(2.0);

        // k1 = f(t, y)
        system.apply(t, state, &mut self.k1);

        // k2 = f(t + dt/2, y + dt*k1/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k1[i] * half;
        }
        system.apply(t + dt * half, &self.tmp, &mut self.k2);

        // k3 = f(t + dt/2, y + dt*k2/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k2[i] * half;
        }
        system.apply(t + dt * half, &self.tmp, &mut self.k3);

        // k4 = f(t + dt, y + dt*k3)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k3[i];
        }
        system.apply(t + dt, &self.tmp, &mut self.k4);

        // y_next = y + dt/6 * (k1 + 2k2 + 2k3 + k4)
        for i in 0..state.len() {
            state[i] = state[i]
                + dt * sixth * (self.k1[i] + two * self.k2[i] + two * self.k3[i] + self.k4[i]);
        }

        self.steps += 1;
    }
}

/// Trapezoidal rule in time.
///
/// Both derivative samples are taken at the starting state, at `t` and at
/// `t + dt`, and averaged:
///
/// ```text
/// x(t + dt) = x(t) + 0.5 * dt * f(x, t) + 0.5 * dt * f(x, t + dt)
/// ```
///
/// For autonomous systems this reduces to explicit Euler.
#[derive(Debug, Clone)]
pub struct Trapezoidal<T: Scalar> {
    dxdt_start: Vec<T>,
    dxdt_end: Vec<T>,
    steps: u64,
}

impl<T: Scalar> Trapezoidal<T> {
    pub fn new(dim: usize) -> Self {
        Self {
            dxdt_start: vec![T::zero(); dim],
            dxdt_end: vec![T::zero(); dim],
            steps: 0,
        }
    }
}

impl<T: Scalar> Default for Trapezoidal<T> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<T: Scalar> Steppable<T> for Trapezoidal<T> {
    fn order(&self) -> u16 {
        1
    }

    fn steps(&self) -> u64 {
        self.steps
    }

    fn reset_steps(&mut self) {
        self.steps = 0;
    }

    fn adjust_size(&mut self, len: usize) {
        self.dxdt_start.resize(len, T::zero());
        self.dxdt_end.resize(len, T::zero());
    }

    fn do_step(&mut self, system: &impl DynamicalSystem<T>, state: &mut [T], t: T, dt: T) {
        if self.dxdt_start.len() != state.len() {
            self.adjust_size(state.len());
        }

        let half_dt = lit::<T>(0.5) * dt;

        system.apply(t, state, &mut self.dxdt_start);
        system.apply(t + dt, state, &mut self.dxdt_end);

        for i in 0..state.len() {
            state[i] = state[i] + half_dt * self.dxdt_start[i] + half_dt * self.dxdt_end[i];
        }

        self.steps += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::{Trapezoidal, RK4};
    use crate::error::IntegrationError;
    use crate::traits::{DynamicalSystem, FnSystem, Steppable};

    struct Decay;

    impl DynamicalSystem<f64> for Decay {
        fn dimension(&self) -> usize {
            1
        }

        fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
            out[0] = -x[0];
        }
    }

    #[test]
    fn rk4_matches_exponential_decay() {
        let mut stepper = RK4::new(1);
        let mut state = [1.0];
        let dt = 0.01;
        let mut t = 0.0;
        for _ in 0..100 {
            stepper.do_step(&Decay, &mut state, t, dt);
            t += dt;
        }
        assert!((state[0] - (-1.0f64).exp()).abs() < 1e-9);
        assert_eq!(stepper.steps(), 100);
        assert_eq!(stepper.order(), 4);
    }

    #[test]
    fn rk4_integrates_time_dependent_system_exactly() {
        // dx/dt = 3t^2 is integrated exactly by a 4th order method.
        let system = FnSystem::new(1, |t: f64, _x: &[f64], out: &mut [f64]| {
            out[0] = 3.0 * t * t;
        });
        let mut stepper = RK4::default();
        let mut state = vec![0.0];
        stepper.do_step(&system, &mut state, 1.0, 0.5);
        let expected = 1.5f64.powi(3) - 1.0;
        assert!((state[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn rk4_sizes_buffers_on_first_use() {
        let system = FnSystem::new(3, |_t: f64, x: &[f64], out: &mut [f64]| {
            out.copy_from_slice(x);
        });
        let mut stepper = RK4::default();
        let mut state = vec![1.0, 2.0, 3.0];
        stepper.do_step(&system, &mut state, 0.0, 0.1);
        let growth = 1.0 + 0.1 + 0.01 / 2.0 + 0.001 / 6.0 + 0.0001 / 24.0;
        for (value, initial) in state.iter().zip([1.0, 2.0, 3.0]) {
            assert!((value - initial * growth).abs() < 1e-12);
        }
    }

    #[test]
    fn trapezoidal_samples_start_state_at_both_ends() {
        let system = FnSystem::new(1, |t: f64, _x: &[f64], out: &mut [f64]| {
            out[0] = t;
        });
        let mut stepper = Trapezoidal::new(1);
        let mut state = [2.0];
        stepper.do_step(&system, &mut state, 1.0, 0.5);
        // 2 + 0.25 * 1.0 + 0.25 * 1.5
        assert!((state[0] - 2.625).abs() < 1e-15);
        assert_eq!(stepper.order(), 1);
    }

    #[test]
    fn trapezoidal_is_euler_for_autonomous_system() {
        let mut stepper = Trapezoidal::default();
        let mut state = [1.0];
        stepper.do_step(&Decay, &mut state, 0.0, 0.1);
        assert!((state[0] - 0.9).abs() < 1e-15);
    }

    #[test]
    fn step_counter_resets() {
        let mut stepper = Trapezoidal::new(1);
        let mut state = [1.0];
        stepper.do_step(&Decay, &mut state, 0.0, 0.1);
        stepper.do_step(&Decay, &mut state, 0.1, 0.1);
        assert_eq!(stepper.steps(), 2);
        stepper.reset_steps();
        assert_eq!(stepper.steps(), 0);
    }

    #[test]
    fn try_step_rejects_invalid_arguments() {
        let mut stepper = RK4::new(1);
        let mut state = [1.0];
        assert!(matches!(
            stepper.try_step(&Decay, &mut state, 0.0, 0.0),
            Err(IntegrationError::InvalidArgument(_))
        ));
        assert!(matches!(
            stepper.try_step(&Decay, &mut state, 0.0, f64::NAN),
            Err(IntegrationError::InvalidArgument(_))
        ));
        let mut wide = [1.0, 2.0];
        assert_eq!(
            stepper.try_step(&Decay, &mut wide, 0.0, 0.1),
            Err(IntegrationError::DimensionMismatch {
                expected: 1,
                found: 2
            })
        );
        assert_eq!(state[0], 1.0);
        assert_eq!(stepper.steps(), 0);
    }

    #[test]
    fn try_step_accepts_negative_step() {
        let mut stepper = RK4::new(1);
        let mut state = [1.0];
        stepper
            .try_step(&Decay, &mut state, 0.0, -0.1)
            .expect("negative step should be accepted");
        assert!((state[0] - 0.1f64.exp()).abs() < 1e-6);
    }
}
