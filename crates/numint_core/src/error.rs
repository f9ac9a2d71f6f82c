/// Errors reported by the steppers.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntegrationError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("dimension mismatch: expected {expected} components, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// The state or the step size became non-finite. The stepper keeps the
    /// diverged values; the caller decides whether to re-initialize.
    #[error("integration diverged at t = {time}")]
    Diverged { time: f64 },
}
