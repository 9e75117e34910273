use thiserror::Error;

/// Integration method used by the [`Solver`](super::Solver).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    /// Embedded Cash–Karp Runge–Kutta 4(5) pair with error-controlled
    /// step size.
    #[default]
    CashKarp,

    /// Explicit forward Euler with a fixed step size.
    ///
    /// Every step uses `step_size_initial`, except a final step shortened to
    /// land on the end time. Tolerances are ignored.
    ForwardEuler,
}

/// Configuration for the ODE solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    pub method: Method,
    pub abs_tol: f64,
    pub rel_tol: f64,
    pub step_size_initial: f64,
    pub step_size_min: f64,
    pub step_size_max: f64,
    pub max_steps: usize,
}

/// Errors that can occur when validating an ODE solver config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("abs_tol must be finite and non-negative")]
    AbsTol,

    #[error("rel_tol must be finite and non-negative")]
    RelTol,

    #[error("abs_tol and rel_tol cannot both be zero")]
    ZeroTol,

    #[error("step sizes must be finite, positive, and ordered min <= initial <= max")]
    StepSize,

    #[error("max_steps must be positive")]
    MaxSteps,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            method: Method::CashKarp,
            abs_tol: 1e-8,
            rel_tol: 1e-8,
            step_size_initial: 1e-6,
            step_size_min: 1e-10,
            step_size_max: 1.0,
            max_steps: 100_000,
        }
    }
}

impl Config {
    /// Validates tolerances and step size bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if a tolerance is negative or non-finite, both
    /// tolerances are zero, the step sizes are not ordered, or `max_steps` is
    /// zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.abs_tol.is_finite() || self.abs_tol < 0.0 {
            return Err(ConfigError::AbsTol);
        }
        if !self.rel_tol.is_finite() || self.rel_tol < 0.0 {
            return Err(ConfigError::RelTol);
        }
        if self.abs_tol == 0.0 && self.rel_tol == 0.0 {
            return Err(ConfigError::ZeroTol);
        }

        let sizes = [
            self.step_size_min,
            self.step_size_initial,
            self.step_size_max,
        ];
        if sizes.iter().any(|h| !h.is_finite() || *h <= 0.0)
            || self.step_size_min > self.step_size_initial
            || self.step_size_initial > self.step_size_max
        {
            return Err(ConfigError::StepSize);
        }

        if self.max_steps == 0 {
            return Err(ConfigError::MaxSteps);
        }
        Ok(())
    }
}
