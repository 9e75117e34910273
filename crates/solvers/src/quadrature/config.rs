use thiserror::Error;

/// Configuration for adaptive quadrature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    abs_tol: f64,
    rel_tol: f64,
    max_intervals: usize,
}

/// Errors that can occur when validating a quadrature config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("abs_tol must be finite and non-negative")]
    AbsTol,

    #[error("rel_tol must be finite and non-negative")]
    RelTol,

    #[error("abs_tol and rel_tol cannot both be zero")]
    ZeroTol,

    #[error("max_intervals must be positive")]
    MaxIntervals,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            abs_tol: 1e-10,
            rel_tol: 1e-8,
            max_intervals: 50,
        }
    }
}

impl Config {
    /// Creates a new config with validated tolerances.
    ///
    /// # Errors
    ///
    /// Returns an error if a tolerance is negative or non-finite, both
    /// tolerances are zero, or `max_intervals` is zero.
    pub fn new(abs_tol: f64, rel_tol: f64, max_intervals: usize) -> Result<Self, ConfigError> {
        if !abs_tol.is_finite() || abs_tol < 0.0 {
            return Err(ConfigError::AbsTol);
        }
        if !rel_tol.is_finite() || rel_tol < 0.0 {
            return Err(ConfigError::RelTol);
        }
        if abs_tol == 0.0 && rel_tol == 0.0 {
            return Err(ConfigError::ZeroTol);
        }
        if max_intervals == 0 {
            return Err(ConfigError::MaxIntervals);
        }

        Ok(Self {
            abs_tol,
            rel_tol,
            max_intervals,
        })
    }

    /// Returns the absolute error target.
    #[must_use]
    pub fn abs_tol(&self) -> f64 {
        self.abs_tol
    }

    /// Returns the relative error target.
    #[must_use]
    pub fn rel_tol(&self) -> f64 {
        self.rel_tol
    }

    /// Returns the maximum number of subintervals.
    #[must_use]
    pub fn max_intervals(&self) -> usize {
        self.max_intervals
    }

    /// Returns the error budget for an integral of magnitude `value`.
    pub(super) fn tolerance(&self, value: f64) -> f64 {
        self.abs_tol.max(self.rel_tol * value.abs())
    }
}
