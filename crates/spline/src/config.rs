use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cubic::MIN_SAMPLES;

/// Refinement settings for adaptive spline fitting.
///
/// An interval is refined while its midpoint error exceeds
/// `atol + rtol * |y|`. The initial grid has `nbase` evenly spaced points and
/// refinement stops before the sample count would exceed `max_points`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub atol: f64,
    pub rtol: f64,
    pub nbase: usize,
    pub max_points: usize,
}

/// Errors that can occur when validating an adaptive spline config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("atol must be finite and non-negative")]
    Atol,

    #[error("rtol must be finite and non-negative")]
    Rtol,

    #[error("atol and rtol cannot both be zero")]
    ZeroTol,

    #[error("nbase must be at least 3")]
    Nbase,

    #[error("max_points must allow at least one refinement round (>= 2 * nbase - 1)")]
    MaxPoints,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            atol: 1e-6,
            rtol: 1e-6,
            nbase: 17,
            max_points: 2049,
        }
    }
}

impl Config {
    /// Creates a validated config.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings fail [`Config::validate`].
    pub fn new(atol: f64, rtol: f64, nbase: usize, max_points: usize) -> Result<Self, ConfigError> {
        let config = Self {
            atol,
            rtol,
            nbase,
            max_points,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates tolerances and sample counts.
    ///
    /// # Errors
    ///
    /// Returns an error if a tolerance is negative or non-finite, both
    /// tolerances are zero, `nbase` is below the cubic minimum, or
    /// `max_points` leaves no room to refine the initial grid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.atol.is_finite() || self.atol < 0.0 {
            return Err(ConfigError::Atol);
        }
        if !self.rtol.is_finite() || self.rtol < 0.0 {
            return Err(ConfigError::Rtol);
        }
        if self.atol == 0.0 && self.rtol == 0.0 {
            return Err(ConfigError::ZeroTol);
        }
        if self.nbase < MIN_SAMPLES {
            return Err(ConfigError::Nbase);
        }
        if self.max_points < 2 * self.nbase - 1 {
            return Err(ConfigError::MaxPoints);
        }
        Ok(())
    }

    /// Returns the error allowed at a point where the true value is `y`.
    pub(crate) fn tolerance(&self, y: f64) -> f64 {
        self.atol + self.rtol * y.abs()
    }
}
