use thiserror::Error;

use super::ConfigError;

/// Errors that can occur during quadrature.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum Error {
    #[error("invalid config: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("integration bounds must be finite, got [{a}, {b}]")]
    NonFiniteBounds { a: f64, b: f64 },

    #[error("integrand returned a non-finite value at x = {x}")]
    NonFiniteIntegrand { x: f64 },
}
