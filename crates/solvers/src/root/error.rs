use thiserror::Error;

use super::ConfigError;

/// Errors that can occur during bisection.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum Error {
    #[error("invalid config: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("bracket bounds must be finite, got [{lo}, {hi}]")]
    NonFiniteBracket { lo: f64, hi: f64 },

    #[error("no sign change over [{lo}, {hi}]: f(lo) = {f_lo}, f(hi) = {f_hi}")]
    NoSignChange { lo: f64, hi: f64, f_lo: f64, f_hi: f64 },

    #[error("function returned a non-finite value at x = {x}")]
    NonFiniteResidual { x: f64 },
}
