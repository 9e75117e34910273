use thiserror::Error;

use crate::ConfigError;

/// Errors that can occur when building or evaluating a spline.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum Error {
    #[error("need at least {needed} samples, got {got}")]
    InsufficientSamples { needed: usize, got: usize },

    #[error("x and y lengths differ: {x} vs {y}")]
    LengthMismatch { x: usize, y: usize },

    #[error("abscissae must be strictly increasing (index {index})")]
    NotIncreasing { index: usize },

    #[error("x = {x} has already been sampled")]
    DuplicateAbscissa { x: f64 },

    #[error("expected {expected} channel values, got {got}")]
    ChannelMismatch { expected: usize, got: usize },

    #[error("channel {channel} out of range for {channels} channels")]
    ChannelOutOfRange { channel: usize, channels: usize },

    #[error("x = {x} is outside the fitted domain [{lo}, {hi}]")]
    OutOfDomain { x: f64, lo: f64, hi: f64 },

    #[error("sample at x = {x} is not finite")]
    NonFinite { x: f64 },

    #[error("invalid domain [{lo}, {hi}]")]
    InvalidDomain { lo: f64, hi: f64 },

    #[error("spline has no fitted coefficients")]
    NotInitialised,

    #[error("invalid config: {0}")]
    InvalidConfig(#[from] ConfigError),
}
