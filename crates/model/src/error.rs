use std::path::PathBuf;

use canopy_solvers::{ode, quadrature, root};
use thiserror::Error;

/// Errors that can occur anywhere in the model.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("ode solver failed: {0}")]
    Solver(#[from] ode::Error),

    #[error("no species at index {idx} (patch has {len})")]
    NoSuchSpecies { idx: usize, len: usize },

    #[error("expected {expected} values, got {got}")]
    LengthMismatch { expected: usize, got: usize },
}

/// Invalid parameters, raised when a component is built.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be in {expected}, got {value}")]
    Parameter {
        name: &'static str,
        value: f64,
        expected: String,
    },

    #[error("need at least {min} sample plants, got {got}")]
    TooFewPlants { min: usize, got: usize },

    #[error("surrogate mass_leaf_max {max} must exceed the seed mass_leaf {seed}")]
    SurrogateRange { max: f64, seed: f64 },

    #[error("cannot solve for the seed leaf mass: {0}")]
    SeedMass(#[from] root::Error),

    #[error("ode solver: {0}")]
    Solver(#[from] ode::ConfigError),

    #[error("assimilation quadrature: {0}")]
    Quadrature(#[from] quadrature::ConfigError),

    #[error("light environment: {0}")]
    LightEnvironment(#[from] canopy_spline::ConfigError),

    #[error("failed to read {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse parameters: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Something was evaluated outside the range where it is defined.
///
/// Callers can recover by rebuilding the offending table and retrying.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum DomainError {
    #[error("mass_leaf {mass_leaf} is above the surrogate range (max {max})")]
    SizeOutOfRange { mass_leaf: f64, max: f64 },

    #[error("light environment: {0}")]
    LightEnvironment(canopy_spline::Error),

    #[error("rate surrogate: {0}")]
    Surrogate(canopy_spline::Error),

    #[error("assimilation integral: {0}")]
    Assimilation(#[from] quadrature::Error),
}
