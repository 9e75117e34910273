//! Patch parameters, loaded from TOML.
//!
//! ```toml
//! c_ext = 0.5
//! patch_area = 1.0
//!
//! [control]
//! ode_rel_tol = 1e-6
//!
//! [control.light_environment]
//! atol = 1e-6
//!
//! [[species]]
//! cohort = "discrete"
//!
//! [species.traits]
//! lma = 0.2
//!
//! [species.surrogate]
//! n_plants = 20
//! mass_leaf_max = 0.01
//! spacing = "geometric"
//! ```
//!
//! Every field has a default, so an empty document describes a patch with no
//! species.

use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

use canopy_solvers::{ode, quadrature};
use serde::{Deserialize, Serialize};

use crate::{ConfigError, Traits};

/// Top-level parameters for a [`Patch`](crate::Patch).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Parameters {
    /// Light extinction coefficient.
    pub c_ext: f64,
    /// Ground area of the patch (m²).
    pub patch_area: f64,
    pub control: Control,
    pub species: Vec<SpeciesParameters>,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            c_ext: 0.5,
            patch_area: 1.0,
            control: Control::default(),
            species: Vec::new(),
        }
    }
}

impl Parameters {
    /// Parses and validates parameters from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or a value is invalid.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let parameters: Self = toml::from_str(s)?;
        parameters.validate()?;
        Ok(parameters)
    }

    /// Reads, parses and validates parameters from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, or for the same reasons
    /// as [`Parameters::from_toml_str`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("loaded parameters from {path:?}");
        Self::from_toml_str(&contents)
    }

    /// Validates every parameter block.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check("c_ext", self.c_ext, 0.0..)?;
        check("patch_area", self.patch_area, f64::MIN_POSITIVE..)?;
        self.control.validate()?;
        for species in &self.species {
            species.validate()?;
        }
        Ok(())
    }
}

/// Numerical settings shared by all species in a patch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Control {
    pub assimilation_abs_tol: f64,
    pub assimilation_rel_tol: f64,
    pub assimilation_max_intervals: usize,

    /// Refinement of the canopy openness spline.
    pub light_environment: canopy_spline::Config,

    pub ode_abs_tol: f64,
    pub ode_rel_tol: f64,
    pub ode_step_size_initial: f64,
    pub ode_step_size_min: f64,
    pub ode_step_size_max: f64,
    pub ode_max_steps: usize,
}

impl Default for Control {
    fn default() -> Self {
        Self {
            assimilation_abs_tol: 1e-6,
            assimilation_rel_tol: 1e-6,
            assimilation_max_intervals: 100,
            light_environment: canopy_spline::Config::default(),
            ode_abs_tol: 1e-8,
            ode_rel_tol: 1e-6,
            ode_step_size_initial: 1e-3,
            ode_step_size_min: 1e-10,
            ode_step_size_max: 1.0,
            ode_max_steps: 100_000,
        }
    }
}

impl Control {
    /// Builds the quadrature config used for assimilation.
    ///
    /// # Errors
    ///
    /// Returns an error if a tolerance or the interval limit is invalid.
    pub fn quadrature_config(&self) -> Result<quadrature::Config, ConfigError> {
        Ok(quadrature::Config::new(
            self.assimilation_abs_tol,
            self.assimilation_rel_tol,
            self.assimilation_max_intervals,
        )?)
    }

    /// Builds the ODE solver config.
    ///
    /// # Errors
    ///
    /// Returns an error if a tolerance or step size is invalid.
    pub fn ode_config(&self) -> Result<ode::Config, ConfigError> {
        let config = ode::Config {
            method: ode::Method::CashKarp,
            abs_tol: self.ode_abs_tol,
            rel_tol: self.ode_rel_tol,
            step_size_initial: self.ode_step_size_initial,
            step_size_min: self.ode_step_size_min,
            step_size_max: self.ode_step_size_max,
            max_steps: self.ode_max_steps,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates the derived solver, quadrature and spline configs.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.quadrature_config()?;
        self.ode_config()?;
        self.light_environment.validate()?;
        Ok(())
    }
}

/// How individuals of a species are represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CohortKind {
    /// Cohorts of a whole number of identical individuals.
    #[default]
    Discrete,
    /// Cohorts carrying a real-valued density that decays with mortality.
    Continuous,
}

/// Placement of the sample plants in a rate surrogate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Spacing {
    /// Evenly spaced leaf masses from the seed to the maximum.
    #[default]
    Uniform,
    /// Leaf masses in constant ratio, denser near the seed.
    Geometric,
}

/// Settings for a species' rate surrogate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SurrogateParameters {
    /// Number of sample plants, at least five.
    pub n_plants: usize,
    /// Upper end of the sampled leaf-mass range (kg).
    pub mass_leaf_max: f64,
    pub spacing: Spacing,
}

impl Default for SurrogateParameters {
    fn default() -> Self {
        Self {
            n_plants: 50,
            mass_leaf_max: 1.0,
            spacing: Spacing::Uniform,
        }
    }
}

/// One species in a patch.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpeciesParameters {
    pub traits: Traits,
    pub cohort: CohortKind,
    /// Approximate rates with a surrogate instead of computing them per
    /// cohort.
    pub surrogate: Option<SurrogateParameters>,
}

impl SpeciesParameters {
    /// Validates traits and surrogate settings.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.traits.validate()?;
        if let Some(surrogate) = &self.surrogate {
            if surrogate.n_plants < crate::PlantSpline::MIN_PLANTS {
                return Err(ConfigError::TooFewPlants {
                    min: crate::PlantSpline::MIN_PLANTS,
                    got: surrogate.n_plants,
                });
            }
            check("mass_leaf_max", surrogate.mass_leaf_max, f64::MIN_POSITIVE..)?;
        }
        Ok(())
    }
}

/// Checks that `value` is finite and inside `range`.
pub(crate) fn check<R>(name: &'static str, value: f64, range: R) -> Result<(), ConfigError>
where
    R: RangeBounds<f64> + Debug,
{
    if value.is_finite() && range.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Parameter {
            name,
            value,
            expected: format!("{range:?}"),
        })
    }
}
