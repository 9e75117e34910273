//! Size-structured plant populations competing for light.
//!
//! A [`Patch`] holds one or more [`Species`], each a [`Population`] of
//! cohorts sharing a [`Strategy`]. Plants shade each other through a
//! [`LightEnvironment`] fitted to the canopy, and their growth, mortality
//! and fecundity rates form the right-hand side of an ODE system that the
//! patch exposes to the solvers in `canopy-solvers`.
//!
//! ```no_run
//! use canopy_model::{Parameters, Patch};
//!
//! # fn main() -> Result<(), canopy_model::Error> {
//! let parameters = Parameters::from_file("patch.toml")?;
//! let mut patch = Patch::new(parameters)?;
//! patch.add_seeds(0, 10)?;
//! patch.advance(5.0)?;
//!
//! for cohort in patch.cohorts(0)? {
//!     println!("height {:.3} m, weight {:.3}", cohort.height, cohort.weight);
//! }
//! # Ok(())
//! # }
//! ```

mod cohort;
mod environment;
mod error;
mod parameters;
mod patch;
mod plant;
mod plant_spline;
mod population;
mod strategy;

pub use cohort::{CohortRecord, ContinuousCohort, DiscreteCohort, Unit};
pub use environment::{LightEnvironment, LightState};
pub use error::{ConfigError, DomainError, Error};
pub use parameters::{
    CohortKind, Control, Parameters, Spacing, SpeciesParameters, SurrogateParameters,
};
pub use patch::Patch;
pub use plant::{PLANT_ODE_SIZE, Physiology, Plant};
pub use plant_spline::PlantSpline;
pub use population::{Population, Species};
pub use strategy::{Size, Strategy, Traits};
