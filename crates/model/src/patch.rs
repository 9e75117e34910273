//! A patch of ground where species compete for light.
//!
//! The patch is the [`OdeSystem`] the solver integrates. Its state is the
//! concatenation of every species' state, in the order the species were
//! configured. Computing derivatives follows a fixed sequence:
//!
//! 1. write the trial state into every plant
//! 2. if the state changed, refit the light environment to the new canopy
//! 3. compute every unit's rates under that light environment
//! 4. read the rates back out
//!
//! Canopy openness at height `z` is Beer's law over the leaf area above `z`:
//!
//! ```text
//! E(z) = exp(−c_ext · Σ weight · leaf_area · Q(z, height) / patch_area)
//! ```

use std::mem;

use canopy_core::{Functor, OdeState, OdeSystem};
use canopy_solvers::{ode, quadrature};

use crate::{
    CohortRecord, ConfigError, Error, LightEnvironment, LightState, Parameters, Species,
};

#[derive(Debug, Clone)]
pub struct Patch {
    c_ext: f64,
    patch_area: f64,
    quadrature: quadrature::Config,
    light_config: canopy_spline::Config,
    species: Vec<Species>,
    light_environment: LightEnvironment,
    light_state: LightState,
    light_rebuilds: usize,
    solver: ode::Solver,
}

impl Patch {
    /// Builds an empty patch from validated `parameters`.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is invalid or a species' rate
    /// surrogate cannot be fitted.
    pub fn new(parameters: Parameters) -> Result<Self, Error> {
        parameters.validate()?;
        let control = parameters.control;
        let quadrature = control.quadrature_config()?;
        let solver = ode::Solver::new(control.ode_config()?).map_err(ConfigError::from)?;
        let species = parameters
            .species
            .iter()
            .map(|species| Species::from_parameters(species, quadrature))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            c_ext: parameters.c_ext,
            patch_area: parameters.patch_area,
            quadrature,
            light_config: control.light_environment,
            species,
            light_environment: LightEnvironment::full_light(),
            light_state: LightState::Stale,
            light_rebuilds: 0,
            solver,
        })
    }

    /// Number of species.
    #[must_use]
    pub fn len(&self) -> usize {
        self.species.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    /// Current solver time.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.solver.time()
    }

    #[must_use]
    pub fn c_ext(&self) -> f64 {
        self.c_ext
    }

    #[must_use]
    pub fn patch_area(&self) -> f64 {
        self.patch_area
    }

    /// The species at `idx`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchSpecies`] if `idx` is out of range.
    pub fn species(&self, idx: usize) -> Result<&Species, Error> {
        self.species.get(idx).ok_or(Error::NoSuchSpecies {
            idx,
            len: self.species.len(),
        })
    }

    fn species_mut(&mut self, idx: usize) -> Result<&mut Species, Error> {
        let len = self.species.len();
        self.species
            .get_mut(idx)
            .ok_or(Error::NoSuchSpecies { idx, len })
    }

    /// Adds `n` seeds to species `idx`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchSpecies`] if `idx` is out of range.
    pub fn add_seeds(&mut self, idx: usize, n: usize) -> Result<(), Error> {
        self.species_mut(idx)?.add_seeds(n);
        self.light_state = LightState::Stale;
        Ok(())
    }

    /// Leaf mass of every unit of species `idx`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchSpecies`] if `idx` is out of range.
    pub fn mass_leaf(&self, idx: usize) -> Result<Vec<f64>, Error> {
        Ok(self.species(idx)?.mass_leaf())
    }

    /// Sets the leaf mass of every unit of species `idx`.
    ///
    /// # Errors
    ///
    /// Returns an error if `idx` is out of range or `values` does not have
    /// one entry per unit.
    pub fn set_mass_leaf(&mut self, values: &[f64], idx: usize) -> Result<(), Error> {
        self.species_mut(idx)?.set_mass_leaf(values)?;
        self.light_state = LightState::Stale;
        Ok(())
    }

    /// Snapshots of every unit of species `idx`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchSpecies`] if `idx` is out of range.
    pub fn cohorts(&self, idx: usize) -> Result<Vec<CohortRecord>, Error> {
        Ok(self.species(idx)?.records())
    }

    /// Height of the tallest plant in the patch.
    #[must_use]
    pub fn height_max(&self) -> f64 {
        self.species
            .iter()
            .map(Species::height_max)
            .fold(0.0, f64::max)
    }

    /// Canopy openness at `height`, computed from every plant directly.
    #[must_use]
    pub fn canopy_openness(&self, height: f64) -> f64 {
        let leaf_area: f64 = self
            .species
            .iter()
            .map(|species| species.leaf_area_above(height))
            .sum();
        (-self.c_ext * leaf_area / self.patch_area).exp()
    }

    /// The light environment from the last rebuild.
    #[must_use]
    pub fn light_environment(&self) -> &LightEnvironment {
        &self.light_environment
    }

    #[must_use]
    pub fn light_state(&self) -> LightState {
        self.light_state
    }

    /// Number of times the light environment has been fitted.
    #[must_use]
    pub fn light_environment_rebuilds(&self) -> usize {
        self.light_rebuilds
    }

    /// Refits the light environment to the current canopy.
    ///
    /// # Errors
    ///
    /// Returns an error if canopy openness cannot be fitted.
    pub fn compute_light_environment(&mut self) -> Result<(), Error> {
        let height_max = self.height_max();
        let light_environment = LightEnvironment::fit(
            Functor::new(&*self, Self::canopy_openness),
            height_max,
            &self.light_config,
        )?;
        self.light_environment = light_environment;
        self.light_rebuilds += 1;
        self.light_state = LightState::Fresh;
        Ok(())
    }

    /// Updates every unit's rates, refitting the light environment first if
    /// it is stale.
    ///
    /// # Errors
    ///
    /// Returns an error if the light environment or any rate cannot be
    /// computed.
    pub fn compute_vars_phys(&mut self) -> Result<(), Error> {
        if self.light_state == LightState::Stale {
            self.compute_light_environment()?;
        }
        for species in &mut self.species {
            species.compute_vars_phys(&self.light_environment, &self.quadrature)?;
        }
        Ok(())
    }

    /// Derivatives at state `y`, leaving this patch untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthMismatch`] if `y` does not match the patch's
    /// state, or any error from computing rates.
    pub fn derivs_at(&self, time: f64, y: &[f64]) -> Result<Vec<f64>, Error> {
        let expected = self.ode_size();
        if y.len() != expected {
            return Err(Error::LengthMismatch {
                expected,
                got: y.len(),
            });
        }
        let mut scratch = self.clone();
        let mut dydt = vec![0.0; expected];
        scratch.derivs(time, y, &mut dydt)?;
        Ok(dydt)
    }

    /// Takes one error-controlled step and keeps the accepted state.
    ///
    /// Rates are recomputed at the accepted state, so [`Patch::cohorts`]
    /// reports rates that match the reported sizes. A failed step leaves the
    /// state and the clock where they were.
    ///
    /// # Errors
    ///
    /// Returns an error if rates cannot be computed or the step size
    /// collapses.
    pub fn step_deterministic(&mut self) -> Result<ode::Step, Error> {
        let mut solver = mem::take(&mut self.solver);
        let result = solver.step(self);
        self.solver = solver;
        let step = result.map_err(unwrap_system_error)?;
        self.compute_vars_phys()?;
        Ok(step)
    }

    /// Steps until `t_end`, then recomputes rates at the final state.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Patch::step_deterministic`], plus the solver's
    /// step limit.
    pub fn advance(&mut self, t_end: f64) -> Result<ode::Solution, Error> {
        let mut solver = mem::take(&mut self.solver);
        let result = solver.advance(self, t_end, ());
        self.solver = solver;
        let solution = result.map_err(unwrap_system_error)?;
        self.compute_vars_phys()?;
        log::debug!(
            "advanced to t = {} in {} steps ({} rejected)",
            solution.time,
            solution.steps,
            solution.rejected
        );
        Ok(solution)
    }
}

/// Recovers a patch error that the solver boxed on its way out.
fn unwrap_system_error(err: ode::Error) -> Error {
    match err {
        ode::Error::System(source) => match source.downcast::<Error>() {
            Ok(err) => *err,
            Err(source) => Error::Solver(ode::Error::System(source)),
        },
        err => Error::Solver(err),
    }
}

impl OdeState for Patch {
    fn ode_size(&self) -> usize {
        self.species.ode_size()
    }

    /// Marks the light environment stale if any value changed.
    fn ode_values_set(&mut self, values: &[f64]) -> bool {
        let changed = self.species.ode_values_set(values);
        if changed {
            self.light_state = LightState::Stale;
        }
        changed
    }

    fn ode_values(&self, out: &mut [f64]) {
        self.species.ode_values(out);
    }

    fn ode_rates(&self, out: &mut [f64]) {
        self.species.ode_rates(out);
    }
}

impl OdeSystem for Patch {
    type Error = Error;

    fn derivs(&mut self, _time: f64, y: &[f64], dydt: &mut [f64]) -> Result<(), Self::Error> {
        self.ode_values_set(y);
        self.compute_vars_phys()?;
        self.ode_rates(dydt);
        Ok(())
    }
}
