//! Populations of one strategy, and the species a patch holds.

use std::sync::Arc;

use canopy_core::OdeState;
use canopy_solvers::quadrature;

use crate::{
    CohortKind, CohortRecord, ContinuousCohort, DiscreteCohort, Error, LightEnvironment,
    PlantSpline, SpeciesParameters, Strategy, Unit,
};

/// Units of one strategy, in the order they were added.
///
/// The ODE state is the concatenation of the units' states. Rates come either
/// from each plant directly or, with a surrogate attached, by interpolation.
#[derive(Debug, Clone)]
pub struct Population<U> {
    strategy: Arc<Strategy>,
    units: Vec<U>,
    surrogate: Option<PlantSpline>,
}

impl<U: Unit> Population<U> {
    /// An empty population.
    #[must_use]
    pub fn new(strategy: Arc<Strategy>) -> Self {
        Self {
            strategy,
            units: Vec::new(),
            surrogate: None,
        }
    }

    /// Computes rates through `surrogate` instead of per plant.
    #[must_use]
    pub fn with_surrogate(mut self, surrogate: PlantSpline) -> Self {
        self.surrogate = Some(surrogate);
        self
    }

    pub fn add_seeds(&mut self, n: usize) {
        U::add_seeds(&mut self.units, &self.strategy, n);
    }

    #[must_use]
    pub fn strategy(&self) -> &Arc<Strategy> {
        &self.strategy
    }

    #[must_use]
    pub fn units(&self) -> &[U] {
        &self.units
    }

    #[must_use]
    pub fn surrogate(&self) -> Option<&PlantSpline> {
        self.surrogate.as_ref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Height of the tallest plant, or zero for an empty population.
    #[must_use]
    pub fn height_max(&self) -> f64 {
        self.units
            .iter()
            .map(|unit| unit.plant().height())
            .fold(0.0, f64::max)
    }

    /// Leaf area above height `z`, weighted by the individuals each unit
    /// represents.
    #[must_use]
    pub fn leaf_area_above(&self, z: f64) -> f64 {
        self.units
            .iter()
            .map(|unit| unit.weight() * unit.plant().leaf_area_above(z))
            .sum()
    }

    /// Updates every unit's rates under `env`.
    ///
    /// With a surrogate, the surrogate is refitted first. If a unit has
    /// outgrown it, it is rebuilt once over twice the largest leaf mass.
    ///
    /// # Errors
    ///
    /// Returns an error if any rate cannot be computed.
    pub fn compute_vars_phys(
        &mut self,
        env: &LightEnvironment,
        quadrature: &quadrature::Config,
    ) -> Result<(), Error> {
        let Some(surrogate) = &mut self.surrogate else {
            for unit in &mut self.units {
                unit.plant_mut().compute_vars_phys(env, quadrature)?;
            }
            return Ok(());
        };

        let largest = self
            .units
            .iter()
            .map(|unit| unit.plant().mass_leaf())
            .fold(0.0, f64::max);
        if largest > surrogate.mass_leaf_max() {
            let mass_leaf_max = 2.0 * largest;
            log::info!(
                "mass_leaf {largest} is beyond the rate surrogate (max {}), rebuilding up to {mass_leaf_max}",
                surrogate.mass_leaf_max()
            );
            surrogate.rebuild(mass_leaf_max, surrogate.n_plants(), env)?;
        } else {
            surrogate.compute_vars_phys(env)?;
        }

        for unit in &mut self.units {
            let rates = surrogate.rates_at(unit.plant().mass_leaf())?;
            unit.plant_mut().set_ode_rates(rates);
        }
        Ok(())
    }

    /// Leaf mass of every unit.
    #[must_use]
    pub fn mass_leaf(&self) -> Vec<f64> {
        self.units.iter().map(|unit| unit.plant().mass_leaf()).collect()
    }

    /// Sets the leaf mass of every unit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthMismatch`] unless there is exactly one value
    /// per unit.
    pub fn set_mass_leaf(&mut self, values: &[f64]) -> Result<(), Error> {
        if values.len() != self.units.len() {
            return Err(Error::LengthMismatch {
                expected: self.units.len(),
                got: values.len(),
            });
        }
        for (unit, &mass_leaf) in self.units.iter_mut().zip(values) {
            unit.plant_mut().set_mass_leaf(mass_leaf);
        }
        Ok(())
    }

    #[must_use]
    pub fn records(&self) -> Vec<CohortRecord> {
        self.units.iter().map(Unit::record).collect()
    }
}

impl<U: Unit> OdeState for Population<U> {
    fn ode_size(&self) -> usize {
        self.units.ode_size()
    }

    fn ode_values_set(&mut self, values: &[f64]) -> bool {
        self.units.ode_values_set(values)
    }

    fn ode_values(&self, out: &mut [f64]) {
        self.units.ode_values(out);
    }

    fn ode_rates(&self, out: &mut [f64]) {
        self.units.ode_rates(out);
    }
}

/// A population of either cohort kind.
#[derive(Debug, Clone)]
pub enum Species {
    Continuous(Population<ContinuousCohort>),
    Discrete(Population<DiscreteCohort>),
}

macro_rules! dispatch {
    ($species:expr, $population:ident => $body:expr) => {
        match $species {
            Species::Continuous($population) => $body,
            Species::Discrete($population) => $body,
        }
    };
}

impl Species {
    /// Builds an empty population from `parameters`.
    ///
    /// A surrogate, if requested, is fitted under full light.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters are invalid or the surrogate
    /// cannot be fitted.
    pub fn from_parameters(
        parameters: &SpeciesParameters,
        quadrature: quadrature::Config,
    ) -> Result<Self, Error> {
        parameters.validate()?;
        let strategy = Arc::new(Strategy::new(parameters.traits)?);
        let surrogate = parameters
            .surrogate
            .map(|settings| {
                PlantSpline::new(
                    Arc::clone(&strategy),
                    settings.mass_leaf_max,
                    settings.n_plants,
                    settings.spacing,
                    &LightEnvironment::full_light(),
                    quadrature,
                )
            })
            .transpose()?;

        Ok(match parameters.cohort {
            CohortKind::Continuous => Self::Continuous(attach(Population::new(strategy), surrogate)),
            CohortKind::Discrete => Self::Discrete(attach(Population::new(strategy), surrogate)),
        })
    }

    #[must_use]
    pub fn kind(&self) -> CohortKind {
        match self {
            Self::Continuous(_) => CohortKind::Continuous,
            Self::Discrete(_) => CohortKind::Discrete,
        }
    }

    #[must_use]
    pub fn strategy(&self) -> &Arc<Strategy> {
        dispatch!(self, population => population.strategy())
    }

    #[must_use]
    pub fn surrogate(&self) -> Option<&PlantSpline> {
        dispatch!(self, population => population.surrogate())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        dispatch!(self, population => population.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        dispatch!(self, population => population.is_empty())
    }

    pub fn add_seeds(&mut self, n: usize) {
        dispatch!(self, population => population.add_seeds(n));
    }

    #[must_use]
    pub fn height_max(&self) -> f64 {
        dispatch!(self, population => population.height_max())
    }

    #[must_use]
    pub fn leaf_area_above(&self, z: f64) -> f64 {
        dispatch!(self, population => population.leaf_area_above(z))
    }

    /// See [`Population::compute_vars_phys`].
    ///
    /// # Errors
    ///
    /// Returns an error if any rate cannot be computed.
    pub fn compute_vars_phys(
        &mut self,
        env: &LightEnvironment,
        quadrature: &quadrature::Config,
    ) -> Result<(), Error> {
        dispatch!(self, population => population.compute_vars_phys(env, quadrature))
    }

    #[must_use]
    pub fn mass_leaf(&self) -> Vec<f64> {
        dispatch!(self, population => population.mass_leaf())
    }

    /// See [`Population::set_mass_leaf`].
    ///
    /// # Errors
    ///
    /// Returns an error unless there is exactly one value per unit.
    pub fn set_mass_leaf(&mut self, values: &[f64]) -> Result<(), Error> {
        dispatch!(self, population => population.set_mass_leaf(values))
    }

    #[must_use]
    pub fn records(&self) -> Vec<CohortRecord> {
        dispatch!(self, population => population.records())
    }
}

fn attach<U: Unit>(population: Population<U>, surrogate: Option<PlantSpline>) -> Population<U> {
    match surrogate {
        Some(surrogate) => population.with_surrogate(surrogate),
        None => population,
    }
}

impl OdeState for Species {
    fn ode_size(&self) -> usize {
        dispatch!(self, population => population.ode_size())
    }

    fn ode_values_set(&mut self, values: &[f64]) -> bool {
        dispatch!(self, population => population.ode_values_set(values))
    }

    fn ode_values(&self, out: &mut [f64]) {
        dispatch!(self, population => population.ode_values(out));
    }

    fn ode_rates(&self, out: &mut [f64]) {
        dispatch!(self, population => population.ode_rates(out));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use crate::{PLANT_ODE_SIZE, Spacing, SurrogateParameters, Traits};

    // --- Test fixtures ---

    fn strategy() -> Arc<Strategy> {
        Arc::new(Strategy::new(Traits::default()).expect("valid traits"))
    }

    fn grown(strategy: &Arc<Strategy>, n: usize) -> Population<DiscreteCohort> {
        let mut population = Population::new(Arc::clone(strategy));
        for i in 0..n {
            population.add_seeds(i + 1);
        }
        let seed = strategy.mass_leaf_seed();
        let sizes: Vec<f64> = (0..n).map(|i| seed * (1.0 + i as f64)).collect();
        population.set_mass_leaf(&sizes).expect("one size per unit");
        population
    }

    // --- Tests ---

    #[test]
    fn ode_size_sums_units() {
        let population = grown(&strategy(), 4);
        assert_eq!(population.len(), 4);
        assert_eq!(population.ode_size(), 4 * PLANT_ODE_SIZE);
    }

    #[test]
    fn state_round_trips() {
        let mut population = grown(&strategy(), 3);
        let mut values = population.ode_values_vec();
        for (i, value) in values.iter_mut().enumerate() {
            *value *= 1.0 + 0.1 * i as f64;
        }
        values[1] = 0.3;

        assert!(population.ode_values_set(&values));
        assert_eq!(population.ode_values_vec(), values);
        assert!(!population.ode_values_set(&values));
    }

    #[test]
    fn leaf_area_is_weighted_by_individuals() {
        let population = grown(&strategy(), 2);
        let units = population.units();
        let expected = units[0].plant().leaf_area() + 2.0 * units[1].plant().leaf_area();

        assert_relative_eq!(population.leaf_area_above(0.0), expected);
        assert_relative_eq!(population.leaf_area_above(population.height_max()), 0.0);
    }

    #[test]
    fn empty_population_has_no_canopy() {
        let population: Population<ContinuousCohort> = Population::new(strategy());
        assert!(population.is_empty());
        assert_relative_eq!(population.height_max(), 0.0);
        assert_relative_eq!(population.leaf_area_above(0.0), 0.0);
    }

    #[test]
    fn set_mass_leaf_checks_length() {
        let mut population = grown(&strategy(), 2);
        let err = population.set_mass_leaf(&[1.0]).expect_err("one value short");
        assert!(matches!(
            err,
            Error::LengthMismatch {
                expected: 2,
                got: 1
            }
        ));
    }

    #[test]
    fn direct_rates_match_plants() {
        let strategy = strategy();
        let mut population = grown(&strategy, 3);
        let env = LightEnvironment::full_light();
        let quadrature = quadrature::Config::default();

        population
            .compute_vars_phys(&env, &quadrature)
            .expect("rates");

        for unit in population.units() {
            let mut plant = unit.plant().clone();
            plant.compute_vars_phys(&env, &quadrature).expect("rates");
            assert_eq!(unit.plant().rates(), plant.rates());
            assert!(unit.plant().physiology().is_some());
        }
    }

    #[test]
    fn outgrown_surrogate_is_rebuilt() {
        let strategy = strategy();
        let env = LightEnvironment::full_light();
        let quadrature = quadrature::Config::default();
        let seed = strategy.mass_leaf_seed();
        let surrogate = PlantSpline::new(
            Arc::clone(&strategy),
            2.0 * seed,
            5,
            Spacing::Uniform,
            &env,
            quadrature,
        )
        .expect("valid surrogate");

        let mut population = grown(&strategy, 3).with_surrogate(surrogate);
        population
            .compute_vars_phys(&env, &quadrature)
            .expect("rebuilt surrogate covers every unit");

        let surrogate = population.surrogate().expect("attached");
        assert_relative_eq!(surrogate.mass_leaf_max(), 6.0 * seed);
        for unit in population.units() {
            assert!(unit.plant().physiology().is_none());
            assert!(unit.plant().rates()[0] > 0.0);
        }
    }

    #[test]
    fn species_from_parameters() {
        let parameters = SpeciesParameters {
            cohort: CohortKind::Continuous,
            surrogate: Some(SurrogateParameters {
                n_plants: 6,
                mass_leaf_max: 0.01,
                spacing: Spacing::Geometric,
            }),
            ..SpeciesParameters::default()
        };

        let mut species = Species::from_parameters(&parameters, quadrature::Config::default())
            .expect("valid parameters");
        species.add_seeds(3);
        species.add_seeds(2);

        assert_eq!(species.kind(), CohortKind::Continuous);
        assert_eq!(species.len(), 1);
        assert_eq!(species.surrogate().map(PlantSpline::n_plants), Some(6));
        assert_relative_eq!(species.records()[0].weight, 5.0);
    }
}
