//! Cohorts: the units a population is made of.

use std::sync::Arc;

use canopy_core::OdeState;
use serde::{Deserialize, Serialize};

use crate::{CohortKind, Plant, Strategy};

/// The smallest simulated entity in a population.
///
/// A unit wraps a [`Plant`] with a weight that says how many individuals it
/// stands for, and exposes the plant's ODE state.
pub trait Unit: OdeState + Clone {
    const KIND: CohortKind;

    /// Adds `n` seeds of `strategy` to `units`.
    ///
    /// Each unit kind decides whether that appends a new unit or grows an
    /// existing one.
    fn add_seeds(units: &mut Vec<Self>, strategy: &Arc<Strategy>, n: usize);

    fn plant(&self) -> &Plant;

    fn plant_mut(&mut self) -> &mut Plant;

    /// Number of individuals this unit represents.
    fn weight(&self) -> f64;

    /// A read-only snapshot.
    fn record(&self) -> CohortRecord {
        let plant = self.plant();
        CohortRecord {
            kind: Self::KIND,
            mass_leaf: plant.mass_leaf(),
            height: plant.height(),
            leaf_area: plant.leaf_area(),
            mortality: plant.mortality(),
            fecundity: plant.fecundity(),
            weight: self.weight(),
            rates: plant.rates(),
        }
    }
}

/// Snapshot of one unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CohortRecord {
    pub kind: CohortKind,
    pub mass_leaf: f64,
    pub height: f64,
    pub leaf_area: f64,
    pub mortality: f64,
    pub fecundity: f64,
    pub weight: f64,
    /// `[growth, mortality, fecundity]` rates from the last rate
    /// computation. A patch recomputes them after every accepted step; a
    /// unit whose size was set by hand keeps its old rates until then.
    pub rates: [f64; 3],
}

/// A whole number of identical individuals.
#[derive(Debug, Clone)]
pub struct DiscreteCohort {
    plant: Plant,
    individuals: usize,
}

impl DiscreteCohort {
    #[must_use]
    pub fn new(strategy: Arc<Strategy>, individuals: usize) -> Self {
        Self {
            plant: Plant::new(strategy),
            individuals,
        }
    }

    #[must_use]
    pub fn individuals(&self) -> usize {
        self.individuals
    }
}

impl Unit for DiscreteCohort {
    const KIND: CohortKind = CohortKind::Discrete;

    /// Appends one cohort holding all `n` seeds.
    fn add_seeds(units: &mut Vec<Self>, strategy: &Arc<Strategy>, n: usize) {
        if n > 0 {
            units.push(Self::new(Arc::clone(strategy), n));
        }
    }

    fn plant(&self) -> &Plant {
        &self.plant
    }

    fn plant_mut(&mut self) -> &mut Plant {
        &mut self.plant
    }

    #[allow(clippy::cast_precision_loss)]
    fn weight(&self) -> f64 {
        self.individuals as f64
    }
}

/// A density of individuals, thinned by the cohort's cumulative mortality.
#[derive(Debug, Clone)]
pub struct ContinuousCohort {
    plant: Plant,
    density: f64,
}

impl ContinuousCohort {
    #[must_use]
    pub fn new(strategy: Arc<Strategy>, density: f64) -> Self {
        Self {
            plant: Plant::new(strategy),
            density,
        }
    }

    /// Density at establishment, before mortality.
    #[must_use]
    pub fn density(&self) -> f64 {
        self.density
    }

    fn is_seed(&self) -> bool {
        let plant = &self.plant;
        plant.mass_leaf() == plant.strategy().mass_leaf_seed() && plant.mortality() == 0.0
    }
}

impl Unit for ContinuousCohort {
    const KIND: CohortKind = CohortKind::Continuous;

    /// Folds the seeds into the newest cohort while it is still at seed
    /// size, and starts a new cohort otherwise.
    #[allow(clippy::cast_precision_loss)]
    fn add_seeds(units: &mut Vec<Self>, strategy: &Arc<Strategy>, n: usize) {
        if n == 0 {
            return;
        }
        match units.last_mut() {
            Some(newest) if newest.is_seed() => newest.density += n as f64,
            _ => units.push(Self::new(Arc::clone(strategy), n as f64)),
        }
    }

    fn plant(&self) -> &Plant {
        &self.plant
    }

    fn plant_mut(&mut self) -> &mut Plant {
        &mut self.plant
    }

    fn weight(&self) -> f64 {
        self.density * (-self.plant.mortality()).exp()
    }
}

macro_rules! delegate_ode_state {
    ($unit:ty) => {
        impl OdeState for $unit {
            fn ode_size(&self) -> usize {
                self.plant.ode_size()
            }

            fn ode_values_set(&mut self, values: &[f64]) -> bool {
                self.plant.ode_values_set(values)
            }

            fn ode_values(&self, out: &mut [f64]) {
                self.plant.ode_values(out);
            }

            fn ode_rates(&self, out: &mut [f64]) {
                self.plant.ode_rates(out);
            }
        }
    };
}

delegate_ode_state!(DiscreteCohort);
delegate_ode_state!(ContinuousCohort);
