//! A rate surrogate for plants of one strategy.
//!
//! Computing a plant's rates means integrating assimilation over its crown,
//! which dominates the cost of a derivative evaluation. A [`PlantSpline`]
//! computes rates directly for a handful of sample plants spanning
//! `[seed, mass_leaf_max]` and interpolates every other size from a
//! three-channel spline.

use std::sync::Arc;

use canopy_solvers::quadrature;
use canopy_spline::{Extrapolate, MultiSpline};

use crate::{
    ConfigError, DomainError, Error, LightEnvironment, PLANT_ODE_SIZE, Plant, Spacing, Strategy,
};

/// Interpolated rates `[growth, mortality, fecundity]` as a function of leaf
/// mass.
///
/// Sizes below the seed evaluate at the seed. Sizes above `mass_leaf_max`
/// are a [`DomainError::SizeOutOfRange`]; the owner is expected to rebuild
/// over a wider range and retry.
#[derive(Debug, Clone)]
pub struct PlantSpline {
    strategy: Arc<Strategy>,
    plants: Vec<Plant>,
    spacing: Spacing,
    rates: MultiSpline,
    quadrature: quadrature::Config,
}

impl PlantSpline {
    /// Fewest sample plants a surrogate may have.
    pub const MIN_PLANTS: usize = 5;

    /// Samples `n_plants` sizes and fits their rates under `env`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if there are too few sample plants or
    /// `mass_leaf_max` does not exceed the seed, and a [`DomainError`] if a
    /// sample plant's rates cannot be computed.
    pub fn new(
        strategy: Arc<Strategy>,
        mass_leaf_max: f64,
        n_plants: usize,
        spacing: Spacing,
        env: &LightEnvironment,
        quadrature: quadrature::Config,
    ) -> Result<Self, Error> {
        let mut surrogate = Self {
            strategy,
            plants: Vec::new(),
            spacing,
            rates: MultiSpline::new(PLANT_ODE_SIZE),
            quadrature,
        };
        surrogate.rebuild(mass_leaf_max, n_plants, env)?;
        Ok(surrogate)
    }

    /// Regenerates the sample plants over `[seed, mass_leaf_max]` and refits.
    ///
    /// # Errors
    ///
    /// Same conditions as [`PlantSpline::new`]. The surrogate is unchanged
    /// if the new range is invalid.
    pub fn rebuild(
        &mut self,
        mass_leaf_max: f64,
        n_plants: usize,
        env: &LightEnvironment,
    ) -> Result<(), Error> {
        if n_plants < Self::MIN_PLANTS {
            return Err(ConfigError::TooFewPlants {
                min: Self::MIN_PLANTS,
                got: n_plants,
            }
            .into());
        }
        let seed = self.strategy.mass_leaf_seed();
        if !(mass_leaf_max > seed && mass_leaf_max.is_finite()) {
            return Err(ConfigError::SurrogateRange {
                max: mass_leaf_max,
                seed,
            }
            .into());
        }

        self.plants = sample_sizes(seed, mass_leaf_max, n_plants, self.spacing)
            .into_iter()
            .map(|mass_leaf| {
                let mut plant = Plant::new(Arc::clone(&self.strategy));
                plant.set_mass_leaf(mass_leaf);
                plant
            })
            .collect();
        self.compute_vars_phys(env)?;
        Ok(())
    }

    /// Recomputes the sample plants' rates under `env` and refits.
    ///
    /// # Errors
    ///
    /// Returns an error if any sample's rates cannot be computed or are not
    /// finite.
    pub fn compute_vars_phys(&mut self, env: &LightEnvironment) -> Result<(), DomainError> {
        let mut rates = MultiSpline::new(PLANT_ODE_SIZE).with_extrapolate(Extrapolate::Clamp);
        for plant in &mut self.plants {
            plant.compute_vars_phys(env, &self.quadrature)?;
            rates
                .add_point(plant.mass_leaf(), &plant.rates())
                .map_err(DomainError::Surrogate)?;
        }
        rates.init_self().map_err(DomainError::Surrogate)?;

        log::debug!(
            "refitted rate surrogate with {} plants up to mass_leaf {}",
            self.plants.len(),
            self.mass_leaf_max()
        );
        self.rates = rates;
        Ok(())
    }

    /// Interpolated rates at leaf mass `mass_leaf`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::SizeOutOfRange`] if `mass_leaf` is above the
    /// sampled range or not finite.
    pub fn rates_at(&self, mass_leaf: f64) -> Result<[f64; PLANT_ODE_SIZE], DomainError> {
        let mut out = [0.0; PLANT_ODE_SIZE];
        self.ode_rates(mass_leaf, &mut out)?;
        Ok(out)
    }

    /// Writes the interpolated rates at `mass_leaf` into `out`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`PlantSpline::rates_at`].
    pub fn ode_rates(&self, mass_leaf: f64, out: &mut [f64]) -> Result<(), DomainError> {
        let max = self.mass_leaf_max();
        if !mass_leaf.is_finite() || mass_leaf > max {
            return Err(DomainError::SizeOutOfRange { mass_leaf, max });
        }
        self.rates
            .eval_into(mass_leaf, out)
            .map_err(DomainError::Surrogate)
    }

    /// Largest sampled leaf mass.
    #[must_use]
    pub fn mass_leaf_max(&self) -> f64 {
        self.plants.last().map_or(f64::NAN, Plant::mass_leaf)
    }

    /// Smallest sampled leaf mass, the seed's.
    #[must_use]
    pub fn mass_leaf_min(&self) -> f64 {
        self.strategy.mass_leaf_seed()
    }

    #[must_use]
    pub fn n_plants(&self) -> usize {
        self.plants.len()
    }

    /// The sample plants, smallest first, with their directly computed
    /// rates.
    #[must_use]
    pub fn plants(&self) -> &[Plant] {
        &self.plants
    }

    #[must_use]
    pub fn spline(&self) -> &MultiSpline {
        &self.rates
    }

    #[must_use]
    pub fn strategy(&self) -> &Arc<Strategy> {
        &self.strategy
    }

    #[must_use]
    pub fn spacing(&self) -> Spacing {
        self.spacing
    }
}

/// Leaf masses from `seed` to `max` inclusive.
#[allow(clippy::cast_precision_loss)]
fn sample_sizes(seed: f64, max: f64, n: usize, spacing: Spacing) -> Vec<f64> {
    let last = (n - 1) as f64;
    let mut sizes: Vec<f64> = (0..n)
        .map(|i| {
            let frac = i as f64 / last;
            match spacing {
                Spacing::Uniform => seed + frac * (max - seed),
                Spacing::Geometric => seed * (max / seed).powf(frac),
            }
        })
        .collect();
    sizes[0] = seed;
    sizes[n - 1] = max;
    sizes
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use crate::Traits;

    // --- Test fixtures ---

    fn strategy() -> Arc<Strategy> {
        Arc::new(Strategy::new(Traits::default()).expect("valid traits"))
    }

    fn surrogate(n_plants: usize, spacing: Spacing) -> Result<PlantSpline, Error> {
        let strategy = strategy();
        let max = 1000.0 * strategy.mass_leaf_seed();
        PlantSpline::new(
            strategy,
            max,
            n_plants,
            spacing,
            &LightEnvironment::full_light(),
            quadrature::Config::default(),
        )
    }

    // --- Tests ---

    #[test]
    fn too_few_plants_is_a_config_error() {
        let err = surrogate(4, Spacing::Uniform).expect_err("four plants are too few");
        assert!(matches!(
            err,
            Error::Config(ConfigError::TooFewPlants { min: 5, got: 4 })
        ));
    }

    #[test]
    fn range_must_exceed_the_seed() {
        let strategy = strategy();
        let seed = strategy.mass_leaf_seed();
        let err = PlantSpline::new(
            strategy,
            seed,
            10,
            Spacing::Uniform,
            &LightEnvironment::full_light(),
            quadrature::Config::default(),
        )
        .expect_err("empty range");
        assert!(matches!(err, Error::Config(ConfigError::SurrogateRange { .. })));
    }

    #[test]
    fn seed_rates_match_direct_computation() {
        let surrogate = surrogate(5, Spacing::Uniform).expect("valid surrogate");
        let seed = surrogate.mass_leaf_min();

        let mut plant = Plant::new(Arc::clone(surrogate.strategy()));
        plant
            .compute_vars_phys(&LightEnvironment::full_light(), &quadrature::Config::default())
            .expect("seed rates");
        let direct = plant.rates();

        let interpolated = surrogate.rates_at(seed).expect("seed is in range");
        for (approx, exact) in interpolated.iter().zip(direct) {
            assert_relative_eq!(*approx, exact, max_relative = 1e-6);
        }
    }

    #[test]
    fn sizes_below_the_seed_clamp() {
        let surrogate = surrogate(5, Spacing::Uniform).expect("valid surrogate");
        let seed = surrogate.mass_leaf_min();

        assert_eq!(
            surrogate.rates_at(0.5 * seed).expect("clamped"),
            surrogate.rates_at(seed).expect("in range")
        );
    }

    #[test]
    fn sizes_above_the_range_are_domain_errors() {
        let surrogate = surrogate(5, Spacing::Uniform).expect("valid surrogate");
        let max = surrogate.mass_leaf_max();

        assert!(surrogate.rates_at(max).is_ok());
        assert_eq!(
            surrogate.rates_at(2.0 * max),
            Err(DomainError::SizeOutOfRange {
                mass_leaf: 2.0 * max,
                max
            })
        );
        assert!(matches!(
            surrogate.rates_at(f64::NAN),
            Err(DomainError::SizeOutOfRange { .. })
        ));
    }

    #[test]
    fn geometric_spacing_has_constant_ratio() {
        let surrogate = surrogate(7, Spacing::Geometric).expect("valid surrogate");
        let xs = surrogate.spline().xs();

        assert_eq!(xs.len(), 7);
        let ratio = xs[1] / xs[0];
        for pair in xs.windows(2) {
            assert_relative_eq!(pair[1] / pair[0], ratio, max_relative = 1e-10);
        }
        assert_relative_eq!(ratio.powi(6), 1000.0, max_relative = 1e-10);
    }

    #[test]
    fn rebuild_widens_the_range() {
        let mut surrogate = surrogate(5, Spacing::Uniform).expect("valid surrogate");
        let max = surrogate.mass_leaf_max();

        surrogate
            .rebuild(2.0 * max, 9, &LightEnvironment::full_light())
            .expect("wider range");

        assert_eq!(surrogate.n_plants(), 9);
        assert_relative_eq!(surrogate.mass_leaf_max(), 2.0 * max);
        assert!(surrogate.rates_at(1.5 * max).is_ok());
    }

    #[test]
    fn shade_refit_keeps_the_sample_sizes() {
        let mut surrogate = surrogate(5, Spacing::Uniform).expect("valid surrogate");
        let before = surrogate.spline().xs().to_vec();
        let mortality_open = surrogate.rates_at(before[2]).expect("in range")[1];

        surrogate
            .compute_vars_phys(&LightEnvironment::uniform(0.05))
            .expect("shaded rates");

        assert_eq!(surrogate.spline().xs(), before.as_slice());
        assert!(surrogate.rates_at(before[2]).expect("in range")[1] > mortality_open);
    }
}
