//! Individual plants.
//!
//! A plant's ODE state is `[mass_leaf, mortality, fecundity]`: leaf mass,
//! cumulative mortality (the negative log of survival probability) and
//! cumulative seed output. Rates come from the carbon budget
//!
//! ```text
//! A   = LA · ∫₀ʰ c_p1 E(z) / (E(z) + c_p2) · q(z, h) dz
//! net = c_bio · y · (A − R) − T
//! ```
//!
//! where `R` is respiration, `T` turnover and `E(z)` canopy openness.

use std::sync::Arc;

use canopy_core::OdeState;
use canopy_solvers::quadrature;
use serde::Serialize;

use crate::{DomainError, LightEnvironment, Size, Strategy};

/// Number of ODE variables per plant.
pub const PLANT_ODE_SIZE: usize = 3;

/// Physiological rates computed directly from the carbon budget.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Physiology {
    /// Gross assimilation (mol/yr).
    pub assimilation: f64,
    /// Maintenance respiration (mol/yr).
    pub respiration: f64,
    /// Tissue turnover (kg/yr).
    pub turnover: f64,
    /// Net dry mass production (kg/yr).
    pub net_production: f64,
    pub reproduction_fraction: f64,
    /// Rate of change of leaf mass (kg/yr).
    pub growth_rate: f64,
    pub mortality_rate: f64,
    /// Seed production rate (1/yr).
    pub fecundity_rate: f64,
}

impl Physiology {
    /// Computes every rate for a plant of `size` under `env`.
    ///
    /// # Errors
    ///
    /// Returns an error if the assimilation integral fails.
    pub fn compute(
        strategy: &Strategy,
        size: &Size,
        env: &LightEnvironment,
        quadrature: &quadrature::Config,
    ) -> Result<Self, DomainError> {
        let t = strategy.traits();
        let height = size.height;

        let assimilation = if height > 0.0 {
            let integral = quadrature::integrate(
                |z: f64| {
                    let e = env.openness(z);
                    t.c_p1 * e / (e + t.c_p2) * strategy.leaf_density(z, height)
                },
                0.0,
                height,
                quadrature,
            )?;
            size.leaf_area * integral.value
        } else {
            0.0
        };

        let respiration = t.c_rl * size.leaf_area
            + t.c_rs * size.mass_sapwood / t.rho
            + t.c_rb * size.mass_bark / t.rho
            + t.c_rr * size.mass_root;
        let turnover = t.k_l * size.mass_leaf
            + t.k_b * size.mass_bark
            + t.k_s * size.mass_sapwood
            + t.k_r * size.mass_root;
        let net_production = t.c_bio * t.y * (assimilation - respiration) - turnover;

        let reproduction_fraction = strategy.reproduction_fraction(height);
        let (growth_rate, fecundity_rate) = if net_production > 0.0 {
            (
                (1.0 - reproduction_fraction) * net_production
                    / strategy.dmass_total_dmass_leaf(size.leaf_area),
                reproduction_fraction * net_production / (t.c_acc * t.s),
            )
        } else {
            (0.0, 0.0)
        };
        let mortality_rate = t.c_d0 + t.c_d2 * (-t.c_d3 * net_production / size.leaf_area).exp();

        Ok(Self {
            assimilation,
            respiration,
            turnover,
            net_production,
            reproduction_fraction,
            growth_rate,
            mortality_rate,
            fecundity_rate,
        })
    }

    /// Rates in ODE order.
    #[must_use]
    pub fn ode_rates(&self) -> [f64; PLANT_ODE_SIZE] {
        [self.growth_rate, self.mortality_rate, self.fecundity_rate]
    }
}

/// A single plant.
#[derive(Debug, Clone)]
pub struct Plant {
    strategy: Arc<Strategy>,
    size: Size,
    mortality: f64,
    fecundity: f64,
    rates: [f64; PLANT_ODE_SIZE],
    physiology: Option<Physiology>,
}

impl Plant {
    /// Creates a seed of `strategy`.
    #[must_use]
    pub fn new(strategy: Arc<Strategy>) -> Self {
        let size = strategy.size(strategy.mass_leaf_seed());
        Self {
            strategy,
            size,
            mortality: 0.0,
            fecundity: 0.0,
            rates: [0.0; PLANT_ODE_SIZE],
            physiology: None,
        }
    }

    #[must_use]
    pub fn strategy(&self) -> &Arc<Strategy> {
        &self.strategy
    }

    #[must_use]
    pub fn size(&self) -> &Size {
        &self.size
    }

    #[must_use]
    pub fn mass_leaf(&self) -> f64 {
        self.size.mass_leaf
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.size.height
    }

    #[must_use]
    pub fn leaf_area(&self) -> f64 {
        self.size.leaf_area
    }

    #[must_use]
    pub fn mortality(&self) -> f64 {
        self.mortality
    }

    #[must_use]
    pub fn fecundity(&self) -> f64 {
        self.fecundity
    }

    /// Sets leaf mass and recomputes allometry.
    ///
    /// Rates are left as they were until the next physiology update.
    pub fn set_mass_leaf(&mut self, mass_leaf: f64) {
        self.size = self.strategy.size(mass_leaf);
    }

    /// Leaf area of this plant above height `z`.
    #[must_use]
    pub fn leaf_area_above(&self, z: f64) -> f64 {
        self.size.leaf_area * self.strategy.leaf_fraction_above(z, self.size.height)
    }

    /// Recomputes rates from the full carbon budget.
    ///
    /// # Errors
    ///
    /// Returns an error if the assimilation integral fails.
    pub fn compute_vars_phys(
        &mut self,
        env: &LightEnvironment,
        quadrature: &quadrature::Config,
    ) -> Result<(), DomainError> {
        let physiology = Physiology::compute(&self.strategy, &self.size, env, quadrature)?;
        self.rates = physiology.ode_rates();
        self.physiology = Some(physiology);
        Ok(())
    }

    /// Sets rates obtained elsewhere, e.g. from a surrogate.
    ///
    /// Clears [`Plant::physiology`], since the breakdown is no longer known.
    pub fn set_ode_rates(&mut self, rates: [f64; PLANT_ODE_SIZE]) {
        self.rates = rates;
        self.physiology = None;
    }

    /// Rates `[growth, mortality, fecundity]` from the last update.
    #[must_use]
    pub fn rates(&self) -> [f64; PLANT_ODE_SIZE] {
        self.rates
    }

    /// The full breakdown behind [`Plant::rates`], if they were computed
    /// directly.
    #[must_use]
    pub fn physiology(&self) -> Option<&Physiology> {
        self.physiology.as_ref()
    }
}

impl OdeState for Plant {
    fn ode_size(&self) -> usize {
        PLANT_ODE_SIZE
    }

    fn ode_values_set(&mut self, values: &[f64]) -> bool {
        let [mass_leaf, mortality, fecundity] = values else {
            panic!("plant state has {PLANT_ODE_SIZE} values, got {}", values.len());
        };
        let changed = *mass_leaf != self.size.mass_leaf
            || *mortality != self.mortality
            || *fecundity != self.fecundity;
        if *mass_leaf != self.size.mass_leaf {
            self.set_mass_leaf(*mass_leaf);
        }
        self.mortality = *mortality;
        self.fecundity = *fecundity;
        changed
    }

    fn ode_values(&self, out: &mut [f64]) {
        out.copy_from_slice(&[self.size.mass_leaf, self.mortality, self.fecundity]);
    }

    fn ode_rates(&self, out: &mut [f64]) {
        out.copy_from_slice(&self.rates);
    }
}
