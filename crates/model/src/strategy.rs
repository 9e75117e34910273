//! Plant strategies: trait values and the allometry they imply.
//!
//! Allometric relationships, with `LA = mass_leaf / lma`:
//!
//! ```text
//! height       = a1 · LA^b1
//! mass_sapwood = rho · eta_c · theta · a1 · LA^(1 + b1)
//! mass_bark    = b · mass_sapwood
//! mass_root    = a3 · LA
//! ```
//!
//! Leaf area is distributed over height so that the fraction above `z` for a
//! plant of height `h` is `Q(z, h) = (1 − (z/h)^eta)²`.

use canopy_core::Functor;
use canopy_solvers::root;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, parameters::check};

/// Trait values for one plant type.
///
/// Defaults follow Falster et al. (2011), *J. Ecol.* 99:148–164.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Traits {
    /// Leaf mass per unit leaf area (kg/m²).
    pub lma: f64,
    /// Wood density (kg/m³).
    pub rho: f64,
    /// Crown shape parameter.
    pub eta: f64,
    /// Sapwood area per unit leaf area.
    pub theta: f64,
    /// Height–leaf area scaling.
    pub a1: f64,
    pub b1: f64,
    /// Bark mass per unit sapwood mass.
    pub b: f64,
    /// Root mass per unit leaf area (kg/m²).
    pub a3: f64,

    /// Maximum leaf photosynthesis (mol/m²/yr).
    pub c_p1: f64,
    /// Light level at half-maximal photosynthesis.
    pub c_p2: f64,
    /// Yield: fraction of assimilate converted to biomass.
    pub y: f64,
    /// Biomass per mol carbon (kg/mol).
    pub c_bio: f64,

    /// Leaf respiration per unit leaf area (mol/m²/yr).
    pub c_rl: f64,
    /// Sapwood respiration per unit sapwood volume (mol/m³/yr).
    pub c_rs: f64,
    /// Bark respiration per unit bark volume (mol/m³/yr).
    pub c_rb: f64,
    /// Root respiration per unit root mass (mol/kg/yr).
    pub c_rr: f64,

    /// Turnover rates (1/yr) of leaves, bark, sapwood and roots.
    pub k_l: f64,
    pub k_b: f64,
    pub k_s: f64,
    pub k_r: f64,

    /// Maximum fraction of production allocated to reproduction.
    pub c_r1: f64,
    /// Steepness of the switch to reproduction around `hmat`.
    pub c_r2: f64,
    /// Height at maturity (m).
    pub hmat: f64,
    /// Seed mass (kg).
    pub s: f64,
    /// Accessory cost per unit seed mass.
    pub c_acc: f64,

    /// Baseline mortality rate (1/yr).
    pub c_d0: f64,
    /// Coefficient and shape of growth-dependent mortality.
    pub c_d2: f64,
    pub c_d3: f64,
}

impl Default for Traits {
    fn default() -> Self {
        Self {
            lma: 0.197_879_1,
            rho: 608.0,
            eta: 12.0,
            theta: 4669e-7,
            a1: 5.44,
            b1: 0.306,
            b: 0.17,
            a3: 0.07,
            c_p1: 150.36,
            c_p2: 0.19,
            y: 0.7,
            c_bio: 12e-3 / 0.49,
            c_rl: 39.27,
            c_rs: 4012.0,
            c_rb: 2.0 * 4012.0,
            c_rr: 217.0,
            k_l: 0.4565,
            k_b: 0.2,
            k_s: 0.0,
            k_r: 1.0,
            c_r1: 1.0,
            c_r2: 50.0,
            hmat: 16.5996,
            s: 3.8e-5,
            c_acc: 4.0,
            c_d0: 0.01,
            c_d2: 5.5,
            c_d3: 20.0,
        }
    }
}

impl Traits {
    /// Checks that every trait is finite and physically meaningful.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parameter`] naming the first offending trait.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = f64::MIN_POSITIVE..;
        for (name, value) in [
            ("lma", self.lma),
            ("rho", self.rho),
            ("theta", self.theta),
            ("a1", self.a1),
            ("b1", self.b1),
            ("c_p1", self.c_p1),
            ("c_p2", self.c_p2),
            ("c_bio", self.c_bio),
            ("hmat", self.hmat),
            ("s", self.s),
            ("c_acc", self.c_acc),
        ] {
            check(name, value, positive.clone())?;
        }

        for (name, value) in [
            ("b", self.b),
            ("a3", self.a3),
            ("c_rl", self.c_rl),
            ("c_rs", self.c_rs),
            ("c_rb", self.c_rb),
            ("c_rr", self.c_rr),
            ("k_l", self.k_l),
            ("k_b", self.k_b),
            ("k_s", self.k_s),
            ("k_r", self.k_r),
            ("c_r2", self.c_r2),
            ("c_d0", self.c_d0),
            ("c_d2", self.c_d2),
            ("c_d3", self.c_d3),
        ] {
            check(name, value, 0.0..)?;
        }

        check("eta", self.eta, 1.0..)?;
        check("y", self.y, f64::MIN_POSITIVE..=1.0)?;
        check("c_r1", self.c_r1, 0.0..=1.0)?;
        Ok(())
    }
}

/// Allometric state of a plant with a given leaf mass.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Size {
    pub mass_leaf: f64,
    pub leaf_area: f64,
    pub height: f64,
    pub mass_sapwood: f64,
    pub mass_bark: f64,
    pub mass_root: f64,
}

impl Size {
    #[must_use]
    pub fn mass_total(&self) -> f64 {
        self.mass_leaf + self.mass_sapwood + self.mass_bark + self.mass_root
    }
}

/// Validated traits plus quantities derived from them.
///
/// Strategies are immutable once built and are shared between plants,
/// populations and surrogate tables through an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    traits: Traits,
    eta_c: f64,
    mass_leaf_seed: f64,
}

impl Strategy {
    /// Validates `traits` and solves for the leaf mass of a seed.
    ///
    /// The seed's leaf mass is the root of `mass_total(mass_leaf) = s`.
    ///
    /// # Errors
    ///
    /// Returns an error if a trait is invalid or the seed leaf mass cannot be
    /// bracketed.
    pub fn new(traits: Traits) -> Result<Self, ConfigError> {
        traits.validate()?;
        let eta = traits.eta;
        let mut strategy = Self {
            traits,
            eta_c: 1.0 - 2.0 / (1.0 + eta) + 1.0 / (1.0 + 2.0 * eta),
            mass_leaf_seed: 0.0,
        };

        let config = root::Config::new(200, 0.0, 1e-12, 0.0).map_err(root::Error::from)?;
        let solution = root::bisection(
            Functor::new(&strategy, Self::seed_residual),
            [0.0, traits.s],
            &config,
        )?;
        strategy.mass_leaf_seed = solution.x;

        log::debug!(
            "seed leaf mass {:e} kg after {} bisection iterations",
            solution.x,
            solution.iters
        );
        Ok(strategy)
    }

    #[must_use]
    pub fn traits(&self) -> &Traits {
        &self.traits
    }

    /// Leaf mass of a newly germinated seed (kg).
    #[must_use]
    pub fn mass_leaf_seed(&self) -> f64 {
        self.mass_leaf_seed
    }

    /// Allometry for a plant with `mass_leaf`.
    #[must_use]
    pub fn size(&self, mass_leaf: f64) -> Size {
        let t = &self.traits;
        let leaf_area = mass_leaf / t.lma;
        let mass_sapwood = t.rho * self.eta_c * t.theta * t.a1 * leaf_area.powf(1.0 + t.b1);
        Size {
            mass_leaf,
            leaf_area,
            height: t.a1 * leaf_area.powf(t.b1),
            mass_sapwood,
            mass_bark: t.b * mass_sapwood,
            mass_root: t.a3 * leaf_area,
        }
    }

    /// Total live mass of a plant with `mass_leaf`.
    #[must_use]
    pub fn mass_total(&self, mass_leaf: f64) -> f64 {
        self.size(mass_leaf).mass_total()
    }

    /// Derivative of total mass with respect to leaf mass.
    #[must_use]
    pub fn dmass_total_dmass_leaf(&self, leaf_area: f64) -> f64 {
        let t = &self.traits;
        let dmass_sapwood =
            t.rho * self.eta_c * t.theta * t.a1 * (1.0 + t.b1) * leaf_area.powf(t.b1) / t.lma;
        1.0 + dmass_sapwood * (1.0 + t.b) + t.a3 / t.lma
    }

    /// Fraction of a plant's leaf area above height `z`.
    #[must_use]
    pub fn leaf_fraction_above(&self, z: f64, height: f64) -> f64 {
        if z >= height {
            0.0
        } else if z <= 0.0 {
            1.0
        } else {
            let u = 1.0 - (z / height).powf(self.traits.eta);
            u * u
        }
    }

    /// Density of leaf area at height `z`, normalised to integrate to one.
    #[must_use]
    pub fn leaf_density(&self, z: f64, height: f64) -> f64 {
        if z <= 0.0 || z >= height {
            return 0.0;
        }
        let eta = self.traits.eta;
        let ratio = z / height;
        2.0 * eta * (1.0 - ratio.powf(eta)) * ratio.powf(eta - 1.0) / height
    }

    /// Fraction of net production allocated to reproduction at `height`.
    #[must_use]
    pub fn reproduction_fraction(&self, height: f64) -> f64 {
        let t = &self.traits;
        t.c_r1 / (1.0 + (t.c_r2 * (1.0 - height / t.hmat)).exp())
    }

    fn seed_residual(&self, mass_leaf: f64) -> f64 {
        self.mass_total(mass_leaf) - self.traits.s
    }
}
