//! Canopy openness as a function of height.

use canopy_core::ScalarFn;
use canopy_spline::{AdaptiveSpline, Config, Extrapolate, Status};

use crate::DomainError;

/// Whether a patch's light environment reflects its current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightState {
    /// Plant sizes changed since the last rebuild.
    #[default]
    Stale,
    /// Built from the current plant sizes.
    Fresh,
}

#[derive(Debug, Clone, PartialEq)]
enum Profile {
    Uniform(f64),
    Spline(AdaptiveSpline),
}

/// Fraction of full light reaching each height.
///
/// Built by fitting an adaptive spline to the canopy openness on
/// `[0, height_max]`. Heights above the tallest plant are clamped to the top of
/// the spline, where openness is exactly one; an empty canopy is uniformly
/// open.
#[derive(Debug, Clone, PartialEq)]
pub struct LightEnvironment {
    profile: Profile,
}

impl Default for LightEnvironment {
    fn default() -> Self {
        Self::full_light()
    }
}

impl LightEnvironment {
    /// Full light at every height.
    #[must_use]
    pub fn full_light() -> Self {
        Self::uniform(1.0)
    }

    /// The same openness at every height.
    #[must_use]
    pub fn uniform(openness: f64) -> Self {
        Self {
            profile: Profile::Uniform(openness),
        }
    }

    /// Fits `openness` over `[0, height_max]`.
    ///
    /// A non-positive `height_max` means there is no canopy, giving
    /// [`LightEnvironment::full_light`] without calling `openness`.
    ///
    /// # Errors
    ///
    /// Returns an error if the fit fails, e.g. on a non-finite openness.
    pub fn fit<F: ScalarFn>(
        openness: F,
        height_max: f64,
        config: &Config,
    ) -> Result<Self, DomainError> {
        if height_max <= 0.0 {
            return Ok(Self::full_light());
        }
        let spline = AdaptiveSpline::fit(openness, 0.0, height_max, config)
            .map_err(DomainError::LightEnvironment)?
            .with_extrapolate(Extrapolate::Clamp);
        log::debug!(
            "light environment on [0, {height_max}] uses {} points ({:?})",
            spline.len(),
            spline.status()
        );
        Ok(Self {
            profile: Profile::Spline(spline),
        })
    }

    /// Canopy openness at height `z`.
    ///
    /// Returns NaN only for a NaN height.
    #[must_use]
    pub fn openness(&self, z: f64) -> f64 {
        match &self.profile {
            Profile::Uniform(_) if z.is_nan() => f64::NAN,
            Profile::Uniform(openness) => *openness,
            Profile::Spline(spline) => spline.eval(z).unwrap_or(f64::NAN),
        }
    }

    /// The fitted spline, if the canopy is not uniform.
    #[must_use]
    pub fn spline(&self) -> Option<&AdaptiveSpline> {
        match &self.profile {
            Profile::Uniform(_) => None,
            Profile::Spline(spline) => Some(spline),
        }
    }

    /// Refinement status of the fitted spline.
    ///
    /// A uniform canopy is exact, so it reports [`Status::Converged`].
    #[must_use]
    pub fn status(&self) -> Status {
        self.spline().map_or(Status::Converged, AdaptiveSpline::status)
    }
}
