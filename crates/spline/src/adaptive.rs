use canopy_core::ScalarFn;

use crate::{
    Config, CubicSpline, Error, Extrapolate,
    refine::{Refined, Status, refine},
};

/// A cubic spline fitted to a function by error-driven refinement.
///
/// ```
/// use canopy_spline::{AdaptiveSpline, Config, Status};
///
/// let spline = AdaptiveSpline::fit(|x: f64| x.sin(), 0.0, 3.0, &Config::default())?;
/// assert_eq!(spline.status(), Status::Converged);
/// assert!((spline.eval(1.0)? - 1.0_f64.sin()).abs() < 1e-5);
/// # Ok::<(), canopy_spline::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveSpline {
    spline: CubicSpline,
    status: Status,
    max_error: f64,
}

impl AdaptiveSpline {
    /// Fits `f` over `[lo, hi]`.
    ///
    /// Hitting `max_points` is not an error: the best spline is returned with
    /// [`Status::MaxPoints`] and [`AdaptiveSpline::max_error`] reports the
    /// largest error seen in the last refinement round.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid, the domain is empty or not
    /// finite, or `f` returns a non-finite value.
    pub fn fit<F: ScalarFn>(mut f: F, lo: f64, hi: f64, config: &Config) -> Result<Self, Error> {
        let Refined {
            xs,
            mut ys,
            mut coefficients,
            status,
            max_error,
        } = refine(|x, out: &mut [f64]| out[0] = f.call(x), 1, lo, hi, config)?;

        let (Some(y), Some(coefficients)) = (ys.pop(), coefficients.pop()) else {
            return Err(Error::NotInitialised);
        };
        Ok(Self {
            spline: CubicSpline::from_parts(xs, y, coefficients),
            status,
            max_error,
        })
    }

    /// Replaces the extrapolation policy.
    #[must_use]
    pub fn with_extrapolate(mut self, extrapolate: Extrapolate) -> Self {
        self.spline = self.spline.with_extrapolate(extrapolate);
        self
    }

    /// Evaluates the fitted spline at `x`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfDomain`] per the extrapolation policy.
    pub fn eval(&self, x: f64) -> Result<f64, Error> {
        self.spline.eval(x)
    }

    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Largest absolute midpoint error in the final refinement round.
    #[must_use]
    pub fn max_error(&self) -> f64 {
        self.max_error
    }

    #[must_use]
    pub fn spline(&self) -> &CubicSpline {
        &self.spline
    }

    #[must_use]
    pub fn xs(&self) -> &[f64] {
        self.spline.xs()
    }

    #[must_use]
    pub fn ys(&self) -> &[f64] {
        self.spline.ys()
    }

    #[must_use]
    pub fn domain(&self) -> (f64, f64) {
        self.spline.domain()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.spline.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spline.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use canopy_core::Functor;
    use std::f64::consts::PI;

    fn grid(lo: f64, hi: f64) -> impl Iterator<Item = f64> {
        (0..=200).map(move |i| lo + (hi - lo) * f64::from(i) / 200.0)
    }

    #[test]
    fn fits_within_tolerance() {
        let config = Config::new(1e-7, 1e-7, 9, 5000).expect("valid config");
        let spline = AdaptiveSpline::fit(|x: f64| x.sin(), 0.0, 2.0 * PI, &config).expect("fit");

        assert_eq!(spline.status(), Status::Converged);
        assert!(spline.max_error() <= 2e-7);
        for x in grid(0.0, 2.0 * PI) {
            assert_abs_diff_eq!(spline.eval(x).expect("in domain"), x.sin(), epsilon = 1e-5);
        }
    }

    #[test]
    fn refits_agree() {
        let config = Config::default();
        let f = |x: f64| (-x * x).exp();
        let first = AdaptiveSpline::fit(f, -2.0, 2.0, &config).expect("fit");
        let second = AdaptiveSpline::fit(f, -2.0, 2.0, &config).expect("fit");

        assert_eq!(first.xs(), second.xs());
        for x in grid(-2.0, 2.0) {
            assert_abs_diff_eq!(
                first.eval(x).expect("in domain"),
                second.eval(x).expect("in domain"),
                epsilon = config.atol
            );
        }
    }

    #[test]
    fn cap_returns_best_effort() {
        let config = Config::new(1e-12, 1e-12, 3, 5).expect("valid config");
        let spline = AdaptiveSpline::fit(|x: f64| (10.0 * x).sin(), 0.0, 1.0, &config).expect("fit");

        assert_eq!(spline.status(), Status::MaxPoints);
        assert_eq!(spline.len(), 5);
        assert!(spline.max_error() > 1e-12);
        assert!(spline.eval(0.3).expect("in domain").is_finite());
    }

    #[test]
    fn fits_bound_methods() {
        struct Growth {
            rate: f64,
        }

        impl Growth {
            fn at(&self, t: f64) -> f64 {
                (self.rate * t).exp()
            }
        }

        let growth = Growth { rate: 0.5 };
        let spline = AdaptiveSpline::fit(Functor::new(&growth, Growth::at), 0.0, 4.0, &Config::default())
            .expect("fit");

        assert_abs_diff_eq!(spline.eval(2.5).expect("in domain"), growth.at(2.5), epsilon = 1e-4);
    }

    #[test]
    fn domain_policy_is_explicit() {
        let spline = AdaptiveSpline::fit(|x: f64| x * x, 0.0, 1.0, &Config::default()).expect("fit");

        assert!(matches!(spline.eval(1.5), Err(Error::OutOfDomain { .. })));

        let clamped = spline.with_extrapolate(Extrapolate::Clamp);
        assert_abs_diff_eq!(clamped.eval(1.5).expect("clamped"), 1.0, epsilon = 1e-12);
        assert_eq!(clamped.domain(), (0.0, 1.0));
    }

    #[test]
    fn too_few_base_samples() {
        let config = Config {
            nbase: 2,
            ..Config::default()
        };
        let err = AdaptiveSpline::fit(|x: f64| x, 0.0, 1.0, &config).expect_err("two samples");

        assert_eq!(err, Error::InsufficientSamples { needed: 3, got: 2 });
    }
}
