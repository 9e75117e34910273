//! Vector-valued splines over shared abscissae.
//!
//! A [`MultiSpline`] is built either by adaptive fitting against a callback
//! that fills one value per channel, or from externally computed samples via
//! [`MultiSpline::add_point`] followed by [`MultiSpline::init_self`]. Either
//! way every channel has exactly the same sample abscissae.

use crate::{
    Config, Error, Extrapolate,
    cubic::{Coefficients, MIN_SAMPLES, check_abscissae},
    extrapolate::Lookup,
    refine::{Refined, Status, refine},
};

#[derive(Debug, Clone, PartialEq)]
pub struct MultiSpline {
    xs: Vec<f64>,
    ys: Vec<Vec<f64>>,
    coefficients: Option<Vec<Coefficients>>,
    extrapolate: Extrapolate,
    status: Status,
    max_error: f64,
}

impl MultiSpline {
    /// Creates an empty spline with `channels` outputs.
    #[must_use]
    pub fn new(channels: usize) -> Self {
        Self {
            xs: Vec::new(),
            ys: vec![Vec::new(); channels],
            coefficients: None,
            extrapolate: Extrapolate::default(),
            status: Status::Converged,
            max_error: 0.0,
        }
    }

    /// Fits `f` over `[lo, hi]`, where `f(x, out)` writes one value per
    /// channel into `out`.
    ///
    /// An interval is refined if any channel misses the tolerance at its
    /// midpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid, the domain is empty or not
    /// finite, or `f` produces a non-finite value.
    pub fn fit<F>(f: F, channels: usize, lo: f64, hi: f64, config: &Config) -> Result<Self, Error>
    where
        F: FnMut(f64, &mut [f64]),
    {
        let Refined {
            xs,
            ys,
            coefficients,
            status,
            max_error,
        } = refine(f, channels, lo, hi, config)?;

        Ok(Self {
            xs,
            ys,
            coefficients: Some(coefficients),
            extrapolate: Extrapolate::default(),
            status,
            max_error,
        })
    }

    /// Replaces the extrapolation policy.
    #[must_use]
    pub fn with_extrapolate(mut self, extrapolate: Extrapolate) -> Self {
        self.extrapolate = extrapolate;
        self
    }

    /// Adds a sample with one value per channel.
    ///
    /// Points may arrive in any order; they are kept sorted by `x`. Any fitted
    /// coefficients are discarded until the next [`MultiSpline::init_self`].
    ///
    /// # Errors
    ///
    /// Returns an error if `values` does not have one entry per channel, `x`
    /// was already added, or any input is not finite. The spline is unchanged
    /// on error.
    pub fn add_point(&mut self, x: f64, values: &[f64]) -> Result<(), Error> {
        if values.len() != self.ys.len() {
            return Err(Error::ChannelMismatch {
                expected: self.ys.len(),
                got: values.len(),
            });
        }
        if !x.is_finite() || values.iter().any(|v| !v.is_finite()) {
            return Err(Error::NonFinite { x });
        }

        let index = match self.xs.binary_search_by(|probe| probe.total_cmp(&x)) {
            Ok(_) => return Err(Error::DuplicateAbscissa { x }),
            Err(index) => index,
        };
        self.xs.insert(index, x);
        for (channel, &value) in self.ys.iter_mut().zip(values) {
            channel.insert(index, value);
        }
        self.coefficients = None;
        Ok(())
    }

    /// Fits every channel through the added points.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InsufficientSamples`] with fewer than three points.
    pub fn init_self(&mut self) -> Result<(), Error> {
        check_abscissae(&self.xs)?;
        self.coefficients = Some(crate::refine::fit_channels(&self.xs, &self.ys));
        self.status = Status::Converged;
        self.max_error = 0.0;
        Ok(())
    }

    /// Removes every sample, keeping the channel count.
    pub fn clear(&mut self) {
        self.xs.clear();
        for channel in &mut self.ys {
            channel.clear();
        }
        self.coefficients = None;
        self.status = Status::Converged;
        self.max_error = 0.0;
    }

    /// Evaluates one channel at `x`.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is not initialised, `channel` is out of
    /// range, or `x` is out of domain under the extrapolation policy.
    pub fn eval(&self, x: f64, channel: usize) -> Result<f64, Error> {
        let coefficients = self.fitted()?;
        let Some(coefficients) = coefficients.get(channel) else {
            return Err(Error::ChannelOutOfRange {
                channel,
                channels: self.channels(),
            });
        };
        match self.lookup(x)? {
            Lookup::At(t) => Ok(coefficients.eval(&self.xs, t)),
            Lookup::Value(value) => Ok(value),
        }
    }

    /// Evaluates every channel at `x` into `out`.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is not initialised, `out` does not have
    /// one slot per channel, or `x` is out of domain.
    pub fn eval_into(&self, x: f64, out: &mut [f64]) -> Result<(), Error> {
        let coefficients = self.fitted()?;
        if out.len() != coefficients.len() {
            return Err(Error::ChannelMismatch {
                expected: coefficients.len(),
                got: out.len(),
            });
        }
        match self.lookup(x)? {
            Lookup::At(t) => {
                for (slot, coefficients) in out.iter_mut().zip(coefficients) {
                    *slot = coefficients.eval(&self.xs, t);
                }
            }
            Lookup::Value(value) => out.fill(value),
        }
        Ok(())
    }

    /// Evaluates every channel at `x`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`MultiSpline::eval`].
    pub fn eval_all(&self, x: f64) -> Result<Vec<f64>, Error> {
        let mut out = vec![0.0; self.channels()];
        self.eval_into(x, &mut out)?;
        Ok(out)
    }

    /// Shared sample abscissae, in increasing order.
    #[must_use]
    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    /// Sample values of one channel, aligned with [`MultiSpline::xs`].
    #[must_use]
    pub fn ys(&self, channel: usize) -> Option<&[f64]> {
        self.ys.get(channel).map(Vec::as_slice)
    }

    #[must_use]
    pub fn channels(&self) -> usize {
        self.ys.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    #[must_use]
    pub fn is_initialised(&self) -> bool {
        self.coefficients.is_some()
    }

    /// Returns the sampled range, if there are any samples.
    #[must_use]
    pub fn domain(&self) -> Option<(f64, f64)> {
        Some((*self.xs.first()?, *self.xs.last()?))
    }

    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    #[must_use]
    pub fn max_error(&self) -> f64 {
        self.max_error
    }

    fn fitted(&self) -> Result<&[Coefficients], Error> {
        self.coefficients.as_deref().ok_or(Error::NotInitialised)
    }

    fn lookup(&self, x: f64) -> Result<Lookup, Error> {
        let (lo, hi) = self.domain().ok_or(Error::InsufficientSamples {
            needed: MIN_SAMPLES,
            got: 0,
        })?;
        self.extrapolate.lookup(x, lo, hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn quadratic_and_line() -> MultiSpline {
        let mut spline = MultiSpline::new(2);
        for x in [2.0, 0.0, 1.0, 3.0] {
            spline.add_point(x, &[x * x, 1.0 - x]).expect("valid point");
        }
        spline.init_self().expect("enough points");
        spline
    }

    #[test]
    fn points_are_sorted_and_shared() {
        let spline = quadratic_and_line();

        assert_eq!(spline.xs(), &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(spline.ys(0), Some(&[0.0, 1.0, 4.0, 9.0][..]));
        assert_eq!(spline.ys(1), Some(&[1.0, 0.0, -1.0, -2.0][..]));
        assert_eq!(spline.ys(2), None);
    }

    #[test]
    fn channels_interpolate_independently() {
        let spline = quadratic_and_line();

        for &x in spline.xs() {
            assert_relative_eq!(spline.eval(x, 0).expect("ok"), x * x, epsilon = 1e-12);
        }
        assert_relative_eq!(spline.eval(1.7, 1).expect("ok"), -0.7, epsilon = 1e-12);

        let all = spline.eval_all(2.0).expect("ok");
        assert_relative_eq!(all[0], 4.0, epsilon = 1e-12);
        assert_relative_eq!(all[1], -1.0, epsilon = 1e-12);
    }

    #[test]
    fn partial_and_duplicate_points_are_rejected() {
        let mut spline = quadratic_and_line();

        assert_eq!(
            spline.add_point(5.0, &[1.0]),
            Err(Error::ChannelMismatch {
                expected: 2,
                got: 1
            })
        );
        assert_eq!(
            spline.add_point(1.0, &[1.0, 2.0]),
            Err(Error::DuplicateAbscissa { x: 1.0 })
        );
        assert_eq!(spline.len(), 4);
        assert!(spline.is_initialised());
    }

    #[test]
    fn adding_points_requires_reinitialising() {
        let mut spline = quadratic_and_line();
        spline.add_point(4.0, &[16.0, -3.0]).expect("valid point");

        assert_eq!(spline.eval(1.0, 0), Err(Error::NotInitialised));
        spline.init_self().expect("enough points");
        assert_relative_eq!(spline.eval(4.0, 0).expect("ok"), 16.0, epsilon = 1e-12);
    }

    #[test]
    fn too_few_points_is_an_error() {
        let mut spline = MultiSpline::new(1);
        spline.add_point(0.0, &[1.0]).expect("valid point");
        spline.add_point(1.0, &[2.0]).expect("valid point");

        assert_eq!(
            spline.init_self(),
            Err(Error::InsufficientSamples { needed: 3, got: 2 })
        );
    }

    #[test]
    fn clear_keeps_channels() {
        let mut spline = quadratic_and_line();
        spline.clear();

        assert!(spline.is_empty());
        assert_eq!(spline.channels(), 2);
        assert_eq!(spline.domain(), None);
        assert_eq!(spline.eval(0.5, 0), Err(Error::NotInitialised));
    }

    #[test]
    fn out_of_range_channel_and_domain() {
        let spline = quadratic_and_line();

        assert_eq!(
            spline.eval(1.0, 2),
            Err(Error::ChannelOutOfRange {
                channel: 2,
                channels: 2
            })
        );
        assert!(matches!(spline.eval(3.5, 0), Err(Error::OutOfDomain { .. })));

        let filled = spline.with_extrapolate(Extrapolate::Fill(0.0));
        assert_eq!(filled.eval_all(-1.0), Ok(vec![0.0, 0.0]));
    }

    #[test]
    fn adaptive_fit_uses_worst_channel() {
        let config = Config::new(1e-6, 0.0, 5, 10_000).expect("valid config");
        let spline = MultiSpline::fit(
            |x, out: &mut [f64]| {
                out[0] = 2.0 * x;
                out[1] = (8.0 * x).sin();
            },
            2,
            0.0,
            1.0,
            &config,
        )
        .expect("fit");

        // The straight line alone would stop after one round.
        let line = MultiSpline::fit(|x, out: &mut [f64]| out[0] = 2.0 * x, 1, 0.0, 1.0, &config)
            .expect("fit");

        assert_eq!(spline.status(), Status::Converged);
        assert_eq!(line.len(), 9);
        assert!(spline.len() > line.len());
        assert_relative_eq!(spline.eval(0.3, 1).expect("ok"), (2.4_f64).sin(), epsilon = 1e-5);
        assert_relative_eq!(spline.eval(0.3, 0).expect("ok"), 0.6, epsilon = 1e-10);
    }
}
