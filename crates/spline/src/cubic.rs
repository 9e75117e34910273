//! Natural cubic splines.
//!
//! Each interval `[x_i, x_{i+1}]` carries a cubic
//!
//! ```text
//! S_i(x) = a_i + b_i (x - x_i) + c_i (x - x_i)^2 + d_i (x - x_i)^3
//! ```
//!
//! with continuous first and second derivatives at the knots and zero second
//! derivative at both ends.

use crate::{Error, Extrapolate, extrapolate::Lookup};

/// Minimum number of samples for a cubic spline.
pub const MIN_SAMPLES: usize = 3;

/// Polynomial coefficients for one channel, indexed by interval.
///
/// The abscissae are stored by the owner so that several channels can share
/// them.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Coefficients {
    a: Vec<f64>,
    b: Vec<f64>,
    c: Vec<f64>,
    d: Vec<f64>,
}

impl Coefficients {
    /// Fits a natural cubic through `(x, y)`.
    ///
    /// `x` must already be validated with [`check_abscissae`] and have the
    /// same length as `y`.
    pub(crate) fn natural(x: &[f64], y: &[f64]) -> Self {
        let n = x.len();
        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
        let slope: Vec<f64> = y
            .windows(2)
            .zip(&h)
            .map(|(w, h)| (w[1] - w[0]) / h)
            .collect();

        // Tridiagonal system for the interior c_i, solved with the Thomas
        // algorithm. Row k corresponds to knot k + 1.
        let m = n - 2;
        let mut diag: Vec<f64> = (0..m).map(|k| 2.0 * (h[k] + h[k + 1])).collect();
        let mut rhs: Vec<f64> = (0..m).map(|k| 3.0 * (slope[k + 1] - slope[k])).collect();
        for k in 1..m {
            let w = h[k] / diag[k - 1];
            diag[k] -= w * h[k];
            rhs[k] -= w * rhs[k - 1];
        }

        let mut c = vec![0.0; n];
        for k in (0..m).rev() {
            c[k + 1] = (rhs[k] - h[k + 1] * c[k + 2]) / diag[k];
        }

        let b = (0..n - 1)
            .map(|i| slope[i] - h[i] * (2.0 * c[i] + c[i + 1]) / 3.0)
            .collect();
        let d = (0..n - 1).map(|i| (c[i + 1] - c[i]) / (3.0 * h[i])).collect();

        Self {
            a: y[..n - 1].to_vec(),
            b,
            c: c[..n - 1].to_vec(),
            d,
        }
    }

    /// Evaluates at `t` using the polynomial of the interval containing it.
    ///
    /// Points beyond either end use the end polynomials.
    pub(crate) fn eval(&self, x: &[f64], t: f64) -> f64 {
        let i = interval(x, t);
        let dx = t - x[i];
        self.a[i] + dx * (self.b[i] + dx * (self.c[i] + dx * self.d[i]))
    }
}

/// Index of the interval containing `t`, clamped to the valid range.
fn interval(x: &[f64], t: f64) -> usize {
    x.partition_point(|&xi| xi <= t).saturating_sub(1).min(x.len() - 2)
}

/// Checks that `x` is long enough, finite, and strictly increasing.
pub(crate) fn check_abscissae(x: &[f64]) -> Result<(), Error> {
    if x.len() < MIN_SAMPLES {
        return Err(Error::InsufficientSamples {
            needed: MIN_SAMPLES,
            got: x.len(),
        });
    }
    if let Some(&bad) = x.iter().find(|v| !v.is_finite()) {
        return Err(Error::NonFinite { x: bad });
    }
    if let Some(index) = x.windows(2).position(|w| w[1] <= w[0]) {
        return Err(Error::NotIncreasing { index: index + 1 });
    }
    Ok(())
}

/// A natural cubic spline through a fixed set of samples.
#[derive(Debug, Clone, PartialEq)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    coefficients: Coefficients,
    extrapolate: Extrapolate,
}

impl CubicSpline {
    /// Fits a spline through `(x, y)` with the default [`Extrapolate::Error`]
    /// policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the lengths differ, there are fewer than
    /// [`MIN_SAMPLES`] points, any value is not finite, or `x` is not strictly
    /// increasing.
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Self, Error> {
        if x.len() != y.len() {
            return Err(Error::LengthMismatch {
                x: x.len(),
                y: y.len(),
            });
        }
        check_abscissae(&x)?;
        if let Some(i) = y.iter().position(|v| !v.is_finite()) {
            return Err(Error::NonFinite { x: x[i] });
        }

        let coefficients = Coefficients::natural(&x, &y);
        Ok(Self {
            x,
            y,
            coefficients,
            extrapolate: Extrapolate::default(),
        })
    }

    /// Assembles a spline from samples that were already fitted.
    pub(crate) fn from_parts(x: Vec<f64>, y: Vec<f64>, coefficients: Coefficients) -> Self {
        Self {
            x,
            y,
            coefficients,
            extrapolate: Extrapolate::default(),
        }
    }

    /// Replaces the extrapolation policy.
    #[must_use]
    pub fn with_extrapolate(mut self, extrapolate: Extrapolate) -> Self {
        self.extrapolate = extrapolate;
        self
    }

    /// Evaluates the spline at `x`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfDomain`] if `x` is outside the sampled range and
    /// the policy is [`Extrapolate::Error`], or if `x` is NaN.
    pub fn eval(&self, x: f64) -> Result<f64, Error> {
        let (lo, hi) = self.domain();
        match self.extrapolate.lookup(x, lo, hi)? {
            Lookup::At(t) => Ok(self.coefficients.eval(&self.x, t)),
            Lookup::Value(value) => Ok(value),
        }
    }

    #[must_use]
    pub fn xs(&self) -> &[f64] {
        &self.x
    }

    #[must_use]
    pub fn ys(&self) -> &[f64] {
        &self.y
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Always false; a spline holds at least [`MIN_SAMPLES`] points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Returns the sampled range `(first, last)`.
    #[must_use]
    pub fn domain(&self) -> (f64, f64) {
        (self.x[0], self.x[self.x.len() - 1])
    }

    #[must_use]
    pub fn extrapolate(&self) -> Extrapolate {
        self.extrapolate
    }
}
