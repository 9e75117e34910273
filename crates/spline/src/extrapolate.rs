use serde::{Deserialize, Serialize};

use crate::Error;

/// Extrapolation strategy.
///
/// Controls what happens when a spline is evaluated outside the range of its
/// sample abscissae.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extrapolate {
    /// Evaluate the end polynomials beyond the sampled range.
    Enable,
    /// Return this value outside the sampled range.
    Fill(f64),
    /// Evaluate at the nearest end of the sampled range.
    Clamp,
    /// Fail with [`Error::OutOfDomain`].
    #[default]
    Error,
}

/// Where to evaluate a spline, after applying an [`Extrapolate`] policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Lookup {
    /// Evaluate the piecewise polynomial at this abscissa.
    At(f64),
    /// Skip evaluation and return this value.
    Value(f64),
}

impl Extrapolate {
    /// Resolves `x` against the domain `[lo, hi]`.
    pub(crate) fn lookup(self, x: f64, lo: f64, hi: f64) -> Result<Lookup, Error> {
        if x.is_nan() {
            return Err(Error::OutOfDomain { x, lo, hi });
        }
        if (lo..=hi).contains(&x) {
            return Ok(Lookup::At(x));
        }
        match self {
            Self::Enable => Ok(Lookup::At(x)),
            Self::Fill(value) => Ok(Lookup::Value(value)),
            Self::Clamp => Ok(Lookup::At(x.clamp(lo, hi))),
            Self::Error => Err(Error::OutOfDomain { x, lo, hi }),
        }
    }
}
