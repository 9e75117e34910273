//! Error-driven refinement shared by single- and multi-channel splines.

use crate::{
    Config, Error,
    cubic::{Coefficients, MIN_SAMPLES},
};

/// Indicates whether an adaptive fit met its tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Every checked midpoint was within tolerance.
    Converged,

    /// Refinement stopped at the sample cap with some intervals still above
    /// tolerance. The spline is still usable.
    MaxPoints,
}

/// Output of [`refine`]: samples stored per channel plus fitted coefficients.
pub(crate) struct Refined {
    pub(crate) xs: Vec<f64>,
    pub(crate) ys: Vec<Vec<f64>>,
    pub(crate) coefficients: Vec<Coefficients>,
    pub(crate) status: Status,
    pub(crate) max_error: f64,
}

/// Samples `f` on `[lo, hi]` and refines until every channel is within
/// tolerance at the midpoints of the last round.
///
/// An interval is refined when ANY channel fails the check, so all channels
/// share the same abscissae.
pub(crate) fn refine<F>(
    mut f: F,
    channels: usize,
    lo: f64,
    hi: f64,
    config: &Config,
) -> Result<Refined, Error>
where
    F: FnMut(f64, &mut [f64]),
{
    if config.nbase < MIN_SAMPLES {
        return Err(Error::InsufficientSamples {
            needed: MIN_SAMPLES,
            got: config.nbase,
        });
    }
    config.validate()?;
    if !lo.is_finite() || !hi.is_finite() || lo >= hi {
        return Err(Error::InvalidDomain { lo, hi });
    }

    let mut buf = vec![0.0; channels];
    let mut xs = linspace(lo, hi, config.nbase);
    let mut ys = vec![Vec::with_capacity(xs.len()); channels];
    for &x in &xs {
        sample(&mut f, x, &mut buf)?;
        push_values(&mut ys, &buf);
    }

    let mut coefficients = fit_channels(&xs, &ys);
    let mut flagged = vec![true; xs.len() - 1];
    let mut max_error = 0.0;

    loop {
        let pending = flagged.iter().filter(|&&flag| flag).count();
        if pending == 0 {
            log::debug!(
                "adaptive spline on [{lo}, {hi}] converged with {} points",
                xs.len()
            );
            return Ok(Refined {
                xs,
                ys,
                coefficients,
                status: Status::Converged,
                max_error,
            });
        }
        if xs.len() + pending > config.max_points {
            log::warn!(
                "adaptive spline on [{lo}, {hi}] stopped at {} points (cap {}), max error {max_error:e}",
                xs.len(),
                config.max_points
            );
            return Ok(Refined {
                xs,
                ys,
                coefficients,
                status: Status::MaxPoints,
                max_error,
            });
        }

        let mut next_xs = Vec::with_capacity(xs.len() + pending);
        let mut next_ys = vec![Vec::with_capacity(xs.len() + pending); channels];
        let mut next_flagged = Vec::with_capacity(flagged.len() + pending);
        let mut round_error: f64 = 0.0;

        for (i, &flag) in flagged.iter().enumerate() {
            next_xs.push(xs[i]);
            for (next, ys) in next_ys.iter_mut().zip(&ys) {
                next.push(ys[i]);
            }

            let mid = 0.5 * (xs[i] + xs[i + 1]);
            if !flag || mid <= xs[i] || mid >= xs[i + 1] {
                next_flagged.push(false);
                continue;
            }

            sample(&mut f, mid, &mut buf)?;
            let mut failed = false;
            for (coefficients, &y) in coefficients.iter().zip(&buf) {
                let err = (y - coefficients.eval(&xs, mid)).abs();
                round_error = round_error.max(err);
                failed |= err > config.tolerance(y);
            }

            next_xs.push(mid);
            push_values(&mut next_ys, &buf);
            next_flagged.extend([failed, failed]);
        }

        let last = xs.len() - 1;
        next_xs.push(xs[last]);
        for (next, ys) in next_ys.iter_mut().zip(&ys) {
            next.push(ys[last]);
        }

        xs = next_xs;
        ys = next_ys;
        flagged = next_flagged;
        max_error = round_error;
        coefficients = fit_channels(&xs, &ys);
    }
}

/// Fits every channel against the shared abscissae.
pub(crate) fn fit_channels(xs: &[f64], ys: &[Vec<f64>]) -> Vec<Coefficients> {
    ys.iter().map(|y| Coefficients::natural(xs, y)).collect()
}

/// Returns `n >= 2` evenly spaced points from `lo` to `hi` inclusive.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    let step = (hi - lo) / (n - 1) as f64;
    let mut xs: Vec<f64> = (0..n).map(|i| lo + step * i as f64).collect();
    xs[n - 1] = hi;
    xs
}

fn sample<F: FnMut(f64, &mut [f64])>(f: &mut F, x: f64, buf: &mut [f64]) -> Result<(), Error> {
    f(x, buf);
    if buf.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(Error::NonFinite { x })
    }
}

fn push_values(ys: &mut [Vec<f64>], values: &[f64]) {
    for (channel, &value) in ys.iter_mut().zip(values) {
        channel.push(value);
    }
}
