//! Bracketed root finding for functions of one variable.
//!
//! [`bisection`] halves an interval whose endpoints have function values of
//! opposite sign until the interval is narrower than the x tolerance or the
//! midpoint residual is within `residual_tol`. Convergence is guaranteed for
//! any continuous function, at one bit of accuracy per iteration.
//!
//! ```
//! use canopy_solvers::root::{Config, Status, bisection};
//!
//! let solution = bisection(|x: f64| x * x - 2.0, [0.0, 2.0], &Config::default())?;
//! assert_eq!(solution.status, Status::Converged);
//! assert!((solution.x - 2.0_f64.sqrt()).abs() < 1e-10);
//! # Ok::<(), canopy_solvers::root::Error>(())
//! ```

mod bracket;
mod config;
mod error;
mod solution;

pub use config::{Config, ConfigError};
pub use error::Error;
pub use solution::{Solution, Status};

use canopy_core::ScalarFn;

use bracket::{Bracket, Sign};

/// Finds a root of `f` within `bracket` by bisection.
///
/// The bounds may be given in either order. If the function is exactly zero at
/// a bound, that bound is returned without iterating.
///
/// # Errors
///
/// Returns an error if a bound is not finite, the function has the same sign
/// at both bounds, or the function returns a non-finite value.
pub fn bisection<F: ScalarFn>(
    mut f: F,
    bracket: [f64; 2],
    config: &Config,
) -> Result<Solution, Error> {
    let [lo, hi] = bracket;
    if !lo.is_finite() || !hi.is_finite() {
        return Err(Error::NonFiniteBracket { lo, hi });
    }

    let f_lo = eval(&mut f, lo)?;
    let f_hi = eval(&mut f, hi)?;

    for (x, residual) in [(lo, f_lo), (hi, f_hi)] {
        if residual == 0.0 {
            return Ok(Solution {
                status: Status::Converged,
                x,
                residual,
                iters: 0,
            });
        }
    }
    if Sign::of(f_lo) == Sign::of(f_hi) {
        return Err(Error::NoSignChange { lo, hi, f_lo, f_hi });
    }

    let mut bracket = Bracket::new([lo, hi], [f_lo, f_hi]);
    let mut best = if f_lo.abs() <= f_hi.abs() {
        (lo, f_lo)
    } else {
        (hi, f_hi)
    };

    for iter in 1..=config.max_iters() {
        let x = bracket.midpoint();
        let residual = eval(&mut f, x)?;
        if residual.abs() <= best.1.abs() {
            best = (x, residual);
        }

        let sign = Sign::of(residual);
        if sign == Sign::Zero
            || residual.abs() <= config.residual_tol()
            || config.x_converged(x, 0.5 * bracket.width())
        {
            return Ok(Solution {
                status: Status::Converged,
                x,
                residual,
                iters: iter,
            });
        }

        bracket.shrink(x, sign);
    }

    log::debug!(
        "bisection stopped after {} iterations with bracket width {:e}",
        config.max_iters(),
        bracket.width()
    );
    Ok(Solution {
        status: Status::MaxIters,
        x: best.0,
        residual: best.1,
        iters: config.max_iters(),
    })
}

fn eval<F: ScalarFn>(f: &mut F, x: f64) -> Result<f64, Error> {
    let value = f.call(x);
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::NonFiniteResidual { x })
    }
}
