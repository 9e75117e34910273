//! Adaptive Gauss–Kronrod quadrature.
//!
//! [`integrate`] applies the 7-point Gauss / 15-point Kronrod pair to the
//! whole interval, then repeatedly bisects the subinterval with the largest
//! error estimate until
//!
//! ```text
//! Σ error_i <= max(abs_tol, rel_tol * |Σ value_i|)
//! ```
//!
//! or the partition reaches `max_intervals` subintervals. Hitting the limit is
//! not an error; the best estimate is returned with [`Status::MaxIntervals`].

mod config;
mod error;
mod rule;
mod solution;

pub use config::{Config, ConfigError};
pub use error::Error;
pub use solution::{Solution, Status};

use canopy_core::ScalarFn;

use rule::Segment;

/// Integrates `f` from `a` to `b`.
///
/// Equal bounds give zero, and reversed bounds negate the result.
///
/// # Errors
///
/// Returns an error if a bound is not finite or the integrand returns a
/// non-finite value.
pub fn integrate<F: ScalarFn>(mut f: F, a: f64, b: f64, config: &Config) -> Result<Solution, Error> {
    if !a.is_finite() || !b.is_finite() {
        return Err(Error::NonFiniteBounds { a, b });
    }
    if a == b {
        return Ok(Solution {
            status: Status::Converged,
            value: 0.0,
            abs_error: 0.0,
            intervals: 0,
        });
    }
    if a > b {
        let solution = integrate(f, b, a, config)?;
        return Ok(Solution {
            value: -solution.value,
            ..solution
        });
    }

    let mut segments = vec![Segment::new(&mut f, a, b)?];

    loop {
        let value: f64 = segments.iter().map(|s| s.value).sum();
        let abs_error: f64 = segments.iter().map(|s| s.error).sum();

        let status = if abs_error <= config.tolerance(value) {
            Some(Status::Converged)
        } else if segments.len() >= config.max_intervals() {
            log::debug!(
                "quadrature over [{a}, {b}] stopped at {} intervals with error {abs_error:e}",
                segments.len()
            );
            Some(Status::MaxIntervals)
        } else {
            None
        };

        if let Some(status) = status {
            return Ok(Solution {
                status,
                value,
                abs_error,
                intervals: segments.len(),
            });
        }

        let worst = segments
            .iter()
            .enumerate()
            .max_by(|(_, l), (_, r)| l.error.total_cmp(&r.error))
            .map_or(0, |(i, _)| i);
        let [left, right] = segments[worst].bisect(&mut f)?;
        segments[worst] = left;
        segments.push(right);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn integrates_smooth_function_in_one_interval() {
        let solution = integrate(|x: f64| x.sin(), 0.0, PI, &Config::default()).expect("integrable");

        assert_eq!(solution.status, Status::Converged);
        assert_eq!(solution.intervals, 1);
        assert_relative_eq!(solution.value, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn refines_around_a_kink() {
        let solution =
            integrate(|x: f64| (x - 0.3).abs(), 0.0, 1.0, &Config::default()).expect("integrable");

        assert_eq!(solution.status, Status::Converged);
        assert!(solution.intervals > 1);
        assert_relative_eq!(solution.value, 0.045 + 0.245, epsilon = 1e-8);
    }

    #[test]
    fn reversed_and_empty_bounds() {
        let config = Config::default();
        let forward = integrate(|x: f64| x * x, 0.0, 3.0, &config).expect("integrable");
        let backward = integrate(|x: f64| x * x, 3.0, 0.0, &config).expect("integrable");
        let empty = integrate(|x: f64| x * x, 2.0, 2.0, &config).expect("integrable");

        assert_relative_eq!(forward.value, 9.0, epsilon = 1e-12);
        assert_relative_eq!(backward.value, -9.0, epsilon = 1e-12);
        assert_relative_eq!(empty.value, 0.0);
    }

    #[test]
    fn interval_limit_is_reported() {
        let config = Config::new(1e-14, 0.0, 2).expect("valid config");
        let solution = integrate(|x: f64| x.sqrt(), 0.0, 1.0, &config).expect("integrable");

        assert_eq!(solution.status, Status::MaxIntervals);
        assert_eq!(solution.intervals, 2);
        assert_relative_eq!(solution.value, 2.0 / 3.0, epsilon = 1e-4);
    }

    #[test]
    fn non_finite_integrand_is_an_error() {
        let err = integrate(|x: f64| 1.0 / (x - 0.5), 0.0, 1.0, &Config::default())
            .expect_err("pole at the centre");

        assert_eq!(err, Error::NonFiniteIntegrand { x: 0.5 });
    }
}
