//! Cubic spline interpolation for the canopy framework.
//!
//! - [`CubicSpline`]: a natural cubic through fixed samples
//! - [`AdaptiveSpline`]: a cubic fitted to a function, refined where the
//!   interpolation error at interval midpoints exceeds a tolerance
//! - [`MultiSpline`]: several output channels over one shared set of
//!   abscissae, fitted adaptively or from precomputed samples
//!
//! Every spline carries an [`Extrapolate`] policy. The default,
//! [`Extrapolate::Error`], fails with [`Error::OutOfDomain`] outside the
//! sampled range, so extrapolation only happens when the caller opts in.

mod adaptive;
mod config;
mod cubic;
mod error;
mod extrapolate;
mod multi;
mod refine;

pub use adaptive::AdaptiveSpline;
pub use config::{Config, ConfigError};
pub use cubic::{CubicSpline, MIN_SAMPLES};
pub use error::Error;
pub use extrapolate::Extrapolate;
pub use multi::MultiSpline;
pub use refine::Status;
