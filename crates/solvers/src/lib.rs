//! Numerical solvers for the canopy framework.
//!
//! # Modules
//!
//! - [`ode`] — controlled time stepping of an [`OdeSystem`]
//! - [`root`] — bracketed root finding for functions of one variable
//! - [`quadrature`] — adaptive integration of functions of one variable
//!
//! Root finding and quadrature accept any [`ScalarFn`], so closures and
//! method bindings built with [`Functor`] work interchangeably.
//!
//! [`OdeSystem`]: canopy_core::OdeSystem
//! [`ScalarFn`]: canopy_core::ScalarFn
//! [`Functor`]: canopy_core::Functor

pub mod ode;
pub mod quadrature;
pub mod root;
