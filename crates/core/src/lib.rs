//! Core traits and types for the canopy framework.
//!
//! This crate defines the shared abstractions that solvers, splines, and
//! models build on:
//!
//! - [`OdeState`] — a value that serializes its mutable state into a slice of
//!   a flattened state vector, and reads it back
//! - [`OdeSystem`] — an [`OdeState`] that can also compute its own derivative
//! - [`ScalarFn`] and [`Functor`] — the callback adapter used by numeric
//!   routines (root finding, quadrature, spline fitting)
//! - [`Observer`] — receives solver events and optionally returns control actions

mod functor;
mod observer;
mod ode;

pub use functor::{Functor, ScalarFn, bind, invoke};
pub use observer::Observer;
pub use ode::{OdeState, OdeSystem};
